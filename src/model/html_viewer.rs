//! HtmlViewerState：HTML检视器的片段级协调（装配 + 图片回退 + 尺寸同步）

use crate::model::html_compose::compose_document;
use crate::model::image_fallback::ImageFallbackResolver;
use crate::model::size_sync::{Generation, SizeSynchronizer};

#[derive(Debug)]
pub struct HtmlViewerState {
    fragment: String,
    composed: String,
    pub resolver: ImageFallbackResolver,
    pub sync: SizeSynchronizer,
}

impl HtmlViewerState {
    /// proxy_base：后端代理端点的基地址，回退链照搬使用
    pub fn new(proxy_base: impl Into<String>) -> Self {
        Self {
            fragment: String::new(),
            composed: String::new(),
            resolver: ImageFallbackResolver::new(proxy_base),
            sync: SizeSynchronizer::new(),
        }
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn composed(&self) -> &str {
        &self.composed
    }

    /// 替换被检视的片段：重新装配文档、清空图片尝试记录、
    /// 取消旧世代的观察并进入新世代。返回新世代号。
    pub fn set_fragment(&mut self, fragment: &str) -> Generation {
        self.fragment = fragment.to_string();
        self.composed = compose_document(fragment);
        self.resolver.reset();
        let generation = self.sync.begin_fragment();
        tracing::info!(
            "片段已装配: {} 字符 -> {} 字符文档",
            self.fragment.len(),
            self.composed.len()
        );
        generation
    }

    /// 隔离宿主转发的图片失败事件；返回应改写的新src（终态None）
    pub fn image_load_failed(&mut self, original_url: &str) -> Option<String> {
        self.resolver.on_load_failed(original_url)
    }

    /// 视图卸载
    pub fn release(&mut self) {
        self.fragment.clear();
        self.composed.clear();
        self.resolver.reset();
        self.sync.release();
    }
}
