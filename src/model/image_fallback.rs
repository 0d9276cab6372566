//! 图片加载失败的两级回退链：直连 → 代理 → 占位图
//!
//! 状态只单向推进，`Placeholder` 为终态。即使占位图本身也加载失败，
//! 也不会再触发第三次改写，链条不可能成环。

use std::collections::HashMap;

/// 后端约定的代理端点路径，照搬使用
pub const PROXY_IMAGE_PATH: &str = "/proxy-image";

/// 本地占位图资产（终态展示）
pub const PLACEHOLDER_ASSET: &str = "/assets/image-unavailable.svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// 尚未失败过，仍在用原始URL
    Direct,
    /// 第一次失败后改走代理
    Proxied,
    /// 第二次失败后落到占位图；不再处理后续失败
    Placeholder,
}

#[derive(Debug)]
pub struct ImageFallbackResolver {
    proxy_base: String,
    /// 以原始URL为键跟踪每张图的尝试状态
    attempts: HashMap<String, AttemptState>,
}

impl ImageFallbackResolver {
    pub fn new(proxy_base: impl Into<String>) -> Self {
        Self {
            proxy_base: proxy_base.into(),
            attempts: HashMap::new(),
        }
    }

    /// 某张图片加载失败时调用；返回应改写成的新src，终态返回None。
    /// 保证：每张图最多两次改写，失败事件不会对外冒泡成错误。
    pub fn on_load_failed(&mut self, original_url: &str) -> Option<String> {
        let state = self
            .attempts
            .entry(original_url.to_string())
            .or_insert(AttemptState::Direct);
        match *state {
            AttemptState::Direct => {
                *state = AttemptState::Proxied;
                let proxied = format!(
                    "{}{}?url={}",
                    self.proxy_base,
                    PROXY_IMAGE_PATH,
                    urlencoding::encode(original_url)
                );
                tracing::info!("图片直连失败，改走代理: {}", original_url);
                Some(proxied)
            }
            AttemptState::Proxied => {
                *state = AttemptState::Placeholder;
                tracing::info!("图片代理仍失败，落到占位图: {}", original_url);
                Some(PLACEHOLDER_ASSET.to_string())
            }
            AttemptState::Placeholder => None,
        }
    }

    pub fn state_of(&self, original_url: &str) -> AttemptState {
        self.attempts
            .get(original_url)
            .copied()
            .unwrap_or(AttemptState::Direct)
    }

    /// 片段更换时清空全部尝试记录
    pub fn reset(&mut self) {
        self.attempts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_failure_rewrites_to_proxy() {
        let mut resolver = ImageFallbackResolver::new("http://admin.example");
        let rewritten = resolver.on_load_failed("http://dead.example/x.png");
        assert_eq!(
            rewritten.as_deref(),
            Some("http://admin.example/proxy-image?url=http%3A%2F%2Fdead.example%2Fx.png"),
            "原始URL应百分号编码后拼到代理端点"
        );
        assert_eq!(
            resolver.state_of("http://dead.example/x.png"),
            AttemptState::Proxied
        );
    }

    #[test]
    fn test_second_failure_falls_to_placeholder() {
        let mut resolver = ImageFallbackResolver::new("");
        resolver.on_load_failed("http://dead.example/x.png");
        let rewritten = resolver.on_load_failed("http://dead.example/x.png");
        assert_eq!(rewritten.as_deref(), Some(PLACEHOLDER_ASSET));
        assert_eq!(
            resolver.state_of("http://dead.example/x.png"),
            AttemptState::Placeholder
        );
    }

    #[test]
    fn test_placeholder_is_terminal_no_third_rewrite() {
        let mut resolver = ImageFallbackResolver::new("");
        let url = "http://dead.example/x.png";
        resolver.on_load_failed(url);
        resolver.on_load_failed(url);
        // 占位图本身加载失败也不再改写
        assert_eq!(resolver.on_load_failed(url), None);
        assert_eq!(resolver.on_load_failed(url), None);
        assert_eq!(resolver.state_of(url), AttemptState::Placeholder);
    }

    #[test]
    fn test_urls_tracked_independently() {
        let mut resolver = ImageFallbackResolver::new("");
        resolver.on_load_failed("http://a.example/1.png");
        resolver.on_load_failed("http://a.example/1.png");
        assert_eq!(resolver.state_of("http://a.example/1.png"), AttemptState::Placeholder);
        assert_eq!(
            resolver.state_of("http://b.example/2.png"),
            AttemptState::Direct,
            "未失败过的图不受影响"
        );
    }

    #[test]
    fn test_reset_clears_attempts() {
        let mut resolver = ImageFallbackResolver::new("");
        resolver.on_load_failed("http://a.example/1.png");
        resolver.reset();
        assert_eq!(resolver.state_of("http://a.example/1.png"), AttemptState::Direct);
        assert!(
            resolver.on_load_failed("http://a.example/1.png").is_some(),
            "重置后重新从直连状态开始"
        );
    }
}
