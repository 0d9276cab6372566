//! 尺寸同步：把隔离文档的内容高度镜像到宿主容器
//!
//! 状态机 `Empty → Composing → (Pending ⇄ Measured)`。测量回调带
//! 世代号，换片段后旧世代的回调被静默丢弃；观察者同一时刻最多一个，
//! 换片段或卸载时同步解除。不设加载超时：一直不完成就一直Pending。

/// 高度下限：Pending期间宿主也按此高度显示忙碌占位
pub const MIN_CONTENT_HEIGHT: f32 = 48.0;

/// 镜像高度相对视口的上限比例
pub const MAX_VIEWPORT_RATIO: f32 = 0.7;

/// 世代号：单调递增，区分先后片段的异步回调
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// 尚无片段
    Empty,
    /// 新片段已装配，隔离文档还没完成加载
    Composing,
    /// 文档加载完成，等第一次非零测量
    Pending,
    /// 已有有效测量
    Measured,
}

/// 布局尺寸观察的能力接口：宿主平台（webview的ResizeObserver、
/// 原生文本测量的定时器等）给出可解除的句柄
pub trait ObserverHandle {
    fn detach(&mut self);
}

pub struct SizeSynchronizer {
    generation: Generation,
    state: LoadState,
    measured_height: Option<f32>,
    observer: Option<Box<dyn ObserverHandle>>,
}

impl std::fmt::Debug for SizeSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeSynchronizer")
            .field("generation", &self.generation)
            .field("state", &self.state)
            .field("measured_height", &self.measured_height)
            .field("observer_attached", &self.observer.is_some())
            .finish()
    }
}

impl Default for SizeSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SizeSynchronizer {
    pub fn new() -> Self {
        Self {
            generation: Generation(0),
            state: LoadState::Empty,
            measured_height: None,
            observer: None,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn measured_height(&self) -> Option<f32> {
        self.measured_height
    }

    /// 新片段到来：无条件回到Composing，世代号+1，旧观察者同步解除。
    /// 返回本片段的世代号，后续的加载完成/测量回调都要带上它。
    pub fn begin_fragment(&mut self) -> Generation {
        self.detach_observer();
        self.generation = Generation(self.generation.0 + 1);
        self.state = LoadState::Composing;
        self.measured_height = None;
        tracing::info!("进入新渲染世代 {:?}", self.generation);
        self.generation
    }

    /// 挂接当前世代的布局观察者；旧世代的挂接请求直接解除并忽略
    pub fn attach_observer(&mut self, generation: Generation, mut handle: Box<dyn ObserverHandle>) {
        if generation != self.generation {
            handle.detach();
            return;
        }
        self.detach_observer();
        self.observer = Some(handle);
    }

    /// 隔离文档加载完成信号；过期世代忽略
    pub fn document_loaded(&mut self, generation: Generation) {
        if generation != self.generation {
            tracing::info!("丢弃过期世代的加载信号 {:?}", generation);
            return;
        }
        if self.state == LoadState::Composing {
            self.state = LoadState::Pending;
        }
    }

    /// 应用一次高度观测。返回宿主应设置的钳制后高度；
    /// 过期世代或无效高度返回None（保持现状）。
    pub fn apply_measurement(
        &mut self,
        generation: Generation,
        height: f32,
        viewport_height: f32,
    ) -> Option<f32> {
        if generation != self.generation {
            tracing::info!("丢弃过期世代的测量 {:?} ({}px)", generation, height);
            return None;
        }
        if height <= 0.0 || !matches!(self.state, LoadState::Pending | LoadState::Measured) {
            return None;
        }
        let clamped = height
            .min(viewport_height * MAX_VIEWPORT_RATIO)
            .max(MIN_CONTENT_HEIGHT);
        self.measured_height = Some(clamped);
        if self.state == LoadState::Pending {
            self.state = LoadState::Measured;
        }
        Some(clamped)
    }

    /// 视图卸载：解除观察并回到空态
    pub fn release(&mut self) {
        self.detach_observer();
        self.state = LoadState::Empty;
        self.measured_height = None;
    }

    fn detach_observer(&mut self) {
        if let Some(mut obs) = self.observer.take() {
            obs.detach();
        }
    }
}
