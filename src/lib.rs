//! 内容检视器核心库
//!
//! 为内容流水线后台提供两类检视视图：任意嵌套JSON值的树形检视，
//! 以及任意HTML片段的隔离渲染检视（装配/图片回退/尺寸同步）。
//! 遵循MVVM架构模式，核心全部是无渲染环境可单测的纯逻辑。

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::html_viewer::HtmlViewerState;
pub use model::image_fallback::{AttemptState, ImageFallbackResolver};
pub use model::json_tree::{build_forest, JsonTreeNode, NodeKind, PathId};
pub use model::search::compute_expand_set;
pub use model::size_sync::{Generation, LoadState, ObserverHandle, SizeSynchronizer};
pub use model::viewer_core::{JsonViewerOptions, JsonViewerState, ViewerError, ViewerTheme};
