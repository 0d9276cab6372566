//! VM桥接层：连接Slint UI与两个检视器状态
//!
//! 注意：此模块的具体实现在main.rs中，因为依赖于Slint生成的类型
//! 这里只提供公共常量

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "就绪";
pub const STATUS_LOADING: &str = "正在加载文件...";
pub const STATUS_LOADED: &str = "文件加载完成";
pub const STATUS_COPIED: &str = "已复制到剪贴板";
pub const STATUS_COMPOSED: &str = "片段已装配，等待测量";
pub const STATUS_MEASURED: &str = "内容高度已同步";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";
