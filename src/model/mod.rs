pub mod html_compose;
pub mod html_viewer;
pub mod image_fallback;
pub mod json_tree;
pub mod search;
pub mod size_sync;
pub mod viewer_core;
