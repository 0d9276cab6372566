//! 程序入口：初始化日志、加载 Slint UI，并绑定两个检视器状态
//!
//! 壳层扮演"协作方"：挑选要检视的文件，把值/片段交给核心，
//! 再把核心派生出的视图渲染出来。本目标没有浏览器内核，HTML片段
//! 用去标签文本做退化渲染（平台替换，核心逻辑不变）。

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use slint::{ComponentHandle, ModelRc, VecModel};
use tracing_subscriber::fmt::SubscriberBuilder;

slint::include_modules!();

mod model;
mod utils;
mod vm;

use model::html_compose::strip_tags;
use model::html_viewer::HtmlViewerState;
use model::json_tree::PathId;
use model::size_sync::ObserverHandle;
use model::viewer_core::{JsonViewerOptions, JsonViewerState, ViewerTheme};
use vm::bridge::*;

/// 展示层行高与内边距，用于退化文本渲染的高度估算
const ROW_HEIGHT_PX: f32 = 22.0;
const CONTENT_PADDING_PX: f32 = 24.0;

/// 展示用截断：模型里的preview不截断，只有行渲染时才截
fn truncate_for_display(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

/// 壳层的"布局尺寸观察者"：detach后回调不再生效
struct TextMeasureObserver {
    active: Rc<Cell<bool>>,
}

impl ObserverHandle for TextMeasureObserver {
    fn detach(&mut self) {
        self.active.set(false);
    }
}

/// VM桥接器：管理UI与两个检视器状态的交互
struct ViewModelBridge {
    json_state: Rc<RefCell<JsonViewerState>>,
    html_state: Rc<RefCell<HtmlViewerState>>,
}

impl ViewModelBridge {
    fn new(app_window: &AppWindow) -> Self {
        let bridge = Self {
            json_state: Rc::new(RefCell::new(JsonViewerState::new(JsonViewerOptions::default()))),
            html_state: Rc::new(RefCell::new(HtmlViewerState::new(""))),
        };
        bridge.setup_callbacks(app_window);
        bridge
    }

    /// 设置所有UI回调函数
    fn setup_callbacks(&self, app_window: &AppWindow) {
        // === 加载JSON文件 ===
        {
            let json_state = self.json_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_load_json_file(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_load_json(&app_window, &json_state);
                }
            });
        }

        // === 加载HTML片段 ===
        {
            let html_state = self.html_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_load_fragment_file(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_load_fragment(&app_window, &html_state);
                }
            });
        }

        // === 节点展开/折叠 ===
        {
            let json_state = self.json_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_node_toggled(move |path| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_node_toggled(&app_window, &json_state, &path.to_string());
                }
            });
        }

        // === 节点选择 ===
        {
            let json_state = self.json_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_node_selected(move |path| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_node_selected(&app_window, &json_state, &path.to_string());
                }
            });
        }

        // === 搜索 ===
        {
            let json_state = self.json_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_search_edited(move |filter| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_search_edited(&app_window, &json_state, &filter.to_string());
                }
            });
        }

        // === 复制 ===
        {
            let json_state = self.json_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_copy_pressed(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_copy_pressed(&app_window, &json_state);
                }
            });
        }

        // === 展开/折叠全部（宿主覆盖入口） ===
        {
            let json_state = self.json_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_expand_all_pressed(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    json_state.borrow_mut().expand_all();
                    Self::rebuild_tree_model(&app_window, &json_state);
                    app_window.set_status_message("已展开全部".into());
                }
            });
        }
        {
            let json_state = self.json_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_collapse_all_pressed(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    json_state.borrow_mut().collapse_all();
                    Self::rebuild_tree_model(&app_window, &json_state);
                    app_window.set_status_message("已折叠全部".into());
                }
            });
        }

        // === 主题切换 ===
        {
            let json_state = self.json_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_theme_toggled(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    let theme = {
                        let mut state = json_state.borrow_mut();
                        state.options.theme = match state.options.theme {
                            ViewerTheme::Light => ViewerTheme::Dark,
                            ViewerTheme::Dark => ViewerTheme::Light,
                        };
                        state.options.theme
                    };
                    Self::apply_theme(&app_window, theme);
                }
            });
        }

        // === 类型标注开关 ===
        {
            let json_state = self.json_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_annotations_toggled(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    let show = {
                        let mut state = json_state.borrow_mut();
                        state.options.show_type_annotations = !state.options.show_type_annotations;
                        state.options.show_type_annotations
                    };
                    app_window.set_show_annotations(show);
                }
            });
        }
    }

    /// 初始化UI状态
    fn initialize_ui(&self, app_window: &AppWindow) {
        app_window.set_status_message(STATUS_READY.into());
        app_window.set_current_path("".into());
        app_window.set_preview_text("".into());
        app_window.set_selected_path("".into());
        app_window.set_html_state("empty".into());

        let empty_model = ModelRc::new(VecModel::<TreeRowData>::default());
        app_window.set_tree_model(empty_model);
        Self::apply_theme(app_window, self.json_state.borrow().options.theme);
    }

    /// 把当前主题的token配色写到UI
    fn apply_theme(app_window: &AppWindow, theme: ViewerTheme) {
        let palette = theme.palette();
        let to_color = |(r, g, b): (u8, u8, u8)| slint::Color::from_rgb_u8(r, g, b);
        app_window.set_dark_theme(matches!(theme, ViewerTheme::Dark));
        app_window.set_key_color(to_color(palette.key));
        app_window.set_string_color(to_color(palette.string));
        app_window.set_number_color(to_color(palette.number));
        app_window.set_bool_color(to_color(palette.boolean));
        app_window.set_null_color(to_color(palette.null));
    }

    /// 显示文件选择对话框
    fn show_file_dialog(filter_name: &str, extensions: &[&str]) -> Option<PathBuf> {
        use rfd::FileDialog;

        let file_path = FileDialog::new()
            .add_filter(filter_name, extensions)
            .add_filter("所有文件", &["*"])
            .set_title("选择要检视的文件")
            .pick_file();

        match file_path {
            Some(path) => {
                tracing::info!("用户选择了文件: {}", path.display());
                Some(path)
            }
            None => {
                tracing::info!("用户取消了文件选择");
                None
            }
        }
    }

    /// 处理加载JSON文件
    fn handle_load_json(app_window: &AppWindow, json_state: &Rc<RefCell<JsonViewerState>>) {
        let file_path = match Self::show_file_dialog("JSON文件", &["json"]) {
            Some(path) => path,
            None => {
                app_window.set_status_message("未选择文件".into());
                return;
            }
        };

        app_window.set_status_message(STATUS_LOADING.into());
        let start_time = Instant::now();

        let load_result = json_state.borrow_mut().load_file(&file_path);
        match load_result {
            Ok(()) => {
                let load_duration = start_time.elapsed();
                app_window.set_current_path(file_path.to_string_lossy().to_string().into());
                app_window.set_selected_path("".into());
                app_window.set_preview_text("".into());
                app_window.set_search_filter("".into());
                Self::rebuild_tree_model(app_window, json_state);

                let node_count = model::json_tree::node_count(json_state.borrow().forest());
                app_window.set_status_message(STATUS_LOADED.into());
                tracing::info!(
                    "文件加载成功: {} 个节点，耗时: {:.2}ms",
                    node_count,
                    load_duration.as_millis()
                );
            }
            Err(e) => {
                let error_msg = format!("{}{}", STATUS_ERROR_PREFIX, e);
                app_window.set_status_message(error_msg.into());
                tracing::error!("文件加载失败: {}", e);
            }
        }
    }

    /// 处理加载HTML片段：装配文档并驱动尺寸同步状态机
    fn handle_load_fragment(app_window: &AppWindow, html_state: &Rc<RefCell<HtmlViewerState>>) {
        let file_path = match Self::show_file_dialog("HTML片段", &["html", "htm"]) {
            Some(path) => path,
            None => {
                app_window.set_status_message("未选择文件".into());
                return;
            }
        };

        let fragment = match utils::fs::read_fragment_file(&file_path) {
            Ok(s) => s,
            Err(e) => {
                let error_msg = format!("{}{}", STATUS_ERROR_PREFIX, e);
                app_window.set_status_message(error_msg.into());
                tracing::error!("片段读取失败: {}", e);
                return;
            }
        };

        // 新片段：装配 + 进入新世代（旧观察者在这里被同步解除）
        let generation = html_state.borrow_mut().set_fragment(&fragment);
        let stripped = strip_tags(&fragment);

        app_window.set_fragment_path(file_path.to_string_lossy().to_string().into());
        app_window.set_composed_source(html_state.borrow().composed().into());
        app_window.set_content_text(stripped.clone().into());
        app_window.set_html_state("composing".into());
        app_window.set_status_message(STATUS_COMPOSED.into());

        // 挂接本世代的观察者；再换片段时detach让回调失效
        let active = Rc::new(Cell::new(true));
        html_state.borrow_mut().sync.attach_observer(
            generation,
            Box::new(TextMeasureObserver {
                active: active.clone(),
            }),
        );

        // 退化渲染没有真正的文档加载事件：用事件循环的下一拍模拟
        // "加载完成 + 首次布局测量"这两个异步边界
        let app_window_weak = app_window.as_weak();
        let html_state = html_state.clone();
        slint::Timer::single_shot(Duration::from_millis(30), move || {
            if !active.get() {
                tracing::info!("观察者已解除，丢弃本次测量回调");
                return;
            }
            let Some(app_window) = app_window_weak.upgrade() else {
                return;
            };

            let mut state = html_state.borrow_mut();
            state.sync.document_loaded(generation);
            app_window.set_html_state("pending".into());

            let line_count = stripped.lines().count() as f32;
            let estimated = line_count * ROW_HEIGHT_PX + CONTENT_PADDING_PX;
            let viewport = app_window.get_viewport_height();

            match state.sync.apply_measurement(generation, estimated, viewport) {
                Some(height) => {
                    app_window.set_content_height(height);
                    app_window.set_html_state("measured".into());
                    app_window.set_status_message(STATUS_MEASURED.into());
                    tracing::info!("内容高度镜像到宿主: {:.1}px", height);
                }
                None => {
                    // 空片段等无效测量：保持Pending的忙碌占位
                    tracing::info!("本次测量无效，保持Pending");
                }
            }
        });
    }

    /// 处理节点展开/折叠切换
    fn handle_node_toggled(
        app_window: &AppWindow,
        json_state: &Rc<RefCell<JsonViewerState>>,
        path_str: &str,
    ) {
        let path: PathId = match path_str.parse() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("路径解析失败: {}", e);
                return;
            }
        };
        json_state.borrow_mut().toggle(&path);
        Self::rebuild_tree_model(app_window, json_state);
    }

    /// 处理节点选择：右侧详情显示复制载荷同款文本
    fn handle_node_selected(
        app_window: &AppWindow,
        json_state: &Rc<RefCell<JsonViewerState>>,
        path_str: &str,
    ) {
        let path: PathId = match path_str.parse() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("路径解析失败: {}", e);
                return;
            }
        };
        app_window.set_selected_path(path_str.into());
        Self::rebuild_tree_model(app_window, json_state);

        match json_state.borrow().copy_payload(&path) {
            Ok(text) => {
                app_window.set_preview_text(text.into());
            }
            Err(e) => {
                let error_msg = format!("{}{}", STATUS_ERROR_PREFIX, e);
                app_window.set_status_message(error_msg.into());
                tracing::error!("节点详情提取失败: {}", e);
            }
        }
    }

    /// 处理搜索：展开集被重算而非重置
    fn handle_search_edited(
        app_window: &AppWindow,
        json_state: &Rc<RefCell<JsonViewerState>>,
        filter: &str,
    ) {
        json_state.borrow_mut().set_query(filter);
        Self::rebuild_tree_model(app_window, json_state);

        if filter.trim().is_empty() {
            app_window.set_status_message("已清除搜索".into());
        } else {
            let expanded = json_state.borrow().expanded().len();
            app_window.set_status_message(
                format!("搜索: {} (自动展开 {} 个容器)", filter, expanded).into(),
            );
        }
    }

    /// 处理复制按钮
    fn handle_copy_pressed(app_window: &AppWindow, json_state: &Rc<RefCell<JsonViewerState>>) {
        let selected = app_window.get_selected_path().to_string();
        if selected.is_empty() {
            app_window.set_status_message("错误: 没有选中的节点".into());
            return;
        }
        let path: PathId = match selected.parse() {
            Ok(p) => p,
            Err(_) => {
                app_window.set_status_message("错误: 选中路径无效".into());
                return;
            }
        };

        let payload = match json_state.borrow().copy_payload(&path) {
            Ok(text) => text,
            Err(e) => {
                let error_msg = format!("{}{}", STATUS_ERROR_PREFIX, e);
                app_window.set_status_message(error_msg.into());
                return;
            }
        };

        match utils::clipboard::copy_to_clipboard(&payload) {
            Ok(()) => {
                app_window.set_status_message(STATUS_COPIED.into());
                tracing::info!("内容已复制到剪贴板，长度: {} 字符", payload.len());
            }
            Err(e) => {
                let error_msg = format!("{}{}", STATUS_ERROR_PREFIX, e);
                app_window.set_status_message(error_msg.into());
                tracing::error!("复制失败: {}", e);
            }
        }
    }

    /// 由受控状态重建树模型（可见行 = 顶层 + 已展开容器的子级）
    fn rebuild_tree_model(app_window: &AppWindow, json_state: &Rc<RefCell<JsonViewerState>>) {
        let rows: Vec<TreeRowData> = {
            let state = json_state.borrow();
            state
                .visible_rows()
                .iter()
                .map(|row| TreeRowData {
                    name: row.node.name.clone().into(),
                    path: row.node.path.to_string().into(),
                    kind: format!("{:?}", row.node.kind).into(),
                    preview: truncate_for_display(&row.node.preview, 80).into(),
                    depth: row.depth as i32,
                    expanded: state.is_expanded(&row.node.path),
                    has_children: !row.node.is_leaf(),
                })
                .collect()
        };
        app_window.set_tree_model(ModelRc::new(VecModel::from(rows)));
    }
}

fn main() -> anyhow::Result<()> {
    // 初始化日志输出
    let _ = SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let app = AppWindow::new()?;
    let bridge = ViewModelBridge::new(&app);
    bridge.initialize_ui(&app);

    tracing::info!("应用启动成功，UI已初始化");
    app.run()?;
    Ok(())
}
