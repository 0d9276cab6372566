//! JsonViewerState：JSON检视器的受控状态（当前值、展开集、搜索、复制）

use std::collections::HashSet;
use std::path::Path;

use jsonpath_rust::JsonPath;
use serde_json::Value;
use thiserror::Error;

use crate::model::json_tree::{build_forest, JsonTreeNode, PathId};
use crate::model::search::compute_expand_set;
use crate::utils::fs::read_json_file;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("JSONPath错误: {0}")]
    JsonPath(String),
    #[error("状态错误: {0}")]
    State(String),
}

/// 内置两套token配色（十六进制RGB），按节点类别着色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPalette {
    pub key: (u8, u8, u8),
    pub string: (u8, u8, u8),
    pub number: (u8, u8, u8),
    pub boolean: (u8, u8, u8),
    pub null: (u8, u8, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerTheme {
    #[default]
    Light,
    Dark,
}

const LIGHT_PALETTE: TokenPalette = TokenPalette {
    key: (0x1f, 0x3a, 0x5f),
    string: (0x0b, 0x7a, 0x3e),
    number: (0x1a, 0x56, 0xdb),
    boolean: (0xb4, 0x5f, 0x06),
    null: (0x6b, 0x72, 0x80),
};

const DARK_PALETTE: TokenPalette = TokenPalette {
    key: (0x93, 0xc5, 0xfd),
    string: (0x86, 0xef, 0xac),
    number: (0x7d, 0xd3, 0xfc),
    boolean: (0xfc, 0xd3, 0x4d),
    null: (0x9c, 0xa3, 0xaf),
};

impl ViewerTheme {
    pub fn palette(self) -> &'static TokenPalette {
        match self {
            ViewerTheme::Light => &LIGHT_PALETTE,
            ViewerTheme::Dark => &DARK_PALETTE,
        }
    }
}

/// 宿主传入的检视选项
#[derive(Debug, Clone, Copy)]
pub struct JsonViewerOptions {
    /// 初始是否折叠全部节点；为false时初始展开全部容器
    pub default_collapsed: bool,
    pub enable_copy: bool,
    /// 在行尾追加类型标注（Object/Array/String...）
    pub show_type_annotations: bool,
    pub theme: ViewerTheme,
}

impl Default for JsonViewerOptions {
    fn default() -> Self {
        Self {
            default_collapsed: true,
            enable_copy: true,
            show_type_annotations: false,
            theme: ViewerTheme::Light,
        }
    }
}

/// 扁平化后的可见行（展示层按depth缩进）
#[derive(Debug)]
pub struct VisibleRow<'a> {
    pub node: &'a JsonTreeNode,
    pub depth: usize,
}

/// 受控视图状态：值与查询是输入，森林与展开集是派生输出。
/// 宿主可通过 toggle/expand_all/collapse_all 覆盖展开集（controlled模式）。
#[derive(Debug, Default)]
pub struct JsonViewerState {
    dom: Option<Value>,
    forest: Vec<JsonTreeNode>,
    expanded: HashSet<PathId>,
    query: String,
    pub options: JsonViewerOptions,
}

impl JsonViewerState {
    pub fn new(options: JsonViewerOptions) -> Self {
        Self {
            dom: None,
            forest: Vec::new(),
            expanded: HashSet::new(),
            query: String::new(),
            options,
        }
    }

    pub fn forest(&self) -> &[JsonTreeNode] {
        &self.forest
    }

    pub fn expanded(&self) -> &HashSet<PathId> {
        &self.expanded
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// 替换被检视的值：全量重建森林，搜索清空，展开集回到默认态
    pub fn set_value(&mut self, value: Value) {
        self.forest = build_forest(&value);
        self.dom = Some(value);
        self.query.clear();
        self.expanded = self.default_expand_set();
        tracing::info!("检视值已替换，共 {} 个顶层节点", self.forest.len());
    }

    /// 从文件加载JSON并作为新的检视值（宿主便捷入口）
    pub fn load_file(&mut self, p: &Path) -> Result<(), ViewerError> {
        let value = read_json_file(p)?;
        self.set_value(value);
        Ok(())
    }

    /// 默认展开集：折叠模式为空集，否则展开全部容器
    fn default_expand_set(&self) -> HashSet<PathId> {
        if self.options.default_collapsed {
            HashSet::new()
        } else {
            self.all_container_paths()
        }
    }

    fn all_container_paths(&self) -> HashSet<PathId> {
        let mut all = HashSet::new();
        fn collect(nodes: &[JsonTreeNode], out: &mut HashSet<PathId>) {
            for n in nodes {
                if !n.is_leaf() {
                    out.insert(n.path.clone());
                }
                collect(&n.children, out);
            }
        }
        collect(&self.forest, &mut all);
        all
    }

    /// 更新搜索查询：展开集被重算（不是重置），清空查询恢复默认态
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.expanded = if query.trim().is_empty() {
            self.default_expand_set()
        } else {
            compute_expand_set(&self.forest, query)
        };
    }

    /// 切换单个容器的展开状态（宿主覆盖入口）
    pub fn toggle(&mut self, path: &PathId) {
        if !self.expanded.remove(path) {
            self.expanded.insert(path.clone());
        }
    }

    pub fn expand_all(&mut self) {
        self.expanded = self.all_container_paths();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn is_expanded(&self, path: &PathId) -> bool {
        self.expanded.contains(path)
    }

    /// 扁平化当前可见行：顶层节点总是可见，子节点仅当父级展开时可见
    pub fn visible_rows(&self) -> Vec<VisibleRow<'_>> {
        fn walk<'a>(
            nodes: &'a [JsonTreeNode],
            depth: usize,
            expanded: &HashSet<PathId>,
            out: &mut Vec<VisibleRow<'a>>,
        ) {
            for n in nodes {
                out.push(VisibleRow { node: n, depth });
                if expanded.contains(&n.path) {
                    walk(&n.children, depth + 1, expanded, out);
                }
            }
        }
        let mut rows = Vec::new();
        walk(&self.forest, 0, &self.expanded, &mut rows);
        rows
    }

    /// 按位置路径查找节点
    pub fn find_node(&self, path: &PathId) -> Option<&JsonTreeNode> {
        fn find<'a>(nodes: &'a [JsonTreeNode], path: &PathId) -> Option<&'a JsonTreeNode> {
            for n in nodes {
                if &n.path == path {
                    return Some(n);
                }
                if n.path.is_ancestor_of(path) {
                    return find(&n.children, path);
                }
            }
            None
        }
        find(&self.forest, path)
    }

    /// 生成复制载荷：原子节点复制其裸值文本，容器复制pretty JSON子树。
    /// 子树通过节点的JSONPath从DOM提取，保持原始深度。
    pub fn copy_payload(&self, path: &PathId) -> Result<String, ViewerError> {
        if !self.options.enable_copy {
            return Err(ViewerError::State("复制功能未启用".into()));
        }
        let node = self
            .find_node(path)
            .ok_or_else(|| ViewerError::State(format!("节点不存在: {}", path)))?;
        let dom = self
            .dom
            .as_ref()
            .ok_or_else(|| ViewerError::State("检视值尚未加载".into()))?;

        let hits: Vec<&Value> = dom
            .query(&node.json_path)
            .map_err(|e| ViewerError::JsonPath(e.to_string()))?;
        let value = hits
            .into_iter()
            .next()
            .ok_or_else(|| ViewerError::JsonPath(format!("未匹配到节点: {}", node.json_path)))?;

        let payload = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            container => serde_json::to_string_pretty(container)?,
        };
        tracing::info!("生成复制载荷: {} ({} 字符)", node.json_path, payload.len());
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_state(options: JsonViewerOptions) -> JsonViewerState {
        let mut state = JsonViewerState::new(options);
        state.set_value(json!({
            "feed": {"title": "早报", "entries": [{"id": 1}, {"id": 2}]},
            "ok": true
        }));
        state
    }

    #[test]
    fn test_default_collapsed_shows_roots_only() {
        let state = sample_state(JsonViewerOptions::default());
        let rows = state.visible_rows();
        assert_eq!(rows.len(), 2, "折叠态只显示顶层节点");
        assert!(rows.iter().all(|r| r.depth == 0));
        assert!(state.expanded().is_empty());
    }

    #[test]
    fn test_expand_all_when_not_default_collapsed() {
        let state = sample_state(JsonViewerOptions {
            default_collapsed: false,
            ..JsonViewerOptions::default()
        });
        let rows = state.visible_rows();
        // feed, title, entries, [0], id, [1], id, ok
        assert_eq!(rows.len(), 8, "非折叠态应显示全部节点");
    }

    #[test]
    fn test_toggle_reveals_children() {
        let mut state = sample_state(JsonViewerOptions::default());
        let feed_path = state.forest()[0].path.clone();

        state.toggle(&feed_path);
        let rows = state.visible_rows();
        assert_eq!(rows.len(), 4, "展开feed后显示其两个子节点");
        assert!(state.is_expanded(&feed_path));

        state.toggle(&feed_path);
        assert_eq!(state.visible_rows().len(), 2, "再次切换应折叠回去");
    }

    #[test]
    fn test_query_recomputes_and_clearing_restores_default() {
        let mut state = sample_state(JsonViewerOptions::default());

        state.set_query("title");
        assert!(!state.expanded().is_empty(), "查询命中后展开集非空");
        let feed_path = state.forest()[0].path.clone();
        assert!(state.is_expanded(&feed_path));

        state.set_query("");
        assert!(state.expanded().is_empty(), "清空查询应恢复默认折叠态");
    }

    #[test]
    fn test_new_value_resets_expansion() {
        let mut state = sample_state(JsonViewerOptions::default());
        let feed_path = state.forest()[0].path.clone();
        state.toggle(&feed_path);
        state.set_query("id");
        assert!(!state.expanded().is_empty());

        state.set_value(json!({"fresh": [1]}));
        assert!(state.expanded().is_empty(), "新根值应重置为默认折叠态");
        assert!(state.query().is_empty(), "新根值应清空查询");
        assert_eq!(state.forest().len(), 1);
    }

    #[test]
    fn test_copy_primitive_yields_bare_text() {
        let state = sample_state(JsonViewerOptions::default());
        let feed = &state.forest()[0];
        let title_path = feed.children[0].path.clone();

        let payload = state.copy_payload(&title_path).expect("复制原子值失败");
        assert_eq!(payload, "早报", "字符串叶子应复制裸文本，不带引号");
    }

    #[test]
    fn test_copy_container_yields_pretty_subtree() {
        let state = sample_state(JsonViewerOptions::default());
        let feed_path = state.forest()[0].path.clone();

        let payload = state.copy_payload(&feed_path).expect("复制子树失败");
        let parsed: Value = serde_json::from_str(&payload).expect("复制载荷应是合法JSON");
        assert_eq!(parsed, json!({"title": "早报", "entries": [{"id": 1}, {"id": 2}]}));
        assert!(payload.contains('\n'), "容器应为pretty格式");
    }

    #[test]
    fn test_copy_disabled_is_rejected() {
        let state = sample_state(JsonViewerOptions {
            enable_copy: false,
            ..JsonViewerOptions::default()
        });
        let path = state.forest()[0].path.clone();
        assert!(state.copy_payload(&path).is_err(), "复制未启用时应拒绝");
    }

    #[test]
    fn test_find_node_by_path() {
        let state = sample_state(JsonViewerOptions::default());
        let feed = &state.forest()[0];
        let entries = &feed.children[1];
        let id_node = &entries.children[0].children[0];

        let found = state.find_node(&id_node.path).expect("按路径查找失败");
        assert_eq!(found.name, "id");
        assert!(state.find_node(&PathId::root().child(9)).is_none());
    }

    #[test]
    fn test_palettes_differ_per_theme() {
        let light = ViewerTheme::Light.palette();
        let dark = ViewerTheme::Dark.palette();
        assert_ne!(light.key, dark.key);
        assert_ne!(light.string, dark.string);
    }
}
