//! JSON节点森林：把已反序列化的Value转成带稳定路径ID的有序树结构

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// JSON 节点类型（与 UI 展示解耦）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl NodeKind {
    /// 是否为容器类型（只有容器会递归产生子节点）
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Object | NodeKind::Array)
    }
}

/// 位置路径ID：根为固定种子 `$`，每一级追加子节点在兄弟中的序号。
///
/// 同一次构建内唯一（即使对象键重名也不会冲突），每次重建全部重新分配，
/// 不保证跨重建稳定。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathId(Vec<u32>);

impl PathId {
    /// 根种子路径
    pub fn root() -> Self {
        PathId(Vec::new())
    }

    /// 派生第 idx 个子节点的路径
    pub fn child(&self, idx: u32) -> Self {
        let mut segs = self.0.clone();
        segs.push(idx);
        PathId(segs)
    }

    /// 父路径；根返回 None
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(PathId(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// 是否为 other 的真祖先
    pub fn is_ancestor_of(&self, other: &PathId) -> bool {
        self.0.len() < other.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for seg in &self.0 {
            write!(f, ".{}", seg)?;
        }
        Ok(())
    }
}

impl FromStr for PathId {
    type Err = String;

    /// 从 Display 形式（`$` / `$.0.1`）解析，供 UI 回调传递路径使用
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('$')
            .ok_or_else(|| format!("路径ID须以 $ 开头: {}", s))?;
        if rest.is_empty() {
            return Ok(PathId::root());
        }
        let segs = rest
            .strip_prefix('.')
            .ok_or_else(|| format!("路径ID格式错误: {}", s))?
            .split('.')
            .map(|seg| seg.parse::<u32>().map_err(|e| format!("路径段无效: {}", e)))
            .collect::<Result<Vec<u32>, String>>()?;
        Ok(PathId(segs))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonTreeNode {
    /// 本次构建内唯一的位置路径
    pub path: PathId,
    /// RFC 9535 JSONPath（用于复制时精确提取子树）
    pub json_path: String,
    /// 节点在父级中的键名或索引的字符串形式
    pub name: String,
    /// 节点类型
    pub kind: NodeKind,
    /// 渲染值文本：原始值不截断（展示层按需截断）；容器为摘要
    pub preview: String,
    /// 子元素数量（对象字段数 / 数组长度）
    pub children_count: u32,
    /// 有序子节点（仅容器非空）
    pub children: Vec<JsonTreeNode>,
}

impl JsonTreeNode {
    pub fn is_leaf(&self) -> bool {
        !self.kind.is_container()
    }
}

fn kind_of(v: &Value) -> NodeKind {
    match v {
        Value::Object(_) => NodeKind::Object,
        Value::Array(_) => NodeKind::Array,
        Value::String(_) => NodeKind::String,
        Value::Number(_) => NodeKind::Number,
        Value::Bool(_) => NodeKind::Bool,
        Value::Null => NodeKind::Null,
    }
}

fn preview_of(v: &Value) -> String {
    match v {
        Value::String(s) => format!("\"{}\"", s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Object(m) => format!("{{..}} ({} keys)", m.len()),
        Value::Array(a) => format!("[..] ({} items)", a.len()),
    }
}

/// JSONPath 字段含特殊字符时使用 bracket-notation
fn field_json_path(parent: &str, key: &str) -> String {
    if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        format!("{}.{}", parent, key)
    } else {
        format!("{}['{}']", parent, key.replace('\'', "\\'"))
    }
}

/// 从根 Value 构建有序森林。
///
/// 森林覆盖根容器的每个键/元素；根本身不作为节点。非容器根退化为空森林
/// （类型不匹配按"无子节点"处理，不报错）。
pub fn build_forest(root: &Value) -> Vec<JsonTreeNode> {
    fn build_node(v: &Value, path: PathId, json_path: String, name: String) -> JsonTreeNode {
        let kind = kind_of(v);
        let (children_count, children) = match v {
            Value::Object(map) => {
                let kids = map
                    .iter()
                    .enumerate()
                    .map(|(i, (k, child))| {
                        build_node(
                            child,
                            path.child(i as u32),
                            field_json_path(&json_path, k),
                            k.clone(),
                        )
                    })
                    .collect::<Vec<_>>();
                (map.len() as u32, kids)
            }
            Value::Array(arr) => {
                let kids = arr
                    .iter()
                    .enumerate()
                    .map(|(i, child)| {
                        build_node(
                            child,
                            path.child(i as u32),
                            format!("{}[{}]", json_path, i),
                            format!("[{}]", i),
                        )
                    })
                    .collect::<Vec<_>>();
                (arr.len() as u32, kids)
            }
            _ => (0, Vec::new()),
        };
        JsonTreeNode {
            path,
            json_path,
            name,
            kind,
            preview: preview_of(v),
            children_count,
            children,
        }
    }

    let seed = PathId::root();
    match root {
        Value::Object(map) => map
            .iter()
            .enumerate()
            .map(|(i, (k, child))| {
                build_node(child, seed.child(i as u32), field_json_path("$", k), k.clone())
            })
            .collect(),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, child)| {
                build_node(
                    child,
                    seed.child(i as u32),
                    format!("$[{}]", i),
                    format!("[{}]", i),
                )
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// 森林总节点数（含所有层级）
pub fn node_count(forest: &[JsonTreeNode]) -> usize {
    forest
        .iter()
        .map(|n| 1 + node_count(&n.children))
        .sum()
}
