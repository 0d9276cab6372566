//! 搜索展开集：计算为了露出全部命中节点而必须展开的最小祖先路径集合

use std::collections::HashSet;

use crate::model::json_tree::{JsonTreeNode, PathId};

/// 命中规则：大小写不敏感子串匹配键名；叶子节点还匹配其值文本。
/// 容器摘要（"{..} (2 keys)" 之类）属于格式化文本，刻意不参与匹配，
/// 避免查询 "keys" 时误命中所有对象。
fn node_matches(node: &JsonTreeNode, query_lower: &str) -> bool {
    if node.name.to_lowercase().contains(query_lower) {
        return true;
    }
    node.is_leaf() && node.preview.to_lowercase().contains(query_lower)
}

/// 对森林做深度优先遍历，返回需要展开的路径集合。
///
/// 空白查询返回空集（默认折叠态）。每个命中节点贡献其全部祖先路径；
/// 命中节点本身是容器时也加入自身（展开后能看到其内容）。
/// 每次查询变化都从头重算，不维护增量索引。
pub fn compute_expand_set(forest: &[JsonTreeNode], query: &str) -> HashSet<PathId> {
    let query = query.trim();
    let mut expand = HashSet::new();
    if query.is_empty() {
        return expand;
    }
    let query_lower = query.to_lowercase();

    fn walk(
        node: &JsonTreeNode,
        ancestors: &mut Vec<PathId>,
        query_lower: &str,
        expand: &mut HashSet<PathId>,
    ) {
        if node_matches(node, query_lower) {
            for anc in ancestors.iter() {
                expand.insert(anc.clone());
            }
            if !node.is_leaf() {
                expand.insert(node.path.clone());
            }
        }
        ancestors.push(node.path.clone());
        for child in &node.children {
            walk(child, ancestors, query_lower, expand);
        }
        ancestors.pop();
    }

    let mut ancestors = Vec::new();
    for root in forest {
        walk(root, &mut ancestors, &query_lower, &mut expand);
    }
    expand
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::json_tree::build_forest;
    use serde_json::json;

    #[test]
    fn test_leaf_match_expands_ancestor_chain_only() {
        // 命中 a[1].b = "hi"：需要展开 a 与 a[1]，叶子本身不进集合
        let v = json!({"a": [1, {"b": "hi"}]});
        let forest = build_forest(&v);
        let expand = compute_expand_set(&forest, "hi");

        let a_path = forest[0].path.clone();
        let a1_path = forest[0].children[1].path.clone();
        let expected: HashSet<_> = [a_path, a1_path].into_iter().collect();
        assert_eq!(expand, expected, "展开集应恰好包含通往命中的两个容器");
    }

    #[test]
    fn test_no_match_yields_empty_set() {
        let v = json!({"a": [1, {"b": "hi"}]});
        let forest = build_forest(&v);
        assert!(compute_expand_set(&forest, "zzz").is_empty());
    }

    #[test]
    fn test_empty_and_whitespace_query_yield_empty_set() {
        let v = json!({"a": {"b": 1}});
        let forest = build_forest(&v);
        assert!(compute_expand_set(&forest, "").is_empty());
        assert!(compute_expand_set(&forest, "   ").is_empty());
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let v = json!({"Feed": {"Title": "Morning News"}});
        let forest = build_forest(&v);
        let by_lower = compute_expand_set(&forest, "morning");
        let by_upper = compute_expand_set(&forest, "MORNING");
        assert!(!by_lower.is_empty(), "小写查询应命中");
        assert_eq!(by_lower, by_upper, "大小写不应影响结果");
    }

    #[test]
    fn test_every_ancestor_present_for_deep_match() {
        let v = json!({"l1": {"l2": {"l3": {"needle": "x"}}}});
        let forest = build_forest(&v);
        let expand = compute_expand_set(&forest, "needle");

        let l1 = &forest[0];
        let l2 = &l1.children[0];
        let l3 = &l2.children[0];
        assert!(expand.contains(&l1.path), "顶层祖先缺失");
        assert!(expand.contains(&l2.path), "中间祖先缺失");
        assert!(expand.contains(&l3.path), "直接父级缺失");
        assert_eq!(expand.len(), 3, "不应包含无关路径");
    }

    #[test]
    fn test_container_name_match_includes_itself() {
        let v = json!({"entries": [1, 2]});
        let forest = build_forest(&v);
        let expand = compute_expand_set(&forest, "entries");
        assert!(expand.contains(&forest[0].path), "命中的容器自身应展开");
    }

    #[test]
    fn test_container_summary_text_not_matched() {
        // "keys" / "items" 只出现在容器摘要里，不应命中任何节点
        let v = json!({"a": {"b": 1}, "c": [1, 2]});
        let forest = build_forest(&v);
        assert!(compute_expand_set(&forest, "keys").is_empty());
        assert!(compute_expand_set(&forest, "items").is_empty());
    }

    #[test]
    fn test_result_paths_are_match_or_proper_ancestor() {
        let v = json!({
            "feeds": [{"url": "http://a.example/rss"}, {"url": "http://b.example/rss"}],
            "note": "rss disabled"
        });
        let forest = build_forest(&v);
        let expand = compute_expand_set(&forest, "rss");

        // 收集全部命中节点
        fn matches<'a>(
            nodes: &'a [crate::model::json_tree::JsonTreeNode],
            out: &mut Vec<&'a crate::model::json_tree::JsonTreeNode>,
        ) {
            for n in nodes {
                if super::node_matches(n, "rss") {
                    out.push(n);
                }
                matches(&n.children, out);
            }
        }
        let mut hit = Vec::new();
        matches(&forest, &mut hit);
        assert!(!hit.is_empty());

        for p in &expand {
            let justified = hit
                .iter()
                .any(|m| p == &m.path || p.is_ancestor_of(&m.path));
            assert!(justified, "展开集中出现了与命中无关的路径: {}", p);
        }
    }
}
