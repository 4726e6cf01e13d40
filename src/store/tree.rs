//! Doc tree payloads: walking a submitted forest into row placements and
//! rebuilding a forest from live rows.
//!
//! Submitted trees are untrusted. The walk rejects repeated ids (which
//! covers cycles and self-parenting) and bounds the nesting depth before
//! anything is written.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// One node of a project's table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocNode {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub children: Vec<TocNode>,
}

/// Where a doc lands after a tree submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub id: i64,
    pub parent_doc: i64,
    pub sort: i64,
}

/// The columns of a live doc needed to rebuild the tree.
#[derive(Debug, Clone)]
pub struct TreeRow {
    pub id: i64,
    pub name: String,
    pub parent_doc: i64,
    pub sort: i64,
}

/// Unwraps a `{"tree": [...]}` body to its list. Any other body is
/// returned as is.
#[must_use]
pub fn unwrap_tree_body(body: Value) -> Value {
    match body {
        Value::Object(mut obj) if obj.contains_key("tree") => {
            obj.remove("tree").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Walks a submitted forest depth-first and returns one placement per node.
///
/// Nodes without a positive integer id are skipped along with their
/// subtree. Sort keys are the node's index among its siblings.
pub fn plan_placements(payload: &Value, max_depth: usize) -> Result<Vec<Placement>> {
    let nodes = payload
        .as_array()
        .ok_or_else(|| Error::BadRequest("tree must be a list".to_string()))?;

    let mut placements = Vec::new();
    let mut seen = HashSet::new();
    walk(nodes, 0, 1, max_depth, &mut seen, &mut placements)?;
    Ok(placements)
}

fn walk(
    nodes: &[Value],
    parent_id: i64,
    depth: usize,
    max_depth: usize,
    seen: &mut HashSet<i64>,
    out: &mut Vec<Placement>,
) -> Result<()> {
    if depth > max_depth {
        return Err(Error::InvalidTree(format!(
            "tree is nested deeper than {max_depth} levels"
        )));
    }

    for (index, node) in nodes.iter().enumerate() {
        let obj = node
            .as_object()
            .ok_or_else(|| Error::InvalidTree("tree nodes must be objects".to_string()))?;

        let id = match obj.get("id") {
            None | Some(Value::Null) => continue,
            Some(value) => value
                .as_i64()
                .ok_or_else(|| Error::InvalidTree(format!("invalid node id: {value}")))?,
        };
        if id <= 0 {
            continue;
        }

        if id == parent_id {
            return Err(Error::InvalidTree(format!("doc {id} cannot be its own parent")));
        }
        if !seen.insert(id) {
            return Err(Error::InvalidTree(format!("doc {id} appears more than once")));
        }

        out.push(Placement {
            id,
            parent_doc: parent_id,
            sort: index as i64,
        });

        match obj.get("children") {
            None | Some(Value::Null) => {}
            Some(Value::Array(children)) => {
                walk(children, id, depth + 1, max_depth, seen, out)?;
            }
            Some(_) => {
                return Err(Error::InvalidTree(format!(
                    "children of doc {id} must be a list"
                )));
            }
        }
    }

    Ok(())
}

/// Returns a doc id that sits on a parent cycle, given `(id, parent_doc)`
/// links for a whole project. Links to unknown parents end a chain.
#[must_use]
pub fn find_cycle(links: &[(i64, i64)]) -> Option<i64> {
    let parents: HashMap<i64, i64> = links.iter().copied().collect();
    let mut settled = HashSet::new();

    for &(start, _) in links {
        let mut path = HashSet::new();
        let mut current = start;
        while current != 0 && !settled.contains(&current) {
            if !path.insert(current) {
                return Some(current);
            }
            match parents.get(&current) {
                Some(&parent) => current = parent,
                None => break,
            }
        }
        settled.extend(path);
    }

    None
}

/// Decodes a cached toc payload, returning `None` when it is not a valid forest.
#[must_use]
pub fn decode_toc(raw: &str) -> Option<Vec<TocNode>> {
    serde_json::from_str(raw).ok()
}

/// Rebuilds the forest from live rows. Siblings are ordered by `(sort, id)`.
/// Rows whose parent chain never reaches the top level are left out.
#[must_use]
pub fn build_from_rows(rows: Vec<TreeRow>) -> Vec<TocNode> {
    let mut by_parent: BTreeMap<i64, Vec<TreeRow>> = BTreeMap::new();
    for row in rows {
        by_parent.entry(row.parent_doc).or_default().push(row);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by_key(|r| (r.sort, r.id));
    }

    let mut visited = HashSet::new();
    build_level(&mut by_parent, 0, &mut visited)
}

fn build_level(
    by_parent: &mut BTreeMap<i64, Vec<TreeRow>>,
    parent_id: i64,
    visited: &mut HashSet<i64>,
) -> Vec<TocNode> {
    let Some(rows) = by_parent.remove(&parent_id) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if !visited.insert(row.id) {
            continue;
        }
        let children = build_level(by_parent, row.id, visited);
        out.push(TocNode {
            id: row.id,
            name: row.name,
            children,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(id: i64, parent_doc: i64, sort: i64) -> TreeRow {
        TreeRow {
            id,
            name: format!("doc-{id}"),
            parent_doc,
            sort,
        }
    }

    #[test]
    fn test_plan_assigns_parent_and_sibling_index() {
        let payload = json!([{"id": 1, "children": [{"id": 2}]}, {"id": 3}]);
        let placements = plan_placements(&payload, DEFAULT_MAX_DEPTH).unwrap();

        assert_eq!(
            placements,
            vec![
                Placement { id: 1, parent_doc: 0, sort: 0 },
                Placement { id: 2, parent_doc: 1, sort: 0 },
                Placement { id: 3, parent_doc: 0, sort: 1 },
            ]
        );
    }

    #[test]
    fn test_plan_skips_nodes_without_id() {
        let payload = json!([{"name": "ghost", "children": [{"id": 9}]}, {"id": 0}, {"id": 4}]);
        let placements = plan_placements(&payload, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(placements, vec![Placement { id: 4, parent_doc: 0, sort: 2 }]);
    }

    #[test]
    fn test_plan_rejects_non_list() {
        let err = plan_placements(&json!({"id": 1}), DEFAULT_MAX_DEPTH).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn test_unwrap_tree_body() {
        let list = json!([{"id": 1}]);
        assert_eq!(unwrap_tree_body(json!({"tree": [{"id": 1}]})), list);
        assert_eq!(unwrap_tree_body(list.clone()), list);

        let other = json!({"nodes": []});
        assert_eq!(unwrap_tree_body(other.clone()), other);
        assert!(plan_placements(&unwrap_tree_body(json!({"tree": 5})), DEFAULT_MAX_DEPTH).is_err());
    }

    #[test]
    fn test_build_nests_three_levels() {
        let tree = build_from_rows(vec![row(1, 0, 0), row(2, 1, 0), row(3, 2, 0), row(4, 2, 1)]);
        assert_eq!(tree.len(), 1);
        let grandchildren: Vec<i64> = tree[0].children[0].children.iter().map(|n| n.id).collect();
        assert_eq!(grandchildren, vec![3, 4]);
    }

    #[test]
    fn test_plan_rejects_self_parent() {
        let payload = json!([{"id": 1, "children": [{"id": 1}]}]);
        let err = plan_placements(&payload, DEFAULT_MAX_DEPTH).unwrap_err();
        assert!(matches!(err, Error::InvalidTree(_)));
    }

    #[test]
    fn test_plan_rejects_repeated_ids() {
        let payload = json!([{"id": 1, "children": [{"id": 2, "children": [{"id": 1}]}]}]);
        assert!(plan_placements(&payload, DEFAULT_MAX_DEPTH).is_err());

        let siblings = json!([{"id": 5}, {"id": 5}]);
        assert!(plan_placements(&siblings, DEFAULT_MAX_DEPTH).is_err());
    }

    #[test]
    fn test_plan_bounds_depth() {
        let payload = json!([{"id": 1, "children": [{"id": 2, "children": [{"id": 3}]}]}]);
        assert!(plan_placements(&payload, 3).is_ok());
        assert!(matches!(
            plan_placements(&payload, 2),
            Err(Error::InvalidTree(_))
        ));
    }

    #[test]
    fn test_plan_rejects_malformed_children() {
        let payload = json!([{"id": 1, "children": "nope"}]);
        assert!(plan_placements(&payload, DEFAULT_MAX_DEPTH).is_err());
        assert!(plan_placements(&json!([{"id": "one"}]), DEFAULT_MAX_DEPTH).is_err());
    }

    #[test]
    fn test_build_orders_siblings_by_sort_then_id() {
        let tree = build_from_rows(vec![row(3, 0, 1), row(1, 0, 0), row(2, 1, 0), row(4, 0, 1)]);

        let top: Vec<i64> = tree.iter().map(|n| n.id).collect();
        assert_eq!(top, vec![1, 3, 4]);
        assert_eq!(tree[0].children[0].id, 2);
    }

    #[test]
    fn test_build_drops_orphans_and_cycles() {
        let tree = build_from_rows(vec![row(1, 0, 0), row(5, 6, 0), row(6, 5, 0), row(7, 99, 0)]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, 1);
        assert!(tree[0].children.is_empty());
    }

    #[test]
    fn test_find_cycle() {
        assert_eq!(find_cycle(&[(1, 0), (2, 1), (3, 2)]), None);
        assert!(find_cycle(&[(1, 2), (2, 1), (3, 0)]).is_some());
        assert_eq!(find_cycle(&[(4, 4)]), Some(4));
        assert_eq!(find_cycle(&[(1, 77)]), None);
    }

    #[test]
    fn test_decode_toc() {
        let decoded = decode_toc(r#"[{"id":1,"name":"a","children":[{"id":2}]}]"#).unwrap();
        assert_eq!(decoded[0].children[0].id, 2);
        assert!(decode_toc("not json").is_none());
        assert!(decode_toc(r#"{"id":1}"#).is_none());
    }
}
