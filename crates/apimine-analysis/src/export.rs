//! Graphviz rendering of histories.

use apimine_core::types::collections::FxHashMap;

use crate::history::{History, NodeId};

/// Render `history` as a DOT digraph.
///
/// Nodes are numbered breadth-first from the root, which is always `n0`.
/// Edge labels show the label set and weight; active nodes are drawn with
/// a double circle.
pub fn to_dot(history: &History) -> String {
    let numbering: FxHashMap<NodeId, usize> = history
        .bfs_order()
        .into_iter()
        .enumerate()
        .map(|(i, node)| (node, i))
        .collect();
    let number = |node: NodeId| numbering.get(&node).copied().unwrap_or(usize::MAX);

    let name = history.title().unwrap_or("history");
    let mut out = format!("digraph \"{}\" {{\n", escape_dot(name));
    out.push_str("    rankdir=LR;\n");
    out.push_str("    node [shape=circle, fontname=\"Helvetica\"];\n");
    out.push_str("    edge [fontname=\"Helvetica\", fontsize=10];\n\n");

    let mut nodes: Vec<(usize, NodeId)> = history.nodes().map(|n| (number(n), n)).collect();
    nodes.sort();
    for (i, node) in nodes {
        let shape = if history.is_active(node) { ", shape=doublecircle" } else { "" };
        out.push_str(&format!("    n{i} [label=\"{i}\"{shape}];\n"));
    }
    out.push('\n');

    let mut edges: Vec<(usize, usize, String)> = history
        .transitions()
        .map(|(from, to, t)| (number(from), number(to), format!("{} ({})", t.labels, t.weight)))
        .collect();
    edges.sort();
    for (from, to, label) in edges {
        out.push_str(&format!("    n{from} -> n{to} [label=\"{}\"];\n", escape_dot(&label)));
    }
    out.push_str("}\n");
    out
}

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::test_support::*;

    #[test]
    fn test_root_is_numbered_zero_and_active_double_circled() {
        let mut h = linear(&[("open", 2), ("close", 1)]);
        h.set_title("File \"demo\"");
        let dot = to_dot(&h);
        assert!(dot.starts_with("digraph \"File \\\"demo\\\"\" {"));
        assert!(dot.contains("n0 -> n1"));
        assert!(dot.contains("n1 -> n2"));
        assert!(dot.contains("n2 [label=\"2\", shape=doublecircle];"));
        assert!(dot.contains("(2)"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let h = linear(&[("a", 1), ("?", 1), ("b", 1)]);
        assert_eq!(to_dot(&h), to_dot(&h.clone()));
        assert!(to_dot(&h).contains("?"));
    }
}
