use std::fmt::Write;

use crate::html::{CLOSED, OPEN};
use crate::view::{NodeKind, TreeView};

/// Terminal rendering of the disclosed part of a tree.
///
/// Collapsed targets show how many devices they hold.
pub fn render_outline(view: &TreeView) -> String {
    let mut out = String::new();
    for row in view.visible_rows() {
        let Some(node) = view.node(row.id) else {
            continue;
        };
        let indent = "  ".repeat(row.depth);
        match node.kind {
            NodeKind::Device => {
                let _ = writeln!(out, "{indent}  {}", node.label);
            }
            NodeKind::Target if !node.is_expanded() => {
                let count = node.children.len();
                let noun = if count == 1 { "device" } else { "devices" };
                let _ = writeln!(out, "{indent}{CLOSED} {} ({count} {noun})", node.label);
            }
            _ => {
                let indicator = if node.is_expanded() { OPEN } else { CLOSED };
                let _ = writeln!(out, "{indent}{indicator} {}", node.label);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::two_target_tree;

    #[test]
    fn collapsed_tree_is_a_single_line() {
        let view = TreeView::from_server(&two_target_tree());
        assert_eq!(render_outline(&view), format!("{CLOSED} srv1\n"));
    }

    #[test]
    fn expanded_nodes_show_their_children() {
        let mut view = TreeView::from_server(&two_target_tree());
        view.toggle(view.root()).unwrap();
        view.toggle(view.find("t1").unwrap()).unwrap();

        let expected = format!(
            "{OPEN} srv1\n  {OPEN} t1\n      d1\n      d2\n  {CLOSED} t2 (1 device)\n"
        );
        assert_eq!(render_outline(&view), expected);
    }
}
