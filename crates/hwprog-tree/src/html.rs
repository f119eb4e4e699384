//! Nested-list markup for a hardware tree.
//!
//! Each server and target is an `<li>` with exactly one toggle control and one
//! nested `<ul>`; the nested list carries `hidden` while the node is collapsed.
//! Devices are plain leaf items.

use std::fmt::Write;

use crate::view::{NodeId, TreeView};

pub const CLOSED: &str = "\u{25b8}";
pub const OPEN: &str = "\u{25be}";

/// Renders `view` as a fragment. `prefix` scopes the `data-node` ids so
/// markup from different renders never shares an id.
pub fn render_fragment(view: &TreeView, prefix: &str) -> String {
    let mut out = String::new();
    out.push_str("<ul class=\"hw-tree\">\n");
    render_node(view, view.root(), prefix, 1, &mut out);
    out.push_str("</ul>\n");
    out
}

fn render_node(view: &TreeView, id: NodeId, prefix: &str, depth: usize, out: &mut String) {
    let Some(node) = view.node(id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let label = escape_html(&node.label);
    if !node.is_collapsible() {
        let _ = writeln!(out, "{indent}<li class=\"device\">{label}</li>");
        return;
    }

    let kind = match node.kind {
        crate::view::NodeKind::Server => "server",
        _ => "target",
    };
    let expanded = node.is_expanded();
    let indicator = if expanded { OPEN } else { CLOSED };
    let hidden = if expanded { "" } else { " hidden" };
    let node_ref = format!("{prefix}-{}", id.index());
    let _ = writeln!(
        out,
        "{indent}<li class=\"hw-node {kind}\"><span class=\"caret\" data-node=\"{node_ref}\" aria-expanded=\"{expanded}\">{indicator}</span> <span class=\"label\">{label}</span>"
    );
    let _ = writeln!(out, "{indent}  <ul class=\"nested\"{hidden}>");
    for child in &node.children {
        render_node(view, *child, prefix, depth + 2, out);
    }
    let _ = writeln!(out, "{indent}  </ul>");
    let _ = writeln!(out, "{indent}</li>");
}

/// Standalone page with one delegated click listener on the container.
///
/// The listener lives on the container, not on the nodes, so replacing the
/// container's content leaves nothing attached to the old tree.
pub fn render_page(title: &str, container_id: &str, fragment: &str) -> String {
    let title = escape_html(title);
    let container_id = escape_html(container_id);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  .hw-tree, .nested {{ list-style: none; padding-left: 1.2em; margin: 0; }}
  .caret {{ cursor: pointer; user-select: none; display: inline-block; width: 1em; }}
  .device {{ padding-left: 1em; font-family: monospace; }}
</style>
</head>
<body>
<h1>{title}</h1>
<div id="{container_id}">
{fragment}</div>
<script>
document.getElementById("{container_id}").addEventListener("click", (event) => {{
  const caret = event.target.closest(".caret");
  if (!caret) return;
  const region = caret.parentElement.querySelector(":scope > .nested");
  if (!region) return;
  const opening = region.hidden;
  region.hidden = !opening;
  caret.textContent = opening ? "{OPEN}" : "{CLOSED}";
  caret.setAttribute("aria-expanded", String(opening));
}});
</script>
</body>
</html>
"#
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{single_target_tree, two_target_tree};
    use hwprog_stream::{ServerNode, TargetNode};

    #[test]
    fn single_target_renders_nested_collapsed_lists() {
        let view = TreeView::from_server(&single_target_tree());
        let html = render_fragment(&view, "hw-1");

        assert_eq!(html.matches("class=\"hw-node server\"").count(), 1);
        assert_eq!(html.matches("class=\"hw-node target\"").count(), 1);
        assert_eq!(html.matches("<li class=\"device\">").count(), 2);
        assert_eq!(html.matches("<ul class=\"nested\" hidden>").count(), 2);
        assert_eq!(html.matches("class=\"caret\"").count(), 2);
        assert_eq!(html.matches(CLOSED).count(), 2);
        assert!(!html.contains(OPEN));
        assert!(html.contains("<li class=\"device\">d1</li>"));
        assert!(html.contains("<li class=\"device\">d2</li>"));
    }

    #[test]
    fn expanded_node_shows_open_indicator_and_visible_region() {
        let mut view = TreeView::from_server(&two_target_tree());
        let t2 = view.find("t2").unwrap();
        view.toggle(t2).unwrap();
        let html = render_fragment(&view, "hw-1");

        assert_eq!(html.matches("<ul class=\"nested\">").count(), 1);
        assert_eq!(html.matches("<ul class=\"nested\" hidden>").count(), 2);
        assert!(html.contains(&format!(
            "data-node=\"hw-1-{}\" aria-expanded=\"true\">{OPEN}",
            t2.index()
        )));
    }

    #[test]
    fn labels_are_escaped() {
        let tree = ServerNode {
            server: "<script>alert(1)</script>".into(),
            targets: vec![TargetNode {
                name: "a&b".into(),
                devices: vec!["\"quoted\"".into()],
            }],
        };
        let html = render_fragment(&TreeView::from_server(&tree), "hw-1");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("a&amp;b"));
        assert!(html.contains("&quot;quoted&quot;"));
    }

    #[test]
    fn page_wraps_fragment_with_single_listener() {
        let fragment = render_fragment(&TreeView::from_server(&single_target_tree()), "hw-1");
        let page = render_page("Hardware on srv1", "hw-tree", &fragment);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains(&fragment));
        assert_eq!(page.matches("addEventListener").count(), 1);
        assert!(page.contains("<div id=\"hw-tree\">"));
    }
}
