use hwprog_stream::ServerNode;
use tracing::debug;

use crate::error::TreeError;
use crate::html;
use crate::text;
use crate::view::{NodeId, TreeView};

/// Reference to a toggle control produced by one particular render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub generation: u64,
    pub id: NodeId,
}

/// Display region that holds at most one rendered tree.
///
/// Every render replaces the previous tree outright and advances the
/// generation, which invalidates all handles issued for earlier renders.
#[derive(Debug)]
pub struct TreeContainer {
    id: String,
    generation: u64,
    view: Option<TreeView>,
}

impl TreeContainer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            generation: 0,
            view: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn view(&self) -> Option<&TreeView> {
        self.view.as_ref()
    }

    /// Replaces the current tree and returns one handle per toggle control.
    pub fn render(&mut self, tree: &ServerNode) -> Vec<NodeHandle> {
        self.generation += 1;
        let view = TreeView::from_server(tree);
        let generation = self.generation;
        let handles = view
            .collapsible()
            .map(|id| NodeHandle { generation, id })
            .collect();
        debug!(
            container = %self.id,
            generation,
            server = %tree.server,
            targets = tree.targets.len(),
            "rendered hardware tree"
        );
        self.view = Some(view);
        handles
    }

    pub fn toggle(&mut self, handle: NodeHandle) -> Result<bool, TreeError> {
        if handle.generation != self.generation {
            return Err(TreeError::StaleHandle {
                handle: handle.generation,
                current: self.generation,
            });
        }
        let view = self.view.as_mut().ok_or(TreeError::Empty)?;
        view.toggle(handle.id)
    }

    /// Handle for the first node labelled `label` in the current tree.
    pub fn handle_for(&self, label: &str) -> Option<NodeHandle> {
        let id = self.view.as_ref()?.find(label)?;
        Some(NodeHandle {
            generation: self.generation,
            id,
        })
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.view = None;
    }

    /// Markup for the current tree, or an empty string when nothing is shown.
    pub fn markup(&self) -> String {
        match &self.view {
            Some(view) => html::render_fragment(view, &self.node_prefix()),
            None => String::new(),
        }
    }

    pub fn page(&self, title: &str) -> String {
        html::render_page(title, &self.id, &self.markup())
    }

    pub fn outline(&self) -> String {
        match &self.view {
            Some(view) => text::render_outline(view),
            None => String::new(),
        }
    }

    fn node_prefix(&self) -> String {
        format!("{}-{}", self.id, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{single_target_tree, two_target_tree};

    #[test]
    fn render_issues_one_handle_per_collapsible_node() {
        let mut container = TreeContainer::new("hw-tree");
        let handles = container.render(&two_target_tree());
        assert_eq!(handles.len(), 3);
        assert!(handles.iter().all(|handle| handle.generation == 1));
    }

    #[test]
    fn toggling_a_target_leaves_sibling_and_server_unchanged() {
        let mut container = TreeContainer::new("hw-tree");
        container.render(&two_target_tree());
        let server = container.handle_for("srv1").unwrap();
        let t1 = container.handle_for("t1").unwrap();
        let t2 = container.handle_for("t2").unwrap();

        for _ in 0..3 {
            container.toggle(t1).unwrap();
            let view = container.view().unwrap();
            assert!(!view.is_expanded(server.id));
            assert!(!view.is_expanded(t2.id));
        }
        assert!(container.view().unwrap().is_expanded(t1.id));

        container.toggle(t2).unwrap();
        container.toggle(t2).unwrap();
        let view = container.view().unwrap();
        assert!(view.is_expanded(t1.id));
        assert!(!view.is_expanded(t2.id));
    }

    #[test]
    fn second_render_replaces_the_first() {
        let mut container = TreeContainer::new("hw-tree");
        let first = container.render(&two_target_tree());
        let first_markup = container.markup();
        container.render(&single_target_tree());

        let markup = container.markup();
        assert!(!markup.contains("t2"));
        assert!(!markup.contains("d3"));
        assert!(!markup.contains("hw-tree-1-"));
        assert!(markup.contains("hw-tree-2-"));
        assert!(first_markup.contains("hw-tree-1-"));

        for handle in first {
            assert_eq!(
                container.toggle(handle),
                Err(TreeError::StaleHandle {
                    handle: 1,
                    current: 2
                })
            );
        }
        let view = container.view().unwrap();
        assert!(view.collapsible().all(|id| !view.is_expanded(id)));
    }

    #[test]
    fn rerendering_the_same_tree_resets_disclosure() {
        let mut container = TreeContainer::new("hw-tree");
        container.render(&two_target_tree());
        let t1 = container.handle_for("t1").unwrap();
        container.toggle(t1).unwrap();

        container.render(&two_target_tree());
        let t1_again = container.handle_for("t1").unwrap();
        assert_eq!(t1.id, t1_again.id);
        assert!(!container.view().unwrap().is_expanded(t1_again.id));
        assert!(container.toggle(t1).is_err());
    }

    #[test]
    fn cleared_container_is_empty() {
        let mut container = TreeContainer::new("hw-tree");
        let handles = container.render(&single_target_tree());
        container.clear();
        assert!(container.view().is_none());
        assert_eq!(container.markup(), "");
        assert_eq!(container.outline(), "");
        assert!(matches!(
            container.toggle(handles[0]),
            Err(TreeError::StaleHandle { .. })
        ));

        let orphan = NodeHandle {
            generation: container.generation(),
            id: handles[0].id,
        };
        assert_eq!(container.toggle(orphan), Err(TreeError::Empty));
    }

    #[test]
    fn page_uses_container_id() {
        let mut container = TreeContainer::new("hw-tree");
        container.render(&single_target_tree());
        let page = container.page("Hardware");
        assert!(page.contains("getElementById(\"hw-tree\")"));
        assert!(page.contains("data-node=\"hw-tree-1-0\""));
    }
}
