use hwprog_stream::ServerNode;

use crate::error::TreeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Server,
    Target,
    Device,
}

#[derive(Clone, Debug)]
pub struct ViewNode {
    pub kind: NodeKind,
    pub label: String,
    pub children: Vec<NodeId>,
    expanded: bool,
}

impl ViewNode {
    pub fn is_collapsible(&self) -> bool {
        self.kind != NodeKind::Device
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }
}

/// One line of the flattened tree as currently disclosed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Row {
    pub id: NodeId,
    pub depth: usize,
}

/// Disclosure state for one rendered hardware tree.
///
/// Nodes live in an arena in pre-order; the server is always index 0. Every
/// server and target starts collapsed and is toggled on its own.
#[derive(Clone, Debug)]
pub struct TreeView {
    nodes: Vec<ViewNode>,
}

impl TreeView {
    pub fn from_server(tree: &ServerNode) -> Self {
        let mut view = TreeView { nodes: Vec::new() };
        let root = view.push(NodeKind::Server, &tree.server);
        for target in &tree.targets {
            let target_id = view.push(NodeKind::Target, &target.name);
            view.nodes[root.0].children.push(target_id);
            for device in &target.devices {
                let device_id = view.push(NodeKind::Device, device);
                view.nodes[target_id.0].children.push(device_id);
            }
        }
        view
    }

    fn push(&mut self, kind: NodeKind, label: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ViewNode {
            kind,
            label: label.to_string(),
            children: Vec::new(),
            expanded: false,
        });
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&ViewNode> {
        self.nodes.get(id.0)
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.node(id).map(ViewNode::is_expanded).unwrap_or(false)
    }

    /// Flips one node's disclosure state and returns the new state.
    pub fn toggle(&mut self, id: NodeId) -> Result<bool, TreeError> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or(TreeError::UnknownNode(id.0))?;
        if !node.is_collapsible() {
            return Err(TreeError::NotCollapsible(node.label.clone()));
        }
        node.expanded = !node.expanded;
        Ok(node.expanded)
    }

    /// First node in pre-order whose label is `label`.
    pub fn find(&self, label: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.label == label)
            .map(NodeId)
    }

    pub fn collapsible(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_collapsible())
            .map(|(index, _)| NodeId(index))
    }

    /// Rows for the root and every node under an expanded parent.
    pub fn visible_rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        if !self.nodes.is_empty() {
            self.collect_visible(self.root(), 0, &mut rows);
        }
        rows
    }

    fn collect_visible(&self, id: NodeId, depth: usize, rows: &mut Vec<Row>) {
        rows.push(Row { id, depth });
        let node = &self.nodes[id.0];
        if node.expanded {
            for child in &node.children {
                self.collect_visible(*child, depth + 1, rows);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::two_target_tree;

    #[test]
    fn builds_server_target_device_hierarchy() {
        let view = TreeView::from_server(&two_target_tree());
        let root = view.node(view.root()).unwrap();
        assert_eq!(root.kind, NodeKind::Server);
        assert_eq!(root.children.len(), 2);

        let t1 = view.node(root.children[0]).unwrap();
        assert_eq!(t1.kind, NodeKind::Target);
        let devices: Vec<&str> = t1
            .children
            .iter()
            .map(|id| view.node(*id).unwrap().label.as_str())
            .collect();
        assert_eq!(devices, vec!["d1", "d2"]);
        assert_eq!(view.len(), 6);
    }

    #[test]
    fn everything_starts_collapsed() {
        let view = TreeView::from_server(&two_target_tree());
        assert!(view.collapsible().all(|id| !view.is_expanded(id)));
        assert_eq!(view.visible_rows(), vec![Row { id: view.root(), depth: 0 }]);
    }

    #[test]
    fn toggling_one_target_leaves_siblings_and_server_alone() {
        let mut view = TreeView::from_server(&two_target_tree());
        let root = view.root();
        let t1 = view.find("t1").unwrap();
        let t2 = view.find("t2").unwrap();

        assert!(view.toggle(root).unwrap());
        assert!(view.toggle(t1).unwrap());
        assert!(view.is_expanded(root));
        assert!(view.is_expanded(t1));
        assert!(!view.is_expanded(t2));

        assert!(!view.toggle(t1).unwrap());
        assert!(view.is_expanded(root));
        assert!(!view.is_expanded(t2));
    }

    #[test]
    fn collapsed_ancestor_hides_expanded_child() {
        let mut view = TreeView::from_server(&two_target_tree());
        let t2 = view.find("t2").unwrap();
        view.toggle(t2).unwrap();
        assert_eq!(view.visible_rows().len(), 1);

        view.toggle(view.root()).unwrap();
        let labels: Vec<(&str, usize)> = view
            .visible_rows()
            .iter()
            .map(|row| (view.node(row.id).unwrap().label.as_str(), row.depth))
            .collect();
        assert_eq!(labels, vec![("srv1", 0), ("t1", 1), ("t2", 1), ("d3", 2)]);
    }

    #[test]
    fn devices_cannot_be_toggled() {
        let mut view = TreeView::from_server(&two_target_tree());
        let d1 = view.find("d1").unwrap();
        assert!(matches!(view.toggle(d1), Err(TreeError::NotCollapsible(label)) if label == "d1"));
        assert!(matches!(
            view.toggle(NodeId(99)),
            Err(TreeError::UnknownNode(99))
        ));
    }
}
