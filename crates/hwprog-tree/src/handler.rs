use hwprog_stream::{RecordHandler, ServerNode, Shared};

use crate::container::TreeContainer;

/// Renders every `tree` record into a shared container.
#[derive(Clone)]
pub struct TreeRecordHandler {
    container: Shared<TreeContainer>,
}

impl TreeRecordHandler {
    pub fn new(container: Shared<TreeContainer>) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &Shared<TreeContainer> {
        &self.container
    }
}

impl RecordHandler for TreeRecordHandler {
    fn on_tree(&mut self, tree: &ServerNode) {
        self.container.lock().render(tree);
    }
}
