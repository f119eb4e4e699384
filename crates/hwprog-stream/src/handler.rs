use serde_json::Value;

use crate::record::{Record, ServerNode};

/// Per-endpoint reaction to decoded records.
///
/// Every record reaches the handler, including `log` records that the
/// output sink already displayed and kinds this crate does not know about.
pub trait RecordHandler {
    fn on_log(&mut self, _line: &str) {}
    fn on_tree(&mut self, _tree: &ServerNode) {}
    fn on_other(&mut self, _record: &Value) {}

    fn handle(&mut self, record: &Record) {
        match record {
            Record::Log { line } => self.on_log(line),
            Record::Tree { tree } => self.on_tree(tree),
            Record::Other(value) => self.on_other(value),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHandler;

impl RecordHandler for NoopHandler {}

/// Keeps every record it sees, in arrival order.
#[derive(Clone, Debug, Default)]
pub struct RecordLog {
    pub records: Vec<Record>,
}

impl RecordHandler for RecordLog {
    fn handle(&mut self, record: &Record) {
        self.records.push(record.clone());
    }
}

impl<H: RecordHandler> RecordHandler for Option<H> {
    fn handle(&mut self, record: &Record) {
        if let Some(handler) = self {
            handler.handle(record);
        }
    }
}

impl<H: RecordHandler + ?Sized> RecordHandler for &mut H {
    fn handle(&mut self, record: &Record) {
        (**self).handle(record);
    }
}

impl<H: RecordHandler + ?Sized> RecordHandler for Box<H> {
    fn handle(&mut self, record: &Record) {
        (**self).handle(record);
    }
}

impl<A: RecordHandler, B: RecordHandler> RecordHandler for (A, B) {
    fn handle(&mut self, record: &Record) {
        self.0.handle(record);
        self.1.handle(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Counts {
        logs: Vec<String>,
        trees: Vec<String>,
        other: Vec<Value>,
    }

    impl RecordHandler for Counts {
        fn on_log(&mut self, line: &str) {
            self.logs.push(line.to_string());
        }

        fn on_tree(&mut self, tree: &ServerNode) {
            self.trees.push(tree.server.clone());
        }

        fn on_other(&mut self, record: &Value) {
            self.other.push(record.clone());
        }
    }

    #[test]
    fn handle_routes_by_variant() {
        let mut counts = Counts::default();
        counts.handle(&Record::Log { line: "a".into() });
        counts.handle(&Record::Tree {
            tree: ServerNode {
                server: "srv1".into(),
                targets: vec![],
            },
        });
        counts.handle(&Record::Other(json!({"type": "progress"})));

        assert_eq!(counts.logs, vec!["a"]);
        assert_eq!(counts.trees, vec!["srv1"]);
        assert_eq!(counts.other, vec![json!({"type": "progress"})]);
    }

    #[test]
    fn absent_handler_ignores_records() {
        let mut handler: Option<RecordLog> = None;
        handler.handle(&Record::Log { line: "x".into() });
        assert!(handler.is_none());
    }

    #[test]
    fn pair_fans_out_in_order() {
        let mut pair = (RecordLog::default(), RecordLog::default());
        pair.handle(&Record::Log { line: "one".into() });
        pair.handle(&Record::Log { line: "two".into() });
        assert_eq!(pair.0.records, pair.1.records);
        assert_eq!(pair.0.records.len(), 2);
    }
}
