use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discovered hardware topology: one server, its targets, and their devices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerNode {
    pub server: String,
    #[serde(default)]
    pub targets: Vec<TargetNode>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetNode {
    pub name: String,
    #[serde(default)]
    pub devices: Vec<String>,
}

/// One decoded NDJSON line.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Log { line: String },
    Tree { tree: ServerNode },
    /// Valid JSON that is not a well-formed `log` or `tree` record.
    Other(Value),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum KnownRecord {
    Log { line: String },
    Tree { tree: ServerNode },
}

impl Record {
    /// Parses one line, wrapping anything that is not JSON as a log line.
    pub fn parse_line(text: &str) -> Record {
        Record::try_parse(text).unwrap_or_else(|| Record::fallback(text))
    }

    /// Returns `None` only when `text` is not valid JSON.
    pub fn try_parse(text: &str) -> Option<Record> {
        let value: Value = serde_json::from_str(text).ok()?;
        Some(Record::from_value(value))
    }

    pub fn fallback(text: &str) -> Record {
        Record::Log {
            line: text.to_string(),
        }
    }

    pub fn from_value(value: Value) -> Record {
        match value.get("type").and_then(Value::as_str) {
            Some("log") | Some("tree") => match KnownRecord::deserialize(&value) {
                Ok(KnownRecord::Log { line }) => Record::Log { line },
                Ok(KnownRecord::Tree { tree }) => Record::Tree { tree },
                Err(_) => Record::Other(value),
            },
            _ => Record::Other(value),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Record::Log { .. } => "log",
            Record::Tree { .. } => "tree",
            Record::Other(value) => value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown"),
        }
    }
}
