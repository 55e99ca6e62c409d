//! Audit log entry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category of an audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Run lifecycle: start, iteration boundaries, termination
    System,
    /// Tool invocation before/after execution
    Tool,
    /// Text emitted by the model
    Message,
    /// Any failure, contained or fatal
    Error,
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogKind::System => "system",
            LogKind::Tool => "tool",
            LogKind::Message => "message",
            LogKind::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// One immutable audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: LogKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl LogEntry {
    pub fn new(kind: LogKind, content: impl Into<String>, metadata: Option<Value>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            content: content.into(),
            metadata,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == LogKind::Error
    }

    /// Human-readable rendering used by the error summary
    pub fn render(&self) -> String {
        let mut line = format!("[{}] {}", self.timestamp.to_rfc3339(), self.content);
        if let Some(metadata) = &self.metadata {
            line.push_str(&format!("\n    {}", metadata));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_serialization() {
        assert_eq!(serde_json::to_string(&LogKind::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&LogKind::Error).unwrap(), "\"error\"");
        assert_eq!(LogKind::Tool.to_string(), "tool");
    }

    #[test]
    fn test_entry_without_metadata_omits_field() {
        let entry = LogEntry::new(LogKind::Message, "hello", None);
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["kind"], "message");
        assert_eq!(value["content"], "hello");
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn test_entry_parses_back() {
        let entry = LogEntry::new(LogKind::Tool, "write_file started", Some(json!({"path": "a.txt"})));
        let line = serde_json::to_string(&entry).unwrap();
        let parsed: LogEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_render_includes_metadata() {
        let entry = LogEntry::new(LogKind::Error, "run_command failed", Some(json!({"exit_code": 2})));
        let rendered = entry.render();

        assert!(rendered.contains("run_command failed"));
        assert!(rendered.contains("\"exit_code\":2"));
        assert!(entry.is_error());
    }
}
