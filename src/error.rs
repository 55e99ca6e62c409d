//! Error types for feature-agent
//!
//! Only failures that escape the orchestration loop live here. Tool-level
//! failures are [`crate::tools::ToolError`] and never cross the tool boundary.

use std::time::Duration;

use thiserror::Error;

/// Errors that terminate a run
#[derive(Debug, Error)]
pub enum AgentError {
    /// Completion request failed (transport, HTTP status, or unparseable body)
    #[error("LLM error: {0}")]
    Llm(String),

    /// An external call exceeded its deadline
    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout { operation: String, after: Duration },

    /// The transcript would violate the tool-call/tool-result pairing
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A required input was absent or empty
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// The audit log could not be persisted
    #[error("Audit log error: {0}")]
    Audit(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for feature-agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error() {
        let err = AgentError::Llm("rate limited".to_string());
        assert_eq!(err.to_string(), "LLM error: rate limited");
    }

    #[test]
    fn test_timeout_error() {
        let err = AgentError::Timeout {
            operation: "completion request".to_string(),
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "completion request timed out after 30s");
    }

    #[test]
    fn test_missing_input_error() {
        let err = AgentError::MissingInput("feature description is empty".to_string());
        assert_eq!(err.to_string(), "Missing input: feature description is empty");
    }

    #[test]
    fn test_config_error() {
        let err = AgentError::Config("Failed to parse config file: invalid type".to_string());
        assert_eq!(err.to_string(), "Configuration error: Failed to parse config file: invalid type");
    }

    #[test]
    fn test_protocol_error() {
        let err = AgentError::Protocol("unanswered tool call toolu_1".to_string());
        assert!(err.to_string().contains("toolu_1"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AgentError = io_err.into();
        assert!(matches!(err, AgentError::Io(_)));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: AgentError = json_err.into();
        assert!(matches!(err, AgentError::Json(_)));
    }
}
