//! Tool execution context and tool-level errors

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

/// Default cap on captured command output
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Default cap on glob results
pub const DEFAULT_GLOB_LIMIT: usize = 100;

/// Default deadline for a single shell command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Execution context shared by every tool in a run.
///
/// There is no sandbox: paths may point anywhere the process can reach.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Relative paths and commands resolve against this directory
    pub working_dir: PathBuf,
    pub command_timeout: Duration,
    pub max_output_bytes: usize,
    pub glob_limit: usize,
}

impl ToolContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            glob_limit: DEFAULT_GLOB_LIMIT,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }

    pub fn with_glob_limit(mut self, limit: usize) -> Self {
        self.glob_limit = limit;
        self
    }

    /// Resolve a model-supplied path against the working directory
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

/// Errors that can occur during tool execution.
///
/// These never leave the tool set; they become error text for the model.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Cannot read {path}: {source}")]
    NotFoundOrUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    WriteDenied {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("old_string not found in {path}. It must match exactly, including whitespace.")]
    OldTextNotFound { path: String },

    #[error("Command exited with status {}\n{output}", exit_label(.code))]
    NonZeroExit { code: Option<i32>, output: String },

    #[error("Command timed out after {timeout_secs}s")]
    CommandTimeout { timeout_secs: u64 },

    #[error("Failed to start command: {source}")]
    SpawnFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl ToolError {
    /// Short machine-readable kind for audit metadata
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::NotFoundOrUnreadable { .. } => "not_found_or_unreadable",
            ToolError::WriteDenied { .. } => "write_denied",
            ToolError::OldTextNotFound { .. } => "old_text_not_found",
            ToolError::NonZeroExit { .. } => "non_zero_exit",
            ToolError::CommandTimeout { .. } => "command_timeout",
            ToolError::SpawnFailed { .. } => "spawn_failed",
            ToolError::InvalidPattern { .. } => "invalid_pattern",
            ToolError::InvalidInput { .. } => "invalid_input",
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "unknown (killed by signal)".to_string(),
    }
}

/// Fetch a required string parameter from tool input
pub fn required_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    input[key].as_str().ok_or_else(|| ToolError::InvalidInput {
        message: format!("'{}' is required and must be a string", key),
    })
}
