//! Tool set exposed to the model
//!
//! Five fixed capabilities, selected by [`ToolKind`]. Each one implements
//! [`Tool`] and reports failure as a [`ToolError`], which the [`ToolSet`]
//! turns into error text for the model. Nothing here raises past the tool set.

mod context;
mod edit_file;
mod executor;
mod glob_tool;
mod read_file;
mod run_command;
mod write_file;

pub use context::{
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_GLOB_LIMIT, DEFAULT_MAX_OUTPUT_BYTES, ToolContext, ToolError, required_str,
};
pub use edit_file::EditFileTool;
pub use executor::ToolSet;
pub use glob_tool::GlobTool;
pub use read_file::ReadFileTool;
pub use run_command::RunCommandTool;
pub use write_file::WriteFileTool;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::ToolDefinition;

/// A capability the model can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches LLM tool_use name)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Facts about the input worth recording before execution
    fn describe_input(&self, input: &Value) -> Value;

    async fn execute(&self, input: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Successful tool output plus audit metadata
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub content: String,
    pub metadata: Value,
}

impl ToolOutput {
    pub fn new(content: impl Into<String>, metadata: Value) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// The closed set of tools the model may call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ReadFile,
    WriteFile,
    EditFile,
    RunCommand,
    Glob,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::ReadFile,
        ToolKind::WriteFile,
        ToolKind::EditFile,
        ToolKind::RunCommand,
        ToolKind::Glob,
    ];

    /// Look up a tool by the name the model used; `None` for anything unknown
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        self.tool().name()
    }

    pub fn tool(self) -> &'static dyn Tool {
        match self {
            ToolKind::ReadFile => &ReadFileTool,
            ToolKind::WriteFile => &WriteFileTool,
            ToolKind::EditFile => &EditFileTool,
            ToolKind::RunCommand => &RunCommandTool,
            ToolKind::Glob => &GlobTool,
        }
    }
}
