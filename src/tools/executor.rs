//! Tool set - dispatches model tool calls and audits every invocation

use serde_json::{Value, json};

use super::{ToolContext, ToolKind};
use crate::audit::AuditLog;
use crate::error::Result;
use crate::llm::{ToolCall, ToolDefinition, ToolResult};

/// Dispatches tool calls against a shared context.
///
/// Each known call records one `tool` entry before running and then either
/// one `tool` entry on success or one `error` entry on failure. An unknown
/// tool records a single `error` entry. The only error returned is a failure
/// to persist the audit log.
pub struct ToolSet {
    ctx: ToolContext,
}

impl ToolSet {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Schema advertised to the model on every request
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolKind::ALL.iter().map(|kind| kind.tool().definition()).collect()
    }

    pub async fn dispatch(&self, call: &ToolCall, audit: &mut AuditLog) -> Result<ToolResult> {
        let Some(kind) = ToolKind::from_name(&call.name) else {
            let message = format!(
                "Unknown tool: {}. Available tools: {}",
                call.name,
                ToolKind::ALL.map(ToolKind::name).join(", ")
            );
            audit.error(
                format!("Unknown tool requested: {}", call.name),
                json!({ "tool": call.name, "tool_use_id": call.id, "input": call.input }),
            )?;
            return Ok(ToolResult::error(&call.id, message));
        };

        let tool = kind.tool();
        let described = tool.describe_input(&call.input);
        audit.tool(
            format!("{} started", tool.name()),
            annotate(described.clone(), tool.name(), &call.id),
        )?;

        match tool.execute(&call.input, &self.ctx).await {
            Ok(output) => {
                log::info!("{} succeeded ({})", tool.name(), call.id);
                audit.tool(
                    format!("{} completed", tool.name()),
                    annotate(output.metadata, tool.name(), &call.id),
                )?;
                Ok(ToolResult::success(&call.id, output.content))
            }
            Err(e) => {
                log::warn!("{} failed ({}): {}", tool.name(), call.id, e);
                let mut metadata = annotate(described, tool.name(), &call.id);
                metadata["error_kind"] = json!(e.kind());
                if let super::ToolError::NonZeroExit { code, .. } = &e {
                    metadata["exit_code"] = json!(code);
                }
                audit.error(format!("{} failed: {}", tool.name(), e), metadata)?;
                Ok(ToolResult::error(&call.id, e.to_string()))
            }
        }
    }
}

/// Ensure metadata is an object carrying the tool name and call id
fn annotate(metadata: Value, tool: &str, id: &str) -> Value {
    let mut object = match metadata {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("detail".to_string(), other);
            map
        }
    };
    object.insert("tool".to_string(), json!(tool));
    object.insert("tool_use_id".to_string(), json!(id));
    Value::Object(object)
}
