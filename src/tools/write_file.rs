//! write_file tool - Create or fully replace a file

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError, ToolOutput, required_str};

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write content to a file, replacing it entirely. Creates parent directories if needed."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path, relative to the repository root or absolute"
                },
                "content": {
                    "type": "string",
                    "description": "Complete new file content"
                }
            },
            "required": ["path", "content"]
        })
    }

    fn describe_input(&self, input: &Value) -> Value {
        json!({
            "path": input["path"],
            "content_length": input["content"].as_str().map(str::len),
        })
    }

    async fn execute(&self, input: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let path = required_str(input, "path")?;
        let content = required_str(input, "content")?;

        let full_path = ctx.resolve(path);
        let denied = |source| ToolError::WriteDenied {
            path: path.to_string(),
            source,
        };

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(denied)?;
        }
        tokio::fs::write(&full_path, content).await.map_err(denied)?;

        Ok(ToolOutput::new(
            format!("Wrote {} bytes to {}", content.len(), path),
            json!({ "path": path, "content_length": content.len() }),
        ))
    }
}
