//! read_file tool - Return a file's contents verbatim

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError, ToolOutput, required_str};

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read the full contents of a file as text."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path, relative to the repository root or absolute"
                }
            },
            "required": ["path"]
        })
    }

    fn describe_input(&self, input: &Value) -> Value {
        json!({ "path": input["path"] })
    }

    async fn execute(&self, input: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let path = required_str(input, "path")?;

        let content = tokio::fs::read_to_string(ctx.resolve(path))
            .await
            .map_err(|source| ToolError::NotFoundOrUnreadable {
                path: path.to_string(),
                source,
            })?;

        let metadata = json!({ "path": path, "content_length": content.len() });
        Ok(ToolOutput::new(content, metadata))
    }
}
