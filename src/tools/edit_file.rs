//! edit_file tool - Replace the first occurrence of a string in a file
//!
//! Only the first match is replaced even when `old_string` occurs several
//! times. The occurrence count goes into the audit metadata so a surprising
//! multi-match edit is visible after the fact.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError, ToolOutput, required_str};

pub struct EditFileTool;

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &'static str {
        "edit_file"
    }

    fn description(&self) -> &'static str {
        "Replace the first exact occurrence of old_string with new_string in a file."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path, relative to the repository root or absolute"
                },
                "old_string": {
                    "type": "string",
                    "description": "Exact text to find, including whitespace"
                },
                "new_string": {
                    "type": "string",
                    "description": "Replacement text"
                }
            },
            "required": ["path", "old_string", "new_string"]
        })
    }

    fn describe_input(&self, input: &Value) -> Value {
        json!({
            "path": input["path"],
            "old_length": input["old_string"].as_str().map(str::len),
            "new_length": input["new_string"].as_str().map(str::len),
        })
    }

    async fn execute(&self, input: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let path = required_str(input, "path")?;
        let old_string = required_str(input, "old_string")?;
        let new_string = required_str(input, "new_string")?;

        if old_string.is_empty() {
            return Err(ToolError::InvalidInput {
                message: "'old_string' must not be empty".to_string(),
            });
        }

        let full_path = ctx.resolve(path);
        let content = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|source| ToolError::NotFoundOrUnreadable {
                path: path.to_string(),
                source,
            })?;

        let occurrences = content.matches(old_string).count();
        if occurrences == 0 {
            return Err(ToolError::OldTextNotFound { path: path.to_string() });
        }

        let new_content = content.replacen(old_string, new_string, 1);
        tokio::fs::write(&full_path, &new_content)
            .await
            .map_err(|source| ToolError::WriteDenied {
                path: path.to_string(),
                source,
            })?;

        Ok(ToolOutput::new(
            format!("Replaced 1 of {} occurrence(s) in {}", occurrences, path),
            json!({
                "path": path,
                "occurrences": occurrences,
                "content_length": new_content.len(),
            }),
        ))
    }
}
