//! glob tool - Find files matching a glob pattern

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError, ToolOutput, required_str};

pub struct GlobTool;

#[async_trait]
impl Tool for GlobTool {
    fn name(&self) -> &'static str {
        "glob"
    }

    fn description(&self) -> &'static str {
        "Find files matching a glob pattern (e.g. src/**/*.rs). Returns one path per line, \
         sorted, capped at a fixed number of results."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern, relative to the repository root or absolute"
                }
            },
            "required": ["pattern"]
        })
    }

    fn describe_input(&self, input: &Value) -> Value {
        json!({ "pattern": input["pattern"] })
    }

    async fn execute(&self, input: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let pattern = required_str(input, "pattern")?;
        let full_pattern = ctx.resolve(pattern);
        let full_pattern = full_pattern.to_str().ok_or_else(|| ToolError::InvalidPattern {
            pattern: pattern.to_string(),
            message: "pattern is not valid UTF-8".to_string(),
        })?;

        let walk_pattern = full_pattern.to_string();
        let working_dir = ctx.working_dir.clone();
        let mut matches = tokio::task::spawn_blocking(move || collect_matches(&walk_pattern, &working_dir))
            .await
            .map_err(|e| ToolError::InvalidPattern {
                pattern: pattern.to_string(),
                message: format!("directory walk did not finish: {}", e),
            })?
            .map_err(|e| ToolError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
        matches.sort();

        let total = matches.len();
        matches.truncate(ctx.glob_limit);

        Ok(ToolOutput::new(
            matches.join("\n"),
            json!({
                "pattern": pattern,
                "match_count": matches.len(),
                "total_matches": total,
            }),
        ))
    }
}

/// Walk the filesystem for `pattern`; blocking, so run it off the async workers
fn collect_matches(pattern: &str, base: &Path) -> Result<Vec<String>, glob::PatternError> {
    Ok(glob::glob(pattern)?
        .filter_map(|entry| entry.ok())
        .map(|p| display_path(&p, base))
        .collect())
}

fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_glob_basic() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        std::fs::write(dir.path().join("file2.txt"), "").unwrap();
        std::fs::write(dir.path().join("file1.txt"), "").unwrap();
        std::fs::write(dir.path().join("file.rs"), "").unwrap();

        let output = GlobTool.execute(&json!({"pattern": "*.txt"}), &ctx).await.unwrap();

        assert_eq!(output.content, "file1.txt\nfile2.txt");
        assert_eq!(output.metadata["match_count"], 2);
    }

    #[tokio::test]
    async fn test_glob_recursive() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        std::fs::write(dir.path().join("root.rs"), "").unwrap();
        std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        std::fs::write(dir.path().join("src/main.rs"), "").unwrap();
        std::fs::write(dir.path().join("src/nested/lib.rs"), "").unwrap();

        let output = GlobTool.execute(&json!({"pattern": "**/*.rs"}), &ctx).await.unwrap();

        let lines: Vec<_> = output.content.lines().collect();
        assert_eq!(lines, vec!["root.rs", "src/main.rs", "src/nested/lib.rs"]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_glob_walk_leaves_runtime_responsive() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        for i in 0..50 {
            let sub = dir.path().join(format!("d{:02}", i));
            std::fs::create_dir_all(&sub).unwrap();
            std::fs::write(sub.join("f.rs"), "").unwrap();
        }

        let ticker = tokio::spawn(async { tokio::task::yield_now().await });
        let output = GlobTool.execute(&json!({"pattern": "**/*.rs"}), &ctx).await.unwrap();

        assert!(ticker.await.is_ok());
        assert_eq!(output.metadata["total_matches"], 50);
        assert_eq!(output.content.lines().next(), Some("d00/f.rs"));
    }

    #[test]
    fn test_collect_matches_rejects_bad_pattern() {
        assert!(collect_matches("[", Path::new("/")).is_err());
    }

    #[tokio::test]
    async fn test_glob_no_matches_is_empty_not_error() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        std::fs::write(dir.path().join("file.txt"), "").unwrap();

        let output = GlobTool.execute(&json!({"pattern": "*.rs"}), &ctx).await.unwrap();

        assert!(output.content.is_empty());
        assert_eq!(output.metadata["match_count"], 0);
    }

    #[tokio::test]
    async fn test_glob_respects_cap() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path()).with_glob_limit(5);
        for i in 0..12 {
            std::fs::write(dir.path().join(format!("f{:02}.txt", i)), "").unwrap();
        }

        let output = GlobTool.execute(&json!({"pattern": "*.txt"}), &ctx).await.unwrap();

        assert_eq!(output.content.lines().count(), 5);
        assert!(output.content.starts_with("f00.txt"));
        assert_eq!(output.metadata["match_count"], 5);
        assert_eq!(output.metadata["total_matches"], 12);
    }

    #[tokio::test]
    async fn test_glob_default_cap_is_100() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        for i in 0..130 {
            std::fs::write(dir.path().join(format!("f{:03}.md", i)), "").unwrap();
        }

        let output = GlobTool.execute(&json!({"pattern": "*.md"}), &ctx).await.unwrap();

        assert_eq!(output.content.lines().count(), 100);
    }

    #[tokio::test]
    async fn test_glob_invalid_pattern() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());

        let err = GlobTool.execute(&json!({"pattern": "[unclosed"}), &ctx).await.unwrap_err();

        assert!(matches!(err, ToolError::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn test_glob_missing_pattern() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());

        let err = GlobTool.execute(&json!({}), &ctx).await.unwrap_err();

        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }
}
