//! run_command tool - Execute a shell command in the working directory

use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use super::{Tool, ToolContext, ToolError, ToolOutput, required_str};

pub struct RunCommandTool;

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &'static str {
        "run_command"
    }

    fn description(&self) -> &'static str {
        "Execute a shell command in the repository root and return its stdout and stderr. \
         Use for git, build tools and tests."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Shell command to execute with sh -c"
                }
            },
            "required": ["command"]
        })
    }

    fn describe_input(&self, input: &Value) -> Value {
        json!({ "command": input["command"] })
    }

    async fn execute(&self, input: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let command = required_str(input, "command")?;

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&ctx.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::SpawnFailed { source })?;

        let run = async {
            let captured = capture_output(&mut child, ctx.max_output_bytes).await?;
            if captured.overflowed {
                log::warn!("Output of `{}` exceeded {} bytes, killing it", command, ctx.max_output_bytes);
                // Already exited is fine; wait() still reaps it
                let _ = child.start_kill();
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((captured, status))
        };

        let (captured, status) = tokio::time::timeout(ctx.command_timeout, run)
            .await
            .map_err(|_| ToolError::CommandTimeout {
                timeout_secs: ctx.command_timeout.as_secs(),
            })?
            .map_err(|source| ToolError::SpawnFailed { source })?;

        let captured_len = captured.len();
        let truncated = captured.overflowed || captured_len > ctx.max_output_bytes;
        let text = cap_output(captured.combined(), ctx.max_output_bytes, truncated);

        if !status.success() {
            return Err(ToolError::NonZeroExit {
                code: status.code(),
                output: text,
            });
        }

        Ok(ToolOutput::new(
            text,
            json!({
                "command": command,
                "exit_code": status.code(),
                "output_length": captured_len,
                "truncated": truncated,
            }),
        ))
    }
}

const READ_CHUNK: usize = 8192;

/// Bytes read from the child's pipes, never much more than the cap
#[derive(Debug, Default)]
struct CapturedOutput {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    overflowed: bool,
}

impl CapturedOutput {
    fn len(&self) -> usize {
        self.stdout.len() + self.stderr.len()
    }

    /// stdout first, then stderr under a marker
    fn combined(&self) -> String {
        let stdout = String::from_utf8_lossy(&self.stdout);
        let stderr = String::from_utf8_lossy(&self.stderr);
        if stdout.is_empty() {
            stderr.into_owned()
        } else if stderr.is_empty() {
            stdout.into_owned()
        } else {
            format!("{}\n\nSTDERR:\n{}", stdout, stderr)
        }
    }
}

/// Drain stdout and stderr together until both close or their sum passes `max`
async fn capture_output(child: &mut Child, max: usize) -> std::io::Result<CapturedOutput> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut out_buf = [0u8; READ_CHUNK];
    let mut err_buf = [0u8; READ_CHUNK];
    let mut captured = CapturedOutput::default();

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            n = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => match n? {
                0 => stdout = None,
                n => captured.stdout.extend_from_slice(&out_buf[..n]),
            },
            n = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => match n? {
                0 => stderr = None,
                n => captured.stderr.extend_from_slice(&err_buf[..n]),
            },
        }

        if captured.len() > max {
            captured.overflowed = true;
            break;
        }
    }

    Ok(captured)
}

async fn read_chunk<R: AsyncRead + Unpin>(reader: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize> {
    match reader {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Cut `text` to at most `max` bytes on a char boundary, marking any truncation
fn cap_output(mut text: String, max: usize, truncated: bool) -> String {
    if !truncated && text.len() <= max {
        return text;
    }
    let mut cut = max.min(text.len());
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str(&format!("\n[output truncated at {} bytes]", max));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_run_command_echo() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());

        let output = RunCommandTool
            .execute(&json!({"command": "echo 'Hello, World!'"}), &ctx)
            .await
            .unwrap();

        assert_eq!(output.content, "Hello, World!\n");
        assert_eq!(output.metadata["exit_code"], 0);
    }

    #[tokio::test]
    async fn test_run_command_in_working_dir() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        std::fs::write(dir.path().join("marker.txt"), "found").unwrap();

        let output = RunCommandTool
            .execute(&json!({"command": "cat marker.txt"}), &ctx)
            .await
            .unwrap();

        assert_eq!(output.content, "found");
    }

    #[tokio::test]
    async fn test_run_command_non_zero_exit() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());

        let err = RunCommandTool
            .execute(&json!({"command": "echo oops >&2; exit 3"}), &ctx)
            .await
            .unwrap_err();

        match err {
            ToolError::NonZeroExit { code, output } => {
                assert_eq!(code, Some(3));
                assert!(output.contains("oops"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_command_combines_stdout_and_stderr() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());

        let output = RunCommandTool
            .execute(&json!({"command": "echo out; echo err >&2"}), &ctx)
            .await
            .unwrap();

        assert_eq!(output.content, "out\n\n\nSTDERR:\nerr\n");
    }

    #[tokio::test]
    async fn test_run_command_timeout() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path()).with_command_timeout(Duration::from_millis(100));

        let err = RunCommandTool
            .execute(&json!({"command": "sleep 10"}), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::CommandTimeout { .. }));
    }

    fn output_text(result: Result<ToolOutput, ToolError>) -> String {
        match result {
            Ok(output) => output.content,
            Err(ToolError::NonZeroExit { output, .. }) => output,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_command_output_is_capped() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path()).with_max_output_bytes(64);

        let text = output_text(
            RunCommandTool
                .execute(&json!({"command": "yes x | head -c 1000"}), &ctx)
                .await,
        );

        assert!(text.starts_with(&"x\n".repeat(32)));
        assert!(text.ends_with("\n[output truncated at 64 bytes]"));
    }

    #[tokio::test]
    async fn test_run_command_endless_output_is_killed_at_cap() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path())
            .with_max_output_bytes(1024)
            .with_command_timeout(Duration::from_secs(20));

        let started = std::time::Instant::now();
        let result = RunCommandTool.execute(&json!({"command": "yes"}), &ctx).await;

        assert!(started.elapsed() < Duration::from_secs(10));
        let text = output_text(result);
        assert!(text.starts_with("y\ny\n"));
        assert!(text.len() <= 1024 + "\n[output truncated at 1024 bytes]".len());
        assert!(text.contains("[output truncated at 1024 bytes]"));
    }

    #[tokio::test]
    async fn test_run_command_small_output_not_marked() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path()).with_max_output_bytes(64);

        let output = RunCommandTool
            .execute(&json!({"command": "printf abc"}), &ctx)
            .await
            .unwrap();

        assert_eq!(output.content, "abc");
        assert_eq!(output.metadata["truncated"], false);
        assert_eq!(output.metadata["output_length"], 3);
    }

    #[tokio::test]
    async fn test_run_command_missing_command() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());

        let err = RunCommandTool.execute(&json!({}), &ctx).await.unwrap_err();

        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[test]
    fn test_cap_output_respects_char_boundary() {
        let text = "ééé".to_string(); // 6 bytes
        let cut = cap_output(text, 3, true);
        assert!(cut.starts_with('é'));
        assert!(!cut.starts_with("éé"));
        assert!(cut.ends_with("[output truncated at 3 bytes]"));
    }

    #[test]
    fn test_cap_output_marks_overflow_even_when_short() {
        assert_eq!(cap_output("ab".to_string(), 10, false), "ab");
        assert_eq!(cap_output("ab".to_string(), 10, true), "ab\n[output truncated at 10 bytes]");
    }
}
