//! Built-in tools (rustc).

use super::r#trait::*;
use anyhow::Context;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Rust compiler, used to build candidate harnesses.
pub struct RustcTool {
    program: String,
}

impl RustcTool {
    /// Use the given compiler executable (`rustc` or a full path).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for RustcTool {
    fn default() -> Self {
        Self::new("rustc")
    }
}

#[async_trait]
impl Tool for RustcTool {
    fn name(&self) -> &str {
        &self.program
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput, anyhow::Error> {
        run_command(&self.program, input).await
    }
}

/// Run `program` with `input`, capturing stdout and stderr.
///
/// The child is killed when the timeout elapses; spawn failures are errors.
pub async fn run_command(program: &str, input: &ToolInput) -> Result<ToolOutput, anyhow::Error> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(&input.args)
        .stdin(if input.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &input.work_dir {
        cmd.current_dir(dir);
    }

    for (k, v) in &input.env {
        cmd.env(k, v);
    }

    debug!("Running {} {}", program, input.args.join(" "));

    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to invoke `{}`", program))?;

    if let Some(stdin) = &input.stdin {
        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(stdin.as_bytes())
                .await
                .with_context(|| format!("failed to write stdin of `{}`", program))?;
        }
    }

    let waited = match input.timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait_with_output()).await.ok(),
        None => Some(child.wait_with_output().await),
    };

    let Some(output) = waited else {
        return Ok(ToolOutput {
            exit_code: -1,
            stdout: String::new(),
            stderr: format!("`{}` timed out", program),
            duration: start.elapsed(),
            timed_out: true,
        });
    };
    let output = output.with_context(|| format!("failed to wait for `{}`", program))?;

    Ok(ToolOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration: start.elapsed(),
        timed_out: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let tool = RustcTool::new("quine-definitely-not-a-compiler");
        let result = tool.execute(&ToolInput::with_args(["--version"])).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("failed to invoke"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_exit_code_and_output() {
        let input = ToolInput::with_args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = run_command("sh", &input).await.unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert!(!output.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_feeds_stdin() {
        let mut input = ToolInput::with_args(["-c", "cat"]);
        input.stdin = Some("hello".to_string());
        let output = run_command("sh", &input).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_reported() {
        let mut input = ToolInput::with_args(["-c", "sleep 5"]);
        input.timeout = Some(Duration::from_millis(100));
        let output = run_command("sh", &input).await.unwrap();
        assert!(output.timed_out);
        assert!(!output.success());
        assert!(output.duration < Duration::from_secs(5));
    }
}
