//! Tool abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// A tool that can be executed.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get tool name.
    fn name(&self) -> &str;

    /// Execute the tool.
    ///
    /// An `Err` means the tool could not be invoked at all; a tool that ran
    /// and failed is reported through [`ToolOutput::exit_code`].
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput, anyhow::Error>;
}

/// Input to a tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInput {
    /// Command arguments
    pub args: Vec<String>,

    /// Environment variables
    pub env: HashMap<String, String>,

    /// Working directory
    pub work_dir: Option<PathBuf>,

    /// Standard input
    pub stdin: Option<String>,

    /// Timeout
    pub timeout: Option<Duration>,
}

impl ToolInput {
    /// Input with the given arguments and nothing else.
    pub fn with_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Output from a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Exit code (-1 when killed by a signal or timed out)
    pub exit_code: i32,

    /// Standard output
    pub stdout: String,

    /// Standard error
    pub stderr: String,

    /// Execution duration
    pub duration: Duration,

    /// Whether the timeout elapsed before the tool finished
    pub timed_out: bool,
}

impl ToolOutput {
    /// Whether the tool exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}
