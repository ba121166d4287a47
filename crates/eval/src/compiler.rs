//! Compiler/loader: candidate source in, running worker out.

use crate::error::EvalError;
use crate::harness::{CANDIDATE_FILE, HARNESS_FILE, HARNESS_SOURCE};
use crate::unit::LoadedUnit;
use quine_core::{CandidateSource, ToolchainSettings};
use quine_tools::{Tool, ToolInput};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Why a candidate could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The candidate is at fault: rejected by the compiler or failed to start
    #[error("{0}")]
    Compile(String),

    /// The harness itself cannot go on
    #[error(transparent)]
    System(#[from] EvalError),
}

/// Builds every candidate from scratch in its own temporary directory.
pub struct Compiler {
    tool: Arc<dyn Tool>,
    settings: ToolchainSettings,
    handshake_timeout: Duration,
}

impl Compiler {
    /// Create a compiler driving `tool`.
    pub fn new(tool: Arc<dyn Tool>, settings: ToolchainSettings, handshake_timeout: Duration) -> Self {
        Self {
            tool,
            settings,
            handshake_timeout,
        }
    }

    /// Compile `source` into a harness executable and start it.
    pub async fn load(&self, source: &CandidateSource) -> Result<LoadedUnit, LoadError> {
        let workspace = tempfile::Builder::new()
            .prefix(&format!("quine-gen{}-", source.generation()))
            .tempdir()
            .map_err(EvalError::Workspace)?;
        let dir = workspace.path();

        tokio::fs::write(dir.join(HARNESS_FILE), HARNESS_SOURCE)
            .await
            .map_err(EvalError::Workspace)?;
        tokio::fs::write(dir.join(CANDIDATE_FILE), source.text())
            .await
            .map_err(EvalError::Workspace)?;

        let binary = dir.join(format!("harness{}", std::env::consts::EXE_SUFFIX));
        let input = ToolInput {
            args: self.compile_args(dir, &binary),
            work_dir: Some(dir.to_path_buf()),
            ..Default::default()
        };

        debug!("Compiling generation {} in {}", source.generation(), dir.display());
        let output = self
            .tool
            .execute(&input)
            .await
            .map_err(EvalError::Toolchain)?;

        if !output.success() {
            let diagnostic = if output.stderr.trim().is_empty() {
                format!("{} exited with code {}", self.tool.name(), output.exit_code)
            } else {
                truncate_diagnostic(&output.stderr, self.settings.max_diagnostic_bytes)
            };
            return Err(LoadError::Compile(diagnostic));
        }

        info!(
            "Generation {} compiled in {:?}",
            source.generation(),
            output.duration
        );

        LoadedUnit::spawn(&binary, workspace, self.handshake_timeout)
            .await
            .map_err(LoadError::Compile)
    }

    fn compile_args(&self, dir: &Path, binary: &Path) -> Vec<String> {
        vec![
            "--edition".to_string(),
            self.settings.edition.clone(),
            "-C".to_string(),
            format!("opt-level={}", self.settings.opt_level),
            "--cap-lints".to_string(),
            "allow".to_string(),
            "--crate-type".to_string(),
            "bin".to_string(),
            "--crate-name".to_string(),
            "quine_harness".to_string(),
            "-o".to_string(),
            binary.to_string_lossy().to_string(),
            dir.join(HARNESS_FILE).to_string_lossy().to_string(),
        ]
    }
}

/// Cut compiler output down to `max` bytes on a char boundary.
pub fn truncate_diagnostic(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n... ({} bytes truncated)", &text[..end], text.len() - end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_diagnostic_untouched() {
        assert_eq!(truncate_diagnostic("  error: x  \n", 100), "error: x");
    }

    #[test]
    fn test_truncate_long_diagnostic() {
        let text = "é".repeat(10);
        let cut = truncate_diagnostic(&text, 5);
        assert!(cut.starts_with("éé"));
        assert!(cut.contains("truncated"));
    }

    #[test]
    fn test_compile_args_build_fresh_binary() {
        let compiler = Compiler::new(
            Arc::new(quine_tools::RustcTool::default()),
            ToolchainSettings::default(),
            Duration::from_secs(1),
        );
        let dir = Path::new("/tmp/quine-gen1-x");
        let args = compiler.compile_args(dir, &dir.join("harness"));
        assert!(args.windows(2).any(|w| w[0] == "--edition" && w[1] == "2021"));
        assert!(args.contains(&"opt-level=3".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "-o" && w[1].ends_with("harness")));
        assert!(args.last().unwrap().ends_with("main.rs"));
    }
}
