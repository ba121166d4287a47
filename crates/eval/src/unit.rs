//! Loaded candidates - a running harness child process.

use crate::harness::{self, Reply};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

/// Fault raised while calling into a candidate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitFault {
    /// The call did not return within the bound
    #[error("no reply within {0:?}")]
    TimedOut(Duration),

    /// The candidate panicked (caught by the harness)
    #[error("{0}")]
    Panicked(String),

    /// The worker process died
    #[error("worker exited: {0}")]
    Exited(String),

    /// The worker replied with something unexpected
    #[error("protocol violation: {0}")]
    Protocol(String),
}

/// An invocable implementation of the sort contract.
#[async_trait]
pub trait SortUnit: Send {
    /// Sort one input, bounded by `limit`.
    async fn solve(&mut self, input: &[i32], limit: Duration) -> Result<Vec<i32>, UnitFault>;

    /// Run `warmup` untimed and `measured` timed calls, each on a fresh copy
    /// of `data`, all bounded by `limit`. Returns the measured durations.
    async fn bench(
        &mut self,
        data: &[i32],
        warmup: u32,
        measured: u32,
        limit: Duration,
    ) -> Result<Vec<Duration>, UnitFault>;

    /// Give up on the worker without waiting for it to stop.
    fn abandon(&mut self);
}

/// A compiled candidate running as a harness child process.
///
/// Each unit owns its own worker and build directory; nothing is shared
/// between generations. Dropping the unit kills the worker.
pub struct LoadedUnit {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    _workspace: TempDir,
}

impl LoadedUnit {
    /// Start the harness binary and wait for its handshake.
    pub(crate) async fn spawn(
        binary: &Path,
        workspace: TempDir,
        handshake_timeout: Duration,
    ) -> Result<Self, String> {
        let mut child = Command::new(binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to start candidate: {}", e))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err("candidate started without stdio pipes".to_string());
        };
        let mut stdout = BufReader::new(stdout).lines();

        match tokio::time::timeout(handshake_timeout, stdout.next_line()).await {
            Ok(Ok(Some(line))) if line.trim_end() == harness::HANDSHAKE => {}
            Ok(Ok(Some(line))) => return Err(format!("unexpected handshake `{}`", line.trim_end())),
            Ok(Ok(None)) => return Err("candidate exited before handshake".to_string()),
            Ok(Err(e)) => return Err(format!("failed to read handshake: {}", e)),
            Err(_) => return Err(format!("no handshake within {:?}", handshake_timeout)),
        }

        debug!("Candidate worker started (pid {:?})", child.id());

        Ok(Self {
            child,
            stdin,
            stdout,
            _workspace: workspace,
        })
    }

    /// Worker process id, while it is running.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn exchange(&mut self, request: &str, limit: Duration) -> Result<Reply, UnitFault> {
        let stdin = &mut self.stdin;
        let stdout = &mut self.stdout;
        let io = async move {
            stdin.write_all(request.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await?;
            stdout.next_line().await
        };

        let line = match tokio::time::timeout(limit, io).await {
            Err(_) => return Err(UnitFault::TimedOut(limit)),
            Ok(Err(e)) => return Err(self.exit_fault(&e.to_string()).await),
            Ok(Ok(None)) => return Err(self.exit_fault("closed its output").await),
            Ok(Ok(Some(line))) => line,
        };

        match harness::parse_reply(&line).map_err(UnitFault::Protocol)? {
            Reply::Error(message) => Err(UnitFault::Panicked(message)),
            reply => Ok(reply),
        }
    }

    async fn exit_fault(&mut self, context: &str) -> UnitFault {
        match tokio::time::timeout(Duration::from_millis(500), self.child.wait()).await {
            Ok(Ok(status)) => UnitFault::Exited(format!("{} ({})", context, status)),
            _ => UnitFault::Exited(context.to_string()),
        }
    }

    /// Ask the worker to exit. Dropping the unit kills it regardless.
    pub async fn shutdown(mut self) {
        let quit = format!("{}\n", harness::encode_quit());
        if self.stdin.write_all(quit.as_bytes()).await.is_ok() {
            let _ = self.stdin.flush().await;
        }
    }
}

#[async_trait]
impl SortUnit for LoadedUnit {
    async fn solve(&mut self, input: &[i32], limit: Duration) -> Result<Vec<i32>, UnitFault> {
        match self.exchange(&harness::encode_solve(input), limit).await? {
            Reply::Sorted(values) => Ok(values),
            other => Err(UnitFault::Protocol(format!("expected sorted values, got {:?}", other))),
        }
    }

    async fn bench(
        &mut self,
        data: &[i32],
        warmup: u32,
        measured: u32,
        limit: Duration,
    ) -> Result<Vec<Duration>, UnitFault> {
        match self.exchange(&harness::encode_bench(warmup, measured, data), limit).await? {
            Reply::Times(nanos) => Ok(nanos.into_iter().map(Duration::from_nanos).collect()),
            other => Err(UnitFault::Protocol(format!("expected timings, got {:?}", other))),
        }
    }

    fn abandon(&mut self) {
        // Best effort: the kill signal is sent, nobody waits for the exit.
        if let Err(e) = self.child.start_kill() {
            warn!("Failed to signal abandoned worker: {}", e);
        }
    }
}
