//! Storage trait abstraction.

use async_trait::async_trait;
use quine_core::{RunId, Time};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A backup entry already exists and must not be overwritten
    #[error("Already recorded: {0}")]
    AlreadyExists(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Metadata stored next to every backed-up generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// Run the generation belongs to
    pub run_id: RunId,

    /// Generation index
    pub generation: u32,

    /// Latency the candidate was accepted with, in nanoseconds
    pub latency_nanos: u64,

    /// Whether it beat the previous baseline (otherwise a neutral mutation)
    pub improvement: bool,

    /// When it was accepted
    pub accepted_at: Time,
}

impl GenerationRecord {
    /// Record an accepted generation now.
    pub fn new(run_id: RunId, generation: u32, latency: Duration, improvement: bool) -> Self {
        Self {
            run_id,
            generation,
            latency_nanos: u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX),
            improvement,
            accepted_at: chrono::Utc::now(),
        }
    }

    /// Accepted latency.
    pub fn latency(&self) -> Duration {
        Duration::from_nanos(self.latency_nanos)
    }
}

/// Persisted state of the evolutionary search.
///
/// This trait allows different storage backends to be plugged in.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Run that [`ArtifactStore::append_generation`] writes into.
    fn run_id(&self) -> RunId;

    // === Live slot ===

    /// Load the current live candidate, if any.
    async fn load_live(&self) -> Result<Option<String>>;

    /// Overwrite the live candidate.
    async fn save_live(&mut self, source: &str) -> Result<()>;

    // === Backup log ===

    /// Append an accepted generation to the current run's log.
    ///
    /// Fails with [`StorageError::AlreadyExists`] rather than overwrite an
    /// earlier entry.
    async fn append_generation(&mut self, record: &GenerationRecord, source: &str) -> Result<()>;

    /// Load a backed-up source.
    async fn load_generation(&self, run_id: RunId, generation: u32) -> Result<Option<String>>;

    /// List a run's accepted generations, oldest first.
    async fn list_generations(&self, run_id: RunId) -> Result<Vec<GenerationRecord>>;

    /// List all runs, oldest first.
    async fn list_runs(&self) -> Result<Vec<RunId>>;

    // === Maintenance ===

    /// Put the origin source back into the live slot, keeping a copy of
    /// whatever was there. Returns the path of that copy.
    async fn reset_to_origin(&mut self) -> Result<Option<PathBuf>>;
}
