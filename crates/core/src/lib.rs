//! Quine core data models.
//!
//! This crate defines the data structures shared by every layer of the
//! evolutionary search harness: candidates, evaluation outcomes, the
//! evolution state, the benchmark workload and the run configuration.

#![warn(missing_docs, unused_crate_dependencies)]

// Core identities
mod id;

// Candidates and their evaluation
mod candidate;
mod outcome;
mod workload;

// Evolution bookkeeping
mod state;

// Configuration
mod config;

// Re-exports
pub use id::RunId;

pub use candidate::{CandidateSource, ORIGIN_SOURCE};
pub use outcome::{Outcome, OutcomeStatus, format_latency};
pub use workload::{Workload, Lcg48};
pub use state::{EvolutionState, AcceptedEntry};
pub use config::{
    QuineConfig, ConfigError, EvolutionSettings, BenchmarkSettings, WorkloadSettings,
    GateSettings, ToolchainSettings, StorageSettings, ProposerSettings,
    DEFAULT_FORBIDDEN_PATTERNS, DEFAULT_CONFIG_FILE,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
