//! Evolution layer - proposes, evaluates and keeps or discards candidates.

#![warn(missing_docs, unused_crate_dependencies)]

mod error;
mod proposer;
mod decision;
mod metrics;
mod controller;

pub use error::{EvolutionError, MutationError};
pub use proposer::Mutator;
pub use decision::{decide, Decision, AcceptKind};
pub use metrics::{RunStatistics, RunSummary};
pub use controller::{EvolutionController, GenerationReport, Phase};
