//! Evolution errors.

use quine_core::Outcome;
use quine_eval::EvalError;
use quine_storage::StorageError;

/// Faults that end a run.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    /// The initial source did not evaluate successfully
    #[error("baseline evaluation failed: {0}")]
    Baseline(Outcome),

    /// The evaluation pipeline hit a system fault
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// Persisted state could not be read or written
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Why the proposer produced no candidate.
///
/// Never fatal: the generation is recorded as failed and the run goes on.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// Request did not complete
    #[error("proposer request failed: {0}")]
    Transport(String),

    /// Service answered with something unusable
    #[error("unexpected proposer response: {0}")]
    Response(String),

    /// Service answered with no code
    #[error("proposer returned no code")]
    Empty,
}
