//! System-level evaluation errors.
//!
//! Candidate faults are never errors; they become an [`quine_core::Outcome`].
//! These variants mean the harness itself cannot evaluate anything.

/// Fatal evaluation error.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// The compiler toolchain could not be invoked
    #[error("failed to invoke toolchain: {0:#}")]
    Toolchain(anyhow::Error),

    /// The scratch build directory could not be prepared
    #[error("failed to prepare build directory: {0}")]
    Workspace(std::io::Error),
}
