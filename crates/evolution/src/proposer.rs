//! Mutation proposer boundary.

use crate::MutationError;
use async_trait::async_trait;

/// Produces a new candidate source from the current best one.
#[async_trait]
pub trait Mutator: Send + Sync {
    /// Propose a full replacement for `current`.
    async fn mutate(&self, current: &str) -> Result<String, MutationError>;
}
