//! Evolution state - the single piece of mutable run state.

use crate::candidate::CandidateSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One accepted generation in the run history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedEntry {
    /// Generation that produced the source
    pub generation: u32,

    /// The accepted source
    pub source: CandidateSource,

    /// Latency the source was accepted with
    pub latency: Duration,
}

/// Running best source, baseline latency, generation counter and the
/// append-only history of accepted generations.
///
/// The best source and the baseline only ever change together, through
/// [`EvolutionState::accept`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionState {
    current_best: CandidateSource,
    baseline: Duration,
    generation: u32,
    history: Vec<AcceptedEntry>,
}

impl EvolutionState {
    /// Start from an evaluated initial source. The first generation is 1.
    pub fn new(initial: CandidateSource, baseline: Duration) -> Self {
        Self {
            current_best: initial,
            baseline,
            generation: 1,
            history: Vec::new(),
        }
    }

    /// Current best source.
    pub fn current_best(&self) -> &CandidateSource {
        &self.current_best
    }

    /// Latency of the current best source.
    pub fn baseline(&self) -> Duration {
        self.baseline
    }

    /// Index of the generation about to run.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Accepted generations, oldest first.
    pub fn history(&self) -> &[AcceptedEntry] {
        &self.history
    }

    /// Replace the best source and baseline together and record the entry.
    pub fn accept(&mut self, candidate: CandidateSource, latency: Duration) {
        self.history.push(AcceptedEntry {
            generation: candidate.generation(),
            source: candidate.clone(),
            latency,
        });
        self.current_best = candidate;
        self.baseline = latency;
    }

    /// Move on to the next generation.
    pub fn advance(&mut self) {
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> EvolutionState {
        EvolutionState::new(CandidateSource::origin(), Duration::from_millis(100))
    }

    #[test]
    fn test_starts_at_generation_one() {
        let state = state();
        assert_eq!(state.generation(), 1);
        assert!(state.history().is_empty());
        assert_eq!(state.baseline(), Duration::from_millis(100));
    }

    #[test]
    fn test_accept_updates_best_and_baseline_together() {
        let mut state = state();
        let candidate = CandidateSource::new(1, "pub fn solve(v: Vec<i32>) -> Vec<i32> { v }");
        state.accept(candidate.clone(), Duration::from_millis(90));

        assert_eq!(state.current_best(), &candidate);
        assert_eq!(state.baseline(), Duration::from_millis(90));
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history()[0].generation, 1);
    }

    #[test]
    fn test_history_is_append_only_and_ordered() {
        let mut state = state();
        for generation in 1..=4 {
            if generation % 2 == 0 {
                let candidate = CandidateSource::new(generation, format!("// gen {}", generation));
                state.accept(candidate, Duration::from_millis(100 - generation as u64));
            }
            state.advance();
        }

        let generations: Vec<u32> = state.history().iter().map(|e| e.generation).collect();
        assert_eq!(generations, vec![2, 4]);
        assert_eq!(state.generation(), 5);
    }
}
