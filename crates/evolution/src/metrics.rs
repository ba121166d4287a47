//! Run statistics.

use crate::decision::{AcceptKind, Decision};
use quine_core::{format_latency, OutcomeStatus, RunId};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Counts over the generations of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatistics {
    /// Generations run
    pub generations: usize,
    /// Accepted as faster
    pub improvements: usize,
    /// Accepted within the tolerance
    pub neutral: usize,
    /// Correct but too slow
    pub rejected: usize,
    /// Proposer faults and non-success outcomes
    pub failed: usize,
    /// Evaluated generations by outcome status
    pub by_status: HashMap<OutcomeStatus, usize>,
}

impl RunStatistics {
    /// Count one generation.
    pub fn record(&mut self, decision: &Decision, status: Option<OutcomeStatus>) {
        self.generations += 1;
        match decision {
            Decision::Accepted(AcceptKind::Improvement) => self.improvements += 1,
            Decision::Accepted(AcceptKind::Neutral) => self.neutral += 1,
            Decision::Rejected => self.rejected += 1,
            Decision::Failed(_) => self.failed += 1,
        }
        if let Some(status) = status {
            *self.by_status.entry(status).or_insert(0) += 1;
        }
    }

    /// Generations that replaced the best source.
    pub fn accepted(&self) -> usize {
        self.improvements + self.neutral
    }

    /// Share of generations that ended in failure.
    pub fn failure_rate(&self) -> f32 {
        if self.generations == 0 {
            return 0.0;
        }
        self.failed as f32 / self.generations as f32
    }
}

/// What a finished run achieved.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Run id the backups were written under
    pub run_id: RunId,
    /// Latency of the initial source
    pub initial_baseline: Duration,
    /// Latency of the final best source
    pub final_baseline: Duration,
    /// Generation that produced the final best source (0 = initial)
    pub best_generation: u32,
    /// Per-decision and per-status counts
    pub statistics: RunStatistics,
}

impl RunSummary {
    /// `initial / final`; above 1.0 means the run got faster.
    pub fn speedup(&self) -> f64 {
        if self.final_baseline.is_zero() {
            return 1.0;
        }
        self.initial_baseline.as_secs_f64() / self.final_baseline.as_secs_f64()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.statistics;
        write!(
            f,
            "Run {} finished after {} generations: {} -> {} ({:.2}x, best from generation {}); \
             {} improvements, {} neutral, {} rejected, {} failed",
            self.run_id,
            stats.generations,
            format_latency(self.initial_baseline),
            format_latency(self.final_baseline),
            self.speedup(),
            self.best_generation,
            stats.improvements,
            stats.neutral,
            stats.rejected,
            stats.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_decisions_and_statuses() {
        let mut stats = RunStatistics::default();
        stats.record(&Decision::Accepted(AcceptKind::Improvement), Some(OutcomeStatus::Success));
        stats.record(&Decision::Accepted(AcceptKind::Neutral), Some(OutcomeStatus::Success));
        stats.record(&Decision::Rejected, Some(OutcomeStatus::Success));
        stats.record(&Decision::Failed("compile-error".into()), Some(OutcomeStatus::CompileError));
        stats.record(&Decision::Failed("proposer".into()), None);

        assert_eq!(stats.generations, 5);
        assert_eq!(stats.accepted(), 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.by_status[&OutcomeStatus::Success], 3);
        assert_eq!(stats.by_status[&OutcomeStatus::CompileError], 1);
        assert!((stats.failure_rate() - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_speedup() {
        let summary = RunSummary {
            run_id: RunId::new(),
            initial_baseline: Duration::from_millis(30),
            final_baseline: Duration::from_millis(10),
            best_generation: 7,
            statistics: RunStatistics::default(),
        };
        assert!((summary.speedup() - 3.0).abs() < 1e-9);
        assert!(summary.to_string().contains("30.00 ms -> 10.00 ms (3.00x"));
    }
}
