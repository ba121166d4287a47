//! The evolution controller - runs the generation loop.

use crate::decision::{decide, AcceptKind, Decision};
use crate::metrics::{RunStatistics, RunSummary};
use crate::{EvolutionError, Mutator};
use quine_core::{format_latency, CandidateSource, EvolutionSettings, EvolutionState, Outcome, Workload};
use quine_eval::Evaluator;
use quine_storage::{ArtifactStore, GenerationRecord};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Where the controller is within a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Between generations
    Idle,
    /// Waiting for the proposer
    Proposing,
    /// Candidate in the evaluation pipeline
    Evaluating,
    /// Applying the acceptance policy
    Deciding,
    /// Generation bound reached, or a fatal fault
    Terminated,
}

/// What happened in one generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Generation index
    pub generation: u32,
    /// Verdict
    pub decision: Decision,
    /// Evaluation outcome (absent when the proposer failed)
    pub outcome: Option<Outcome>,
    /// Baseline the candidate was judged against
    pub baseline: Duration,
    /// Wall-clock time of the whole generation
    pub elapsed: Duration,
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let latency = self.outcome.as_ref().and_then(Outcome::latency);
        let old = self.baseline;
        match (&self.decision, latency) {
            (Decision::Accepted(AcceptKind::Improvement), Some(new)) => write!(
                f,
                "Generation {}: improvement {} -> {} (gain {}, {:.2}x faster)",
                self.generation,
                format_latency(old),
                format_latency(new),
                format_latency(old.saturating_sub(new)),
                ratio(old, new)
            ),
            (Decision::Accepted(AcceptKind::Neutral), Some(new)) => write!(
                f,
                "Generation {}: neutral mutation accepted {} -> {} ({:+.1}%)",
                self.generation,
                format_latency(old),
                format_latency(new),
                (ratio(new, old) - 1.0) * 100.0
            ),
            (Decision::Rejected, Some(new)) => write!(
                f,
                "Generation {}: rejected, {} is {:.1}% slower than {}",
                self.generation,
                format_latency(new),
                (ratio(new, old) - 1.0) * 100.0,
                format_latency(old)
            ),
            (decision, _) => write!(f, "Generation {}: {}", self.generation, decision),
        }
    }
}

fn ratio(numerator: Duration, denominator: Duration) -> f64 {
    if denominator.is_zero() {
        return 1.0;
    }
    numerator.as_secs_f64() / denominator.as_secs_f64()
}

/// The evolution controller.
///
/// Runs the generation loop:
/// ```text
/// Propose → Evaluate → Decide → (persist if accepted)
/// ```
/// until the generation bound is exhausted. Candidate faults only fail their
/// generation; evaluation system faults and storage faults end the run.
pub struct EvolutionController<E, M, S> {
    evaluator: E,
    mutator: M,
    store: S,
    workload: Workload,
    settings: EvolutionSettings,
    state: EvolutionState,
    initial_baseline: Duration,
    phase: Phase,
    stats: RunStatistics,
}

impl<E: Evaluator, M: Mutator, S: ArtifactStore> EvolutionController<E, M, S> {
    /// Evaluate `initial` (generation 0) to establish the baseline.
    ///
    /// Any non-success outcome is fatal: there is nothing to compare against.
    pub async fn start(
        evaluator: E,
        mutator: M,
        store: S,
        workload: Workload,
        settings: EvolutionSettings,
        initial: CandidateSource,
    ) -> Result<Self, EvolutionError> {
        info!("Evaluating initial source (run {})", store.run_id());

        let outcome = evaluator.evaluate(&initial, &workload).await?;
        let baseline = match outcome.latency() {
            Some(latency) if outcome.is_success() => latency,
            _ => {
                error!("Initial source failed: {}", outcome);
                return Err(EvolutionError::Baseline(outcome));
            }
        };
        info!("Baseline: {}", format_latency(baseline));

        Ok(Self {
            evaluator,
            mutator,
            store,
            workload,
            settings,
            state: EvolutionState::new(initial, baseline),
            initial_baseline: baseline,
            phase: Phase::Idle,
            stats: RunStatistics::default(),
        })
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Best source, baseline and history so far.
    pub fn state(&self) -> &EvolutionState {
        &self.state
    }

    /// Counts so far.
    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    /// The store accepted candidates are written to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one generation. `None` once the generation bound is exhausted.
    pub async fn step(&mut self) -> Result<Option<GenerationReport>, EvolutionError> {
        if self.phase == Phase::Terminated || self.state.generation() > self.settings.max_generations {
            self.phase = Phase::Terminated;
            return Ok(None);
        }

        let result = self.run_generation().await;
        match result {
            Ok(report) => {
                self.phase = Phase::Idle;
                self.stats.record(&report.decision, report.outcome.as_ref().map(Outcome::status));
                self.state.advance();
                Ok(Some(report))
            }
            Err(e) => {
                self.phase = Phase::Terminated;
                error!("Generation {} aborted the run: {}", self.state.generation(), e);
                Err(e)
            }
        }
    }

    /// Run generations until the bound is exhausted.
    pub async fn run(&mut self) -> Result<RunSummary, EvolutionError> {
        while let Some(report) = self.step().await? {
            debug!("Generation {} took {:?}", report.generation, report.elapsed);
        }

        let summary = self.summary();
        info!("{}", summary);
        Ok(summary)
    }

    /// Summary of the run so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.store.run_id(),
            initial_baseline: self.initial_baseline,
            final_baseline: self.state.baseline(),
            best_generation: self.state.current_best().generation(),
            statistics: self.stats.clone(),
        }
    }

    async fn run_generation(&mut self) -> Result<GenerationReport, EvolutionError> {
        let generation = self.state.generation();
        let baseline = self.state.baseline();
        let started = Instant::now();

        // 1. Propose
        self.phase = Phase::Proposing;
        debug!("Generation {}: requesting mutation", generation);
        let text = match self.mutator.mutate(self.state.current_best().text()).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Generation {}: proposer failed: {}", generation, e);
                return Ok(GenerationReport {
                    generation,
                    decision: Decision::Failed(e.to_string()),
                    outcome: None,
                    baseline,
                    elapsed: started.elapsed(),
                });
            }
        };
        let candidate = CandidateSource::new(generation, text);

        // 2. Evaluate
        self.phase = Phase::Evaluating;
        let outcome = self.evaluator.evaluate(&candidate, &self.workload).await?;

        // 3. Decide
        self.phase = Phase::Deciding;
        let decision = decide(&outcome, baseline, self.settings.tolerance);
        if let (Decision::Accepted(kind), Some(latency)) = (&decision, outcome.latency()) {
            self.persist(&candidate, latency, *kind).await?;
            self.state.accept(candidate, latency);
        }

        let report = GenerationReport {
            generation,
            decision,
            outcome: Some(outcome),
            baseline,
            elapsed: started.elapsed(),
        };
        match report.decision {
            Decision::Failed(_) => warn!("{}", report),
            _ => info!("{}", report),
        }
        Ok(report)
    }

    async fn persist(
        &mut self,
        candidate: &CandidateSource,
        latency: Duration,
        kind: AcceptKind,
    ) -> Result<(), EvolutionError> {
        let record = GenerationRecord::new(
            self.store.run_id(),
            candidate.generation(),
            latency,
            kind == AcceptKind::Improvement,
        );
        // The live slot never holds a source the backup log is missing.
        self.store.append_generation(&record, candidate.text()).await?;
        self.store.save_live(candidate.text()).await?;
        Ok(())
    }
}
