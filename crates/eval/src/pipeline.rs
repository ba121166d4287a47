//! Evaluation pipeline: gate → compile/load → verify → benchmark.

use crate::bench::BenchmarkRunner;
use crate::compiler::{Compiler, LoadError};
use crate::error::EvalError;
use crate::gate::ForbiddenPatternGate;
use crate::unit::{SortUnit, UnitFault};
use crate::verifier::{CorrectnessVerifier, Verification};
use async_trait::async_trait;
use futures::FutureExt;
use quine_core::{format_latency, CandidateSource, Outcome, OutcomeStatus, QuineConfig, Workload};
use quine_tools::{RustcTool, Tool};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns a candidate into an [`Outcome`].
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Evaluate `source` against `workload`.
    ///
    /// Candidate faults come back as a non-success outcome; `Err` is reserved
    /// for system faults that make further evaluation pointless.
    async fn evaluate(&self, source: &CandidateSource, workload: &Workload) -> Result<Outcome, EvalError>;
}

/// The standard pipeline, stages in fixed order, stopping at the first
/// failure.
pub struct EvaluationPipeline {
    gate: ForbiddenPatternGate,
    compiler: Compiler,
    verifier: CorrectnessVerifier,
    runner: BenchmarkRunner,
}

impl EvaluationPipeline {
    /// Pipeline driving the configured `rustc`.
    pub fn new(config: &QuineConfig) -> Self {
        Self::with_tool(config, Arc::new(RustcTool::new(config.toolchain.rustc.clone())))
    }

    /// Pipeline driving a custom compiler tool.
    pub fn with_tool(config: &QuineConfig, tool: Arc<dyn Tool>) -> Self {
        let limit = config.benchmark.timeout();
        Self {
            gate: ForbiddenPatternGate::from_settings(&config.gate),
            compiler: Compiler::new(tool, config.toolchain.clone(), limit),
            verifier: CorrectnessVerifier::new(limit),
            runner: BenchmarkRunner::from_settings(&config.benchmark),
        }
    }

    async fn run_stages(&self, source: &CandidateSource, workload: &Workload) -> Result<Outcome, EvalError> {
        let generation = source.generation();

        if let Some(pattern) = self.gate.violation(source.text()) {
            warn!("Generation {} uses forbidden call `{}`", generation, pattern);
            return Ok(Outcome::failure(
                OutcomeStatus::ForbiddenApi,
                format!("forbidden call `{}`: candidates must not delegate to a built-in sort", pattern),
            ));
        }

        let mut unit = match self.compiler.load(source).await {
            Ok(unit) => unit,
            Err(LoadError::Compile(diagnostic)) => {
                debug!("Generation {} failed to compile:\n{}", generation, diagnostic);
                return Ok(Outcome::failure(OutcomeStatus::CompileError, diagnostic));
            }
            Err(LoadError::System(e)) => return Err(e),
        };

        match self.verifier.verify(&mut unit).await {
            Verification::Passed => {
                debug!("Generation {} passed correctness checks", generation);
            }
            Verification::Mismatch { input, expected, actual } => {
                return Ok(Outcome::failure(
                    OutcomeStatus::CorrectnessFailure,
                    format!("input {:?}: expected {:?}, got {:?}", input, expected, actual),
                ));
            }
            Verification::Fault(message) => {
                return Ok(Outcome::failure(OutcomeStatus::RuntimeFault, message));
            }
            Verification::TimedOut(limit) => {
                unit.abandon();
                return Ok(Outcome::failure(
                    OutcomeStatus::Timeout,
                    format!("correctness check did not finish within {}s", limit.as_secs_f64()),
                ));
            }
        }

        match self.runner.run(&mut unit, workload).await {
            Ok(report) => {
                info!(
                    "Generation {} benchmark: mean {}, min {}, max {}",
                    generation,
                    format_latency(report.mean),
                    format_latency(report.min),
                    format_latency(report.max)
                );
                unit.shutdown().await;
                Ok(Outcome::success(report.mean))
            }
            Err(UnitFault::TimedOut(limit)) => Ok(Outcome::failure(
                OutcomeStatus::Timeout,
                format!("benchmark did not finish within {}s", limit.as_secs_f64()),
            )),
            Err(fault) => Ok(Outcome::failure(OutcomeStatus::RuntimeFault, fault.to_string())),
        }
    }
}

#[async_trait]
impl Evaluator for EvaluationPipeline {
    async fn evaluate(&self, source: &CandidateSource, workload: &Workload) -> Result<Outcome, EvalError> {
        match AssertUnwindSafe(self.run_stages(source, workload)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!("Evaluation of generation {} panicked: {}", source.generation(), message);
                Ok(Outcome::failure(
                    OutcomeStatus::RuntimeFault,
                    format!("evaluation panicked: {}", message),
                ))
            }
        }
    }
}
