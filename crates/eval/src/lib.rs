//! Candidate evaluation.
//!
//! Forbidden-pattern gate, compiler/loader, correctness verifier and
//! benchmark runner, composed into one evaluation pipeline.

#![warn(missing_docs, unused_crate_dependencies)]

pub mod error;
pub mod gate;
pub mod harness;
pub mod unit;
pub mod compiler;
pub mod verifier;
pub mod bench;
pub mod pipeline;

pub use error::EvalError;
pub use gate::ForbiddenPatternGate;
pub use unit::{SortUnit, LoadedUnit, UnitFault};
pub use compiler::{Compiler, LoadError};
pub use verifier::{CorrectnessVerifier, Verification, CORRECTNESS_VECTORS, reference_sort};
pub use bench::{BenchmarkRunner, BenchmarkReport};
pub use pipeline::{Evaluator, EvaluationPipeline};
