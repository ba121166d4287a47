//! Evaluation outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Classification of a single candidate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeStatus {
    /// Compiled, verified and benchmarked
    Success,
    /// Delegates to a trusted built-in sort
    ForbiddenApi,
    /// Toolchain rejected the source, or the built unit could not start
    CompileError,
    /// Produced a wrong answer on a literal vector
    CorrectnessFailure,
    /// Did not finish within the wall-clock bound
    Timeout,
    /// Panicked, crashed or broke the harness protocol
    RuntimeFault,
}

impl OutcomeStatus {
    /// All statuses, in pipeline order.
    pub const ALL: [OutcomeStatus; 6] = [
        OutcomeStatus::Success,
        OutcomeStatus::ForbiddenApi,
        OutcomeStatus::CompileError,
        OutcomeStatus::CorrectnessFailure,
        OutcomeStatus::Timeout,
        OutcomeStatus::RuntimeFault,
    ];
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Success => write!(f, "success"),
            OutcomeStatus::ForbiddenApi => write!(f, "forbidden-api"),
            OutcomeStatus::CompileError => write!(f, "compile-error"),
            OutcomeStatus::CorrectnessFailure => write!(f, "correctness-failure"),
            OutcomeStatus::Timeout => write!(f, "timeout"),
            OutcomeStatus::RuntimeFault => write!(f, "runtime-fault"),
        }
    }
}

/// Result of evaluating one candidate.
///
/// `latency` is present iff the status is [`OutcomeStatus::Success`];
/// `diagnostic` is present for every other status. The constructors are the
/// only way to build one, and deserialization goes through the same check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOutcome")]
pub struct Outcome {
    status: OutcomeStatus,
    latency: Option<Duration>,
    diagnostic: Option<String>,
}

#[derive(Deserialize)]
struct RawOutcome {
    status: OutcomeStatus,
    latency: Option<Duration>,
    diagnostic: Option<String>,
}

impl TryFrom<RawOutcome> for Outcome {
    type Error = String;

    fn try_from(raw: RawOutcome) -> Result<Self, Self::Error> {
        match (raw.status, raw.latency, raw.diagnostic) {
            (OutcomeStatus::Success, Some(latency), None) => Ok(Outcome::success(latency)),
            (OutcomeStatus::Success, _, _) => {
                Err("a success outcome needs a latency and no diagnostic".to_string())
            }
            (status, None, Some(diagnostic)) => Ok(Outcome::failure(status, diagnostic)),
            (status, _, _) => Err(format!("a {} outcome needs a diagnostic and no latency", status)),
        }
    }
}

impl Outcome {
    /// A successful evaluation with its mean latency.
    pub fn success(latency: Duration) -> Self {
        Self {
            status: OutcomeStatus::Success,
            latency: Some(latency),
            diagnostic: None,
        }
    }

    /// A failed evaluation.
    ///
    /// A `Success` status here is a programming error and is downgraded to
    /// `RuntimeFault`, keeping the latency/diagnostic invariant intact.
    pub fn failure(status: OutcomeStatus, diagnostic: impl Into<String>) -> Self {
        let diagnostic = diagnostic.into();
        let (status, diagnostic) = match status {
            OutcomeStatus::Success => (
                OutcomeStatus::RuntimeFault,
                format!("failure reported with success status: {}", diagnostic),
            ),
            other => (other, diagnostic),
        };
        Self {
            status,
            latency: None,
            diagnostic: Some(diagnostic),
        }
    }

    /// Outcome status.
    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    /// Mean latency (only on success).
    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }

    /// Failure diagnostic (only on failure).
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Whether the candidate passed every stage.
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.latency, &self.diagnostic) {
            (Some(latency), _) => write!(f, "{} ({})", self.status, format_latency(*latency)),
            (None, Some(diagnostic)) => write!(f, "{}: {}", self.status, diagnostic),
            (None, None) => write!(f, "{}", self.status),
        }
    }
}

/// Format a latency the way run reports show it: microseconds below one
/// millisecond, milliseconds with two decimals above.
pub fn format_latency(latency: Duration) -> String {
    let micros = latency.as_micros();
    if micros >= 1000 {
        format!("{:.2} ms", micros as f64 / 1000.0)
    } else {
        format!("{} µs", micros)
    }
}
