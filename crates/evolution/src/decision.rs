//! Acceptance policy.

use quine_core::{Outcome, OutcomeStatus};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Why an accepted candidate was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AcceptKind {
    /// Strictly faster than the baseline
    Improvement,
    /// Not faster, but within the tolerance
    Neutral,
}

/// Verdict on one generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Decision {
    /// Candidate becomes the new best
    Accepted(AcceptKind),
    /// Correct, but slower than the tolerance allows
    Rejected,
    /// No usable candidate: proposer fault or a non-success outcome
    Failed(String),
}

impl Decision {
    /// Whether the candidate replaced the best source.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Decision::Accepted(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Accepted(AcceptKind::Improvement) => write!(f, "improvement"),
            Decision::Accepted(AcceptKind::Neutral) => write!(f, "neutral"),
            Decision::Rejected => write!(f, "rejected"),
            Decision::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Judge `outcome` against the current `baseline`.
///
/// Accepted iff the outcome is a success and
/// `latency <= baseline * tolerance`.
pub fn decide(outcome: &Outcome, baseline: Duration, tolerance: f64) -> Decision {
    let latency = match (outcome.status(), outcome.latency()) {
        (OutcomeStatus::Success, Some(latency)) => latency,
        (status, _) => {
            let reason = match outcome.diagnostic() {
                Some(diagnostic) => format!("{} ({})", status, first_line(diagnostic)),
                None => status.to_string(),
            };
            return Decision::Failed(reason);
        }
    };

    let limit = baseline.as_nanos() as f64 * tolerance;
    if latency.as_nanos() as f64 > limit {
        Decision::Rejected
    } else if latency < baseline {
        Decision::Accepted(AcceptKind::Improvement)
    } else {
        Decision::Accepted(AcceptKind::Neutral)
    }
}

fn first_line(text: &str) -> &str {
    text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_micros(100);

    #[test]
    fn test_faster_is_improvement() {
        let decision = decide(&Outcome::success(Duration::from_micros(90)), BASE, 1.05);
        assert_eq!(decision, Decision::Accepted(AcceptKind::Improvement));
    }

    #[test]
    fn test_equal_or_slightly_slower_is_neutral() {
        assert_eq!(
            decide(&Outcome::success(BASE), BASE, 1.05),
            Decision::Accepted(AcceptKind::Neutral)
        );
        assert_eq!(
            decide(&Outcome::success(Duration::from_micros(104)), BASE, 1.05),
            Decision::Accepted(AcceptKind::Neutral)
        );
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let decision = decide(&Outcome::success(Duration::from_micros(105)), BASE, 1.05);
        assert_eq!(decision, Decision::Accepted(AcceptKind::Neutral));

        let decision = decide(&Outcome::success(Duration::from_nanos(105_001)), BASE, 1.05);
        assert_eq!(decision, Decision::Rejected);
    }

    #[test]
    fn test_slower_than_tolerance_is_rejected() {
        let decision = decide(&Outcome::success(Duration::from_micros(110)), BASE, 1.05);
        assert_eq!(decision, Decision::Rejected);
    }

    #[test]
    fn test_strict_tolerance_only_keeps_improvements() {
        assert_eq!(decide(&Outcome::success(BASE), BASE, 1.0), Decision::Accepted(AcceptKind::Neutral));
        assert_eq!(decide(&Outcome::success(Duration::from_nanos(100_001)), BASE, 1.0), Decision::Rejected);
    }

    #[test]
    fn test_non_success_fails_with_reason() {
        for status in OutcomeStatus::ALL.into_iter().filter(|s| *s != OutcomeStatus::Success) {
            let outcome = Outcome::failure(status, "\nfirst problem\nsecond problem");
            match decide(&outcome, BASE, 1.05) {
                Decision::Failed(reason) => {
                    assert!(reason.starts_with(&status.to_string()));
                    assert!(reason.contains("first problem"));
                    assert!(!reason.contains("second problem"));
                }
                other => panic!("{:?} decided as {:?}", status, other),
            }
        }
    }

    #[test]
    fn test_accepted_latency_never_exceeds_tolerance() {
        for micros in 1..=300u64 {
            let latency = Duration::from_micros(micros);
            if decide(&Outcome::success(latency), BASE, 1.05).is_accepted() {
                assert!(latency.as_nanos() as f64 <= BASE.as_nanos() as f64 * 1.05);
            }
        }
    }
}
