//! Correctness verifier.

use crate::unit::{SortUnit, UnitFault};
use std::time::Duration;
use tracing::debug;

/// Literal vectors every candidate must sort correctly.
pub const CORRECTNESS_VECTORS: &[&[i32]] = &[
    &[5, 3, 1, 4, 2],
    &[1],
    &[2, 1],
    &[-5, 0, 3, -2, 10],
];

/// Trusted reference ordering. Lives in the evaluating process only and is
/// never compiled into a candidate.
pub fn reference_sort(input: &[i32]) -> Vec<i32> {
    let mut sorted = input.to_vec();
    sorted.sort_unstable();
    sorted
}

/// Verdict of a verification pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// Every vector sorted correctly
    Passed,
    /// A vector came back wrong
    Mismatch {
        /// Input vector
        input: Vec<i32>,
        /// Reference ordering
        expected: Vec<i32>,
        /// What the candidate returned
        actual: Vec<i32>,
    },
    /// The candidate panicked, crashed or broke the protocol
    Fault(String),
    /// A call did not return within the bound
    TimedOut(Duration),
}

impl Verification {
    /// Boolean verdict.
    pub fn passed(&self) -> bool {
        matches!(self, Verification::Passed)
    }
}

/// Runs the literal vectors and compares against the reference ordering.
#[derive(Debug, Clone)]
pub struct CorrectnessVerifier {
    vectors: Vec<Vec<i32>>,
    limit: Duration,
}

impl CorrectnessVerifier {
    /// Verifier over the standard vectors, each call bounded by `limit`.
    pub fn new(limit: Duration) -> Self {
        Self::with_vectors(CORRECTNESS_VECTORS.iter().map(|v| v.to_vec()).collect(), limit)
    }

    /// Verifier over custom vectors.
    pub fn with_vectors(vectors: Vec<Vec<i32>>, limit: Duration) -> Self {
        Self { vectors, limit }
    }

    /// Check `unit` against every vector, stopping at the first failure.
    pub async fn verify(&self, unit: &mut dyn SortUnit) -> Verification {
        for input in &self.vectors {
            let expected = reference_sort(input);
            let actual = match unit.solve(input, self.limit).await {
                Ok(actual) => actual,
                Err(UnitFault::TimedOut(limit)) => return Verification::TimedOut(limit),
                Err(fault) => return Verification::Fault(fault.to_string()),
            };
            if actual != expected {
                debug!("Mismatch on {:?}: got {:?}", input, actual);
                return Verification::Mismatch {
                    input: input.clone(),
                    expected,
                    actual,
                };
            }
        }
        Verification::Passed
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;

    /// In-process unit driven by a plain function.
    pub(crate) struct FnUnit {
        pub(crate) f: fn(Vec<i32>) -> Result<Vec<i32>, UnitFault>,
        pub(crate) calls: usize,
        pub(crate) abandoned: bool,
    }

    impl FnUnit {
        pub(crate) fn new(f: fn(Vec<i32>) -> Result<Vec<i32>, UnitFault>) -> Self {
            Self { f, calls: 0, abandoned: false }
        }
    }

    #[async_trait]
    impl SortUnit for FnUnit {
        async fn solve(&mut self, input: &[i32], _limit: Duration) -> Result<Vec<i32>, UnitFault> {
            self.calls += 1;
            (self.f)(input.to_vec())
        }

        async fn bench(
            &mut self,
            data: &[i32],
            warmup: u32,
            measured: u32,
            _limit: Duration,
        ) -> Result<Vec<Duration>, UnitFault> {
            for _ in 0..warmup {
                (self.f)(data.to_vec())?;
            }
            (0..measured)
                .map(|i| (self.f)(data.to_vec()).map(|_| Duration::from_micros(100 + i as u64 * 10)))
                .collect()
        }

        fn abandon(&mut self) {
            self.abandoned = true;
        }
    }

    fn bubble(mut v: Vec<i32>) -> Result<Vec<i32>, UnitFault> {
        for i in 0..v.len() {
            for j in 0..v.len().saturating_sub(i + 1) {
                if v[j] > v[j + 1] {
                    v.swap(j, j + 1);
                }
            }
        }
        Ok(v)
    }

    fn identity(v: Vec<i32>) -> Result<Vec<i32>, UnitFault> {
        Ok(v)
    }

    fn drops_duplicates(v: Vec<i32>) -> Result<Vec<i32>, UnitFault> {
        let mut v = bubble(v)?;
        v.dedup();
        Ok(v)
    }

    fn panics(_: Vec<i32>) -> Result<Vec<i32>, UnitFault> {
        Err(UnitFault::Panicked("panic: boom".to_string()))
    }

    fn hangs(_: Vec<i32>) -> Result<Vec<i32>, UnitFault> {
        Err(UnitFault::TimedOut(Duration::from_secs(20)))
    }

    #[test]
    fn test_reference_sort_matches_literal_expectations() {
        assert_eq!(reference_sort(&[5, 3, 1, 4, 2]), vec![1, 2, 3, 4, 5]);
        assert_eq!(reference_sort(&[1]), vec![1]);
        assert_eq!(reference_sort(&[2, 1]), vec![1, 2]);
        assert_eq!(reference_sort(&[-5, 0, 3, -2, 10]), vec![-5, -2, 0, 3, 10]);
    }

    #[tokio::test]
    async fn test_correct_unit_passes() {
        let mut unit = FnUnit::new(bubble);
        let verdict = CorrectnessVerifier::new(Duration::from_secs(1)).verify(&mut unit).await;
        assert!(verdict.passed());
        assert_eq!(unit.calls, CORRECTNESS_VECTORS.len());
    }

    #[tokio::test]
    async fn test_short_circuits_on_first_mismatch() {
        let mut unit = FnUnit::new(identity);
        let verdict = CorrectnessVerifier::new(Duration::from_secs(1)).verify(&mut unit).await;
        assert_eq!(
            verdict,
            Verification::Mismatch {
                input: vec![5, 3, 1, 4, 2],
                expected: vec![1, 2, 3, 4, 5],
                actual: vec![5, 3, 1, 4, 2],
            }
        );
        assert_eq!(unit.calls, 1);
    }

    #[tokio::test]
    async fn test_duplicate_counts_matter() {
        let verifier = CorrectnessVerifier::with_vectors(vec![vec![3, 1, 3, 2]], Duration::from_secs(1));
        let mut unit = FnUnit::new(drops_duplicates);
        assert!(matches!(verifier.verify(&mut unit).await, Verification::Mismatch { .. }));
    }

    #[tokio::test]
    async fn test_faults_are_failures_not_errors() {
        let verifier = CorrectnessVerifier::new(Duration::from_secs(1));

        let mut unit = FnUnit::new(panics);
        let verdict = verifier.verify(&mut unit).await;
        assert_eq!(verdict, Verification::Fault("panic: boom".to_string()));
        assert!(!verdict.passed());

        let mut unit = FnUnit::new(hangs);
        assert!(matches!(verifier.verify(&mut unit).await, Verification::TimedOut(_)));
    }
}
