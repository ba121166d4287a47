//! Benchmark runner.

use crate::unit::{SortUnit, UnitFault};
use quine_core::{BenchmarkSettings, Workload};
use serde::Serialize;
use std::time::Duration;

/// Latency figures of one benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    /// Arithmetic mean of the measured runs
    pub mean: Duration,
    /// Fastest measured run
    pub min: Duration,
    /// Slowest measured run
    pub max: Duration,
    /// Every measured run, in order
    pub samples: Vec<Duration>,
}

impl BenchmarkReport {
    /// Summarise measured samples. `None` when there are none.
    pub fn from_samples(samples: Vec<Duration>) -> Option<Self> {
        let min = *samples.iter().min()?;
        let max = *samples.iter().max()?;
        let total: Duration = samples.iter().sum();
        let mean = total / u32::try_from(samples.len()).ok()?;
        Some(Self {
            mean,
            min,
            max,
            samples,
        })
    }
}

/// Warm-up then measured runs on the unit's worker, under one hard bound.
#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    warmup_runs: u32,
    measured_runs: u32,
    timeout: Duration,
}

impl BenchmarkRunner {
    /// Create a runner.
    pub fn new(warmup_runs: u32, measured_runs: u32, timeout: Duration) -> Self {
        Self {
            warmup_runs,
            measured_runs,
            timeout,
        }
    }

    /// Runner configured from settings.
    pub fn from_settings(settings: &BenchmarkSettings) -> Self {
        Self::new(settings.warmup_runs, settings.measured_runs, settings.timeout())
    }

    /// Wall-clock bound of one benchmark.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Measure the mean latency of `unit` on `workload`.
    ///
    /// Every call gets a fresh copy of the workload. On timeout the worker
    /// is abandoned and [`UnitFault::TimedOut`] is returned.
    pub async fn run(
        &self,
        unit: &mut dyn SortUnit,
        workload: &Workload,
    ) -> Result<BenchmarkReport, UnitFault> {
        let samples = match unit
            .bench(workload.values(), self.warmup_runs, self.measured_runs, self.timeout)
            .await
        {
            Ok(samples) => samples,
            Err(fault @ UnitFault::TimedOut(_)) => {
                unit.abandon();
                return Err(fault);
            }
            Err(fault) => return Err(fault),
        };

        if samples.len() != self.measured_runs as usize {
            return Err(UnitFault::Protocol(format!(
                "expected {} measured runs, got {}",
                self.measured_runs,
                samples.len()
            )));
        }

        BenchmarkReport::from_samples(samples)
            .ok_or_else(|| UnitFault::Protocol("no measured runs".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::tests::FnUnit;

    fn reverse_sorted(mut v: Vec<i32>) -> Result<Vec<i32>, UnitFault> {
        v.reverse();
        Ok(v)
    }

    fn hangs(_: Vec<i32>) -> Result<Vec<i32>, UnitFault> {
        Err(UnitFault::TimedOut(Duration::from_secs(20)))
    }

    #[test]
    fn test_report_mean_min_max() {
        let samples = vec![
            Duration::from_micros(100),
            Duration::from_micros(300),
            Duration::from_micros(200),
        ];
        let report = BenchmarkReport::from_samples(samples).unwrap();
        assert_eq!(report.mean, Duration::from_micros(200));
        assert_eq!(report.min, Duration::from_micros(100));
        assert_eq!(report.max, Duration::from_micros(300));
        assert!(BenchmarkReport::from_samples(Vec::new()).is_none());
    }

    #[tokio::test]
    async fn test_run_averages_measured_calls() {
        let runner = BenchmarkRunner::new(3, 5, Duration::from_secs(1));
        let mut unit = FnUnit::new(reverse_sorted);
        let report = runner.run(&mut unit, &Workload::generate(42, 100, 1000)).await.unwrap();

        // FnUnit reports 100, 110, .., 140 µs.
        assert_eq!(report.samples.len(), 5);
        assert_eq!(report.mean, Duration::from_micros(120));
        assert!(!unit.abandoned);
    }

    #[tokio::test]
    async fn test_timeout_abandons_worker() {
        let runner = BenchmarkRunner::new(3, 5, Duration::from_secs(1));
        let mut unit = FnUnit::new(hangs);
        let fault = runner.run(&mut unit, &Workload::generate(42, 100, 1000)).await.unwrap_err();
        assert!(matches!(fault, UnitFault::TimedOut(_)));
        assert!(unit.abandoned);
    }

    #[tokio::test]
    async fn test_workload_is_untouched() {
        let workload = Workload::generate(42, 100, 1000);
        let before = workload.clone();
        let runner = BenchmarkRunner::new(1, 2, Duration::from_secs(1));
        runner.run(&mut FnUnit::new(reverse_sorted), &workload).await.unwrap();
        assert_eq!(workload, before);
    }
}
