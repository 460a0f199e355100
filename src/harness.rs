//! Trial harness: warm-up, timed iterations, aggregation.
//!
//! Per kernel variant the harness moves through
//! `Init → WarmUp → Timed(0..N) → Aggregate → Done`. Iteration 0 is timed
//! but left out of the statistics: even after the warm-up it still carries
//! first-touch and layout effects.

use crate::error::{BenchError, BenchResult};
use crate::profiling::timer::{now, elapsed, Granularity};

/// Per-iteration elapsed seconds for one kernel variant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingSeries {
    samples: Vec<f64>,
    /// Iterations too short for the clock to resolve.
    unreliable: Vec<usize>,
}

impl TimingSeries {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            samples: Vec::with_capacity(n),
            unreliable: Vec::new(),
        }
    }

    pub fn from_samples(samples: Vec<f64>) -> Self {
        Self {
            samples,
            unreliable: Vec::new(),
        }
    }

    pub fn push(&mut self, secs: f64) {
        self.samples.push(secs);
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Indices of the iterations flagged by the granularity check.
    pub fn unreliable(&self) -> &[usize] {
        &self.unreliable
    }

    fn mark_unreliable(&mut self, iter: usize) {
        self.unreliable.push(iter);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Min/max/mean over every sample except the first.
    pub fn aggregate(&self) -> BenchResult<TrialStats> {
        if self.samples.len() < 2 {
            return Err(BenchError::Config(format!(
                "need at least 2 samples to aggregate, got {}",
                self.samples.len()
            )));
        }
        let steady = &self.samples[1..];
        let min = steady.iter().copied().fold(f64::INFINITY, f64::min);
        let max = steady.iter().copied().fold(0.0, f64::max);
        let avg = steady.iter().sum::<f64>() / steady.len() as f64;
        Ok(TrialStats {
            min_time: min,
            max_time: max,
            avg_time: avg,
            samples: steady.len(),
        })
    }
}

/// Aggregated timings of one kernel variant. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialStats {
    pub min_time: f64,
    pub max_time: f64,
    pub avg_time: f64,
    /// Samples that went into the statistics (iterations − 1).
    pub samples: usize,
}

impl std::fmt::Display for TrialStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "min={:.6}s avg={:.6}s max={:.6}s (n={})",
            self.min_time, self.avg_time, self.max_time, self.samples
        )
    }
}

/// Harness settings. Construct with [`Harness::new`] so the iteration
/// count is checked before any kernel runs.
#[derive(Debug, Clone, Copy)]
pub struct Harness {
    iterations: usize,
    warmup_runs: usize,
    granularity: Granularity,
}

impl Harness {
    /// Fails with [`BenchError::Config`] when `iterations < 2`.
    pub fn new(iterations: usize, warmup_runs: usize, granularity: Granularity) -> BenchResult<Self> {
        if iterations < 2 {
            return Err(BenchError::Config(format!(
                "iteration count must be >= 2 (got {iterations})"
            )));
        }
        Ok(Self {
            iterations,
            warmup_runs,
            granularity,
        })
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Warm up, then time `iterations` calls of `kernel`.
    ///
    /// `kernel` receives the iteration index (warm-up runs are not indexed).
    pub fn run<F>(&self, label: &str, mut kernel: F) -> TimingSeries
    where
        F: FnMut(usize),
    {
        for i in 0..self.warmup_runs {
            log::debug!("{label}: warm-up {i}");
            kernel(i);
        }
        let mut series = TimingSeries::with_capacity(self.iterations);
        for iter in 0..self.iterations {
            let t0 = now();
            kernel(iter);
            let secs = elapsed(t0, now());
            if self.check_sample(label, iter, secs) {
                series.mark_unreliable(iter);
            }
            series.push(secs);
        }
        series
    }

    /// Time a group of kernels that must run in a fixed order each trial.
    ///
    /// Returns one series per kernel. Each warm-up run executes the whole
    /// group in order; chained kernels whose shared state must not advance
    /// should be timed by a harness built with zero warm-up runs.
    pub fn run_group<K, F>(&self, kernels: &[K], label: impl Fn(&K) -> String, mut run: F) -> Vec<TimingSeries>
    where
        F: FnMut(&K, usize),
    {
        for i in 0..self.warmup_runs {
            for kernel in kernels {
                log::debug!("{}: warm-up {i}", label(kernel));
                run(kernel, i);
            }
        }
        let mut series = vec![TimingSeries::with_capacity(self.iterations); kernels.len()];
        for iter in 0..self.iterations {
            for (kernel, out) in kernels.iter().zip(series.iter_mut()) {
                let t0 = now();
                run(kernel, iter);
                let secs = elapsed(t0, now());
                if self.check_sample(&label(kernel), iter, secs) {
                    out.mark_unreliable(iter);
                }
                out.push(secs);
            }
        }
        series
    }

    /// Warn when a sample is too short for the clock to resolve. Iteration 0
    /// is exempt since it never reaches the statistics. Returns whether it warned.
    fn check_sample(&self, label: &str, iter: usize, secs: f64) -> bool {
        let unreliable = iter > 0 && !self.granularity.is_reliable(secs);
        if unreliable {
            log::warn!(
                "{label}: iteration {iter} took {:.1} us, only {} clock ticks (granularity {} us); \
                 increase the problem size for reliable timings",
                secs * 1e6,
                self.granularity.ticks(secs),
                self.granularity.micros()
            );
        }
        unreliable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harness(iterations: usize, warmup: usize) -> Harness {
        Harness::new(iterations, warmup, Granularity::from_micros(1)).unwrap()
    }

    #[test]
    fn test_aggregate_drops_first_sample() {
        let series = TimingSeries::from_samples(vec![5.0, 1.0, 3.0, 1.0, 9.0, 2.0]);
        let stats = series.aggregate().unwrap();
        assert_eq!(stats.min_time, 1.0);
        assert_eq!(stats.max_time, 9.0);
        assert!((stats.avg_time - 3.2).abs() < 1e-12);
        assert_eq!(stats.samples, 5);
    }

    #[test]
    fn test_aggregate_requires_two_samples() {
        assert!(TimingSeries::from_samples(vec![1.0]).aggregate().is_err());
        assert!(TimingSeries::default().aggregate().is_err());
        let stats = TimingSeries::from_samples(vec![100.0, 2.0]).aggregate().unwrap();
        assert_eq!(stats.min_time, 2.0);
        assert_eq!(stats.max_time, 2.0);
    }

    #[test]
    fn test_new_rejects_fewer_than_two_iterations() {
        for n in [0, 1] {
            let err = Harness::new(n, 1, Granularity::from_micros(1)).unwrap_err();
            assert!(matches!(err, BenchError::Config(_)));
        }
        assert!(Harness::new(2, 0, Granularity::from_micros(1)).is_ok());
    }

    #[test]
    fn test_run_counts_warmup_and_iterations() {
        let h = harness(6, 2);
        let mut calls = 0;
        let series = h.run("count", |_| calls += 1);
        assert_eq!(calls, 8);
        assert_eq!(series.len(), 6);
        assert!(series.samples().iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn test_run_group_order_and_shape() {
        let h = harness(3, 0);
        let mut order = Vec::new();
        let series = h.run_group(&["x", "y"], |k| k.to_string(), |k, iter| order.push((*k, iter)));
        assert_eq!(series.len(), 2);
        assert!(series.iter().all(|s| s.len() == 3));
        assert_eq!(
            order,
            vec![("x", 0), ("y", 0), ("x", 1), ("y", 1), ("x", 2), ("y", 2)]
        );
    }

    #[test]
    fn test_run_group_warms_whole_group() {
        let h = harness(2, 1);
        let mut order = Vec::new();
        let series = h.run_group(&["x", "y"], |k| k.to_string(), |k, iter| order.push((*k, iter)));
        assert!(series.iter().all(|s| s.len() == 2));
        assert_eq!(
            order,
            vec![("x", 0), ("y", 0), ("x", 0), ("y", 0), ("x", 1), ("y", 1)]
        );
    }

    #[test]
    fn test_short_samples_flagged_except_first() {
        let coarse = Granularity::from_micros(1_000_000);
        let h = Harness::new(4, 0, coarse).unwrap();

        let series = h.run("noop", |_| {});
        assert_eq!(series.unreliable(), &[1, 2, 3]);
        assert!(series.aggregate().is_ok());

        let group = h.run_group(&[0u8, 1], |k| k.to_string(), |_, _| {});
        for s in &group {
            assert_eq!(s.unreliable(), &[1, 2, 3]);
        }
    }

    #[test]
    fn test_long_samples_not_flagged() {
        let h = harness(3, 0);
        let series = h.run("sleep", |_| std::thread::sleep(std::time::Duration::from_millis(1)));
        assert!(series.unreliable().is_empty());
    }

    #[test]
    fn test_run_measures_sleep() {
        let h = harness(3, 0);
        let stats = h
            .run("sleep", |_| std::thread::sleep(std::time::Duration::from_millis(1)))
            .aggregate()
            .unwrap();
        assert!(stats.min_time >= 0.001);
        assert!(stats.min_time <= stats.avg_time && stats.avg_time <= stats.max_time);
    }
}
