//! Report payload and rendering.
//!
//! A [`BenchReport`] holds everything one suite produced: configuration echo,
//! per-iteration timings, verification verdicts, and the final table. The
//! text renderer follows the STREAM layout; JSON goes through serde_json.

use serde::Serialize;

use crate::harness::{TimingSeries, TrialStats};
use crate::profiling::counters::{best_rate, parallel_efficiency, speedup, OpWorkload, RateUnit};
use crate::validation::Mismatch;

/// One row of the final table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub label: String,
    pub best_rate: f64,
    pub rate_unit: RateUnit,
    pub avg_time: f64,
    pub min_time: f64,
    pub max_time: f64,
}

impl ReportRow {
    pub fn new(label: impl Into<String>, workload: OpWorkload, stats: &TrialStats) -> Self {
        let (best_rate, rate_unit) = best_rate(workload, stats.min_time);
        Self {
            label: label.into(),
            best_rate,
            rate_unit,
            avg_time: stats.avg_time,
            min_time: stats.min_time,
            max_time: stats.max_time,
        }
    }
}

/// Per-iteration timings of one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationLog {
    pub label: String,
    pub seconds: Vec<f64>,
    /// Rate per iteration, in the row's unit.
    pub rates: Vec<f64>,
}

impl IterationLog {
    pub fn new(label: impl Into<String>, workload: OpWorkload, series: &TimingSeries) -> Self {
        Self {
            label: label.into(),
            seconds: series.samples().to_vec(),
            rates: series.samples().iter().map(|&s| best_rate(workload, s).0).collect(),
        }
    }
}

/// Speedup of a parallel variant over the serial baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalingLine {
    pub label: String,
    pub speedup: f64,
    pub efficiency_pct: f64,
}

impl ScalingLine {
    pub fn new(label: impl Into<String>, serial_min: f64, parallel_min: f64, threads: usize) -> Self {
        let s = speedup(serial_min, parallel_min);
        Self {
            label: label.into(),
            speedup: s,
            efficiency_pct: parallel_efficiency(s, threads),
        }
    }
}

/// Verification outcome of one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictLine {
    pub label: String,
    pub passed: bool,
    pub errors: usize,
    /// The first few out-of-tolerance elements, for machine consumers.
    pub mismatches: Vec<Mismatch>,
    /// Rendered text lines; the table shows these instead of `mismatches`.
    #[serde(skip)]
    pub details: Vec<String>,
}

/// Everything a suite reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BenchReport {
    pub title: String,
    /// Configuration echo, as (key, value) pairs.
    pub config: Vec<(String, String)>,
    /// Free-form notes (clock granularity, timing probe).
    pub notes: Vec<String>,
    pub iterations: Vec<IterationLog>,
    pub verdicts: Vec<VerdictLine>,
    pub rows: Vec<ReportRow>,
    pub scaling: Vec<ScalingLine>,
}

impl BenchReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn echo(&mut self, key: impl Into<String>, value: impl ToString) {
        self.config.push((key.into(), value.to_string()));
    }

    pub fn note(&mut self, line: impl Into<String>) {
        self.notes.push(line.into());
    }

    pub fn all_passed(&self) -> bool {
        self.verdicts.iter().all(|v| v.passed)
    }

    /// Look up a row by label.
    pub fn row(&self, label: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Render as a fixed-width text report.
    pub fn to_table(&self) -> String {
        let sep = "-".repeat(70);
        let mut s = String::with_capacity(2048);
        s.push_str(&format!("{sep}\n{}\n{sep}\n", self.title));
        for (k, v) in &self.config {
            s.push_str(&format!("{k:<28} {v}\n"));
        }
        if !self.notes.is_empty() {
            s.push_str(&format!("{sep}\n"));
            for n in &self.notes {
                s.push_str(&format!("{n}\n"));
            }
        }
        for log in &self.iterations {
            let unit = self
                .row(&log.label)
                .map(|r| r.rate_unit.as_str())
                .unwrap_or("");
            s.push_str(&format!("\n{}:\n", log.label));
            for (i, (secs, rate)) in log.seconds.iter().zip(&log.rates).enumerate() {
                s.push_str(&format!("  Iteration {:2}: {secs:.6} seconds ({rate:.2} {unit})\n", i + 1));
            }
        }
        if !self.verdicts.is_empty() {
            s.push_str(&format!("{sep}\n"));
            for v in &self.verdicts {
                s.push_str(&format!("{}:\n", v.label));
                for d in &v.details {
                    s.push_str(&format!("  {d}\n"));
                }
            }
        }
        s.push_str(&format!("{sep}\n"));
        s.push_str(&format!(
            "{:<22} {:>14}  {:>11}  {:>11}  {:>11}\n",
            "Function", "Best Rate", "Avg time", "Min time", "Max time"
        ));
        for r in &self.rows {
            s.push_str(&format!(
                "{:<22} {:>7.2} {:<6}  {:>11.6}  {:>11.6}  {:>11.6}\n",
                format!("{}:", r.label),
                r.best_rate,
                r.rate_unit.as_str(),
                r.avg_time,
                r.min_time,
                r.max_time
            ));
        }
        if !self.scaling.is_empty() {
            s.push_str(&format!("{sep}\n"));
            for l in &self.scaling {
                s.push_str(&format!(
                    "{:<22} speedup {:>6.2}x   efficiency {:>6.2}%\n",
                    format!("{}:", l.label),
                    l.speedup,
                    l.efficiency_pct
                ));
            }
        }
        s.push_str(&format!("{sep}\n"));
        s
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}
