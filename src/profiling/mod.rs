//! Timing, throughput accounting and report generation.
//!
//! ```rust,no_run
//! use kernbench::profiling::{counters, timer};
//!
//! let workload = counters::gemm_workload(512);
//! let secs = timer::time_it(|| {
//!     // ... run kernel ...
//! });
//! println!("{:.2} GFLOPS", counters::gflops(workload.flops(), secs));
//! ```

pub mod counters;
pub mod report;
pub mod timer;

pub use counters::{OpWorkload, RateUnit};
pub use report::{BenchReport, IterationLog, ReportRow, ScalingLine, VerdictLine};
pub use timer::{Granularity, Stopwatch};
