//! kernbench: a parallel compute-kernel benchmark suite.
//!
//! Times dense matrix multiply, vector add and the four STREAM kernels
//! (Copy, Scale, Add, Triad) in serial and parallel variants, verifies the
//! results, and reports throughput, speedup and parallel efficiency.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kernbench::{BenchConfig, BenchSession};
//!
//! let mut session = BenchSession::new(BenchConfig::quick())?;
//! let summary = session.run_all()?;
//! for outcome in &summary.outcomes {
//!     println!("{}", outcome.report.to_table());
//! }
//! # Ok::<(), kernbench::BenchError>(())
//! ```

pub mod config;
pub mod error;
pub mod harness;
pub mod kernels;
pub mod parallel;
pub mod profiling;
pub mod session;
pub mod types;
pub mod validation;

pub use config::{BenchConfig, Suite};
pub use error::{BenchError, BenchResult};
pub use harness::{Harness, TimingSeries, TrialStats};
pub use kernels::{MatmulVariant, StreamArrays, StreamKernel};
pub use parallel::{parallel_for, Chunking, ParallelRuntime};
pub use profiling::{BenchReport, Granularity, ReportRow};
pub use session::{BenchSession, SessionSummary, SuiteOutcome};
pub use types::{Buffer, Elem, ELEM_BYTES};
pub use validation::{check_analytic, compare_buffers, StreamRecurrence, VerificationResult};
