//! Error taxonomy for benchmark sessions.
//!
//! Verification failures are deliberately *not* errors: they are reported
//! through [`crate::validation::VerificationResult`] so the remaining kernel
//! variants still run. Clock granularity problems are only logged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("failed to allocate {what} ({elements} elements)")]
    Allocation { what: &'static str, elements: usize },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{what} length {actual} != expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BenchResult<T> = Result<T, BenchError>;

impl BenchError {
    /// True for errors that must stop the process before any timing happens.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BenchError::Allocation { .. }
                | BenchError::Config(_)
                | BenchError::Io(_)
                | BenchError::Json(_)
        )
    }
}

/// Check a buffer length against its expected size.
#[inline]
pub fn check_len(what: &'static str, actual: usize, expected: usize) -> BenchResult<()> {
    if actual != expected {
        return Err(BenchError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
