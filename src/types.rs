//! Element type and buffer allocation shared by every kernel.

use crate::error::{BenchError, BenchResult};

/// Element type of every benchmark buffer.
pub type Elem = f64;

/// Bytes per buffer element.
pub const ELEM_BYTES: usize = std::mem::size_of::<Elem>();

/// A fixed-length, contiguous run of elements owned by the session.
pub type Buffer = Vec<Elem>;

/// Allocate a zero-filled buffer, reporting failure instead of aborting.
///
/// Uses `try_reserve_exact` so an oversized request surfaces as
/// [`BenchError::Allocation`] before any timing starts.
pub fn try_alloc(what: &'static str, elements: usize) -> BenchResult<Buffer> {
    if elements == 0 {
        return Err(BenchError::Config(format!("{what} must have at least one element")));
    }
    let fail = || BenchError::Allocation { what, elements };
    elements.checked_mul(ELEM_BYTES).ok_or_else(fail)?;
    let mut buf = Buffer::new();
    buf.try_reserve_exact(elements).map_err(|_| fail())?;
    buf.resize(elements, 0.0);
    Ok(buf)
}

/// Number of elements in an n×n matrix, with overflow check.
#[inline]
pub fn matrix_len(n: usize) -> BenchResult<usize> {
    n.checked_mul(n).ok_or(BenchError::Allocation {
        what: "matrix",
        elements: usize::MAX,
    })
}

/// Format a byte count as MiB.
#[inline]
pub fn mib(bytes: usize) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Format a byte count as GiB.
#[inline]
pub fn gib(bytes: usize) -> f64 {
    bytes as f64 / (1024.0 * 1024.0 * 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_alloc_zeroed() {
        let buf = try_alloc("test", 16).unwrap();
        assert_eq!(buf.len(), 16);
        assert!(buf.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_try_alloc_rejects_empty() {
        assert!(matches!(try_alloc("empty", 0), Err(BenchError::Config(_))));
    }

    #[test]
    fn test_try_alloc_overflow() {
        let err = try_alloc("huge", usize::MAX).unwrap_err();
        assert!(matches!(err, BenchError::Allocation { what: "huge", .. }));
    }

    #[test]
    fn test_matrix_len() {
        assert_eq!(matrix_len(1024).unwrap(), 1024 * 1024);
        assert!(matches!(matrix_len(usize::MAX), Err(BenchError::Allocation { .. })));
    }
}
