//! Result verification for benchmarked kernels.
//!
//! Two policies, catching different failure classes:
//!
//! - [`compare_buffers`]: elementwise worst case against a reference buffer
//!   (isolated corruption in matmul / vector add).
//! - [`check_analytic`]: mean relative error of the STREAM arrays against the
//!   scalar trajectory of the kernel recurrence (systematic drift).

use crate::error::{check_len, BenchResult};
use crate::kernels::stream::STREAM_INIT;
use crate::types::{Elem, ELEM_BYTES};

/// Mismatches kept for reporting; the total count is always exact.
pub const MAX_REPORTED_MISMATCHES: usize = 5;

/// Default tolerance for matrix multiply comparisons.
pub const MATMUL_TOLERANCE: f64 = 1e-6;

/// Default tolerance for vector add comparisons.
pub const VECADD_TOLERANCE: f64 = 1e-9;

/// Acceptable mean relative error for an element of `bytes` width.
pub fn epsilon_for_width(bytes: usize) -> f64 {
    match bytes {
        8 => 1e-13,
        4 => 1e-6,
        other => {
            log::warn!("unexpected element width {other} bytes; using 1e-6");
            1e-6
        }
    }
}

/// One out-of-tolerance element.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Mismatch {
    pub index: usize,
    pub expected: f64,
    pub observed: f64,
    pub abs_diff: f64,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "index {}: {:.6} != {:.6} (diff: {:.6e})",
            self.index, self.expected, self.observed, self.abs_diff
        )
    }
}

/// Analytic check outcome for one STREAM array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayCheck {
    pub name: &'static str,
    pub expected: f64,
    pub avg_abs_err: f64,
    pub avg_rel_err: f64,
    pub passed: bool,
    /// Elements whose relative error exceeds epsilon (counted only on failure).
    pub errors: usize,
}

/// Outcome of verifying one kernel variant.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    /// Total erroneous elements.
    pub errors: usize,
    /// The first [`MAX_REPORTED_MISMATCHES`] erroneous elements.
    pub mismatches: Vec<Mismatch>,
    /// Tolerance (elementwise) or epsilon (analytic) used.
    pub tolerance: f64,
    /// Per-array detail for the analytic check; empty otherwise.
    pub arrays: Vec<ArrayCheck>,
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        self.errors == 0 && self.arrays.iter().all(|a| a.passed)
    }

    pub fn verdict(&self) -> &'static str {
        if self.passed() {
            "PASSED"
        } else {
            "FAILED"
        }
    }

    /// Human-readable lines describing the outcome.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.arrays.is_empty() {
            if self.passed() {
                lines.push("Verification: PASSED".to_string());
            } else {
                for m in &self.mismatches {
                    lines.push(format!("  Error at {m}"));
                }
                lines.push(format!("Verification: FAILED ({} errors)", self.errors));
            }
            return lines;
        }
        for a in self.arrays.iter().filter(|a| !a.passed) {
            lines.push(format!(
                "Failed Validation on array {}[], AvgRelAbsErr > epsilon ({:e})",
                a.name, self.tolerance
            ));
            lines.push(format!(
                "     Expected Value: {:e}, AvgAbsErr: {:e}, AvgRelAbsErr: {:e}",
                a.expected, a.avg_abs_err, a.avg_rel_err
            ));
            lines.push(format!("     For array {}[], {} errors were found.", a.name, a.errors));
        }
        for m in &self.mismatches {
            lines.push(format!("     {m}"));
        }
        if self.passed() {
            lines.push(format!(
                "Solution Validates: avg error less than {:e} on all three arrays",
                self.tolerance
            ));
        }
        lines
    }
}

/// Compare `candidate` against `reference` elementwise.
///
/// Element i is erroneous when `|reference[i] - candidate[i]| > tolerance`.
pub fn compare_buffers(reference: &[Elem], candidate: &[Elem], tolerance: f64) -> BenchResult<VerificationResult> {
    check_len("candidate buffer", candidate.len(), reference.len())?;
    let mut errors = 0usize;
    let mut mismatches = Vec::new();
    for (index, (&expected, &observed)) in reference.iter().zip(candidate).enumerate() {
        let abs_diff = (expected - observed).abs();
        if abs_diff > tolerance || abs_diff.is_nan() {
            errors += 1;
            if mismatches.len() < MAX_REPORTED_MISMATCHES {
                mismatches.push(Mismatch {
                    index,
                    expected,
                    observed,
                    abs_diff,
                });
            }
        }
    }
    Ok(VerificationResult {
        errors,
        mismatches,
        tolerance,
        arrays: Vec::new(),
    })
}

/// Initial values and scalar of the STREAM recurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamRecurrence {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub scalar: f64,
}

impl StreamRecurrence {
    /// Classic start: a = 1, b = 2, c = 0.
    pub fn new(scalar: f64) -> Self {
        let (a, b, c) = STREAM_INIT;
        Self { a, b, c, scalar }
    }

    /// Account for a pass that scaled `a` before the trials (the timing probe).
    #[must_use]
    pub fn with_prescaled_a(mut self, factor: f64) -> Self {
        self.a *= factor;
        self
    }

    /// Expected (a, b, c) after `iterations` Copy → Scale → Add → Triad trials.
    pub fn expected_after(&self, iterations: usize) -> (f64, f64, f64) {
        let (mut a, mut b, mut c) = (self.a, self.b, self.c);
        for _ in 0..iterations {
            c = a;
            b = self.scalar * c;
            c = a + b;
            a = b + self.scalar * c;
        }
        (a, b, c)
    }
}

/// Verify the STREAM arrays against the analytic trajectory.
pub fn check_analytic(
    a: &[Elem],
    b: &[Elem],
    c: &[Elem],
    recurrence: &StreamRecurrence,
    iterations: usize,
) -> BenchResult<VerificationResult> {
    check_len("STREAM array b", b.len(), a.len())?;
    check_len("STREAM array c", c.len(), a.len())?;
    let epsilon = epsilon_for_width(ELEM_BYTES);
    let (aj, bj, cj) = recurrence.expected_after(iterations);

    let mut arrays = Vec::with_capacity(3);
    let mut mismatches = Vec::new();
    let mut errors = 0usize;
    for (name, data, expected) in [("a", a, aj), ("b", b, bj), ("c", c, cj)] {
        let check = check_array(name, data, expected, epsilon, &mut mismatches);
        errors += check.errors;
        arrays.push(check);
    }
    Ok(VerificationResult {
        errors,
        mismatches,
        tolerance: epsilon,
        arrays,
    })
}

fn check_array(
    name: &'static str,
    data: &[Elem],
    expected: f64,
    epsilon: f64,
    mismatches: &mut Vec<Mismatch>,
) -> ArrayCheck {
    let n = data.len().max(1) as f64;
    let sum_err: f64 = data.iter().map(|&v| (v - expected).abs()).sum();
    let avg_abs_err = sum_err / n;
    let avg_rel_err = relative(avg_abs_err, expected);
    let passed = avg_rel_err <= epsilon;

    let mut errors = 0;
    if !passed {
        for (index, &observed) in data.iter().enumerate() {
            let abs_diff = (observed - expected).abs();
            if relative(abs_diff, expected) > epsilon || abs_diff.is_nan() {
                errors += 1;
                if mismatches.len() < MAX_REPORTED_MISMATCHES {
                    mismatches.push(Mismatch {
                        index,
                        expected,
                        observed,
                        abs_diff,
                    });
                }
            }
        }
        log::warn!(
            "array {name}[]: AvgRelAbsErr {avg_rel_err:e} > epsilon {epsilon:e}, {errors} bad elements"
        );
    }
    ArrayCheck {
        name,
        expected,
        avg_abs_err,
        avg_rel_err,
        passed,
        errors,
    }
}

#[inline]
fn relative(abs_err: f64, expected: f64) -> f64 {
    if expected == 0.0 {
        abs_err
    } else {
        abs_err / expected.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsilon_for_width() {
        assert_eq!(epsilon_for_width(8), 1e-13);
        assert_eq!(epsilon_for_width(4), 1e-6);
        assert_eq!(epsilon_for_width(2), 1e-6);
    }

    #[test]
    fn test_compare_identical() {
        let v = vec![1.0, 2.0, 3.0];
        let r = compare_buffers(&v, &v, 1e-9).unwrap();
        assert!(r.passed());
        assert_eq!(r.errors, 0);
        assert_eq!(r.describe(), vec!["Verification: PASSED".to_string()]);
    }

    #[test]
    fn test_compare_caps_reported_mismatches() {
        let reference = vec![0.0; 20];
        let mut candidate = reference.clone();
        for v in candidate.iter_mut().skip(3).take(8) {
            *v = 1.0;
        }
        let r = compare_buffers(&reference, &candidate, 1e-6).unwrap();
        assert!(!r.passed());
        assert_eq!(r.errors, 8);
        assert_eq!(r.mismatches.len(), MAX_REPORTED_MISMATCHES);
        assert_eq!(r.mismatches[0].index, 3);
        assert_eq!(r.mismatches[0].abs_diff, 1.0);
        assert!(r.describe().last().unwrap().contains("8 errors"));
    }

    #[test]
    fn test_compare_tolerance_boundary() {
        let r = compare_buffers(&[1.0], &[1.0 + 5e-7], 1e-6).unwrap();
        assert!(r.passed());
        let r = compare_buffers(&[1.0], &[1.0 + 2e-6], 1e-6).unwrap();
        assert!(!r.passed());
    }

    #[test]
    fn test_compare_flags_nan() {
        let r = compare_buffers(&[1.0, 2.0], &[1.0, f64::NAN], 1e-6).unwrap();
        assert_eq!(r.errors, 1);
    }

    #[test]
    fn test_compare_length_mismatch() {
        assert!(compare_buffers(&[1.0, 2.0], &[1.0], 1e-6).is_err());
    }

    #[test]
    fn test_recurrence_closed_form() {
        // Each trial maps a -> 15a, so after k trials:
        // a = 15^k, b = 3 * 15^(k-1), c = 4 * 15^(k-1).
        let (a, b, c) = StreamRecurrence::new(3.0).expected_after(10);
        assert_eq!(a, 576_650_390_625.0);
        assert_eq!(b, 115_330_078_125.0);
        assert_eq!(c, 153_773_437_500.0);

        let (a, _, _) = StreamRecurrence::new(3.0).with_prescaled_a(2.0).expected_after(1);
        assert_eq!(a, 30.0);
    }

    #[test]
    fn test_recurrence_zero_iterations() {
        let r = StreamRecurrence::new(3.0);
        assert_eq!(r.expected_after(0), (1.0, 2.0, 0.0));
        // c expected 0: relative error falls back to absolute.
        let v = check_analytic(&[1.0; 4], &[2.0; 4], &[0.0; 4], &r, 0).unwrap();
        assert!(v.passed());
    }

    #[test]
    fn test_check_analytic_detects_perturbation() {
        let rec = StreamRecurrence::new(3.0);
        let (aj, bj, cj) = rec.expected_after(10);
        let n = 100;
        let a = vec![aj; n];
        let b = vec![bj; n];
        let mut c = vec![cj; n];

        let ok = check_analytic(&a, &b, &c, &rec, 10).unwrap();
        assert!(ok.passed(), "{:?}", ok.describe());
        assert!(ok.describe().last().unwrap().starts_with("Solution Validates"));

        c[17] *= 1.001;
        let bad = check_analytic(&a, &b, &c, &rec, 10).unwrap();
        assert!(!bad.passed());
        assert_eq!(bad.errors, 1);
        assert_eq!(bad.mismatches[0].index, 17);
        let failed: Vec<_> = bad.arrays.iter().filter(|x| !x.passed).map(|x| x.name).collect();
        assert_eq!(failed, vec!["c"]);
    }
}
