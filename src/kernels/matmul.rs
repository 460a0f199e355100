//! Square matrix multiply `C = A·B` in ijk order.
//!
//! Three execution strategies over identical math:
//! - serial,
//! - rows of C split across workers,
//! - the flattened (i, j) cell space split across workers.
//!
//! Each cell keeps its own accumulator and sums k in ascending order, so all
//! three produce bit-identical output for any thread count.

use crate::parallel::{parallel_for, Chunking, ParallelRuntime};
use crate::types::Elem;

/// Execution strategy for matrix multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatmulVariant {
    Serial,
    ParallelRows,
    ParallelCollapsed,
}

impl MatmulVariant {
    pub const ALL: [MatmulVariant; 3] = [
        MatmulVariant::Serial,
        MatmulVariant::ParallelRows,
        MatmulVariant::ParallelCollapsed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MatmulVariant::Serial => "Serial",
            MatmulVariant::ParallelRows => "Parallel",
            MatmulVariant::ParallelCollapsed => "Parallel (collapse)",
        }
    }

    pub fn is_parallel(&self) -> bool {
        !matches!(self, MatmulVariant::Serial)
    }

    /// Run this strategy.
    #[inline]
    pub fn run(&self, rt: &ParallelRuntime, a: &[Elem], b: &[Elem], c: &mut [Elem], n: usize) {
        match self {
            MatmulVariant::Serial => matmul_serial(a, b, c, n),
            MatmulVariant::ParallelRows => matmul_parallel_rows(rt, a, b, c, n),
            MatmulVariant::ParallelCollapsed => matmul_parallel_collapsed(rt, a, b, c, n),
        }
    }
}

/// Fill an n×n matrix with `((i + j + seed) % 100) / 10`.
pub fn init_matrix(m: &mut [Elem], n: usize, seed: usize) {
    assert_eq!(m.len(), n * n);
    for (idx, v) in m.iter_mut().enumerate() {
        let (i, j) = (idx / n, idx % n);
        *v = ((i + j + seed) % 100) as Elem / 10.0;
    }
}

/// Compute the cells `first .. first + out.len()` of C (row-major cell index).
#[inline]
fn matmul_cells(a: &[Elem], b: &[Elem], n: usize, first: usize, out: &mut [Elem]) {
    for (off, cell) in out.iter_mut().enumerate() {
        let idx = first + off;
        let (i, j) = (idx / n, idx % n);
        let row = &a[i * n..(i + 1) * n];
        let mut sum: Elem = 0.0;
        for (k, &aik) in row.iter().enumerate() {
            sum += aik * b[k * n + j];
        }
        *cell = sum;
    }
}

#[inline]
fn check_shapes(a: &[Elem], b: &[Elem], c: &[Elem], n: usize) {
    let len = n * n;
    assert_eq!(a.len(), len, "A must be n*n");
    assert_eq!(b.len(), len, "B must be n*n");
    assert_eq!(c.len(), len, "C must be n*n");
}

/// Single-threaded reference multiply.
pub fn matmul_serial(a: &[Elem], b: &[Elem], c: &mut [Elem], n: usize) {
    check_shapes(a, b, c, n);
    matmul_cells(a, b, n, 0, c);
}

/// Rows of C distributed across workers in contiguous blocks.
pub fn matmul_parallel_rows(rt: &ParallelRuntime, a: &[Elem], b: &[Elem], c: &mut [Elem], n: usize) {
    check_shapes(a, b, c, n);
    parallel_for(rt, c, n, Chunking::Static, |first, out| {
        matmul_cells(a, b, n, first, out)
    });
}

/// The fused row×column cell space distributed across workers.
pub fn matmul_parallel_collapsed(rt: &ParallelRuntime, a: &[Elem], b: &[Elem], c: &mut [Elem], n: usize) {
    check_shapes(a, b, c, n);
    parallel_for(rt, c, 1, Chunking::Static, |first, out| {
        matmul_cells(a, b, n, first, out)
    });
}
