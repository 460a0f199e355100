//! The four STREAM kernels over one buffer triple.
//!
//! ```text
//! Copy:   c = a
//! Scale:  b = scalar * c
//! Add:    c = a + b
//! Triad:  a = b + scalar * c
//! ```
//!
//! A trial runs them in this order. Triad writes `a`, which the next trial's
//! Copy reads, so successive trials form a closed loop over the same arrays.

use crate::error::BenchResult;
use crate::parallel::{parallel_for, Chunking, ParallelRuntime};
use crate::types::{try_alloc, Buffer, Elem, ELEM_BYTES};

/// Initial array values used by the classic STREAM setup.
pub const STREAM_INIT: (Elem, Elem, Elem) = (1.0, 2.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKernel {
    Copy,
    Scale,
    Add,
    Triad,
}

impl StreamKernel {
    /// Execution order within one trial.
    pub const ALL: [StreamKernel; 4] = [
        StreamKernel::Copy,
        StreamKernel::Scale,
        StreamKernel::Add,
        StreamKernel::Triad,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StreamKernel::Copy => "Copy",
            StreamKernel::Scale => "Scale",
            StreamKernel::Add => "Add",
            StreamKernel::Triad => "Triad",
        }
    }

    /// Array words read + written per element.
    pub fn words_per_element(&self) -> usize {
        match self {
            StreamKernel::Copy | StreamKernel::Scale => 2,
            StreamKernel::Add | StreamKernel::Triad => 3,
        }
    }

    /// Floating-point operations per element.
    pub fn flops_per_element(&self) -> usize {
        match self {
            StreamKernel::Copy => 0,
            StreamKernel::Scale | StreamKernel::Add => 1,
            StreamKernel::Triad => 2,
        }
    }

    /// Bytes moved by one invocation over `len` elements.
    pub fn bytes(&self, len: usize) -> u64 {
        (self.words_per_element() * ELEM_BYTES) as u64 * len as u64
    }
}

// ── Slice kernels ───────────────────────────────────────────────────────

pub fn copy(dst: &mut [Elem], src: &[Elem]) {
    assert_eq!(dst.len(), src.len());
    dst.copy_from_slice(src);
}

pub fn scale(dst: &mut [Elem], src: &[Elem], scalar: Elem) {
    assert_eq!(dst.len(), src.len());
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = scalar * s;
    }
}

pub fn add(dst: &mut [Elem], x: &[Elem], y: &[Elem]) {
    assert!(dst.len() == x.len() && dst.len() == y.len());
    for ((d, &p), &q) in dst.iter_mut().zip(x).zip(y) {
        *d = p + q;
    }
}

pub fn triad(dst: &mut [Elem], x: &[Elem], y: &[Elem], scalar: Elem) {
    assert!(dst.len() == x.len() && dst.len() == y.len());
    for ((d, &p), &q) in dst.iter_mut().zip(x).zip(y) {
        *d = p + scalar * q;
    }
}

pub fn copy_parallel(rt: &ParallelRuntime, dst: &mut [Elem], src: &[Elem]) {
    assert_eq!(dst.len(), src.len());
    parallel_for(rt, dst, 1, Chunking::Static, |first, out| {
        copy(out, &src[first..first + out.len()])
    });
}

pub fn scale_parallel(rt: &ParallelRuntime, dst: &mut [Elem], src: &[Elem], scalar: Elem) {
    assert_eq!(dst.len(), src.len());
    parallel_for(rt, dst, 1, Chunking::Static, |first, out| {
        scale(out, &src[first..first + out.len()], scalar)
    });
}

pub fn add_parallel(rt: &ParallelRuntime, dst: &mut [Elem], x: &[Elem], y: &[Elem]) {
    assert!(dst.len() == x.len() && dst.len() == y.len());
    parallel_for(rt, dst, 1, Chunking::Static, |first, out| {
        let end = first + out.len();
        add(out, &x[first..end], &y[first..end])
    });
}

pub fn triad_parallel(rt: &ParallelRuntime, dst: &mut [Elem], x: &[Elem], y: &[Elem], scalar: Elem) {
    assert!(dst.len() == x.len() && dst.len() == y.len());
    parallel_for(rt, dst, 1, Chunking::Static, |first, out| {
        let end = first + out.len();
        triad(out, &x[first..end], &y[first..end], scalar)
    });
}

// ── Buffer triple ───────────────────────────────────────────────────────

/// The a/b/c arrays shared by all four kernels for a whole session.
#[derive(Debug, Clone)]
pub struct StreamArrays {
    pub a: Buffer,
    pub b: Buffer,
    pub c: Buffer,
}

impl StreamArrays {
    /// Allocate three zeroed arrays of `len` elements.
    pub fn new(len: usize) -> BenchResult<Self> {
        Ok(Self {
            a: try_alloc("STREAM array a", len)?,
            b: try_alloc("STREAM array b", len)?,
            c: try_alloc("STREAM array c", len)?,
        })
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Total bytes held by the three arrays.
    pub fn footprint_bytes(&self) -> usize {
        3 * self.len() * ELEM_BYTES
    }

    /// Set every element of a, b, c to the given constants.
    pub fn fill(&mut self, rt: &ParallelRuntime, a: Elem, b: Elem, c: Elem) {
        for (buf, value) in [(&mut self.a, a), (&mut self.b, b), (&mut self.c, c)] {
            parallel_for(rt, buf, 1, Chunking::Static, |_, out| out.fill(value));
        }
    }

    /// `a[j] *= factor`, used as the timing probe before the trials.
    pub fn scale_a(&mut self, rt: &ParallelRuntime, factor: Elem) {
        parallel_for(rt, &mut self.a, 1, Chunking::Static, |_, out| {
            for v in out.iter_mut() {
                *v *= factor;
            }
        });
    }

    /// Run one kernel; `rt == None` selects the serial variant.
    pub fn run(&mut self, kernel: StreamKernel, scalar: Elem, rt: Option<&ParallelRuntime>) {
        let Self { a, b, c } = self;
        match (kernel, rt) {
            (StreamKernel::Copy, None) => copy(c, a),
            (StreamKernel::Scale, None) => scale(b, c, scalar),
            (StreamKernel::Add, None) => add(c, a, b),
            (StreamKernel::Triad, None) => triad(a, b, c, scalar),
            (StreamKernel::Copy, Some(rt)) => copy_parallel(rt, c, a),
            (StreamKernel::Scale, Some(rt)) => scale_parallel(rt, b, c, scalar),
            (StreamKernel::Add, Some(rt)) => add_parallel(rt, c, a, b),
            (StreamKernel::Triad, Some(rt)) => triad_parallel(rt, a, b, c, scalar),
        }
    }

    /// One full Copy → Scale → Add → Triad trial.
    pub fn run_trial(&mut self, scalar: Elem, rt: Option<&ParallelRuntime>) {
        for kernel in StreamKernel::ALL {
            self.run(kernel, scalar, rt);
        }
    }
}
