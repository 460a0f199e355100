//! Fork-join runtime for the parallel kernel variants.
//!
//! One rayon pool is built per session with a fixed thread count. Kernels
//! describe only how their output is partitioned (`unit` + [`Chunking`]);
//! every chunk is a disjoint `&mut` slice, so no locks or atomics are needed.

use rayon::prelude::*;

use crate::error::{BenchError, BenchResult};
use crate::types::Elem;

/// How the output range is split into work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Chunking {
    /// One contiguous block per worker thread.
    #[default]
    Static,
    /// Blocks of a fixed number of units.
    Fixed(usize),
}

/// Thread pool shared by every parallel kernel of a session.
pub struct ParallelRuntime {
    pool: rayon::ThreadPool,
}

impl ParallelRuntime {
    /// Build a pool with `threads` workers; 0 lets rayon use available parallelism.
    pub fn new(threads: usize) -> BenchResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("kernbench-worker{idx}"))
            .build()
            .map_err(|e| BenchError::Config(format!("failed to build thread pool: {e}")))?;
        log::debug!("Thread pool ready: {} workers", pool.current_num_threads());
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `f` inside the pool.
    pub fn install<R, F>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(f)
    }

    /// Count the workers that actually participate in a parallel region.
    pub fn counted_threads(&self) -> usize {
        self.pool.install(|| {
            rayon::broadcast(|_| 1usize).into_iter().sum()
        })
    }
}

/// Elements per work item for an output of `len` elements.
///
/// `unit` is the indivisible grain (a matrix row, or one element).
pub fn chunk_len(len: usize, unit: usize, chunking: Chunking, threads: usize) -> usize {
    let unit = unit.max(1);
    let units = len.div_ceil(unit);
    let units_per_chunk = match chunking {
        Chunking::Static => units.div_ceil(threads.max(1)),
        Chunking::Fixed(k) => k,
    };
    units_per_chunk.max(1) * unit
}

/// Run `body(first_index, chunk)` over disjoint chunks of `out`, then join.
pub fn parallel_for<F>(rt: &ParallelRuntime, out: &mut [Elem], unit: usize, chunking: Chunking, body: F)
where
    F: Fn(usize, &mut [Elem]) + Sync + Send,
{
    if out.is_empty() {
        return;
    }
    let chunk = chunk_len(out.len(), unit, chunking, rt.threads());
    rt.install(|| {
        out.par_chunks_mut(chunk)
            .enumerate()
            .for_each(|(idx, part)| body(idx * chunk, part));
    });
}
