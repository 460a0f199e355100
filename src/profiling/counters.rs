//! FLOP/byte accounting and derived throughput metrics.
//!
//! Counts are theoretical, computed from the problem size. Rates always use
//! the *minimum* observed time (the least-perturbed run).

use crate::kernels::StreamKernel;
use crate::types::ELEM_BYTES;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Describes the work done by one kernel invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpWorkload {
    /// Compute-bound: reported in GFLOPS.
    Compute { flops: u64 },
    /// Both counts known; reported by bandwidth.
    Mixed { flops: u64, bytes: u64 },
}

impl OpWorkload {
    pub fn flops(&self) -> u64 {
        match *self {
            OpWorkload::Compute { flops } | OpWorkload::Mixed { flops, .. } => flops,
        }
    }

    pub fn bytes(&self) -> u64 {
        match *self {
            OpWorkload::Mixed { bytes, .. } => bytes,
            OpWorkload::Compute { .. } => 0,
        }
    }
}

/// n×n matrix multiply: 2n³ FLOPs (one multiply + one add per term).
pub fn gemm_workload(n: usize) -> OpWorkload {
    let n = n as u64;
    OpWorkload::Compute { flops: 2 * n * n * n }
}

/// Vector add: reads 2n, writes n elements.
pub fn vec_add_workload(n: usize) -> OpWorkload {
    OpWorkload::Mixed {
        flops: n as u64,
        bytes: 3 * n as u64 * ELEM_BYTES as u64,
    }
}

/// One STREAM kernel over `len` elements.
pub fn stream_workload(kernel: StreamKernel, len: usize) -> OpWorkload {
    OpWorkload::Mixed {
        flops: (kernel.flops_per_element() * len) as u64,
        bytes: kernel.bytes(len),
    }
}

/// GFLOPS = flops / seconds / 1e9. Zero for a non-positive time.
#[inline]
pub fn gflops(flops: u64, secs: f64) -> f64 {
    if secs > 0.0 {
        flops as f64 / secs / 1e9
    } else {
        0.0
    }
}

/// Bandwidth in GB/s (2^30 bytes). Zero for a non-positive time.
#[inline]
pub fn bandwidth_gbs(bytes: u64, secs: f64) -> f64 {
    if secs > 0.0 {
        bytes as f64 / secs / GIB
    } else {
        0.0
    }
}

/// serial time / parallel time.
#[inline]
pub fn speedup(serial_min: f64, parallel_min: f64) -> f64 {
    if parallel_min > 0.0 {
        serial_min / parallel_min
    } else {
        0.0
    }
}

/// Speedup per thread, as a percentage.
#[inline]
pub fn parallel_efficiency(speedup: f64, threads: usize) -> f64 {
    speedup / threads.max(1) as f64 * 100.0
}

/// Unit of a report's "best rate" column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RateUnit {
    #[serde(rename = "GFLOPS")]
    Gflops,
    #[serde(rename = "GB/s")]
    GBs,
}

impl RateUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateUnit::Gflops => "GFLOPS",
            RateUnit::GBs => "GB/s",
        }
    }
}

/// The headline rate for a workload: GFLOPS if compute-bound, else GB/s.
pub fn best_rate(workload: OpWorkload, secs: f64) -> (f64, RateUnit) {
    match workload {
        OpWorkload::Compute { flops } => (gflops(flops, secs), RateUnit::Gflops),
        OpWorkload::Mixed { bytes, .. } => (bandwidth_gbs(bytes, secs), RateUnit::GBs),
    }
}
