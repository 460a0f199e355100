//! Numeric kernels under measurement.
//!
//! Every kernel borrows its buffers, allocates nothing, and writes only its
//! output. Serial and parallel variants of a kernel share one inner routine,
//! so each output element is accumulated in the same order regardless of
//! how the work is split.

pub mod matmul;
pub mod stream;
pub mod vector;

pub use matmul::{init_matrix, matmul_parallel_collapsed, matmul_parallel_rows, matmul_serial, MatmulVariant};
pub use stream::{StreamKernel, StreamArrays};
pub use vector::{init_vectors, vec_add_parallel, vec_add_serial};
