//! Criterion benchmarks for the kernel library.
//!
//! Kernels: matrix multiply (3 variants), vector add, STREAM Copy/Scale/Add/Triad
//! Reports: element throughput for matrix multiply, byte throughput otherwise

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

#[path = "utils.rs"]
mod utils;

use kernbench::kernels::stream::STREAM_INIT;
use kernbench::kernels::vector::{vec_add_parallel, vec_add_serial};
use kernbench::{MatmulVariant, ParallelRuntime, StreamArrays, StreamKernel};

const MATRIX_SIZES: &[usize] = &[64, 128, 256];
const VECTOR_SIZES: &[usize] = &[1 << 16, 1 << 20, 1 << 22];

fn size_label(n: usize) -> String {
    match n {
        n if n >= 1 << 20 => format!("{}M", n >> 20),
        n if n >= 1 << 10 => format!("{}K", n >> 10),
        _ => format!("{n}"),
    }
}

fn bench_matmul(c: &mut Criterion) {
    let rt = ParallelRuntime::new(0).unwrap();
    let mut group = c.benchmark_group("matmul");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(3));

    for &n in MATRIX_SIZES {
        let a = utils::random_vec(n * n);
        let b = utils::random_vec(n * n);
        let mut out = vec![0.0; n * n];
        group.throughput(Throughput::Elements(utils::matmul_flops(n)));
        for variant in MatmulVariant::ALL {
            group.bench_with_input(BenchmarkId::new(variant.label(), n), &n, |bench, &n| {
                bench.iter(|| {
                    variant.run(&rt, black_box(&a), black_box(&b), &mut out, n);
                    black_box(&out);
                });
            });
        }
    }
    group.finish();
}

fn bench_vec_add(c: &mut Criterion) {
    let rt = ParallelRuntime::new(0).unwrap();
    let mut group = c.benchmark_group("vec_add");
    group.measurement_time(Duration::from_secs(3));

    for &n in VECTOR_SIZES {
        let a = utils::random_vec(n);
        let b = utils::random_vec(n);
        let mut out = vec![0.0; n];
        group.throughput(Throughput::Bytes(utils::vec_add_rw_bytes(n)));
        group.bench_with_input(BenchmarkId::new("serial", size_label(n)), &n, |bench, _| {
            bench.iter(|| vec_add_serial(black_box(&a), black_box(&b), &mut out));
        });
        group.bench_with_input(BenchmarkId::new("parallel", size_label(n)), &n, |bench, _| {
            bench.iter(|| vec_add_parallel(&rt, black_box(&a), black_box(&b), &mut out));
        });
    }
    group.finish();
}

fn bench_stream(c: &mut Criterion) {
    let rt = ParallelRuntime::new(0).unwrap();
    let mut group = c.benchmark_group("stream");
    group.measurement_time(Duration::from_secs(3));

    for &n in VECTOR_SIZES {
        let mut arrays = StreamArrays::new(n).unwrap();
        let (a, b, cv) = STREAM_INIT;
        arrays.fill(&rt, a, b, cv);
        for kernel in StreamKernel::ALL {
            group.throughput(Throughput::Bytes(kernel.bytes(n)));
            group.bench_with_input(BenchmarkId::new(kernel.label(), size_label(n)), &n, |bench, _| {
                // Repeating a single kernel leaves its output unchanged.
                bench.iter(|| arrays.run(kernel, 0.5, Some(&rt)));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_matmul, bench_vec_add, bench_stream);
criterion_main!(benches);
