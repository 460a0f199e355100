//! Benchmark session: owns the configuration, the thread pool and every
//! buffer, and drives each suite through harness, verifier and reporter.

use crate::config::{BenchConfig, Suite};
use crate::error::{BenchError, BenchResult};
use crate::harness::{Harness, TimingSeries, TrialStats};
use crate::kernels::{
    init_matrix, init_vectors, vec_add_parallel, vec_add_serial, MatmulVariant, StreamArrays, StreamKernel,
};
use crate::kernels::stream::STREAM_INIT;
use crate::parallel::ParallelRuntime;
use crate::profiling::counters::{self, OpWorkload};
use crate::profiling::report::{BenchReport, IterationLog, ReportRow, ScalingLine, VerdictLine};
use crate::profiling::timer::{time_it, Granularity};
use crate::types::{gib, matrix_len, mib, try_alloc, Buffer, ELEM_BYTES};
use crate::validation::{
    check_analytic, compare_buffers, StreamRecurrence, VerificationResult, MATMUL_TOLERANCE, VECADD_TOLERANCE,
};

/// Exit code when every verification passed.
pub const EXIT_OK: i32 = 0;
/// Exit code when at least one verification failed.
pub const EXIT_VERIFY_FAILED: i32 = 1;
/// Exit code for allocation or configuration failures.
pub const EXIT_FATAL: i32 = 2;

/// Factor applied to `a` by the STREAM timing probe.
const PROBE_FACTOR: f64 = 2.0;

struct MatmulBuffers {
    n: usize,
    a: Buffer,
    b: Buffer,
    /// One result matrix per variant, in [`MatmulVariant::ALL`] order.
    results: [Buffer; 3],
}

impl MatmulBuffers {
    fn new(n: usize) -> BenchResult<Self> {
        let len = matrix_len(n)?;
        Ok(Self {
            n,
            a: try_alloc("matrix A", len)?,
            b: try_alloc("matrix B", len)?,
            results: [
                try_alloc("matrix C (serial)", len)?,
                try_alloc("matrix C (parallel)", len)?,
                try_alloc("matrix C (collapse)", len)?,
            ],
        })
    }
}

struct VecAddBuffers {
    a: Buffer,
    b: Buffer,
    serial: Buffer,
    parallel: Buffer,
}

impl VecAddBuffers {
    fn new(len: usize) -> BenchResult<Self> {
        Ok(Self {
            a: try_alloc("vector a", len)?,
            b: try_alloc("vector b", len)?,
            serial: try_alloc("vector c (serial)", len)?,
            parallel: try_alloc("vector c (parallel)", len)?,
        })
    }
}

/// Result of one suite: its report and each variant's verification.
#[derive(Debug, Clone)]
pub struct SuiteOutcome {
    pub suite: Suite,
    pub report: BenchReport,
    pub verifications: Vec<(String, VerificationResult)>,
}

impl SuiteOutcome {
    pub fn passed(&self) -> bool {
        self.verifications.iter().all(|(_, v)| v.passed())
    }
}

/// Outcomes of every suite a session ran.
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub outcomes: Vec<SuiteOutcome>,
}

impl SessionSummary {
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(SuiteOutcome::passed)
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            EXIT_OK
        } else {
            EXIT_VERIFY_FAILED
        }
    }
}

/// A configured benchmark run.
pub struct BenchSession {
    config: BenchConfig,
    runtime: ParallelRuntime,
    granularity: Granularity,
    matmul: Option<MatmulBuffers>,
    vec_add: Option<VecAddBuffers>,
    stream: Option<StreamArrays>,
}

impl BenchSession {
    /// Validate `config`, build the pool, allocate the buffers of every
    /// enabled suite and calibrate the clock.
    pub fn new(config: BenchConfig) -> BenchResult<Self> {
        config.validate()?;
        let runtime = ParallelRuntime::new(config.threads)?;
        let matmul = if config.runs(Suite::Matmul) {
            Some(MatmulBuffers::new(config.matrix_size)?)
        } else {
            None
        };
        let vec_add = if config.runs(Suite::VecAdd) {
            Some(VecAddBuffers::new(config.vector_len)?)
        } else {
            None
        };
        let stream = if config.runs(Suite::Stream) {
            Some(StreamArrays::new(config.stream_len)?)
        } else {
            None
        };
        let granularity = Granularity::calibrate();
        log::info!(
            "Session ready: {} threads, clock granularity {} us",
            runtime.threads(),
            granularity.micros()
        );
        Ok(Self {
            config,
            runtime,
            granularity,
            matmul,
            vec_add,
            stream,
        })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn threads(&self) -> usize {
        self.runtime.threads()
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Run every enabled suite in configured order.
    pub fn run_all(&mut self) -> BenchResult<SessionSummary> {
        let mut summary = SessionSummary::default();
        for suite in self.config.suites.clone() {
            let outcome = match suite {
                Suite::Matmul => self.run_matmul()?,
                Suite::VecAdd => self.run_vec_add()?,
                Suite::Stream => self.run_stream()?,
            };
            if !outcome.passed() {
                log::warn!("{}: verification failed", suite.name());
            }
            summary.outcomes.push(outcome);
        }
        Ok(summary)
    }

    /// Serial, row-parallel and collapsed matrix multiply.
    pub fn run_matmul(&mut self) -> BenchResult<SuiteOutcome> {
        let n = self.config.matrix_size;
        let mut bufs = match self.matmul.take() {
            Some(bufs) if bufs.n == n => bufs,
            _ => MatmulBuffers::new(n)?,
        };
        let outcome = self.matmul_with(&mut bufs);
        self.matmul = Some(bufs);
        outcome
    }

    fn matmul_with(&self, bufs: &mut MatmulBuffers) -> BenchResult<SuiteOutcome> {
        let rt = &self.runtime;
        let n = bufs.n;
        // Warm-up happens once up front, not per variant.
        let harness = Harness::new(self.config.matmul_iterations, 0, self.granularity)?;
        let workload = counters::gemm_workload(n);
        let matrix_bytes = n * n * ELEM_BYTES;

        let mut report = BenchReport::new("Matrix Multiplication Benchmark");
        report.echo("Number of threads", rt.counted_threads());
        report.echo("Matrix size", format!("{n} x {n}"));
        report.echo("Memory per matrix", format!("{:.2} MiB", mib(matrix_bytes)));
        // A, B and one result matrix per variant.
        let matrices = 2 + MatmulVariant::ALL.len();
        report.echo("Total memory", format!("{:.2} MiB", mib(matrices * matrix_bytes)));
        report.echo("Iterations", harness.iterations());
        report.echo("Operations per multiply", format!("{} (2*n^3)", workload.flops()));
        report.note(format!("Clock granularity: {} microseconds", self.granularity.micros()));

        log::info!("Initializing matrices...");
        let MatmulBuffers { a, b, results, .. } = bufs;
        init_matrix(a, n, 1);
        init_matrix(b, n, 2);

        log::info!("Performing warm-up run...");
        for _ in 0..self.config.warmup_runs {
            MatmulVariant::ParallelRows.run(rt, a, b, &mut results[1], n);
        }

        let mut stats = Vec::with_capacity(MatmulVariant::ALL.len());
        for (variant, c) in MatmulVariant::ALL.iter().zip(results.iter_mut()) {
            log::info!("Running {} version...", variant.label());
            let series = harness.run(variant.label(), |_| variant.run(rt, a, b, c, n));
            stats.push(self.record(&mut report, variant.label(), workload, &series)?);
        }

        let serial_min = stats[0].min_time;
        for (variant, s) in MatmulVariant::ALL.iter().zip(&stats).skip(1) {
            report.scaling.push(ScalingLine::new(variant.label(), serial_min, s.min_time, rt.threads()));
        }

        log::info!("Verifying results...");
        let mut verifications = Vec::new();
        for (variant, c) in MatmulVariant::ALL.iter().zip(results.iter()).skip(1) {
            let result = compare_buffers(&results[0], c, MATMUL_TOLERANCE)?;
            let label = format!("Comparing {} vs Serial", variant.label());
            push_verdict(&mut report, &label, &result);
            verifications.push((label, result));
        }

        Ok(SuiteOutcome {
            suite: Suite::Matmul,
            report,
            verifications,
        })
    }

    /// Serial and parallel vector add.
    pub fn run_vec_add(&mut self) -> BenchResult<SuiteOutcome> {
        let len = self.config.vector_len;
        let mut bufs = match self.vec_add.take() {
            Some(bufs) if bufs.a.len() == len => bufs,
            _ => VecAddBuffers::new(len)?,
        };
        let outcome = self.vec_add_with(&mut bufs);
        self.vec_add = Some(bufs);
        outcome
    }

    fn vec_add_with(&self, bufs: &mut VecAddBuffers) -> BenchResult<SuiteOutcome> {
        let rt = &self.runtime;
        let n = bufs.a.len();
        let harness = Harness::new(self.config.vecadd_iterations, self.config.warmup_runs, self.granularity)?;
        let workload = counters::vec_add_workload(n);
        let vector_bytes = n * ELEM_BYTES;

        let mut report = BenchReport::new("Vector Addition Benchmark");
        report.echo("Number of threads", rt.counted_threads());
        report.echo("Vector size", format!("{n} elements"));
        report.echo("Memory per vector", format!("{:.2} MiB", mib(vector_bytes)));
        report.echo("Total memory", format!("{:.2} MiB", mib(3 * vector_bytes)));
        report.echo("Iterations", harness.iterations());
        report.note(format!("Clock granularity: {} microseconds", self.granularity.micros()));

        log::info!("Initializing vectors...");
        let VecAddBuffers { a, b, serial, parallel } = bufs;
        init_vectors(rt, a, b);

        log::info!("Running serial version...");
        let series = harness.run("Serial", |_| vec_add_serial(a, b, serial));
        let serial_stats = self.record(&mut report, "Serial", workload, &series)?;

        log::info!("Running parallel version...");
        let series = harness.run("Parallel", |_| vec_add_parallel(rt, a, b, parallel));
        let parallel_stats = self.record(&mut report, "Parallel", workload, &series)?;

        report.scaling.push(ScalingLine::new(
            "Parallel",
            serial_stats.min_time,
            parallel_stats.min_time,
            rt.threads(),
        ));

        log::info!("Verifying results...");
        let result = compare_buffers(serial, parallel, VECADD_TOLERANCE)?;
        let label = "Comparing Parallel vs Serial".to_string();
        push_verdict(&mut report, &label, &result);

        Ok(SuiteOutcome {
            suite: Suite::VecAdd,
            report,
            verifications: vec![(label, result)],
        })
    }

    /// STREAM Copy/Scale/Add/Triad, chained across trials, with analytic check.
    pub fn run_stream(&mut self) -> BenchResult<SuiteOutcome> {
        let len = self.config.stream_len;
        let mut arrays = match self.stream.take() {
            Some(arrays) if arrays.len() == len => arrays,
            _ => StreamArrays::new(len)?,
        };
        let outcome = self.stream_with(&mut arrays);
        self.stream = Some(arrays);
        outcome
    }

    fn stream_with(&self, arrays: &mut StreamArrays) -> BenchResult<SuiteOutcome> {
        let rt = &self.runtime;
        let len = arrays.len();
        let iterations = self.config.stream_iterations;
        let scalar = self.config.stream_scalar;
        let harness = Harness::new(iterations, 0, self.granularity)?;

        let mut report = BenchReport::new("STREAM Memory Bandwidth Benchmark");
        report.echo("Array size", format!("{len} (elements)"));
        report.echo("Bytes per array element", ELEM_BYTES);
        report.echo("Memory per array", format!("{:.1} MiB ({:.1} GiB)", mib(len * ELEM_BYTES), gib(len * ELEM_BYTES)));
        report.echo(
            "Total memory required",
            format!("{:.1} MiB ({:.1} GiB)", mib(arrays.footprint_bytes()), gib(arrays.footprint_bytes())),
        );
        report.echo("Iterations", iterations);
        report.echo("Number of threads", rt.counted_threads());
        report.note("The *best* time for each kernel (excluding the first iteration) is used to compute the reported bandwidth.");
        report.note(format!(
            "Your clock granularity/precision appears to be {} microseconds.",
            self.granularity.micros()
        ));

        let (a0, b0, c0) = STREAM_INIT;
        arrays.fill(rt, a0, b0, c0);

        let probe = time_it(|| arrays.scale_a(rt, PROBE_FACTOR));
        report.note(format!(
            "Each test below will take on the order of {} microseconds ({} clock ticks).",
            (probe * 1e6) as u64,
            self.granularity.ticks(probe)
        ));
        if !self.granularity.is_reliable(probe) {
            log::warn!("STREAM arrays are small for this clock; increase the array size for reliable timings");
        }

        log::info!("Running {iterations} STREAM trials over {len} elements...");
        let series = harness.run_group(
            &StreamKernel::ALL,
            |k| k.label().to_string(),
            |k, _| arrays.run(*k, scalar, Some(rt)),
        );
        for (kernel, s) in StreamKernel::ALL.iter().zip(&series) {
            self.record(&mut report, kernel.label(), counters::stream_workload(*kernel, len), s)?;
        }

        let reference = StreamRecurrence::new(scalar).with_prescaled_a(PROBE_FACTOR);
        let result = check_analytic(&arrays.a, &arrays.b, &arrays.c, &reference, iterations)?;
        let label = "STREAM results".to_string();
        push_verdict(&mut report, &label, &result);

        Ok(SuiteOutcome {
            suite: Suite::Stream,
            report,
            verifications: vec![(label, result)],
        })
    }

    /// Aggregate a series and add its iteration log and table row.
    fn record(
        &self,
        report: &mut BenchReport,
        label: &str,
        workload: OpWorkload,
        series: &TimingSeries,
    ) -> BenchResult<TrialStats> {
        let stats = series.aggregate()?;
        log::debug!("{label}: {stats}");
        report.iterations.push(IterationLog::new(label, workload, series));
        report.rows.push(ReportRow::new(label, workload, &stats));
        Ok(stats)
    }
}

fn push_verdict(report: &mut BenchReport, label: &str, result: &VerificationResult) {
    report.verdicts.push(VerdictLine {
        label: label.to_string(),
        passed: result.passed(),
        errors: result.errors,
        mismatches: result.mismatches.clone(),
        details: result.describe(),
    });
}

/// Map a session error to the process exit code.
pub fn exit_code_for(err: &BenchError) -> i32 {
    if err.is_fatal() {
        EXIT_FATAL
    } else {
        EXIT_VERIFY_FAILED
    }
}
