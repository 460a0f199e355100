//! Benchmark configuration.
//!
//! A [`BenchConfig`] is populated once at startup and never changes during a
//! session. Sources, in increasing priority:
//!
//! 1. built-in defaults (the classic problem sizes),
//! 2. a JSON file named by `KERNBENCH_CONFIG`,
//! 3. individual `KERNBENCH_*` environment overrides.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "KERNBENCH_CONFIG";

/// Which benchmark suites a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    Matmul,
    VecAdd,
    Stream,
}

impl Suite {
    pub const ALL: [Suite; 3] = [Suite::Matmul, Suite::VecAdd, Suite::Stream];

    pub fn name(&self) -> &'static str {
        match self {
            Suite::Matmul => "matmul",
            Suite::VecAdd => "vecadd",
            Suite::Stream => "stream",
        }
    }

    fn parse(value: &str) -> BenchResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "matmul" => Ok(Suite::Matmul),
            "vecadd" | "vec_add" => Ok(Suite::VecAdd),
            "stream" => Ok(Suite::Stream),
            other => Err(BenchError::Config(format!("unknown suite '{other}'"))),
        }
    }
}

/// Configuration for a benchmark session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Matrix dimension n (matrices are n×n).
    pub matrix_size: usize,
    /// Timed iterations for the matrix multiply variants.
    pub matmul_iterations: usize,
    /// Vector length for vector add.
    pub vector_len: usize,
    /// Timed iterations for the vector add variants.
    pub vecadd_iterations: usize,
    /// Array length for the STREAM kernels.
    pub stream_len: usize,
    /// Closed-loop STREAM trials.
    pub stream_iterations: usize,
    /// STREAM scale factor.
    pub stream_scalar: f64,
    /// Untimed warm-up runs before each timed series.
    pub warmup_runs: usize,
    /// Worker threads; 0 lets rayon pick (available parallelism).
    pub threads: usize,
    /// Suites to run, in order.
    pub suites: Vec<Suite>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            matrix_size: 1024,
            matmul_iterations: 5,
            vector_len: 100_000_000,
            vecadd_iterations: 10,
            stream_len: 10_000_000,
            stream_iterations: 10,
            stream_scalar: 3.0,
            warmup_runs: 1,
            threads: 0,
            suites: Suite::ALL.to_vec(),
        }
    }
}

impl BenchConfig {
    /// Small sizes for smoke runs and tests.
    pub fn quick() -> Self {
        BenchConfig {
            matrix_size: 64,
            matmul_iterations: 3,
            vector_len: 100_000,
            vecadd_iterations: 3,
            stream_len: 100_000,
            stream_iterations: 4,
            ..Self::default()
        }
    }

    /// Set the same iteration count for every suite.
    #[must_use]
    pub fn with_iterations(mut self, n: usize) -> Self {
        self.matmul_iterations = n;
        self.vecadd_iterations = n;
        self.stream_iterations = n;
        self
    }

    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    #[must_use]
    pub fn with_suites(mut self, suites: &[Suite]) -> Self {
        self.suites = suites.to_vec();
        self
    }

    pub fn runs(&self, suite: Suite) -> bool {
        self.suites.contains(&suite)
    }

    /// Load defaults, then the optional JSON file, then env overrides.
    pub fn load() -> BenchResult<Self> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_json_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file. Missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> BenchResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: BenchConfig = serde_json::from_str(&text)?;
        log::debug!("Loaded config from {:?}", path.as_ref());
        Ok(config)
    }

    /// Apply `KERNBENCH_*` overrides from a variable lookup.
    ///
    /// The lookup is injected so tests need not touch the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> BenchResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("KERNBENCH_MATRIX_SIZE") {
            self.matrix_size = parse_usize("KERNBENCH_MATRIX_SIZE", &v)?;
        }
        if let Some(v) = lookup("KERNBENCH_VECTOR_LEN") {
            self.vector_len = parse_usize("KERNBENCH_VECTOR_LEN", &v)?;
        }
        if let Some(v) = lookup("KERNBENCH_STREAM_LEN") {
            self.stream_len = parse_usize("KERNBENCH_STREAM_LEN", &v)?;
        }
        if let Some(v) = lookup("KERNBENCH_ITERATIONS") {
            let n = parse_usize("KERNBENCH_ITERATIONS", &v)?;
            *self = std::mem::take(self).with_iterations(n);
        }
        if let Some(v) = lookup("KERNBENCH_THREADS") {
            self.threads = parse_usize("KERNBENCH_THREADS", &v)?;
        }
        if let Some(v) = lookup("KERNBENCH_SUITES") {
            self.suites = v
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(Suite::parse)
                .collect::<BenchResult<Vec<_>>>()?;
        }
        Ok(())
    }

    /// Reject configurations the harness cannot measure.
    pub fn validate(&self) -> BenchResult<()> {
        if self.suites.is_empty() {
            return Err(BenchError::Config("no suites selected".into()));
        }
        for suite in &self.suites {
            let (len, iterations) = match suite {
                Suite::Matmul => (self.matrix_size, self.matmul_iterations),
                Suite::VecAdd => (self.vector_len, self.vecadd_iterations),
                Suite::Stream => (self.stream_len, self.stream_iterations),
            };
            if len == 0 {
                return Err(BenchError::Config(format!(
                    "{} problem size must be > 0",
                    suite.name()
                )));
            }
            if iterations < 2 {
                return Err(BenchError::Config(format!(
                    "{} iterations must be >= 2 (got {iterations})",
                    suite.name()
                )));
            }
        }
        if !self.stream_scalar.is_finite() {
            return Err(BenchError::Config("stream_scalar must be finite".into()));
        }
        Ok(())
    }
}

fn parse_usize(key: &str, value: &str) -> BenchResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| BenchError::Config(format!("{key}={value} is not a non-negative integer")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_classic_sizes() {
        let cfg = BenchConfig::default();
        assert_eq!(cfg.matrix_size, 1024);
        assert_eq!(cfg.vector_len, 100_000_000);
        assert_eq!(cfg.stream_len, 10_000_000);
        assert_eq!(cfg.stream_iterations, 10);
        assert_eq!(cfg.stream_scalar, 3.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = BenchConfig::default();
        cfg.apply_overrides(lookup_from(&[
            ("KERNBENCH_MATRIX_SIZE", "128"),
            ("KERNBENCH_ITERATIONS", "4"),
            ("KERNBENCH_THREADS", "2"),
            ("KERNBENCH_SUITES", "stream, matmul"),
        ]))
        .unwrap();
        assert_eq!(cfg.matrix_size, 128);
        assert_eq!(cfg.matmul_iterations, 4);
        assert_eq!(cfg.stream_iterations, 4);
        assert_eq!(cfg.threads, 2);
        assert_eq!(cfg.suites, vec![Suite::Stream, Suite::Matmul]);
    }

    #[test]
    fn test_bad_override_is_config_error() {
        let mut cfg = BenchConfig::default();
        let err = cfg
            .apply_overrides(lookup_from(&[("KERNBENCH_STREAM_LEN", "lots")]))
            .unwrap_err();
        assert!(matches!(err, BenchError::Config(_)));

        let err = cfg
            .apply_overrides(lookup_from(&[("KERNBENCH_SUITES", "fft")]))
            .unwrap_err();
        assert!(err.to_string().contains("fft"));
    }

    #[test]
    fn test_validate_rejects_single_iteration() {
        let cfg = BenchConfig::quick().with_iterations(1);
        assert!(matches!(cfg.validate(), Err(BenchError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_length() {
        let mut cfg = BenchConfig::quick();
        cfg.vector_len = 0;
        assert!(cfg.validate().is_err());
        // Disabled suites are not checked.
        cfg.suites = vec![Suite::Stream];
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_json_partial_config() {
        let json = r#"{"matrix_size": 32, "suites": ["matmul", "vecadd"]}"#;
        let cfg: BenchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.matrix_size, 32);
        assert_eq!(cfg.suites, vec![Suite::Matmul, Suite::VecAdd]);
        assert_eq!(cfg.stream_len, BenchConfig::default().stream_len);
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "kernbench_cfg_{}.json",
            std::process::id()
        ));
        let cfg = BenchConfig::quick().with_threads(3);
        std::fs::write(&path, serde_json::to_string_pretty(&cfg).unwrap()).unwrap();
        let loaded = BenchConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, cfg);
    }
}
