//! Process-wide run settings.
//!
//! Settings come from built-in defaults, `ARGMORPH_*` environment variables
//! and command-line flags, in increasing precedence. Every value remembers
//! where it came from so `--verbose` runs can explain themselves.

pub mod env;
pub mod source;

pub use env::{EnvError, EnvParser};
pub use source::{ConfigSource, Sourced};

use crate::scheduler::default_threads;
use crate::types::DEFAULT_TIMEOUT_SECS;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub const MIN_THREADS: usize = 1;
pub const MAX_THREADS: usize = 1024;
pub const MIN_TIMEOUT_SECS: f64 = 0.01;
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;

/// Settings shared by every test case of a run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Worker pool width.
    pub threads: Sourced<usize>,
    /// Default per-variant timeout in seconds; batch entries may override it.
    pub timeout_secs: Sourced<f64>,
    /// Directory receiving the per-test-case report files.
    pub report_dir: Sourced<PathBuf>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            threads: Sourced::default_value(default_threads()),
            timeout_secs: Sourced::default_value(DEFAULT_TIMEOUT_SECS),
            report_dir: Sourced::default_value(PathBuf::from(".")),
        }
    }
}

impl RunSettings {
    /// Load settings from `ARGMORPH_THREADS`, `ARGMORPH_TIMEOUT_SECS` and
    /// `ARGMORPH_REPORT_DIR`.
    ///
    /// Invalid values fall back to their defaults; the errors are returned
    /// alongside so the caller decides whether they are fatal.
    pub fn from_env() -> (Self, Vec<EnvError>) {
        let mut parser = EnvParser::new();
        let settings = Self {
            threads: parser.get_usize_range("THREADS", default_threads(), MIN_THREADS, MAX_THREADS),
            timeout_secs: parser.get_f64_range(
                "TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
                MIN_TIMEOUT_SECS,
                MAX_TIMEOUT_SECS,
            ),
            report_dir: parser.get_path("REPORT_DIR", "."),
        };
        (settings, parser.take_errors())
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        if let Some(threads) = threads {
            self.threads = self.threads.merge(Sourced::from_cli(threads));
        }
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: Option<f64>) -> Self {
        if let Some(timeout_secs) = timeout_secs {
            self.timeout_secs = self.timeout_secs.merge(Sourced::from_cli(timeout_secs));
        }
        self
    }

    pub fn with_report_dir(mut self, report_dir: Option<PathBuf>) -> Self {
        if let Some(report_dir) = report_dir {
            self.report_dir = self.report_dir.merge(Sourced::from_cli(report_dir));
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs.value)
    }

    /// Log each effective value and its origin.
    pub fn log_sources(&self) {
        debug!(
            threads = self.threads.value,
            source = %self.threads.source,
            "Effective worker pool width"
        );
        debug!(
            timeout_secs = self.timeout_secs.value,
            source = %self.timeout_secs.source,
            "Effective default timeout"
        );
        debug!(
            report_dir = %self.report_dir.value.display(),
            source = %self.report_dir.source,
            "Effective report directory"
        );
    }
}
