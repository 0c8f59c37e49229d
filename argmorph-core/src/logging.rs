//! Structured logging initialization for argmorph.
//!
//! The engine only emits `tracing` events; this module configures where they
//! go (console, optional log file) for the binary and for tests.

use crate::config::{ConfigSource, EnvError, EnvParser};
use anyhow::Result;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, fmt,
    fmt::writer::{BoxMakeWriter, MakeWriterExt},
    util::SubscriberInitExt,
};

/// Logging output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-friendly, pretty-printed logs.
    Pretty,
    /// JSON-formatted logs for machine parsing.
    Json,
    /// Compact single-line logs.
    Compact,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Configuration for logging initialization.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Console log level (trace, debug, info, warn, error, off).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Optional log file; it always receives debug and above.
    pub file_path: Option<PathBuf>,
    /// Per-target log level overrides.
    pub targets: BTreeMap<String, String>,
    /// Include target in log output.
    pub with_target: bool,
    /// Include thread IDs in log output.
    pub with_thread_ids: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            file_path: None,
            targets: BTreeMap::new(),
            with_target: false,
            with_thread_ids: false,
        }
    }
}

impl LogConfig {
    /// Build a logging configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - ARGMORPH_LOG_LEVEL
    /// - ARGMORPH_LOG_FORMAT (pretty|json|compact)
    /// - ARGMORPH_LOG_FILE
    /// - ARGMORPH_LOG_TARGETS (comma-separated target=level list)
    ///
    /// Invalid values keep their defaults and are returned so they can be
    /// reported once logging is up.
    pub fn from_env(default_level: &str) -> (Self, Vec<EnvError>) {
        let mut parser = EnvParser::new();
        let mut config = Self {
            level: parser.get_log_level("LOG_LEVEL", default_level).value,
            ..Self::default()
        };

        let format = parser.get_string("LOG_FORMAT", "compact");
        match LogFormat::parse(&format.value) {
            Some(parsed) => config.format = parsed,
            None => parser.push_error(EnvError::InvalidValue {
                var: format.env_var.unwrap_or_default(),
                expected: "pretty, json or compact".to_string(),
                value: format.value,
            }),
        }

        let file = parser.get_path("LOG_FILE", "");
        if file.source == ConfigSource::Environment {
            config.file_path = Some(file.value);
        }

        let targets = parser.get_string("LOG_TARGETS", "");
        config.targets = parse_target_overrides(&targets.value);

        (config, parser.take_errors())
    }

    /// Override the base log level.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Also write logs to `path`.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Build the effective console filter, honoring RUST_LOG if set.
    pub fn env_filter(&self) -> EnvFilter {
        if std::env::var_os("RUST_LOG").is_some()
            && let Ok(filter) = EnvFilter::try_from_default_env()
        {
            return filter;
        }

        let mut filter = self.level.clone();
        for (target, level) in &self.targets {
            filter.push_str(&format!(",{}={}", target, level));
        }
        EnvFilter::new(filter)
    }
}

/// Guards required to keep background logging workers alive.
pub struct LoggingGuards {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialize tracing-based logging for the current process.
///
/// Console output goes to stderr so that stdout stays reserved for results.
/// When a log file is configured the filter is widened to debug for the
/// file and the console keeps its own level.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuards> {
    let console_filter = config.env_filter();
    let console_level = console_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level());

    let (writer, file_guard, filter) = match config.file_path.as_ref() {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().unwrap_or_else(|| OsStr::new("argmorph.log"));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let console = match console_level {
                Some(level) => std::io::stderr.with_max_level(level),
                None => std::io::stderr.with_max_level(tracing::Level::ERROR),
            };
            let writer = BoxMakeWriter::new(console.and(non_blocking));
            (writer, Some(guard), EnvFilter::new("debug"))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None, console_filter),
    };
    let ansi = file_guard.is_none();

    let builder = fmt::Subscriber::builder()
        .with_writer(writer)
        .with_target(config.with_target)
        .with_thread_ids(config.with_thread_ids)
        .with_env_filter(filter);

    match config.format {
        LogFormat::Pretty => finish_subscriber(builder.with_ansi(ansi).pretty().finish(), file_guard),
        LogFormat::Json => finish_subscriber(builder.with_ansi(false).json().finish(), file_guard),
        LogFormat::Compact => finish_subscriber(builder.with_ansi(ansi).compact().finish(), file_guard),
    }
}

fn finish_subscriber<S>(
    subscriber: S,
    file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
) -> Result<LoggingGuards>
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = subscriber.try_init() {
        if err.to_string().contains("already initialized") {
            return Ok(LoggingGuards {
                _file_guard: file_guard,
            });
        }
        return Err(err.into());
    }

    Ok(LoggingGuards {
        _file_guard: file_guard,
    })
}

fn parse_target_overrides(value: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for entry in value.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((target, level)) = entry.split_once('=') else {
            continue;
        };
        let target = target.trim();
        let level = level.trim().to_lowercase();
        if target.is_empty() || !is_valid_level(&level) {
            continue;
        }
        map.insert(target.to_string(), level);
    }
    map
}

pub(crate) fn is_valid_level(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error" | "off")
}
