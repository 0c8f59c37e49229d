//! Configuration source tracking.
//!
//! Tracks where each configuration value came from for debugging.

use serde::Serialize;
use std::fmt;

/// Where a configuration value originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Built-in default value.
    Default,
    /// Environment variable.
    Environment,
    /// Command-line argument (highest precedence).
    CommandLine,
}

impl ConfigSource {
    /// Get the precedence level (higher = takes priority).
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::Environment => 1,
            ConfigSource::CommandLine => 2,
        }
    }

    /// Get a human-readable name for this source.
    pub fn display_name(&self) -> &'static str {
        match self {
            ConfigSource::Default => "default",
            ConfigSource::Environment => "environment",
            ConfigSource::CommandLine => "command line",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A configuration value with its source.
#[derive(Debug, Clone)]
pub struct Sourced<T> {
    /// The actual value.
    pub value: T,
    /// Where this value came from.
    pub source: ConfigSource,
    /// Optional environment variable name if from environment.
    pub env_var: Option<String>,
}

impl<T> Sourced<T> {
    /// Create a new sourced value.
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self {
            value,
            source,
            env_var: None,
        }
    }

    /// Create a sourced value from an environment variable.
    pub fn from_env(value: T, var_name: impl Into<String>) -> Self {
        Self {
            value,
            source: ConfigSource::Environment,
            env_var: Some(var_name.into()),
        }
    }

    /// Create a sourced value given on the command line.
    pub fn from_cli(value: T) -> Self {
        Self::new(value, ConfigSource::CommandLine)
    }

    /// Create a default sourced value.
    pub fn default_value(value: T) -> Self {
        Self::new(value, ConfigSource::Default)
    }

    /// Merge with another sourced value, taking the higher precedence one.
    pub fn merge(self, other: Self) -> Self {
        if other.source.precedence() >= self.source.precedence() {
            other
        } else {
            self
        }
    }
}

impl<T: Default> Default for Sourced<T> {
    fn default() -> Self {
        Self::default_value(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_precedence() {
        assert!(ConfigSource::Environment.precedence() > ConfigSource::Default.precedence());
        assert!(ConfigSource::CommandLine.precedence() > ConfigSource::Environment.precedence());
    }

    #[test]
    fn test_sourced_merge() {
        let default = Sourced::new(10, ConfigSource::Default);
        let env = Sourced::new(20, ConfigSource::Environment);

        let merged = default.merge(env);
        assert_eq!(merged.value, 20);
        assert_eq!(merged.source, ConfigSource::Environment);
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = Sourced::from_env(4usize, "ARGMORPH_THREADS");
        let cli = Sourced::from_cli(8usize);
        let merged = cli.merge(env);
        assert_eq!(merged.value, 8);
        assert_eq!(merged.source, ConfigSource::CommandLine);
        assert_eq!(merged.source.to_string(), "command line");
    }
}
