//! argmorph core library
//!
//! Mutation engine that finds command-line variants a program treats as
//! equivalent to a canonical invocation: baseline resolution, variant
//! generators, the execution harness and the bounded worker pool.

// Use deny instead of forbid so tests can set environment variables
// (env::set_var/remove_var are unsafe in Rust 2024)
#![deny(unsafe_code)]

pub mod baseline;
pub mod config;
pub mod engine;
pub mod exec;
pub mod generate;
pub mod harness;
pub mod logging;
pub mod progress;
pub mod scheduler;
pub mod token;
pub mod types;

pub use baseline::{ResolveError, resolve};
pub use config::{ConfigSource, EnvError, EnvParser, RunSettings, Sourced};
pub use engine::{Engine, is_missing_executable};
pub use exec::{CommandOutput, ExecError, run_command, run_tokens};
pub use generate::{
    CandidateGenerator, CandidateSet, Generated, Strategy, preferred_char_offset, select_arg_index,
};
pub use harness::Harness;
pub use logging::{LogConfig, LogFormat, LoggingGuards, init_logging};
pub use progress::{NoProgress, ProgressSink};
pub use scheduler::{Scheduler, default_threads};
pub use token::{FixedToken, RandomHexTokens, TOKEN_PLACEHOLDER, TokenSource, substitute_token};
pub use types::{
    BaselineResult, Candidate, CandidateId, Category, CategoryResult, Command, DEFAULT_TIMEOUT_SECS,
    MatchSet, TOKEN_SEPARATOR, TestCase, TestOutcomes, split_flattened,
};
