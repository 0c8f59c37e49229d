//! argmorph - command-line obfuscation analysis
//!
//! Runs a program once as given, then with many mutated command lines, and
//! reports which variants the program treats as equivalent.

#![forbid(unsafe_code)]

mod batch;
mod error;
mod prepare;
mod report;
mod summary;
mod ui;

use argmorph_core::{
    Engine, LogConfig, RunSettings, TestCase, TestOutcomes, init_logging, is_missing_executable,
};
use clap::{ArgGroup, Parser};
use error::ArgError;
use miette::IntoDiagnostic;
use prepare::{CaseOptions, CodeRange, RangeName};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use ui::CategoryProgress;

#[derive(Parser, Debug)]
#[command(name = "argmorph")]
#[command(
    version,
    about = "Find command-line variants that a program treats as equivalent",
    long_about = "argmorph runs a command once to record its exit code and output, then \
                  executes mutated variants (alternative option chars, inserted or replaced \
                  characters, quotes, shortened options) and reports the ones that behave the same.",
    after_help = r#"EXAMPLES:
    # Test a single command with the default character range
    argmorph --command "certutil /urlcache /f http://example.com/x x"

    # Scan only Cyrillic lower case letters at a given position
    argmorph --command "net start fax" --char-offset 6 --custom-range 0x0430..0x0450

    # Run a batch of test cases, one JSON object per line
    argmorph --json-file cases.jsonl --report-dir reports

ENVIRONMENT VARIABLES:
    ARGMORPH_THREADS       Worker pool width (default: available parallelism)
    ARGMORPH_TIMEOUT_SECS  Default per-execution timeout (default: 2)
    ARGMORPH_REPORT_DIR    Directory for report files (default: .)
    ARGMORPH_LOG_LEVEL     Logging level: trace, debug, info, warn, error, off
    ARGMORPH_LOG_FORMAT    Log format: pretty, json, compact
    ARGMORPH_LOG_FILE      Also write debug logs to this file
    ARGMORPH_LOG_TARGETS   Per-target levels, e.g. argmorph_core::harness=debug"#
)]
#[command(group(ArgGroup::new("input").required(true).args(["command", "json_file"])))]
struct Cli {
    /// Single command to test
    #[arg(long, value_name = "\"proc /arg1 /arg2\"")]
    command: Option<String>,

    /// JSON lines file with one test case per line
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = [
            "range",
            "custom_range",
            "char_offset",
            "pre_command",
            "post_command",
            "exit_code_only",
        ]
    )]
    json_file: Option<PathBuf>,

    /// Character range to scan (default: educated)
    #[arg(long, value_enum)]
    range: Option<RangeName>,

    /// Custom code point range to scan, end exclusive
    #[arg(long, value_name = "0x??..0x??", num_args = 1..)]
    custom_range: Vec<CodeRange>,

    /// Character position used for insertion and replacement
    #[arg(long, value_name = "N")]
    char_offset: Option<usize>,

    /// Command run before each attempt; its output is piped to stdin
    #[arg(long, value_name = "COMMAND")]
    pre_command: Option<String>,

    /// Command run after each attempt (e.g. to clean up)
    #[arg(long, value_name = "COMMAND")]
    post_command: Option<String>,

    /// Only compare exit codes, not the output
    #[arg(long)]
    exit_code_only: bool,

    /// Seconds per execution before timing out
    #[arg(long, value_name = "SECS")]
    timeout: Option<f64>,

    /// Number of concurrent executions
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..=1024))]
    threads: Option<u16>,

    /// Increase output verbosity
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long)]
    quiet: bool,

    /// Directory to save report files to
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// Also write a debug log to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Print results as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Do not write report files
    #[arg(long)]
    no_report: bool,
}

impl Cli {
    fn case_options(&self) -> CaseOptions {
        CaseOptions {
            command: self.command.clone().unwrap_or_default(),
            range: self.range,
            custom_range: self.custom_range.clone(),
            char_offset: self.char_offset,
            pre_command: self.pre_command.clone(),
            post_command: self.post_command.clone(),
            exit_code_only: self.exit_code_only,
            timeout: None,
        }
    }
}

/// JSON rendering of one finished test case.
#[derive(Serialize)]
struct CaseResult<'a> {
    name: String,
    command: String,
    char_offset: usize,
    outcomes: &'a TestOutcomes,
}

fn collect_test_cases(cli: &Cli, settings: &RunSettings) -> Result<Vec<TestCase>, ArgError> {
    let default_timeout = settings.timeout_secs.value;
    prepare::validate_timeout(default_timeout)?;
    match &cli.json_file {
        Some(path) => batch::load_batch(path, default_timeout),
        None => Ok(vec![cli.case_options().build(default_timeout)?]),
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Console logs go to stderr so stdout stays reserved for results
    let (mut log_config, log_env_errors) = LogConfig::from_env("warn");
    if cli.verbose {
        log_config = log_config.with_level("debug");
    } else if cli.quiet {
        log_config = log_config.with_level("error");
    }
    if let Some(path) = &cli.log_file {
        log_config = log_config.with_file(path);
    }
    let _logging_guards = init_logging(&log_config).map_err(|err| miette::miette!("{err:#}"))?;

    let (settings, env_errors) = RunSettings::from_env();
    for err in log_env_errors.iter().chain(&env_errors) {
        warn!("{}", err);
    }
    let settings = settings
        .with_threads(cli.threads.map(usize::from))
        .with_timeout_secs(cli.timeout)
        .with_report_dir(cli.report_dir.clone());
    settings.log_sources();

    let report_dir = settings.report_dir.value.clone();
    if !cli.no_report && !report_dir.is_dir() {
        return Err(ArgError::ReportDirMissing { path: report_dir }.into());
    }
    let test_cases = collect_test_cases(&cli, &settings)?;

    if !ui::stdout_is_terminal() {
        colored::control::set_override(false);
    }
    let progress = Arc::new(CategoryProgress::new(
        !cli.quiet && !cli.json && ui::stderr_is_terminal(),
    ));
    let engine = Engine::new(settings.threads.value).with_progress(progress.clone());
    info!(
        "Running {} test case(s) with {} threads",
        test_cases.len(),
        engine.threads()
    );

    let mut results: Vec<(String, TestCase, TestOutcomes)> = Vec::new();
    for test_case in test_cases {
        let name = test_case.display_name();
        progress.set_test_case(&name);
        info!("Testing {}", name);

        let outcomes = match engine.run(&test_case).await {
            Ok(outcomes) => outcomes,
            Err(err) if is_missing_executable(&err) => {
                error!("Skipping {}: {}", name, err);
                continue;
            }
            Err(err) => {
                error!("Unexpected error when executing {}: {:#}", name, err);
                continue;
            }
        };

        if !cli.no_report
            && let Err(err) = report::write_report(&report_dir, &test_case, &outcomes)
        {
            error!("{:#}", err);
        }
        results.push((name, test_case, outcomes));
    }

    if cli.json {
        let json: Vec<CaseResult<'_>> = results
            .iter()
            .map(|(name, test_case, outcomes)| CaseResult {
                name: name.clone(),
                command: test_case.command.flatten(),
                char_offset: test_case.char_offset,
                outcomes,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
    } else {
        let rows = results
            .iter()
            .map(|(name, _, outcomes)| (name.as_str(), outcomes));
        println!("{}", summary::render_summary(rows, ui::stdout_is_terminal()));
    }
    Ok(())
}
