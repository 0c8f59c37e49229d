//! Subprocess execution primitives.
//!
//! Commands are split into words and executed directly (no intermediate
//! shell), with captured output and an optional hard timeout.

#[cfg(not(windows))]
use crate::types::split_flattened;
use crate::types::{Command, combine_output};
use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::{Child, Command as ProcessCommand};
use tracing::{debug, trace};

/// Errors raised while executing a single command.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Empty command")]
    Empty,

    #[error("Failed to parse command '{command}': {source}")]
    Parse {
        command: String,
        #[source]
        source: shell_words::ParseError,
    },

    #[error("Executable not found: {program}")]
    NotFound { program: String },

    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),
}

impl ExecError {
    fn from_io(program: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ExecError::NotFound {
                program: program.to_string(),
            }
        } else {
            ExecError::Spawn {
                program: program.to_string(),
                source,
            }
        }
    }
}

/// Captured result of a completed command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code; -1 when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout and stderr joined for baseline comparison.
    pub fn combined(&self) -> Vec<u8> {
        combine_output(&self.stdout, &self.stderr)
    }
}

/// Split a flattened command string into a program and its process builder.
///
/// On Unix the string is split on the token separator only. Quotes and
/// backslashes reach the program verbatim, and adjacent separators yield
/// empty arguments.
#[cfg(not(windows))]
fn prepare(command: &str) -> Result<(String, ProcessCommand), ExecError> {
    let mut words = split_flattened(command);
    let program = match words.next() {
        Some(program) if !program.is_empty() => program,
        _ => return Err(ExecError::Empty),
    };
    let mut process = ProcessCommand::new(program);
    process.args(words);
    Ok((program.to_string(), process))
}

/// Split a flattened command string into a program and its process builder.
///
/// On Windows every program parses its own command line, so everything
/// after the executable is handed over verbatim.
#[cfg(windows)]
fn prepare(command: &str) -> Result<(String, ProcessCommand), ExecError> {
    let trimmed = command.trim_start();
    if trimmed.is_empty() {
        return Err(ExecError::Empty);
    }
    let (program, rest) = if let Some(quoted) = trimmed.strip_prefix('"') {
        match quoted.find('"') {
            Some(end) => (&quoted[..end], &quoted[end + 1..]),
            None => {
                return Err(ExecError::Parse {
                    command: command.to_string(),
                    source: shell_words::ParseError,
                });
            }
        }
    } else {
        match trimmed.find(char::is_whitespace) {
            Some(end) => (&trimmed[..end], &trimmed[end..]),
            None => (trimmed, ""),
        }
    };
    let mut process = ProcessCommand::new(program);
    let rest = rest.trim_start();
    if !rest.is_empty() {
        process.raw_arg(rest);
    }
    Ok((program.to_string(), process))
}

/// Execute a flattened command string.
///
/// With a `timeout`, the child is killed once the limit elapses and
/// [`ExecError::Timeout`] is returned. A `pre_command`'s stdout is piped
/// into the command's stdin.
pub async fn run_command(
    command: &str,
    timeout: Option<Duration>,
    pre_command: Option<&Command>,
) -> Result<CommandOutput, ExecError> {
    let (program, process) = prepare(command)?;
    execute(program, process, timeout, pre_command).await
}

/// Execute an already tokenized command without re-splitting it.
pub async fn run_tokens(
    command: &Command,
    timeout: Option<Duration>,
) -> Result<CommandOutput, ExecError> {
    let Some((program, args)) = command.tokens().split_first() else {
        return Err(ExecError::Empty);
    };
    let mut process = ProcessCommand::new(program);
    process.args(args);
    execute(program.clone(), process, timeout, None).await
}

fn spawn_pre_command(pre_command: &Command) -> Result<Child, ExecError> {
    let Some((program, args)) = pre_command.tokens().split_first() else {
        return Err(ExecError::Empty);
    };
    ProcessCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExecError::from_io(program, source))
}

async fn reap(pre: Option<Child>) {
    if let Some(mut child) = pre {
        // Already-exited children make both calls no-ops.
        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}

async fn execute(
    program: String,
    mut process: ProcessCommand,
    timeout: Option<Duration>,
    pre_command: Option<&Command>,
) -> Result<CommandOutput, ExecError> {
    let mut pre = pre_command.map(spawn_pre_command).transpose()?;
    let stdin: Stdio = match pre.as_mut().and_then(|child| child.stdout.take()) {
        Some(stdout) => stdout
            .try_into()
            .map_err(|source| ExecError::from_io(&program, source))?,
        None => Stdio::null(),
    };

    trace!("Spawning {}", program);
    let start = Instant::now();
    let child = match process
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(source) => {
            reap(pre).await;
            return Err(ExecError::from_io(&program, source));
        }
    };

    let waited = match timeout {
        // Dropping the wait future drops the child, which kills it.
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(waited) => waited,
            Err(_) => {
                reap(pre).await;
                return Err(ExecError::Timeout(limit));
            }
        },
        None => child.wait_with_output().await,
    };
    reap(pre).await;

    let output = waited.map_err(|source| ExecError::from_io(&program, source))?;
    let duration = start.elapsed();
    let exit_code = output.status.code().unwrap_or(-1);
    debug!(
        "{} exited with {} after {}ms",
        program,
        exit_code,
        duration.as_millis()
    );

    Ok(CommandOutput {
        exit_code,
        stdout: output.stdout,
        stderr: output.stderr,
        duration_ms: duration.as_millis() as u64,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_command_captures_stdout_and_exit_code() {
        let out = run_command("echo hello", None, None).await.unwrap();
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout, b"hello\n");
        assert!(out.success());

        let out = run_command("false", None, None).await.unwrap();
        assert_eq!(out.exit_code, 1);
        assert!(!out.success());
    }

    #[tokio::test]
    async fn test_run_tokens_captures_stderr() {
        let cmd = Command::new(["sh", "-c", "echo oops >&2; exit 3"]);
        let out = run_tokens(&cmd, None).await.unwrap();
        assert_eq!(out.exit_code, 3);
        assert!(out.stdout.is_empty());
        assert_eq!(out.stderr, b"oops\n");
        assert_eq!(out.combined(), b" / oops\n");
    }

    #[tokio::test]
    async fn test_run_command_passes_quotes_and_backslashes_verbatim() {
        let out = run_command("echo s\"t\"art sta\\rt", None, None)
            .await
            .unwrap();
        assert_eq!(out.stdout, b"s\"t\"art sta\\rt\n");

        let out = run_command("echo \"unterminated", None, None).await.unwrap();
        assert_eq!(out.stdout, b"\"unterminated\n");
    }

    #[tokio::test]
    async fn test_run_command_splits_on_single_spaces_only() {
        let out = run_command("printf [%s] a\tb  c", None, None).await.unwrap();
        assert_eq!(out.stdout, b"[a\tb][][c]");
    }

    #[tokio::test]
    async fn test_run_command_empty() {
        let err = run_command("   ", None, None).await.unwrap_err();
        assert!(matches!(err, ExecError::Empty));
        let err = run_command("", None, None).await.unwrap_err();
        assert!(matches!(err, ExecError::Empty));
    }

    #[tokio::test]
    async fn test_run_command_missing_executable() {
        let err = run_command("argmorph-no-such-binary-xyz --flag", None, None)
            .await
            .unwrap_err();
        match err {
            ExecError::NotFound { program } => assert_eq!(program, "argmorph-no-such-binary-xyz"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_command_times_out() {
        let start = Instant::now();
        let err = run_command("sleep 5", Some(Duration::from_millis(200)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Timeout(_)));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_pre_command_feeds_stdin() {
        let pre = Command::new(["echo", "from-pre"]);
        let out = run_command("cat", Some(Duration::from_secs(5)), Some(&pre))
            .await
            .unwrap();
        assert_eq!(out.stdout, b"from-pre\n");
    }

    #[tokio::test]
    async fn test_without_pre_command_stdin_is_empty() {
        let out = run_command("cat", Some(Duration::from_secs(5)), None)
            .await
            .unwrap();
        assert!(out.stdout.is_empty());
        assert_eq!(out.exit_code, 0);
    }

    #[tokio::test]
    async fn test_run_tokens_keeps_arguments_intact() {
        let cmd = Command::new(["sh", "-c", "printf '%s' \"$0\"", "a b"]);
        let out = run_tokens(&cmd, None).await.unwrap();
        assert_eq!(out.stdout, b"a b");
    }
}
