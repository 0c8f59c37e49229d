//! Baseline resolution: run the canonical command once and record what
//! "equivalent" has to look like.

use crate::exec::{ExecError, run_command};
use crate::token::{TokenSource, substitute_token};
use crate::types::{BaselineResult, TestCase};
use thiserror::Error;
use tracing::{error, info, warn};

/// Fatal baseline failures. The test case is abandoned.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Command \"{command}\" could not be executed: {program} not found")]
    ExecutableNotFound { command: String, program: String },

    #[error("Argument {index} (\"{token}\") contains a space and would be split apart")]
    SeparatorInToken { index: usize, token: String },
}

/// Run the canonical command (no timeout) and capture its exit code and output.
///
/// A missing executable is fatal. So is, on Unix, a token containing the
/// separator, since the executed argv would not match the test case.
/// Non-zero exit codes are valid baselines; any other execution failure is
/// logged and recorded as exit code -1 with empty output.
pub async fn resolve(
    test_case: &TestCase,
    tokens: &dyn TokenSource,
) -> Result<BaselineResult, ResolveError> {
    #[cfg(not(windows))]
    if let Some((index, token)) = test_case.command.token_with_separator() {
        return Err(ResolveError::SeparatorInToken {
            index,
            token: token.to_string(),
        });
    }

    let command = substitute_token(&test_case.command.flatten(), &tokens.fresh());
    info!("Resolving baseline for {}", command);

    match run_command(&command, None, test_case.pre_command.as_ref()).await {
        Ok(output) => {
            let baseline = BaselineResult {
                exit_code: output.exit_code,
                output: output.combined(),
            };
            if !output.success() {
                warn!(
                    "Observed exit code is {}, which is not 0 as usual",
                    output.exit_code
                );
                warn!("Test outcome may contain unexpected results");
                warn!("{}", baseline.output_lossy());
            }
            Ok(baseline)
        }
        Err(ExecError::NotFound { program }) => {
            error!("Command \"{}\" could not be executed: file not found", command);
            Err(ResolveError::ExecutableNotFound { command, program })
        }
        Err(err) => {
            warn!("Baseline execution of \"{}\" failed: {}", command, err);
            Ok(BaselineResult {
                exit_code: -1,
                output: Vec::new(),
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::token::FixedToken;
    use crate::types::Command;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn case(tokens: &[&str]) -> TestCase {
        TestCase::new(Command::new(tokens.iter().copied()))
    }

    fn script(dir: &Path, body: &str, mode: u32) -> String {
        let path = dir.join("tool");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path.display().to_string()
    }

    #[tokio::test]
    async fn test_resolve_records_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "echo service not found; exit 2", 0o755);
        let baseline = resolve(&case(&[&tool, "start"]), &FixedToken("T".into()))
            .await
            .unwrap();
        assert_eq!(baseline.exit_code, 2);
        assert_eq!(baseline.output, b"service not found\n / ");
    }

    #[tokio::test]
    async fn test_resolve_missing_executable_is_fatal() {
        let tc = case(&["argmorph-missing-exe-123", "/x"]);
        let err = resolve(&tc, &FixedToken("T".into())).await.unwrap_err();
        match err {
            ResolveError::ExecutableNotFound { program, .. } => {
                assert_eq!(program, "argmorph-missing-exe-123")
            }
            other => panic!("expected ExecutableNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_token_with_space() {
        // run as given, this argv exits 3; flattened and split it would not
        let tc = case(&["sh", "-c", "exit 3"]);
        let err = resolve(&tc, &FixedToken("T".into())).await.unwrap_err();
        match err {
            ResolveError::SeparatorInToken { index, token } => {
                assert_eq!(index, 2);
                assert_eq!(token, "exit 3");
            }
            other => panic!("expected SeparatorInToken, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_substitutes_token() {
        let tc = case(&["echo", "user-{random}"]);
        let baseline = resolve(&tc, &FixedToken("ABCDEF0123".into()))
            .await
            .unwrap();
        assert_eq!(baseline.output, b"user-ABCDEF0123\n / ");
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "echo stable; exit 4", 0o755);
        let tc = case(&[&tool, "x"]);
        let tokens = FixedToken("T".into());
        let first = resolve(&tc, &tokens).await.unwrap();
        let second = resolve(&tc, &tokens).await.unwrap();
        assert_eq!(first.exit_code, 4);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_resolve_spawn_failure_records_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "exit 0", 0o644);
        let baseline = resolve(&case(&[&tool, "x"]), &FixedToken("T".into()))
            .await
            .unwrap();
        assert_eq!(baseline.exit_code, -1);
        assert!(baseline.output.is_empty());
    }
}
