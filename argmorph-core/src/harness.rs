//! Execution harness: run one variant and decide whether it behaves like
//! the baseline.

use crate::exec::{ExecError, run_command, run_tokens};
use crate::token::{TokenSource, substitute_token};
use crate::types::{BaselineResult, Command};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything a worker needs to test a variant. Shared read-only across the
/// pool of one category.
pub struct Harness {
    baseline: Arc<BaselineResult>,
    tokens: Arc<dyn TokenSource>,
    timeout: Duration,
    exit_code_only: bool,
    pre_command: Option<Command>,
    post_command: Option<Command>,
}

impl Harness {
    pub fn new(baseline: Arc<BaselineResult>, tokens: Arc<dyn TokenSource>, timeout: Duration) -> Self {
        Self {
            baseline,
            tokens,
            timeout,
            exit_code_only: false,
            pre_command: None,
            post_command: None,
        }
    }

    /// Compare exit codes only, ignoring output.
    pub fn exit_code_only(mut self, exit_code_only: bool) -> Self {
        self.exit_code_only = exit_code_only;
        self
    }

    pub fn pre_command(mut self, command: Option<Command>) -> Self {
        self.pre_command = command;
        self
    }

    pub fn post_command(mut self, command: Option<Command>) -> Self {
        self.post_command = command;
        self
    }

    pub fn baseline(&self) -> &BaselineResult {
        &self.baseline
    }

    /// Execute one variant and report whether it is equivalent to the
    /// baseline. Never fails: timeouts and execution errors count as
    /// non-equivalent. The post-command runs exactly once afterwards.
    pub async fn run_variant(&self, command: &str) -> bool {
        let command = substitute_token(command, &self.tokens.fresh());
        let equivalent = self.execute_and_compare(&command).await;
        self.run_post_command().await;
        equivalent
    }

    async fn execute_and_compare(&self, command: &str) -> bool {
        match run_command(command, Some(self.timeout), self.pre_command.as_ref()).await {
            Ok(output) => {
                info!(
                    "Exit code {} observed ({} desired) for {}",
                    output.exit_code, self.baseline.exit_code, command
                );
                let equivalent = output.exit_code == self.baseline.exit_code
                    && (self.exit_code_only || output.combined() == self.baseline.output);
                if !equivalent {
                    debug!("Behaviour differs from baseline for {}", command);
                }
                equivalent
            }
            Err(ExecError::Timeout(limit)) => {
                warn!(
                    "Timeout ({:.2}s) elapsed for command \"{}\"",
                    limit.as_secs_f64(),
                    command
                );
                false
            }
            Err(err) => {
                info!("Exception when executing \"{}\": {}", command, err);
                false
            }
        }
    }

    async fn run_post_command(&self) {
        let Some(post) = &self.post_command else {
            return;
        };
        match run_tokens(post, Some(self.timeout)).await {
            Ok(output) => debug!("Post command exited with exit code {}", output.exit_code),
            Err(err) => warn!("Post command caused exception ({})", err),
        }
    }
}
