//! Outcome aggregation: drive every strategy for one test case and collect
//! the per-category results.

use crate::baseline::{ResolveError, resolve};
use crate::generate::{CandidateGenerator, Generated, Strategy};
use crate::harness::Harness;
use crate::progress::{NoProgress, ProgressSink};
use crate::scheduler::{Scheduler, default_threads};
use crate::token::{RandomHexTokens, TokenSource};
use crate::types::{Candidate, Category, CategoryResult, MatchSet, TestCase, TestOutcomes};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Runs test cases end to end. Holds no per-test-case state, so one engine
/// can process a whole batch sequentially.
pub struct Engine {
    threads: usize,
    tokens: Arc<dyn TokenSource>,
    progress: Arc<dyn ProgressSink>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(default_threads())
    }
}

impl Engine {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
            tokens: Arc::new(RandomHexTokens),
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_tokens(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Resolve the baseline, then run every category in sequence.
    ///
    /// Fails only when the baseline cannot be resolved (see
    /// [`ResolveError`]) or the worker pool itself breaks down.
    pub async fn run(&self, test_case: &TestCase) -> Result<TestOutcomes> {
        let baseline = resolve(test_case, self.tokens.as_ref()).await?;
        debug!(
            exit_code = baseline.exit_code,
            "Baseline resolved for {}", test_case.command
        );

        let harness = Harness::new(Arc::new(baseline), self.tokens.clone(), test_case.timeout)
            .exit_code_only(test_case.exit_code_only)
            .pre_command(test_case.pre_command.clone())
            .post_command(test_case.post_command.clone());
        let scheduler = Scheduler::new(Arc::new(harness), self.threads, self.progress.clone());

        Ok(TestOutcomes {
            option_char: self.run_set(&scheduler, test_case, Category::OptionChar).await?,
            char_insert: self.run_set(&scheduler, test_case, Category::CharInsert).await?,
            char_substitute: self
                .run_set(&scheduler, test_case, Category::CharSubstitute)
                .await?,
            quotes: self.run_single(&scheduler, test_case).await,
            shorthands: self.run_set(&scheduler, test_case, Category::Shorthands).await?,
        })
    }

    async fn run_set(
        &self,
        scheduler: &Scheduler,
        test_case: &TestCase,
        category: Category,
    ) -> Result<CategoryResult<MatchSet>> {
        let set = match Strategy::for_category(category).generate(test_case) {
            Generated::NotApplicable => {
                info!(category = %category, "Not applicable");
                return Ok(CategoryResult::NotApplicable);
            }
            Generated::Candidates(set) => set,
        };
        if !set.unmaterialized.is_empty() {
            info!(
                category = %category,
                "{} code points could not be materialized and count as failed",
                set.unmaterialized.len()
            );
        }
        let matches = scheduler
            .run_category(category, set.candidates)
            .await
            .with_context(|| format!("Worker pool failed during {category}"))?;
        Ok(CategoryResult::from_matches(matches))
    }

    /// Quote injection has exactly one candidate and runs it inline.
    async fn run_single(&self, scheduler: &Scheduler, test_case: &TestCase) -> CategoryResult<String> {
        let Generated::Candidates(set) = Strategy::for_category(Category::Quotes).generate(test_case) else {
            return CategoryResult::NotApplicable;
        };
        let Some(Candidate { command, .. }) = set.candidates.into_iter().next() else {
            return CategoryResult::TestedEmpty;
        };
        if scheduler.harness().run_variant(&command).await {
            CategoryResult::Found(command)
        } else {
            CategoryResult::TestedEmpty
        }
    }
}

/// True when the error aborted a test case because its executable is missing.
pub fn is_missing_executable(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ResolveError>(),
        Some(ResolveError::ExecutableNotFound { .. })
    )
}
