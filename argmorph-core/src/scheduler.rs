//! Bounded worker pool for one category of candidates.

use crate::harness::Harness;
use crate::progress::ProgressSink;
use crate::types::{Candidate, Category, MatchSet};
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Pool width used when none is configured.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Runs candidates through the harness with at most `threads` in flight.
pub struct Scheduler {
    harness: Arc<Harness>,
    threads: usize,
    progress: Arc<dyn ProgressSink>,
}

impl Scheduler {
    pub fn new(harness: Arc<Harness>, threads: usize, progress: Arc<dyn ProgressSink>) -> Self {
        Self {
            harness,
            // Ensure at least one permit to avoid deadlock
            threads: threads.max(1),
            progress,
        }
    }

    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    /// Execute every candidate and return those equivalent to the baseline.
    ///
    /// Completion order is arbitrary; each task carries its own candidate so
    /// identifiers always stay attached to their outcome. Non-matching
    /// candidates are dropped as soon as they complete.
    pub async fn run_category(&self, category: Category, candidates: Vec<Candidate>) -> Result<MatchSet> {
        let total = candidates.len();
        info!("Preparing {} commands to run", total);

        let show_progress = total > 1;
        if show_progress {
            self.progress.begin(category.label(), total as u64);
        }

        let semaphore = Arc::new(Semaphore::new(self.threads));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();
        let mut matches = MatchSet::new();

        for candidate in candidates {
            let permit = semaphore.clone().acquire_owned().await?;
            let harness = self.harness.clone();
            let progress = self.progress.clone();
            let completed = completed.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let equivalent = harness.run_variant(&candidate.command).await;
                completed.fetch_add(1, Ordering::Relaxed);
                if show_progress {
                    progress.advance();
                }
                (candidate, equivalent)
            });

            // Collect whatever already finished so losers don't pile up.
            while let Some(joined) = tasks.try_join_next() {
                collect(category, joined, &mut matches);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            collect(category, joined, &mut matches);
        }

        if show_progress {
            self.progress.finish();
        }
        debug!(
            category = %category,
            completed = completed.load(Ordering::Relaxed),
            matched = matches.len(),
            "Category pass finished"
        );
        Ok(matches)
    }
}

fn collect(
    category: Category,
    joined: std::result::Result<(Candidate, bool), tokio::task::JoinError>,
    matches: &mut MatchSet,
) {
    match joined {
        Ok((candidate, true)) => {
            debug!(category = %category, id = %candidate.id, "Equivalent variant: {}", candidate.command);
            matches.insert(candidate);
        }
        Ok((_, false)) => {}
        Err(err) => error!(category = %category, "Worker task failed: {}", err),
    }
}
