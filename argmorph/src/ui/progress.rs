//! Per-category progress bars using the indicatif crate.
//!
//! The engine reports progress through [`ProgressSink`]; this adapter draws
//! one bar per category pass on stderr and hides itself when stderr is not
//! a terminal or output is quiet or JSON.

use argmorph_core::ProgressSink;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;

/// Progress bar characters for filled display.
const PROGRESS_CHARS: &str = "█▓░";

const TEMPLATE: &str =
    "{prefix:.bold} {msg:24} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA {eta}";

/// Draws a bar for each category pass of the current test case.
pub struct CategoryProgress {
    visible: bool,
    prefix: Mutex<String>,
    current: Mutex<ProgressBar>,
}

impl CategoryProgress {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            prefix: Mutex::new(String::new()),
            current: Mutex::new(ProgressBar::hidden()),
        }
    }

    /// Label following bars with the process under test.
    pub fn set_test_case(&self, name: &str) {
        *self.prefix.lock().unwrap_or_else(|e| e.into_inner()) = name.to_string();
    }

    fn bar(&self, label: &str, total: u64) -> ProgressBar {
        if !self.visible {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_bar()
                .template(TEMPLATE)
                .expect("valid template")
                .progress_chars(PROGRESS_CHARS),
        );
        pb.set_prefix(self.prefix.lock().unwrap_or_else(|e| e.into_inner()).clone());
        pb.set_message(label.to_string());
        pb
    }
}

impl ProgressSink for CategoryProgress {
    fn begin(&self, label: &str, total: u64) {
        let bar = self.bar(label, total);
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = bar;
    }

    fn advance(&self) {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).inc(1);
    }

    fn finish(&self) {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_still_counts() {
        let progress = CategoryProgress::new(false);
        progress.set_test_case("net");
        progress.begin("Dash/hyphen", 3);
        progress.advance();
        progress.advance();
        let bar = progress.current.lock().unwrap().clone();
        assert_eq!(bar.position(), 2);
        assert!(bar.is_hidden());
        progress.finish();
    }

    #[test]
    fn test_begin_replaces_previous_bar() {
        let progress = CategoryProgress::new(false);
        progress.begin("first", 2);
        progress.advance();
        progress.begin("second", 5);
        assert_eq!(progress.current.lock().unwrap().position(), 0);
    }
}
