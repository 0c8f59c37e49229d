//! Progress reporting seam between the scheduler and the front end.

/// Receives progress for one category pass at a time.
///
/// `advance` is called from many workers concurrently.
pub trait ProgressSink: Send + Sync {
    /// A category pass with `total` candidates is starting.
    fn begin(&self, label: &str, total: u64);
    /// One candidate finished.
    fn advance(&self);
    /// The current pass is done.
    fn finish(&self);
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn begin(&self, _label: &str, _total: u64) {}
    fn advance(&self) {}
    fn finish(&self) {}
}
