//! Progress reporting for batch runs.
//!
//! The batch driver reports through [`ProgressCallback`] without knowing
//! how progress is rendered. The CLI plugs in `indicatif` bars; library
//! callers and tests use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a batch run.
pub trait ProgressCallback: Send + Sync {
    /// Sets the total number of documents.
    fn set_total(&self, total: u64);

    /// Advances by `delta` documents.
    fn inc(&self, delta: u64);

    /// Shows the document currently being processed.
    fn set_message(&self, msg: String);

    /// Marks the run as done.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
