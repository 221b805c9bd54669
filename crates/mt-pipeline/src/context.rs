//! Per-run execution context: cancellation and progress reporting.

use std::sync::Arc;

use mt_core::{Error, Stage};
use tokio_util::sync::CancellationToken;

/// Sender for reporting progress from within a run.
///
/// Wraps a callback that receives a progress percentage (0.0 -- 100.0) and a
/// human-readable step description.
pub struct ProgressSender {
    callback: Box<dyn Fn(f32, &str) + Send + Sync>,
}

impl ProgressSender {
    /// Create a new sender from the given callback.
    pub fn new(callback: impl Fn(f32, &str) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op sender that discards all progress reports.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_, _| {}),
        }
    }

    /// Report progress.
    pub fn send(&self, progress: f32, step: &str) {
        (self.callback)(progress, step);
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}

/// Context passed to the driver for a single run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Checked at every stage boundary; a cancelled run stops before the
    /// next stage and cleans up.
    pub cancellation: CancellationToken,
    /// Receives progress after each completed stage.
    pub progress: Arc<ProgressSender>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            progress: Arc::new(ProgressSender::noop()),
        }
    }

    /// Builder: attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Builder: attach a progress sender.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    /// Fail with [`Error::Cancelled`] if the run was cancelled before `next`.
    pub fn ensure_active(&self, next: Stage) -> mt_core::Result<()> {
        if self.cancellation.is_cancelled() {
            return Err(Error::Cancelled(next));
        }
        Ok(())
    }
}
