//! Callback-based progress reporting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::EnhanceError;
use crate::pipeline::StageTimings;

use super::handler::{ProgressEvent, ProgressHandler};

/// A progress handler that invokes a callback function.
///
/// # Example
///
/// ```rust,ignore
/// use imgenhance::progress::CallbackProgress;
///
/// let progress = CallbackProgress::new(|event| {
///     println!("[{:.0}%] {}", event.overall_progress * 100.0, event.message);
/// });
///
/// // Stops the pipeline before its next stage
/// progress.cancel();
/// ```
pub struct CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    callback: F,
    error_callback: Option<Arc<dyn Fn(&EnhanceError) + Send + Sync>>,
    complete_callback: Option<Arc<dyn Fn(&StageTimings) + Send + Sync>>,
    cancelled: AtomicBool,
}

impl<F> CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    /// Create a new callback progress handler.
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            error_callback: None,
            complete_callback: None,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Set an error callback.
    pub fn on_error<E>(mut self, callback: E) -> Self
    where
        E: Fn(&EnhanceError) + Send + Sync + 'static,
    {
        self.error_callback = Some(Arc::new(callback));
        self
    }

    /// Set a completion callback.
    pub fn on_complete<C>(mut self, callback: C) -> Self
    where
        C: Fn(&StageTimings) + Send + Sync + 'static,
    {
        self.complete_callback = Some(Arc::new(callback));
        self
    }

    /// Request cancellation; the pipeline stops before its next stage.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl<F> ProgressHandler for CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        (self.callback)(event.clone());
    }

    fn on_error(&self, error: &EnhanceError) {
        if let Some(ref callback) = self.error_callback {
            callback(error);
        }
    }

    fn on_complete(&self, timings: &StageTimings) {
        if let Some(ref callback) = self.complete_callback {
            callback(timings);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
