//! Progress handler trait and related types.

use crate::error::EnhanceError;
use crate::pipeline::StageTimings;

/// Stage of an enhancement or evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// Validating inputs and preparing buffers.
    Preparing,
    /// Scoring the degraded input against the reference.
    Baseline,
    /// Noise reduction (Gaussian or bilateral).
    Denoising,
    /// Detail amplification (unsharp mask or kernel sharpen).
    Sharpening,
    /// Scoring the enhanced image.
    Scoring,
    /// Operation completed successfully.
    Complete,
    /// Operation failed.
    Failed,
}

impl ProgressPhase {
    /// Get a human-readable description of the phase.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Preparing => "Preparing",
            Self::Baseline => "Scoring input",
            Self::Denoising => "Reducing noise",
            Self::Sharpening => "Sharpening",
            Self::Scoring => "Scoring output",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Check if this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for ProgressPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Progress event emitted between pipeline stages.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Current phase of operation.
    pub phase: ProgressPhase,

    /// Number of stages finished so far.
    pub completed_stages: usize,

    /// Total stages in this run.
    pub total_stages: Option<usize>,

    /// Overall progress (0.0 to 1.0).
    pub overall_progress: f64,

    /// Status message.
    pub message: String,
}

impl Default for ProgressEvent {
    fn default() -> Self {
        Self {
            phase: ProgressPhase::Preparing,
            completed_stages: 0,
            total_stages: None,
            overall_progress: 0.0,
            message: String::new(),
        }
    }
}

impl ProgressEvent {
    /// Create a new progress event for a specific phase.
    pub fn new(phase: ProgressPhase) -> Self {
        Self {
            phase,
            message: phase.description().into(),
            ..Default::default()
        }
    }

    /// Create a completion event.
    pub fn complete(total_stages: usize) -> Self {
        Self {
            phase: ProgressPhase::Complete,
            completed_stages: total_stages,
            total_stages: Some(total_stages),
            overall_progress: 1.0,
            message: format!("Completed {} stages", total_stages),
        }
    }

    /// Create a failure event.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            phase: ProgressPhase::Failed,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Set stage progress information.
    pub fn with_stage_progress(mut self, completed: usize, total: usize) -> Self {
        self.completed_stages = completed;
        self.total_stages = Some(total);
        if total > 0 {
            self.overall_progress = completed as f64 / total as f64;
        }
        self
    }
}

impl std::fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(total) = self.total_stages {
            write!(
                f,
                "[{}/{}] {}: {}",
                self.completed_stages, total, self.phase, self.message
            )
        } else {
            write!(f, "{}: {}", self.phase, self.message)
        }
    }
}

/// Trait for handling progress updates from the enhancement pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use imgenhance::progress::{ProgressHandler, ProgressEvent};
///
/// struct Printer;
///
/// impl ProgressHandler for Printer {
///     fn on_progress(&self, event: &ProgressEvent) {
///         println!("{}", event);
///     }
/// }
/// ```
pub trait ProgressHandler: Send + Sync {
    /// Called when a stage starts.
    fn on_progress(&self, event: &ProgressEvent);

    /// Called when a stage fails.
    fn on_error(&self, error: &EnhanceError) {
        let _ = error;
    }

    /// Called when the run completes.
    fn on_complete(&self, timings: &StageTimings) {
        let _ = timings;
    }

    /// Check if the run should stop.
    ///
    /// Checked between stages; a running filter is never interrupted.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A no-op progress handler that does nothing.
///
/// Use this when you don't need progress reporting.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressHandler for NullProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
