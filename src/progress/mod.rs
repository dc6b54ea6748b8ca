//! Progress reporting for enhancement runs.
//!
//! The pipeline reports each stage (baseline scoring, noise reduction,
//! sharpening, final scoring) through a [`ProgressHandler`] and checks it
//! for cancellation between stages.
//!
//! # Example
//!
//! ```rust,ignore
//! use imgenhance::progress::CallbackProgress;
//! use imgenhance::{EnhancementConfig, EnhancementPipeline};
//!
//! let progress = CallbackProgress::new(|event| println!("{}", event));
//! let pipeline = EnhancementPipeline::new(EnhancementConfig::default())?
//!     .with_progress(progress);
//! ```

mod callback;
mod handler;

pub use callback::CallbackProgress;
pub use handler::{NullProgress, ProgressEvent, ProgressHandler, ProgressPhase};
