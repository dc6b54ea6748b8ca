//! Quality metrics for comparing two images.
//!
//! This module provides tools to measure how close an image is to a reference:
//! - **PSNR** (Peak Signal-to-Noise Ratio): Measures pixel-level fidelity
//! - **SSIM** (Structural Similarity Index): Measures perceptual similarity
//! - **Composite score**: Averages normalized PSNR and SSIM into `[0, 1]`
//!
//! Every metric validates its inputs first (non-empty, equal shape) and
//! performs no computation when validation fails.
//!
//! # Example
//!
//! ```rust,ignore
//! use imgenhance::metrics::{calculate_psnr, calculate_ssim, SsimConfig};
//!
//! let psnr_result = calculate_psnr(&reference, &candidate)?;
//! println!("PSNR: {:.2} dB", psnr_result.psnr_db);
//!
//! let ssim_result = calculate_ssim(&reference, &candidate, &SsimConfig::default())?;
//! println!("SSIM: {:.4}", ssim_result.ssim);
//! ```

mod comparator;
mod composite;
mod psnr;
mod ssim;

pub use comparator::{ImageComparator, QualityReport};
pub use composite::{composite_score, PSNR_CEILING_DB};
pub use psnr::{calculate_psnr, psnr, PsnrResult};
pub use ssim::{calculate_ssim, ssim, SsimConfig, SsimResult};

use rayon::prelude::*;

use crate::Shape;

/// Sum an interleaved plane per channel.
///
/// Rows are summed in parallel and the row partials are combined in row
/// order, so the result does not depend on thread scheduling.
pub(crate) fn channel_sums(values: &[f64], shape: Shape) -> Vec<f64> {
    let channels = shape.channels.count();
    let row_len = shape.row_len();
    if values.is_empty() || row_len == 0 {
        return vec![0.0; channels];
    }

    let partials: Vec<Vec<f64>> = values
        .par_chunks(row_len)
        .map(|row| {
            let mut sums = vec![0.0; channels];
            for pixel in row.chunks_exact(channels) {
                for (sum, &v) in sums.iter_mut().zip(pixel) {
                    *sum += v;
                }
            }
            sums
        })
        .collect();

    partials.iter().fold(vec![0.0; channels], |mut acc, row| {
        for (a, &v) in acc.iter_mut().zip(row) {
            *a += v;
        }
        acc
    })
}
