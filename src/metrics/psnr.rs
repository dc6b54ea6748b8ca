//! PSNR (Peak Signal-to-Noise Ratio) calculation.
//!
//! PSNR measures pixel-level fidelity in decibels. Higher values indicate
//! less distortion.
//!
//! - Identical images: PSNR = infinity (MSE = 0)
//! - Excellent: PSNR > 40 dB
//! - Good: PSNR 30-40 dB
//! - Acceptable: PSNR 20-30 dB

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{EnhanceError, Result};
use crate::{ensure_same_shape, PixelBuffer, Sample};

use super::channel_sums;

/// Result of PSNR calculation.
#[derive(Debug, Clone, Serialize)]
pub struct PsnrResult {
    /// PSNR value in decibels (higher = better quality).
    /// `f64::INFINITY` for identical images.
    pub psnr_db: f64,

    /// Mean Squared Error over all samples of all channels.
    /// 0.0 indicates identical images.
    pub mse: f64,

    /// Peak sample value of the sample depth.
    pub max_value: f64,

    /// Per-channel PSNR for RGB images.
    /// None for grayscale images.
    pub per_component: Option<Vec<f64>>,
}

impl PsnrResult {
    /// Check if the images are identical.
    pub fn is_identical(&self) -> bool {
        self.mse == 0.0
    }

    /// Get a quality rating based on PSNR value.
    pub fn quality_rating(&self) -> &'static str {
        if self.psnr_db.is_infinite() {
            "Identical"
        } else if self.psnr_db > 40.0 {
            "Excellent"
        } else if self.psnr_db > 30.0 {
            "Good"
        } else if self.psnr_db > 20.0 {
            "Acceptable"
        } else {
            "Poor"
        }
    }
}

impl std::fmt::Display for PsnrResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.psnr_db.is_infinite() {
            write!(f, "PSNR: Infinity (identical)")
        } else {
            write!(f, "PSNR: {:.4} dB ({})", self.psnr_db, self.quality_rating())
        }
    }
}

/// Calculate PSNR between a reference and a candidate image.
///
/// MSE is accumulated in `f64` over every sample of every channel; the peak
/// value comes from the sample depth (255 for `u8`, 65535 for `u16`, 1.0
/// for `f32`), never from the image content.
///
/// # Errors
///
/// `EmptyInput` or `ShapeMismatch` if the images are not comparable;
/// `DegenerateResult` if the MSE is not finite (NaN samples).
///
/// # Example
///
/// ```rust,ignore
/// use imgenhance::metrics::calculate_psnr;
///
/// let result = calculate_psnr(&reference, &candidate)?;
/// println!("PSNR: {:.2} dB", result.psnr_db);
/// println!("MSE: {:.6}", result.mse);
/// ```
pub fn calculate_psnr<T: Sample>(
    reference: &PixelBuffer<T>,
    candidate: &PixelBuffer<T>,
) -> Result<PsnrResult> {
    ensure_same_shape(reference, candidate)?;

    let shape = reference.shape();
    let max_value = T::MAX_VALUE;

    let squared_errors: Vec<f64> = reference
        .samples()
        .par_iter()
        .zip(candidate.samples().par_iter())
        .map(|(&r, &c)| {
            let diff = r.to_f64() - c.to_f64();
            diff * diff
        })
        .collect();

    let sums = channel_sums(&squared_errors, shape);
    let pixel_count = (shape.width * shape.height) as f64;

    let mse = sums.iter().sum::<f64>() / squared_errors.len() as f64;
    if !mse.is_finite() {
        return Err(EnhanceError::DegenerateResult(format!(
            "mean squared error is not finite ({})",
            mse
        )));
    }

    let per_component = if sums.len() > 1 {
        Some(
            sums.iter()
                .map(|&sse| psnr_from_mse(sse / pixel_count, max_value))
                .collect(),
        )
    } else {
        None
    };

    Ok(PsnrResult {
        psnr_db: psnr_from_mse(mse, max_value),
        mse,
        max_value,
        per_component,
    })
}

/// PSNR in decibels between two images.
pub fn psnr<T: Sample>(reference: &PixelBuffer<T>, candidate: &PixelBuffer<T>) -> Result<f64> {
    calculate_psnr(reference, candidate).map(|r| r.psnr_db)
}

/// Convert an MSE to PSNR; zero error maps to infinity.
fn psnr_from_mse(mse: f64, max_value: f64) -> f64 {
    if mse == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (max_value * max_value / mse).log10()
    }
}
