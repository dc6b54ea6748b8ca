//! Composite quality score.

use crate::error::{EnhanceError, Result};

/// PSNR treated as perfect quality when normalizing.
pub const PSNR_CEILING_DB: f64 = 50.0;

/// Combine PSNR and SSIM into a single score in `[0, 1]`.
///
/// `composite = 0.5 · min(psnr / 50, 1) + 0.5 · ssim`. An infinite PSNR
/// normalizes to 1.0. The score is non-decreasing in both arguments.
///
/// # Errors
///
/// `InvalidParameter` if either input is negative or NaN.
pub fn composite_score(psnr: f64, ssim: f64) -> Result<f64> {
    if psnr.is_nan() || psnr < 0.0 {
        return Err(EnhanceError::InvalidParameter(format!(
            "composite score needs a non-negative PSNR, got {}",
            psnr
        )));
    }
    if ssim.is_nan() || ssim < 0.0 {
        return Err(EnhanceError::InvalidParameter(format!(
            "composite score needs a non-negative SSIM, got {}",
            ssim
        )));
    }

    let normalized_psnr = (psnr / PSNR_CEILING_DB).min(1.0);
    Ok(0.5 * normalized_psnr + 0.5 * ssim)
}
