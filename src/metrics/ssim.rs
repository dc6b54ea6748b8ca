//! SSIM (Structural Similarity Index) calculation.
//!
//! SSIM is a perceptual metric that measures structural similarity between images.
//! It considers luminance, contrast, and structure, making it more aligned with
//! human visual perception than PSNR.
//!
//! - SSIM = 1.0: Identical images
//! - SSIM > 0.95: Excellent quality (nearly imperceptible difference)
//! - SSIM > 0.90: Good quality
//! - SSIM > 0.80: Acceptable quality
//!
//! Local statistics are Gaussian-weighted window means computed with the same
//! convolution engine as the blur filter, so the SSIM map covers every pixel.
//! Channels are scored independently on the raw samples; there is no
//! luminance conversion.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{check_kernel_size, check_positive, check_sigma};
use crate::error::{EnhanceError, Result};
use crate::filters::gaussian_mean_plane;
use crate::{ensure_same_shape, PixelBuffer, Sample};

use super::channel_sums;

/// Configuration for SSIM calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsimConfig {
    /// Window size for local statistics (default: 11).
    /// Larger windows are more stable but less sensitive to local differences.
    pub window_size: usize,

    /// Standard deviation of the Gaussian window (default: 1.5).
    pub sigma: f64,

    /// K1 constant for luminance comparison (default: 0.01).
    /// Stabilizes division when luminance is close to zero.
    pub k1: f64,

    /// K2 constant for contrast comparison (default: 0.03).
    /// Stabilizes division when contrast is close to zero.
    pub k2: f64,

    /// Whether to generate a spatial SSIM map.
    /// Useful for visualizing where quality degradation occurs.
    pub generate_map: bool,
}

impl Default for SsimConfig {
    fn default() -> Self {
        Self {
            window_size: 11,
            sigma: 1.5,
            k1: 0.01,
            k2: 0.03,
            generate_map: false,
        }
    }
}

impl SsimConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set window size.
    pub fn window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Set the Gaussian window sigma.
    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Enable SSIM map generation.
    pub fn with_map(mut self) -> Self {
        self.generate_map = true;
        self
    }

    /// Check that the window and stabilizing constants are usable.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(EnhanceError::InvalidParameter(
                "SSIM window size must be at least 1".to_string(),
            ));
        }
        check_kernel_size("SSIM window size", self.window_size)?;
        check_sigma("SSIM sigma", self.sigma)?;
        check_positive("SSIM k1", self.k1)?;
        check_positive("SSIM k2", self.k2)?;
        Ok(())
    }
}

/// Result of SSIM calculation.
#[derive(Debug, Clone, Serialize)]
pub struct SsimResult {
    /// Mean SSIM over every sample of the map (nominally -1.0 to 1.0).
    pub ssim: f64,

    /// Interleaved SSIM map, one value per sample, same layout as the input.
    /// Only populated if `config.generate_map` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssim_map: Option<Vec<f64>>,

    /// Map dimensions (width, height) if map is generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_dimensions: Option<(usize, usize)>,

    /// Per-channel mean SSIM for RGB images.
    /// None for grayscale images.
    pub per_component: Option<Vec<f64>>,

    /// Mean luminance comparison term.
    pub luminance: f64,

    /// Mean contrast-structure comparison term.
    pub contrast_structure: f64,
}

impl SsimResult {
    /// Check if images are structurally identical.
    pub fn is_identical(&self) -> bool {
        (self.ssim - 1.0).abs() < f64::EPSILON
    }

    /// Get a quality rating based on SSIM value.
    pub fn quality_rating(&self) -> &'static str {
        if self.ssim > 0.95 {
            "Excellent"
        } else if self.ssim > 0.90 {
            "Good"
        } else if self.ssim > 0.80 {
            "Acceptable"
        } else {
            "Poor"
        }
    }
}

impl std::fmt::Display for SsimResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SSIM: {:.4} ({})", self.ssim, self.quality_rating())
    }
}

/// Calculate SSIM between a reference and a candidate image.
///
/// For each sample the map value is
///
/// ```text
/// ((2·μA·μB + C1)(2·σAB + C2)) / ((μA² + μB² + C1)(σA² + σB² + C2))
/// ```
///
/// with `C1 = (k1·MAX)²`, `C2 = (k2·MAX)²` and `MAX` taken from the sample
/// depth. The result is the mean of the map over all samples of all channels.
///
/// # Errors
///
/// `EmptyInput` or `ShapeMismatch` if the images are not comparable,
/// `InvalidParameter` for a bad configuration, `DegenerateResult` if the
/// mean is not finite.
///
/// # Example
///
/// ```rust,ignore
/// use imgenhance::metrics::{calculate_ssim, SsimConfig};
///
/// let config = SsimConfig::default().with_map();
/// let result = calculate_ssim(&reference, &candidate, &config)?;
/// println!("SSIM: {:.4}", result.ssim);
/// ```
pub fn calculate_ssim<T: Sample>(
    reference: &PixelBuffer<T>,
    candidate: &PixelBuffer<T>,
    config: &SsimConfig,
) -> Result<SsimResult> {
    ensure_same_shape(reference, candidate)?;
    config.validate()?;

    let shape = reference.shape();
    let max_value = T::MAX_VALUE;
    let c1 = (config.k1 * max_value).powi(2);
    let c2 = (config.k2 * max_value).powi(2);

    let a = reference.to_f64();
    let b = candidate.to_f64();
    let a_sq: Vec<f64> = a.par_iter().map(|v| v * v).collect();
    let b_sq: Vec<f64> = b.par_iter().map(|v| v * v).collect();
    let ab: Vec<f64> = a.par_iter().zip(b.par_iter()).map(|(x, y)| x * y).collect();

    let local_mean = |plane: &[f64]| {
        gaussian_mean_plane(plane, shape, config.window_size, config.sigma)
    };
    let mu_a = local_mean(&a)?;
    let mu_b = local_mean(&b)?;
    let e_a_sq = local_mean(&a_sq)?;
    let e_b_sq = local_mean(&b_sq)?;
    let e_ab = local_mean(&ab)?;

    // (luminance term, contrast-structure term) per sample.
    let terms: Vec<(f64, f64)> = (0..a.len())
        .into_par_iter()
        .map(|i| {
            let (ma, mb) = (mu_a[i], mu_b[i]);
            let var_a = e_a_sq[i] - ma * ma;
            let var_b = e_b_sq[i] - mb * mb;
            let cov = e_ab[i] - ma * mb;

            let l = (2.0 * ma * mb + c1) / (ma * ma + mb * mb + c1);
            let cs = (2.0 * cov + c2) / (var_a + var_b + c2);
            (l, cs)
        })
        .collect();

    let map: Vec<f64> = terms.par_iter().map(|&(l, cs)| l * cs).collect();
    let luminance: Vec<f64> = terms.iter().map(|&(l, _)| l).collect();
    let contrast_structure: Vec<f64> = terms.iter().map(|&(_, cs)| cs).collect();

    let sample_count = map.len() as f64;
    let pixel_count = (shape.width * shape.height) as f64;

    let sums = channel_sums(&map, shape);
    let ssim = sums.iter().sum::<f64>() / sample_count;
    if !ssim.is_finite() {
        return Err(EnhanceError::DegenerateResult(format!(
            "mean SSIM is not finite ({})",
            ssim
        )));
    }

    let per_component = if sums.len() > 1 {
        Some(sums.iter().map(|s| s / pixel_count).collect())
    } else {
        None
    };

    let luminance = channel_sums(&luminance, shape).iter().sum::<f64>() / sample_count;
    let contrast_structure =
        channel_sums(&contrast_structure, shape).iter().sum::<f64>() / sample_count;

    let (ssim_map, map_dimensions) = if config.generate_map {
        (Some(map), Some((shape.width, shape.height)))
    } else {
        (None, None)
    };

    Ok(SsimResult {
        ssim,
        ssim_map,
        map_dimensions,
        per_component,
        luminance,
        contrast_structure,
    })
}

/// Mean SSIM between two images with the standard 11x11, σ=1.5 window.
pub fn ssim<T: Sample>(reference: &PixelBuffer<T>, candidate: &PixelBuffer<T>) -> Result<f64> {
    calculate_ssim(reference, candidate, &SsimConfig::default()).map(|r| r.ssim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Channels;

    fn pattern(width: usize, height: usize, channels: Channels, seed: usize) -> PixelBuffer {
        let samples = (0..width * height * channels.count())
            .map(|i| ((i * 37 + seed * 11) % 251) as u8)
            .collect();
        PixelBuffer::from_samples(width, height, channels, samples).unwrap()
    }

    #[test]
    fn test_ssim_identical_images() {
        let img = pattern(32, 24, Channels::Gray, 1);
        let result = calculate_ssim(&img, &img.clone(), &SsimConfig::default()).unwrap();
        assert!((result.ssim - 1.0).abs() < 1e-12);
        assert!(result.is_identical());
        assert_eq!(result.quality_rating(), "Excellent");
    }

    #[test]
    fn test_ssim_identical_black() {
        let img = PixelBuffer::filled(4, 4, Channels::Gray, 0u8);
        assert_eq!(ssim(&img, &img).unwrap(), 1.0);
    }

    #[test]
    fn test_ssim_is_symmetric() {
        let a = pattern(20, 16, Channels::Rgb, 1);
        let b = pattern(20, 16, Channels::Rgb, 7);
        assert_eq!(ssim(&a, &b).unwrap(), ssim(&b, &a).unwrap());
    }

    #[test]
    fn test_ssim_drops_with_noise() {
        let clean = PixelBuffer::filled(32, 32, Channels::Gray, 128u8);
        let noisy = pattern(32, 32, Channels::Gray, 3);
        let value = ssim(&clean, &noisy).unwrap();
        assert!(value < 0.5, "got {}", value);
        assert!(value >= -1.0);
    }

    #[test]
    fn test_ssim_black_vs_white() {
        let black = PixelBuffer::filled(8, 8, Channels::Gray, 0u8);
        let white = PixelBuffer::filled(8, 8, Channels::Gray, 255u8);
        let result = calculate_ssim(&black, &white, &SsimConfig::default()).unwrap();
        // Luminance term: C1 / (255² + C1)
        let c1 = (0.01f64 * 255.0).powi(2);
        assert!((result.ssim - c1 / (65025.0 + c1)).abs() < 1e-9);
        assert_eq!(result.quality_rating(), "Poor");
    }

    #[test]
    fn test_ssim_per_component_and_map() {
        let a = pattern(12, 10, Channels::Rgb, 2);
        let mut b = a.clone();
        for y in 0..10 {
            for x in 0..12 {
                b.set(x, y, 2, 255 - a.get(x, y, 2));
            }
        }

        let config = SsimConfig::default().with_map();
        let result = calculate_ssim(&a, &b, &config).unwrap();

        let per = result.per_component.as_ref().unwrap();
        assert_eq!(per.len(), 3);
        assert!((per[0] - 1.0).abs() < 1e-12);
        assert!((per[1] - 1.0).abs() < 1e-12);
        assert!(per[2] < 1.0);

        let mean_of_channels = per.iter().sum::<f64>() / 3.0;
        assert!((result.ssim - mean_of_channels).abs() < 1e-12);

        let map = result.ssim_map.as_ref().unwrap();
        assert_eq!(map.len(), 12 * 10 * 3);
        assert_eq!(result.map_dimensions, Some((12, 10)));
    }

    #[test]
    fn test_ssim_no_map_by_default() {
        let a = pattern(8, 8, Channels::Gray, 1);
        let result = calculate_ssim(&a, &a, &SsimConfig::default()).unwrap();
        assert!(result.ssim_map.is_none());
        assert!(result.map_dimensions.is_none());
        assert!(result.per_component.is_none());
    }

    #[test]
    fn test_ssim_tiny_images() {
        for &(w, h) in &[(1, 1), (2, 2)] {
            let a = PixelBuffer::filled(w, h, Channels::Rgb, 30u8);
            let b = PixelBuffer::filled(w, h, Channels::Rgb, 40u8);
            let value = ssim(&a, &b).unwrap();
            assert!(value.is_finite() && value < 1.0);
        }
    }

    #[test]
    fn test_ssim_shape_mismatch() {
        let a = PixelBuffer::filled(4, 4, Channels::Gray, 0u8);
        let b = PixelBuffer::filled(4, 5, Channels::Gray, 0u8);
        assert!(matches!(
            ssim(&a, &b),
            Err(EnhanceError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_ssim_rejects_bad_config() {
        let a = pattern(8, 8, Channels::Gray, 1);
        let config = SsimConfig::default().sigma(0.0);
        assert!(matches!(
            calculate_ssim(&a, &a, &config),
            Err(EnhanceError::InvalidParameter(_))
        ));
        assert!(SsimConfig::default().window_size(0).validate().is_err());
        assert!(SsimConfig::default().window_size(4096).validate().is_err());
        assert!(SsimConfig::default().sigma(1e-170).validate().is_err());
    }

    #[test]
    fn test_ssim_float_samples() {
        let a = PixelBuffer::filled(6, 6, Channels::Gray, 0.25f32);
        let b = PixelBuffer::filled(6, 6, Channels::Gray, 0.75f32);
        let result = calculate_ssim(&a, &b, &SsimConfig::default()).unwrap();
        assert!(result.ssim > 0.0 && result.ssim < 1.0);
    }
}
