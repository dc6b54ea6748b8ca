//! Configuration types for filter parameters and the enhancement pipeline.
//!
//! Every parameter is passed explicitly; nothing is read from the
//! environment. A configuration can be loaded from TOML:
//!
//! ```toml
//! denoise = "bilateral"
//! sharpen = "unsharp-mask"
//! threads = 4
//!
//! [gaussian]
//! kernel_size = 5
//! sigma = 1.0
//!
//! [unsharp]
//! amount = 1.5
//! threshold = 0.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EnhanceError, Result};
use crate::metrics::SsimConfig;

/// Largest kernel the fast bilateral variant evaluates.
pub const FAST_BILATERAL_MAX_KERNEL: usize = 9;

/// Largest accepted kernel or window size for any filter.
pub const MAX_KERNEL_SIZE: usize = 255;

/// Noise reduction stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DenoiseMethod {
    /// Separable Gaussian blur.
    #[default]
    Gaussian,
    /// Edge-preserving bilateral filter.
    Bilateral,
    /// Bilateral filter with the kernel capped at 9x9.
    BilateralFast,
}

/// Sharpening stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SharpenMethod {
    /// Amplify the difference between the input and its denoised version.
    #[default]
    UnsharpMask,
    /// Convolve the denoised image with the fixed 3x3 sharpen kernel.
    Kernel,
}

/// Gaussian blur parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianParams {
    /// Kernel size; even values are bumped to the next odd value.
    /// At most [`MAX_KERNEL_SIZE`].
    pub kernel_size: usize,
    /// Standard deviation of the Gaussian (must be > 0).
    pub sigma: f64,
}

impl Default for GaussianParams {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            sigma: 1.0,
        }
    }
}

impl GaussianParams {
    /// Create Gaussian parameters.
    pub fn new(kernel_size: usize, sigma: f64) -> Self {
        Self { kernel_size, sigma }
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<()> {
        check_kernel_size("gaussian kernel size", self.kernel_size)?;
        check_sigma("gaussian sigma", self.sigma)?;
        Ok(())
    }
}

/// Unsharp mask parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsharpParams {
    /// Detail amplification factor (0 = identity).
    pub amount: f64,
    /// Details with a magnitude below this value are left untouched.
    pub threshold: f64,
}

impl Default for UnsharpParams {
    fn default() -> Self {
        Self {
            amount: 1.5,
            threshold: 0.0,
        }
    }
}

impl UnsharpParams {
    /// Create unsharp mask parameters.
    pub fn new(amount: f64, threshold: f64) -> Self {
        Self { amount, threshold }
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<()> {
        check_non_negative("unsharp amount", self.amount)?;
        check_non_negative("unsharp threshold", self.threshold)
    }
}

/// Bilateral filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BilateralParams {
    /// Window size; the window radius is `kernel_size / 2`. At most
    /// [`MAX_KERNEL_SIZE`].
    pub kernel_size: usize,
    /// Spatial standard deviation (must be > 0).
    pub sigma_spatial: f64,
    /// Range (color similarity) standard deviation (must be > 0).
    pub sigma_range: f64,
}

impl Default for BilateralParams {
    fn default() -> Self {
        Self {
            kernel_size: 9,
            sigma_spatial: 3.0,
            sigma_range: 30.0,
        }
    }
}

impl BilateralParams {
    /// Create bilateral parameters.
    pub fn new(kernel_size: usize, sigma_spatial: f64, sigma_range: f64) -> Self {
        Self {
            kernel_size,
            sigma_spatial,
            sigma_range,
        }
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<()> {
        check_kernel_size("bilateral kernel size", self.kernel_size)?;
        check_sigma("bilateral spatial sigma", self.sigma_spatial)?;
        check_sigma("bilateral range sigma", self.sigma_range)?;
        Ok(())
    }

    /// Parameters for the fast variant (kernel capped at 9).
    pub fn fast(&self) -> Self {
        Self {
            kernel_size: self.kernel_size.min(FAST_BILATERAL_MAX_KERNEL),
            ..*self
        }
    }
}

/// Configuration for the enhancement pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    /// Noise reduction method.
    pub denoise: DenoiseMethod,
    /// Sharpening method.
    pub sharpen: SharpenMethod,
    /// Strength of the fixed 3x3 kernel (used by `SharpenMethod::Kernel`).
    pub kernel_amount: f64,
    /// Worker threads; `None` uses one per CPU.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    /// Gaussian blur parameters (used by `DenoiseMethod::Gaussian`).
    pub gaussian: GaussianParams,
    /// Bilateral parameters (used by the bilateral methods).
    pub bilateral: BilateralParams,
    /// Unsharp mask parameters (used by `SharpenMethod::UnsharpMask`).
    pub unsharp: UnsharpParams,
    /// SSIM settings for quality reports.
    pub ssim: SsimConfig,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            denoise: DenoiseMethod::Gaussian,
            sharpen: SharpenMethod::UnsharpMask,
            kernel_amount: 1.0,
            threads: None,
            gaussian: GaussianParams::default(),
            bilateral: BilateralParams::default(),
            unsharp: UnsharpParams::default(),
            ssim: SsimConfig::default(),
        }
    }
}

impl EnhancementConfig {
    /// Configuration that denoises with the bilateral filter.
    pub fn edge_preserving() -> Self {
        Self {
            denoise: DenoiseMethod::Bilateral,
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EnhancementConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Serialize the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate all parameters, including the ones of unused stages.
    pub fn validate(&self) -> Result<()> {
        self.gaussian.validate()?;
        self.bilateral.validate()?;
        self.unsharp.validate()?;
        check_non_negative("kernel sharpen amount", self.kernel_amount)?;
        self.ssim.validate()?;
        if self.threads == Some(0) {
            return Err(EnhanceError::Config(
                "threads must be at least 1 (omit it to use all CPUs)".into(),
            ));
        }
        Ok(())
    }

    /// Number of worker threads to use.
    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Reject values that are not finite and strictly positive.
pub(crate) fn check_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EnhanceError::InvalidParameter(format!(
            "{} must be a finite value > 0, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate a Gaussian standard deviation and return `2σ²`.
///
/// Rejects sigmas whose `2σ²` underflows to zero or overflows, since the
/// weights `exp(-d² / 2σ²)` are then NaN or constant.
pub(crate) fn check_sigma(name: &str, sigma: f64) -> Result<f64> {
    check_positive(name, sigma)?;
    let denom = 2.0 * sigma * sigma;
    if !denom.is_finite() || denom <= 0.0 {
        return Err(EnhanceError::InvalidParameter(format!(
            "{} = {} is out of range (2σ² = {})",
            name, sigma, denom
        )));
    }
    Ok(denom)
}

/// Reject kernel sizes above [`MAX_KERNEL_SIZE`].
pub(crate) fn check_kernel_size(name: &str, size: usize) -> Result<()> {
    if size > MAX_KERNEL_SIZE {
        return Err(EnhanceError::InvalidParameter(format!(
            "{} must be at most {}, got {}",
            name, MAX_KERNEL_SIZE, size
        )));
    }
    Ok(())
}

/// Reject values that are not finite or negative.
pub(crate) fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EnhanceError::InvalidParameter(format!(
            "{} must be a finite value >= 0, got {}",
            name, value
        )));
    }
    Ok(())
}
