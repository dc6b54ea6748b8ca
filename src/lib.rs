//! Image Enhancement and Quality Scoring Library
//!
//! Restores a degraded raster image (noise reduction followed by edge
//! sharpening) and scores the similarity of two images with standard
//! fidelity metrics.
//!
//! # Features
//!
//! - **Gaussian blur**: separable two-pass convolution with clamp-to-edge borders
//! - **Bilateral filter**: edge-preserving smoothing with spatial and range weights
//! - **Sharpening**: unsharp masking with a noise gate, or a fixed 3x3 kernel
//! - **Metrics**: PSNR, windowed SSIM and a composite score in `[0, 1]`
//! - **Parallel**: every filter and metric partitions work by output rows
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use imgenhance::{EnhancementConfig, EnhancementPipeline};
//!
//! let pipeline = EnhancementPipeline::new(EnhancementConfig::default())?;
//! let evaluation = pipeline.evaluate(&clean, &degraded)?;
//! println!("{}", evaluation.enhanced);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod error;
pub mod filters;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod progress;

// Re-export commonly used types
pub use config::{
    BilateralParams, DenoiseMethod, EnhancementConfig, GaussianParams, SharpenMethod,
    UnsharpParams,
};
pub use error::{EnhanceError, Result};
pub use metrics::{composite_score, ImageComparator, QualityReport};
pub use pipeline::{EnhancementOutput, EnhancementPipeline, Evaluation, PracticalResult};

use serde::{Deserialize, Serialize};

/// A numeric sample type that a [`PixelBuffer`] can hold.
///
/// `MAX_VALUE` is the representable maximum of the sample depth. It drives
/// output clamping in the filters and the peak value used by PSNR and SSIM.
pub trait Sample: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Largest value of the sample depth (255 for 8-bit, 65535 for 16-bit, 1.0 for float).
    const MAX_VALUE: f64;

    /// Widen the sample for computation.
    fn to_f64(self) -> f64;

    /// Narrow a computed value back to the sample depth.
    ///
    /// Values are clamped to `[0, MAX_VALUE]`; integer depths round to the
    /// nearest integer.
    fn from_f64(value: f64) -> Self;

    /// Narrow a computed value, clamping to `[0, MAX_VALUE]` and then
    /// truncating toward zero on integer depths.
    fn from_f64_truncated(value: f64) -> Self;
}

impl Sample for u8 {
    const MAX_VALUE: f64 = 255.0;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value.round().clamp(0.0, Self::MAX_VALUE) as u8
    }

    fn from_f64_truncated(value: f64) -> Self {
        value.clamp(0.0, Self::MAX_VALUE) as u8
    }
}

impl Sample for u16 {
    const MAX_VALUE: f64 = 65535.0;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value.round().clamp(0.0, Self::MAX_VALUE) as u16
    }

    fn from_f64_truncated(value: f64) -> Self {
        value.clamp(0.0, Self::MAX_VALUE) as u16
    }
}

impl Sample for f32 {
    const MAX_VALUE: f64 = 1.0;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value.clamp(0.0, Self::MAX_VALUE) as f32
    }

    fn from_f64_truncated(value: f64) -> Self {
        Self::from_f64(value)
    }
}

/// Channel layout of a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channels {
    /// One sample per pixel.
    Gray,
    /// Three interleaved samples per pixel (R, G, B).
    Rgb,
}

impl Channels {
    /// Number of samples per pixel.
    pub fn count(self) -> usize {
        match self {
            Channels::Gray => 1,
            Channels::Rgb => 3,
        }
    }

    /// Map a raw channel count to a layout.
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(Channels::Gray),
            3 => Some(Channels::Rgb),
            _ => None,
        }
    }
}

/// Width, height and channel layout of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Channel layout.
    pub channels: Channels,
}

impl Shape {
    /// Create a new shape.
    pub fn new(width: usize, height: usize, channels: Channels) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Total number of samples (W·H·C).
    pub fn sample_count(&self) -> usize {
        self.width * self.height * self.channels.count()
    }

    /// Number of samples in one row.
    pub fn row_len(&self) -> usize {
        self.width * self.channels.count()
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels.count())
    }
}

/// Interleaved image samples with a fixed shape.
///
/// Sample `(x, y, c)` lives at index `(y * width + x) * channels + c`.
/// The storage length always equals `width * height * channels`; there is
/// no resizing after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<T: Sample = u8> {
    shape: Shape,
    samples: Vec<T>,
}

impl<T: Sample> PixelBuffer<T> {
    /// Create a zero-initialized buffer.
    ///
    /// Zero width or height is accepted here; every filter and metric
    /// rejects such a buffer with [`EnhanceError::EmptyInput`].
    pub fn new(width: usize, height: usize, channels: Channels) -> Self {
        let shape = Shape::new(width, height, channels);
        Self {
            shape,
            samples: vec![T::default(); shape.sample_count()],
        }
    }

    /// Create a buffer where every sample has the same value.
    pub fn filled(width: usize, height: usize, channels: Channels, value: T) -> Self {
        let shape = Shape::new(width, height, channels);
        Self {
            shape,
            samples: vec![value; shape.sample_count()],
        }
    }

    /// Wrap existing interleaved samples.
    pub fn from_samples(
        width: usize,
        height: usize,
        channels: Channels,
        samples: Vec<T>,
    ) -> Result<Self> {
        let shape = Shape::new(width, height, channels);
        if samples.len() != shape.sample_count() {
            return Err(EnhanceError::InvalidParameter(format!(
                "Sample count mismatch for {}: expected {}, got {}",
                shape,
                shape.sample_count(),
                samples.len()
            )));
        }
        Ok(Self { shape, samples })
    }

    /// Build a buffer from computed values, narrowing each with [`Sample::from_f64`].
    pub(crate) fn from_f64_slice(shape: Shape, values: &[f64]) -> Self {
        debug_assert_eq!(values.len(), shape.sample_count());
        Self {
            shape,
            samples: values.iter().map(|&v| T::from_f64(v)).collect(),
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.shape.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.shape.height
    }

    /// Channel layout.
    pub fn channels(&self) -> Channels {
        self.shape.channels
    }

    /// Shape of the buffer.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Flat index of sample `(x, y, c)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize, c: usize) -> usize {
        (y * self.shape.width + x) * self.shape.channels.count() + c
    }

    /// Read sample `(x, y, c)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> T {
        self.samples[self.index(x, y, c)]
    }

    /// Write sample `(x, y, c)`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, c: usize, value: T) {
        let idx = self.index(x, y, c);
        self.samples[idx] = value;
    }

    /// All samples in interleaved order.
    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    /// Consume the buffer and return its samples.
    pub fn into_samples(self) -> Vec<T> {
        self.samples
    }

    /// Widen every sample to `f64`.
    pub fn to_f64(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.to_f64()).collect()
    }

    /// Fail with [`EnhanceError::EmptyInput`] if the buffer has no samples.
    pub(crate) fn ensure_non_empty(&self, what: &str) -> Result<()> {
        if self.is_empty() {
            return Err(EnhanceError::EmptyInput(format!(
                "{} has no samples ({})",
                what, self.shape
            )));
        }
        Ok(())
    }
}

/// Check that two buffers are non-empty and share a shape.
pub(crate) fn ensure_same_shape<T: Sample>(
    left: &PixelBuffer<T>,
    right: &PixelBuffer<T>,
) -> Result<()> {
    left.ensure_non_empty("first image")?;
    right.ensure_non_empty("second image")?;
    if left.shape() != right.shape() {
        return Err(EnhanceError::shape_mismatch(left.shape(), right.shape()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_zeroed() {
        let image: PixelBuffer = PixelBuffer::new(4, 3, Channels::Rgb);
        assert_eq!(image.samples().len(), 4 * 3 * 3);
        assert!(image.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_index_layout() {
        let mut image: PixelBuffer = PixelBuffer::new(5, 4, Channels::Rgb);
        assert_eq!(image.index(0, 0, 0), 0);
        assert_eq!(image.index(1, 0, 2), 5);
        assert_eq!(image.index(0, 1, 0), 15);

        image.set(2, 3, 1, 77);
        assert_eq!(image.get(2, 3, 1), 77);
        assert_eq!(image.samples()[(3 * 5 + 2) * 3 + 1], 77);
    }

    #[test]
    fn test_from_samples_validates_length() {
        assert!(PixelBuffer::from_samples(2, 2, Channels::Gray, vec![0u8; 4]).is_ok());
        let err = PixelBuffer::from_samples(2, 2, Channels::Rgb, vec![0u8; 4]).unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidParameter(_)));
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let image: PixelBuffer = PixelBuffer::new(0, 4, Channels::Gray);
        assert!(image.is_empty());
        assert!(matches!(
            image.ensure_non_empty("input"),
            Err(EnhanceError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_ensure_same_shape() {
        let a: PixelBuffer = PixelBuffer::new(4, 4, Channels::Gray);
        let b: PixelBuffer = PixelBuffer::new(4, 5, Channels::Gray);
        let c: PixelBuffer = PixelBuffer::new(4, 4, Channels::Rgb);
        assert!(ensure_same_shape(&a, &a.clone()).is_ok());
        assert!(matches!(
            ensure_same_shape(&a, &b),
            Err(EnhanceError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            ensure_same_shape(&a, &c),
            Err(EnhanceError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_sample_narrowing() {
        assert_eq!(u8::from_f64(-3.0), 0);
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(u8::from_f64(114.6), 115);
        assert_eq!(u8::from_f64_truncated(114.6), 114);
        assert_eq!(u8::from_f64_truncated(-0.5), 0);
        assert_eq!(u8::from_f64_truncated(255.9), 255);
        assert_eq!(u16::from_f64_truncated(1.99), 1);
        assert_eq!(u16::from_f64(70000.0), 65535);
        assert_eq!(f32::from_f64(1.5), 1.0);
        assert_eq!(u8::MAX_VALUE, 255.0);
        assert_eq!(u16::MAX_VALUE, 65535.0);
        assert_eq!(f32::MAX_VALUE, 1.0);
    }

    #[test]
    fn test_channels_from_count() {
        assert_eq!(Channels::from_count(1), Some(Channels::Gray));
        assert_eq!(Channels::from_count(3), Some(Channels::Rgb));
        assert_eq!(Channels::from_count(4), None);
    }
}
