//! Image comparator for comprehensive quality analysis.
//!
//! Combines PSNR, SSIM and the composite score into a unified quality report.

use serde::Serialize;

use crate::error::Result;
use crate::{PixelBuffer, Sample};

use super::{calculate_psnr, calculate_ssim, composite_score, PsnrResult, SsimConfig, SsimResult};

/// Comprehensive quality report combining multiple metrics.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    /// PSNR analysis result.
    pub psnr: PsnrResult,

    /// SSIM analysis result.
    pub ssim: SsimResult,

    /// Composite score in `[0, 1]`.
    /// None when the metrics fall outside the scorer's domain (negative SSIM).
    pub composite: Option<f64>,
}

impl QualityReport {
    /// Check if the two images were identical.
    pub fn is_identical(&self) -> bool {
        self.psnr.is_identical()
    }

    /// Get an overall quality summary from the composite score.
    pub fn overall_quality(&self) -> &'static str {
        if self.is_identical() {
            return "Identical";
        }

        match self.composite {
            Some(c) if c >= 0.90 => "Excellent",
            Some(c) if c >= 0.80 => "Good",
            Some(c) if c >= 0.60 => "Acceptable",
            _ => "Poor",
        }
    }
}

impl std::fmt::Display for QualityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Quality Report")?;
        writeln!(f, "==============")?;
        writeln!(f, "Overall: {}", self.overall_quality())?;
        writeln!(f)?;
        writeln!(f, "{}", self.psnr)?;
        writeln!(f, "{}", self.ssim)?;
        match self.composite {
            Some(c) => writeln!(f, "Composite: {:.4}", c)?,
            None => writeln!(f, "Composite: n/a")?,
        }
        if let Some(per) = &self.psnr.per_component {
            let parts: Vec<String> = per.iter().map(|p| format!("{:.2}", p)).collect();
            writeln!(f, "  PSNR per channel (R, G, B): {}", parts.join(", "))?;
        }
        if let Some(per) = &self.ssim.per_component {
            let parts: Vec<String> = per.iter().map(|s| format!("{:.4}", s)).collect();
            writeln!(f, "  SSIM per channel (R, G, B): {}", parts.join(", "))?;
        }
        Ok(())
    }
}

/// Utility for comparing a reference image with a candidate.
#[derive(Debug, Clone, Default)]
pub struct ImageComparator {
    /// SSIM configuration.
    ssim_config: SsimConfig,
}

impl ImageComparator {
    /// Create a new image comparator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a comparator with custom SSIM configuration.
    pub fn with_ssim_config(ssim_config: SsimConfig) -> Self {
        Self { ssim_config }
    }

    /// SSIM configuration in use.
    pub fn ssim_config(&self) -> &SsimConfig {
        &self.ssim_config
    }

    /// Compare two images and generate a comprehensive quality report.
    ///
    /// # Errors
    ///
    /// Returns an error if the images are empty or differ in shape, or if a
    /// metric is degenerate.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use imgenhance::metrics::ImageComparator;
    ///
    /// let comparator = ImageComparator::new();
    /// let report = comparator.compare(&reference, &candidate)?;
    /// println!("{}", report);
    /// ```
    pub fn compare<T: Sample>(
        &self,
        reference: &PixelBuffer<T>,
        candidate: &PixelBuffer<T>,
    ) -> Result<QualityReport> {
        let psnr = calculate_psnr(reference, candidate)?;
        let ssim = calculate_ssim(reference, candidate, &self.ssim_config)?;
        let composite = composite_score(psnr.psnr_db, ssim.ssim).ok();

        Ok(QualityReport {
            psnr,
            ssim,
            composite,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnhanceError;
    use crate::Channels;

    #[test]
    fn test_compare_identical_black() {
        let img = PixelBuffer::filled(4, 4, Channels::Gray, 0u8);
        let report = ImageComparator::new().compare(&img, &img.clone()).unwrap();

        assert!(report.psnr.psnr_db.is_infinite());
        assert_eq!(report.ssim.ssim, 1.0);
        assert_eq!(report.composite, Some(1.0));
        assert!(report.is_identical());
        assert_eq!(report.overall_quality(), "Identical");
    }

    #[test]
    fn test_compare_black_vs_white() {
        let black = PixelBuffer::filled(2, 2, Channels::Gray, 0u8);
        let white = PixelBuffer::filled(2, 2, Channels::Gray, 255u8);
        let report = ImageComparator::new().compare(&black, &white).unwrap();

        assert_eq!(report.psnr.psnr_db, 0.0);
        let composite = report.composite.unwrap();
        assert!((composite - 0.5 * report.ssim.ssim).abs() < 1e-12);
        assert_eq!(report.overall_quality(), "Poor");
    }

    #[test]
    fn test_compare_shape_mismatch() {
        let a = PixelBuffer::filled(4, 4, Channels::Gray, 0u8);
        let b = PixelBuffer::filled(4, 5, Channels::Gray, 0u8);
        assert!(matches!(
            ImageComparator::new().compare(&a, &b),
            Err(EnhanceError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_report_display_and_json() {
        let a = PixelBuffer::filled(8, 8, Channels::Rgb, 100u8);
        let mut b = a.clone();
        b.set(3, 3, 0, 140);
        let report = ImageComparator::new().compare(&a, &b).unwrap();

        let text = report.to_string();
        assert!(text.contains("Quality Report"));
        assert!(text.contains("PSNR:"));
        assert!(text.contains("SSIM:"));
        assert!(text.contains("Composite:"));

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert!(json["psnr"]["psnr_db"].is_f64());
        assert!(json["composite"].is_f64());
        assert_eq!(json["ssim"]["per_component"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_infinite_psnr_serializes_as_null() {
        let img = PixelBuffer::filled(4, 4, Channels::Gray, 7u8);
        let report = ImageComparator::new().compare(&img, &img).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["psnr"]["psnr_db"].is_null());
    }
}
