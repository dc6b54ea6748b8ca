//! Enhancement pipeline module.
//!
//! This module orchestrates the enhancement workflow: noise reduction
//! followed by sharpening, with quality scoring before and after. It runs
//! every stage inside its own worker pool and reports stage progress.
//!
//! Two modes are supported:
//! - **Evaluation** (`evaluate`): a clean reference is available, so the
//!   degraded input and the enhanced output are both scored against it.
//! - **Practical** (`practical`): only the degraded image exists; the
//!   enhanced output is scored against it.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::{DenoiseMethod, EnhancementConfig, SharpenMethod};
use crate::error::{EnhanceError, Result};
use crate::filters::{
    bilateral_filter, bilateral_filter_fast, gaussian_blur, sharpen, unsharp_mask,
};
use crate::metrics::{ImageComparator, QualityReport};
use crate::progress::{NullProgress, ProgressEvent, ProgressHandler, ProgressPhase};
use crate::{ensure_same_shape, PixelBuffer, Sample};

/// Wall-clock time spent in each stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageTimings {
    /// Scoring the degraded input (evaluation mode only).
    pub baseline: Option<Duration>,
    /// Noise reduction.
    pub denoise: Duration,
    /// Sharpening.
    pub sharpen: Duration,
    /// Scoring the enhanced output.
    pub scoring: Option<Duration>,
}

impl StageTimings {
    /// Total time across all stages.
    pub fn total(&self) -> Duration {
        self.baseline.unwrap_or_default()
            + self.denoise
            + self.sharpen
            + self.scoring.unwrap_or_default()
    }
}

/// Images produced by one enhancement run.
#[derive(Debug, Clone)]
pub struct EnhancementOutput<T: Sample = u8> {
    /// Result of the noise reduction stage.
    pub denoised: PixelBuffer<T>,
    /// Final sharpened image.
    pub enhanced: PixelBuffer<T>,
    /// Stage timings.
    pub timings: StageTimings,
}

/// Change in each metric from the baseline to the enhanced image.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Improvement {
    /// PSNR difference in dB.
    pub psnr_db: f64,
    /// SSIM difference.
    pub ssim: f64,
    /// Composite difference, if both reports have a composite score.
    pub composite: Option<f64>,
}

/// Result of evaluation mode.
#[derive(Debug, Clone)]
pub struct Evaluation<T: Sample = u8> {
    /// Degraded input scored against the clean reference.
    pub baseline: QualityReport,
    /// Enhanced output scored against the clean reference.
    pub enhanced: QualityReport,
    /// Enhancement images and timings.
    pub output: EnhancementOutput<T>,
}

impl<T: Sample> Evaluation<T> {
    /// Metric deltas (enhanced minus baseline).
    pub fn improvement(&self) -> Improvement {
        Improvement {
            psnr_db: self.enhanced.psnr.psnr_db - self.baseline.psnr.psnr_db,
            ssim: self.enhanced.ssim.ssim - self.baseline.ssim.ssim,
            composite: match (self.enhanced.composite, self.baseline.composite) {
                (Some(e), Some(b)) => Some(e - b),
                _ => None,
            },
        }
    }

    /// Whether enhancement raised the composite score.
    ///
    /// Falls back to SSIM when either report lacks a composite score.
    pub fn improved(&self) -> bool {
        match (self.enhanced.composite, self.baseline.composite) {
            (Some(e), Some(b)) => e > b,
            _ => self.enhanced.ssim.ssim > self.baseline.ssim.ssim,
        }
    }
}

/// Result of practical mode.
#[derive(Debug, Clone)]
pub struct PracticalResult<T: Sample = u8> {
    /// Enhanced output scored against the degraded input.
    pub report: QualityReport,
    /// Enhancement images and timings.
    pub output: EnhancementOutput<T>,
}

/// Enhancement pipeline with a dedicated worker pool.
pub struct EnhancementPipeline {
    config: EnhancementConfig,
    comparator: ImageComparator,
    pool: rayon::ThreadPool,
    progress: Box<dyn ProgressHandler>,
}

impl EnhancementPipeline {
    /// Create a pipeline from a configuration.
    ///
    /// The configuration is validated here, so every later call only fails
    /// on its image inputs.
    pub fn new(config: EnhancementConfig) -> Result<Self> {
        config.validate()?;

        let threads = config.worker_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| EnhanceError::Internal(e.to_string()))?;

        log::debug!("Enhancement pipeline using {} worker threads", threads);

        Ok(Self {
            comparator: ImageComparator::with_ssim_config(config.ssim.clone()),
            config,
            pool,
            progress: Box::new(NullProgress),
        })
    }

    /// Attach a progress handler.
    pub fn with_progress<P: ProgressHandler + 'static>(mut self, progress: P) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &EnhancementConfig {
        &self.config
    }

    /// Number of worker threads in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run an operation inside the pipeline's worker pool.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool.install(op)
    }

    /// Score a candidate against a reference with the configured SSIM
    /// settings.
    pub fn compare<T: Sample>(
        &self,
        reference: &PixelBuffer<T>,
        candidate: &PixelBuffer<T>,
    ) -> Result<QualityReport> {
        ensure_same_shape(reference, candidate)?;
        let (report, elapsed) = self.stage(ProgressPhase::Scoring, 0, 1, || {
            self.comparator.compare(reference, candidate)
        })?;
        self.finish(
            1,
            &StageTimings {
                scoring: Some(elapsed),
                ..Default::default()
            },
        );
        Ok(report)
    }

    /// Denoise and sharpen an image.
    pub fn enhance<T: Sample>(&self, image: &PixelBuffer<T>) -> Result<EnhancementOutput<T>> {
        image.ensure_non_empty("input image")?;
        let output = self.run_enhancement(image, 0, 2)?;
        self.finish(2, &output.timings);
        Ok(output)
    }

    /// Evaluation mode: score, enhance and re-score a degraded image against
    /// its clean reference.
    ///
    /// Fails with `ShapeMismatch` before any filtering if the two images
    /// differ in shape.
    pub fn evaluate<T: Sample>(
        &self,
        clean: &PixelBuffer<T>,
        degraded: &PixelBuffer<T>,
    ) -> Result<Evaluation<T>> {
        ensure_same_shape(clean, degraded)?;
        let total = 4;

        let (baseline, baseline_time) = self.stage(ProgressPhase::Baseline, 0, total, || {
            self.comparator.compare(clean, degraded)
        })?;
        log::info!(
            "Baseline: PSNR {:.4} dB, SSIM {:.4}",
            baseline.psnr.psnr_db,
            baseline.ssim.ssim
        );

        let mut output = self.run_enhancement(degraded, 1, total)?;

        let (enhanced, scoring_time) = self.stage(ProgressPhase::Scoring, 3, total, || {
            self.comparator.compare(clean, &output.enhanced)
        })?;
        log::info!(
            "Enhanced: PSNR {:.4} dB, SSIM {:.4}",
            enhanced.psnr.psnr_db,
            enhanced.ssim.ssim
        );

        output.timings.baseline = Some(baseline_time);
        output.timings.scoring = Some(scoring_time);
        self.finish(total, &output.timings);

        Ok(Evaluation {
            baseline,
            enhanced,
            output,
        })
    }

    /// Practical mode: enhance a degraded image and score the result
    /// against it.
    pub fn practical<T: Sample>(&self, degraded: &PixelBuffer<T>) -> Result<PracticalResult<T>> {
        degraded.ensure_non_empty("input image")?;
        let total = 3;

        let mut output = self.run_enhancement(degraded, 0, total)?;

        let (report, scoring_time) = self.stage(ProgressPhase::Scoring, 2, total, || {
            self.comparator.compare(degraded, &output.enhanced)
        })?;
        log::info!(
            "Enhanced vs input: PSNR {:.4} dB, SSIM {:.4}",
            report.psnr.psnr_db,
            report.ssim.ssim
        );

        output.timings.scoring = Some(scoring_time);
        self.finish(total, &output.timings);

        Ok(PracticalResult { report, output })
    }

    fn run_enhancement<T: Sample>(
        &self,
        image: &PixelBuffer<T>,
        completed: usize,
        total: usize,
    ) -> Result<EnhancementOutput<T>> {
        let (denoised, denoise_time) =
            self.stage(ProgressPhase::Denoising, completed, total, || self.denoise(image))?;

        let (enhanced, sharpen_time) =
            self.stage(ProgressPhase::Sharpening, completed + 1, total, || {
                self.sharpen(image, &denoised)
            })?;

        Ok(EnhancementOutput {
            denoised,
            enhanced,
            timings: StageTimings {
                denoise: denoise_time,
                sharpen: sharpen_time,
                ..Default::default()
            },
        })
    }

    fn denoise<T: Sample>(&self, image: &PixelBuffer<T>) -> Result<PixelBuffer<T>> {
        match self.config.denoise {
            DenoiseMethod::Gaussian => {
                let params = &self.config.gaussian;
                gaussian_blur(image, params.kernel_size, params.sigma)
            }
            DenoiseMethod::Bilateral => bilateral_filter(image, &self.config.bilateral),
            DenoiseMethod::BilateralFast => bilateral_filter_fast(image, &self.config.bilateral),
        }
    }

    fn sharpen<T: Sample>(
        &self,
        original: &PixelBuffer<T>,
        denoised: &PixelBuffer<T>,
    ) -> Result<PixelBuffer<T>> {
        match self.config.sharpen {
            SharpenMethod::UnsharpMask => {
                let params = &self.config.unsharp;
                unsharp_mask(original, denoised, params.amount, params.threshold)
            }
            SharpenMethod::Kernel => sharpen(denoised, self.config.kernel_amount),
        }
    }

    /// Run one stage inside the worker pool, reporting progress and timing.
    fn stage<R, F>(
        &self,
        phase: ProgressPhase,
        completed: usize,
        total: usize,
        work: F,
    ) -> Result<(R, Duration)>
    where
        R: Send,
        F: FnOnce() -> Result<R> + Send,
    {
        if self.progress.is_cancelled() {
            log::warn!("Cancelled before stage: {}", phase);
            return Err(EnhanceError::Cancelled);
        }
        self.progress
            .on_progress(&ProgressEvent::new(phase).with_stage_progress(completed, total));

        let start = Instant::now();
        match self.pool.install(work) {
            Ok(result) => {
                let elapsed = start.elapsed();
                log::debug!("{} took {:.2?}", phase, elapsed);
                Ok((result, elapsed))
            }
            Err(e) => {
                log::error!("{} failed: {}", phase, e);
                self.progress.on_error(&e);
                self.progress.on_progress(&ProgressEvent::failed(e.to_string()));
                Err(e)
            }
        }
    }

    fn finish(&self, total: usize, timings: &StageTimings) {
        log::info!("Finished in {:.2?}", timings.total());
        self.progress.on_progress(&ProgressEvent::complete(total));
        self.progress.on_complete(timings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BilateralParams, GaussianParams, UnsharpParams};
    use crate::filters::unsharp_mask_with_blur;
    use crate::progress::CallbackProgress;
    use crate::Channels;
    use std::sync::{Arc, Mutex};

    fn pipeline() -> EnhancementPipeline {
        EnhancementPipeline::new(EnhancementConfig {
            threads: Some(2),
            ..Default::default()
        })
        .unwrap()
    }

    fn textured(width: usize, height: usize) -> PixelBuffer {
        let mut image = PixelBuffer::new(width, height, Channels::Rgb);
        for y in 0..height {
            for x in 0..width {
                for c in 0..3 {
                    let v = ((x * 9 + y * 5 + c * 40) % 200) as u8 + 20;
                    image.set(x, y, c, v);
                }
            }
        }
        image
    }

    fn noisy(clean: &PixelBuffer) -> PixelBuffer {
        let mut out = clean.clone();
        for y in 0..clean.height() {
            for x in 0..clean.width() {
                if (x * 7 + y * 3) % 5 == 0 {
                    let v = clean.get(x, y, 1);
                    out.set(x, y, 1, v.saturating_add(25));
                }
            }
        }
        out
    }

    #[test]
    fn test_pipeline_uses_configured_threads() {
        assert_eq!(pipeline().threads(), 2);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EnhancementConfig {
            gaussian: GaussianParams::new(5, 0.0),
            ..Default::default()
        };
        assert!(matches!(
            EnhancementPipeline::new(config),
            Err(EnhanceError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_enhance_matches_filters() {
        let image = textured(16, 12);
        let output = pipeline().enhance(&image).unwrap();

        let expected =
            unsharp_mask_with_blur(&image, &GaussianParams::default(), &UnsharpParams::default())
                .unwrap();
        assert_eq!(output.enhanced, expected);
        assert_eq!(output.denoised, gaussian_blur(&image, 5, 1.0).unwrap());
        assert!(output.timings.baseline.is_none());
    }

    #[test]
    fn test_enhance_with_bilateral_and_kernel() {
        let config = EnhancementConfig {
            denoise: DenoiseMethod::Bilateral,
            sharpen: SharpenMethod::Kernel,
            bilateral: BilateralParams::new(5, 2.0, 25.0),
            threads: Some(1),
            ..Default::default()
        };
        let image = textured(10, 10);
        let output = EnhancementPipeline::new(config).unwrap().enhance(&image).unwrap();

        let denoised = bilateral_filter(&image, &BilateralParams::new(5, 2.0, 25.0)).unwrap();
        assert_eq!(output.denoised, denoised);
        assert_eq!(output.enhanced, sharpen(&denoised, 1.0).unwrap());
    }

    #[test]
    fn test_evaluate_reports() {
        let clean = textured(24, 16);
        let degraded = noisy(&clean);
        let evaluation = pipeline().evaluate(&clean, &degraded).unwrap();

        let comparator = ImageComparator::new();
        let baseline = comparator.compare(&clean, &degraded).unwrap();
        assert_eq!(evaluation.baseline.psnr.psnr_db, baseline.psnr.psnr_db);
        assert_eq!(evaluation.baseline.ssim.ssim, baseline.ssim.ssim);

        let enhanced = comparator.compare(&clean, &evaluation.output.enhanced).unwrap();
        assert_eq!(evaluation.enhanced.ssim.ssim, enhanced.ssim.ssim);

        let delta = evaluation.improvement();
        assert_eq!(
            delta.ssim,
            evaluation.enhanced.ssim.ssim - evaluation.baseline.ssim.ssim
        );
        assert_eq!(
            evaluation.improved(),
            evaluation.enhanced.composite.unwrap() > evaluation.baseline.composite.unwrap()
        );
        assert!(evaluation.output.timings.baseline.is_some());
        assert!(evaluation.output.timings.scoring.is_some());
    }

    #[test]
    fn test_evaluate_shape_mismatch_fails_fast() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let pipeline = pipeline().with_progress(CallbackProgress::new(move |event| {
            sink.lock().unwrap().push(event.phase);
        }));

        let clean: PixelBuffer = PixelBuffer::new(4, 4, Channels::Rgb);
        let degraded: PixelBuffer = PixelBuffer::new(4, 5, Channels::Rgb);
        assert!(matches!(
            pipeline.evaluate(&clean, &degraded),
            Err(EnhanceError::ShapeMismatch { .. })
        ));
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_practical_scores_against_input() {
        let degraded = noisy(&textured(20, 20));
        let result = pipeline().practical(&degraded).unwrap();

        let report = ImageComparator::new()
            .compare(&degraded, &result.output.enhanced)
            .unwrap();
        assert_eq!(result.report.psnr.psnr_db, report.psnr.psnr_db);
        assert_eq!(result.output.enhanced.shape(), degraded.shape());
    }

    #[test]
    fn test_progress_events_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let pipeline = pipeline().with_progress(CallbackProgress::new(move |event| {
            sink.lock().unwrap().push(event.phase);
        }));

        let clean = textured(8, 8);
        pipeline.evaluate(&clean, &noisy(&clean)).unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                ProgressPhase::Baseline,
                ProgressPhase::Denoising,
                ProgressPhase::Sharpening,
                ProgressPhase::Scoring,
                ProgressPhase::Complete,
            ]
        );
    }

    #[test]
    fn test_cancelled_before_first_stage() {
        let progress = CallbackProgress::new(|_| {});
        progress.cancel();
        let pipeline = pipeline().with_progress(progress);

        let image = textured(8, 8);
        assert!(matches!(
            pipeline.enhance(&image),
            Err(EnhanceError::Cancelled)
        ));
    }

    #[test]
    fn test_compare_uses_configured_ssim() {
        let config = EnhancementConfig {
            ssim: crate::metrics::SsimConfig::default().window_size(7).with_map(),
            threads: Some(1),
            ..Default::default()
        };
        let pipeline = EnhancementPipeline::new(config).unwrap();
        let a = textured(9, 9);
        let report = pipeline.compare(&a, &noisy(&a)).unwrap();
        assert_eq!(report.ssim.map_dimensions, Some((9, 9)));
        assert_eq!(pipeline.install(|| rayon::current_num_threads()), 1);
    }

    #[test]
    fn test_enhance_rejects_empty_input() {
        let image: PixelBuffer = PixelBuffer::new(0, 0, Channels::Gray);
        assert!(matches!(
            pipeline().enhance(&image),
            Err(EnhanceError::EmptyInput(_))
        ));
    }
}
