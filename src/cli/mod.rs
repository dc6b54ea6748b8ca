//! Command-line interface for the image enhancement tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::config::{DenoiseMethod, EnhancementConfig, SharpenMethod};
use crate::filters::{
    bilateral_filter, bilateral_filter_fast, gaussian_blur, sharpen, unsharp_mask_with_blur,
};
use crate::io::{load_image, save_image};
use crate::metrics::QualityReport;
use crate::pipeline::{
    EnhancementPipeline, Evaluation, Improvement, PracticalResult, StageTimings,
};
use crate::progress::CallbackProgress;
use crate::{Channels, PixelBuffer};

/// Image Enhancement Tool
///
/// Reduces noise, sharpens detail and scores image quality with PSNR,
/// SSIM and a composite score.
#[derive(Parser, Debug)]
#[command(name = "imgenhance")]
#[command(version)]
#[command(about = "Image enhancement and PSNR/SSIM quality scoring")]
#[command(long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Load settings from a TOML file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Worker threads (default: one per CPU)
    #[arg(short = 'j', long, global = true)]
    pub threads: Option<usize>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Load images as single-channel grayscale
    #[arg(long, global = true)]
    pub grayscale: bool,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a degraded image against its clean reference before and after enhancement
    Test {
        /// Clean reference image
        #[arg(long)]
        clean: PathBuf,

        /// Degraded (compressed or noisy) image
        #[arg(long)]
        degraded: PathBuf,

        /// Where to write the enhanced image
        #[arg(short, long, default_value = "output_enhanced.png")]
        output: PathBuf,

        /// Filter parameter overrides
        #[command(flatten)]
        params: FilterArgs,
    },

    /// Enhance an image and score the result against the input
    Practical {
        /// Degraded input image
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for output_blurred.png and output_enhanced.png
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Filter parameter overrides
        #[command(flatten)]
        params: FilterArgs,
    },

    /// Compare two images
    Compare {
        /// Reference image
        #[arg(short, long)]
        reference: PathBuf,

        /// Candidate image
        #[arg(short = 'x', long)]
        candidate: PathBuf,
    },

    /// Apply a single filter
    Filter {
        /// Input image
        #[arg(short, long)]
        input: PathBuf,

        /// Output image
        #[arg(short, long)]
        output: PathBuf,

        /// Filter to apply
        #[arg(short, long, value_enum)]
        kind: FilterKind,

        /// Filter parameter overrides
        #[command(flatten)]
        params: FilterArgs,
    },
}

/// Filter selection for the `filter` subcommand.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    /// Gaussian blur
    Gaussian,
    /// Bilateral filter
    Bilateral,
    /// Bilateral filter with the window capped at 9x9
    BilateralFast,
    /// Fixed 3x3 sharpen kernel
    Sharpen,
    /// Gaussian blur followed by unsharp masking
    Unsharp,
}

/// Noise reduction argument.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DenoiseArg {
    /// Gaussian blur
    Gaussian,
    /// Bilateral filter
    Bilateral,
    /// Bilateral filter with the window capped at 9x9
    BilateralFast,
}

impl From<DenoiseArg> for DenoiseMethod {
    fn from(arg: DenoiseArg) -> Self {
        match arg {
            DenoiseArg::Gaussian => DenoiseMethod::Gaussian,
            DenoiseArg::Bilateral => DenoiseMethod::Bilateral,
            DenoiseArg::BilateralFast => DenoiseMethod::BilateralFast,
        }
    }
}

/// Sharpening argument.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SharpenArg {
    /// Unsharp mask against the denoised image
    UnsharpMask,
    /// Fixed 3x3 sharpen kernel
    Kernel,
}

impl From<SharpenArg> for SharpenMethod {
    fn from(arg: SharpenArg) -> Self {
        match arg {
            SharpenArg::UnsharpMask => SharpenMethod::UnsharpMask,
            SharpenArg::Kernel => SharpenMethod::Kernel,
        }
    }
}

/// Filter parameter overrides; unset values keep the configured ones.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Noise reduction method
    #[arg(long, value_enum)]
    pub denoise: Option<DenoiseArg>,

    /// Sharpening method
    #[arg(long = "sharpen-method", value_enum)]
    pub sharpen: Option<SharpenArg>,

    /// Gaussian kernel size (even sizes use the next odd size)
    #[arg(long)]
    pub kernel_size: Option<usize>,

    /// Gaussian sigma
    #[arg(long)]
    pub sigma: Option<f64>,

    /// Unsharp mask amount
    #[arg(long)]
    pub amount: Option<f64>,

    /// Unsharp mask threshold
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Bilateral window size
    #[arg(long)]
    pub bilateral_size: Option<usize>,

    /// Bilateral spatial sigma
    #[arg(long)]
    pub sigma_spatial: Option<f64>,

    /// Bilateral range sigma
    #[arg(long)]
    pub sigma_range: Option<f64>,

    /// Strength of the fixed 3x3 sharpen kernel
    #[arg(long)]
    pub kernel_amount: Option<f64>,
}

impl FilterArgs {
    /// Apply the overrides to a configuration.
    pub fn apply(&self, config: &mut EnhancementConfig) {
        if let Some(denoise) = self.denoise {
            config.denoise = denoise.into();
        }
        if let Some(sharpen) = self.sharpen {
            config.sharpen = sharpen.into();
        }
        if let Some(size) = self.kernel_size {
            config.gaussian.kernel_size = size;
        }
        if let Some(sigma) = self.sigma {
            config.gaussian.sigma = sigma;
        }
        if let Some(amount) = self.amount {
            config.unsharp.amount = amount;
        }
        if let Some(threshold) = self.threshold {
            config.unsharp.threshold = threshold;
        }
        if let Some(size) = self.bilateral_size {
            config.bilateral.kernel_size = size;
        }
        if let Some(sigma) = self.sigma_spatial {
            config.bilateral.sigma_spatial = sigma;
        }
        if let Some(sigma) = self.sigma_range {
            config.bilateral.sigma_range = sigma;
        }
        if let Some(amount) = self.kernel_amount {
            config.kernel_amount = amount;
        }
    }
}

/// Run the CLI application.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging
    if cli.verbose {
        let env = env_logger::Env::default().default_filter_or("debug");
        let _ = env_logger::Builder::from_env(env).try_init();
    } else if !cli.quiet {
        let env = env_logger::Env::default().default_filter_or("info");
        let _ = env_logger::Builder::from_env(env).try_init();
    }

    let mut config = match &cli.config {
        Some(path) => EnhancementConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EnhancementConfig::default(),
    };
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }

    let channels = if cli.grayscale {
        Channels::Gray
    } else {
        Channels::Rgb
    };
    let output = Output {
        quiet: cli.quiet,
        json: cli.json,
    };

    match cli.command {
        Commands::Test {
            clean,
            degraded,
            output: enhanced_path,
            params,
        } => {
            params.apply(&mut config);
            run_test(config, &clean, &degraded, &enhanced_path, channels, output)
        }
        Commands::Practical {
            input,
            output_dir,
            params,
        } => {
            params.apply(&mut config);
            run_practical(config, &input, &output_dir, channels, output)
        }
        Commands::Compare {
            reference,
            candidate,
        } => run_compare(config, &reference, &candidate, channels, output),
        Commands::Filter {
            input,
            output: filtered_path,
            kind,
            params,
        } => {
            params.apply(&mut config);
            run_filter(config, &input, &filtered_path, kind, channels, output)
        }
    }
}

/// How results are printed.
#[derive(Debug, Clone, Copy)]
struct Output {
    quiet: bool,
    json: bool,
}

impl Output {
    fn spinner(&self) -> ProgressBar {
        if self.quiet || self.json {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    fn print_json<S: Serialize>(&self, value: &S) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Build a pipeline that drives a spinner with its stage events.
fn pipeline_with_spinner(
    config: EnhancementConfig,
    output: Output,
) -> anyhow::Result<(EnhancementPipeline, ProgressBar)> {
    let bar = output.spinner();
    let sink = bar.clone();
    let pipeline = EnhancementPipeline::new(config)?
        .with_progress(CallbackProgress::new(move |event| sink.set_message(event.to_string())));
    Ok((pipeline, bar))
}

fn load(path: &Path, channels: Channels) -> anyhow::Result<PixelBuffer> {
    let image = load_image(path, channels)
        .with_context(|| format!("failed to load image {}", path.display()))?;
    log::info!(
        "Loaded {} ({}x{}, {} channels)",
        path.display(),
        image.width(),
        image.height(),
        image.channels().count()
    );
    Ok(image)
}

fn save(image: &PixelBuffer, path: &Path) -> anyhow::Result<()> {
    save_image(image, path).with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("Saved {}", path.display());
    Ok(())
}

/// JSON summary of evaluation mode.
#[derive(Serialize)]
struct TestSummary<'a> {
    baseline: &'a QualityReport,
    enhanced: &'a QualityReport,
    improvement: Improvement,
    improved: bool,
    timings: &'a StageTimings,
    output: &'a Path,
}

/// JSON summary of practical mode.
#[derive(Serialize)]
struct PracticalSummary<'a> {
    report: &'a QualityReport,
    timings: &'a StageTimings,
    blurred: &'a Path,
    enhanced: &'a Path,
}

/// Run evaluation mode.
fn run_test(
    config: EnhancementConfig,
    clean_path: &Path,
    degraded_path: &Path,
    enhanced_path: &Path,
    channels: Channels,
    output: Output,
) -> anyhow::Result<()> {
    let clean = load(clean_path, channels)?;
    let degraded = load(degraded_path, channels)?;

    let (pipeline, bar) = pipeline_with_spinner(config, output)?;
    let result = pipeline.evaluate(&clean, &degraded);
    bar.finish_and_clear();
    let evaluation = result?;

    save(&evaluation.output.enhanced, enhanced_path)?;

    if output.json {
        return output.print_json(&TestSummary {
            baseline: &evaluation.baseline,
            enhanced: &evaluation.enhanced,
            improvement: evaluation.improvement(),
            improved: evaluation.improved(),
            timings: &evaluation.output.timings,
            output: enhanced_path,
        });
    }
    if !output.quiet {
        print_evaluation(&evaluation, pipeline.config());
        println!("Enhanced image saved as: {}", enhanced_path.display());
    }
    Ok(())
}

/// Run practical mode.
fn run_practical(
    config: EnhancementConfig,
    input: &Path,
    output_dir: &Path,
    channels: Channels,
    output: Output,
) -> anyhow::Result<()> {
    let degraded = load(input, channels)?;

    let (pipeline, bar) = pipeline_with_spinner(config, output)?;
    let result = pipeline.practical(&degraded);
    bar.finish_and_clear();
    let practical = result?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let blurred_path = output_dir.join("output_blurred.png");
    let enhanced_path = output_dir.join("output_enhanced.png");
    save(&practical.output.denoised, &blurred_path)?;
    save(&practical.output.enhanced, &enhanced_path)?;

    if output.json {
        return output.print_json(&PracticalSummary {
            report: &practical.report,
            timings: &practical.output.timings,
            blurred: &blurred_path,
            enhanced: &enhanced_path,
        });
    }
    if !output.quiet {
        print_practical(&practical, pipeline.config());
        println!("Saved processed images:");
        println!("  - {} (after noise reduction)", blurred_path.display());
        println!("  - {} (final enhanced image)", enhanced_path.display());
    }
    Ok(())
}

/// Run compare command.
fn run_compare(
    config: EnhancementConfig,
    reference_path: &Path,
    candidate_path: &Path,
    channels: Channels,
    output: Output,
) -> anyhow::Result<()> {
    let reference = load(reference_path, channels)?;
    let candidate = load(candidate_path, channels)?;

    let (pipeline, bar) = pipeline_with_spinner(config, output)?;
    let result = pipeline.compare(&reference, &candidate);
    bar.finish_and_clear();
    let report = result?;

    if output.json {
        return output.print_json(&report);
    }
    if !output.quiet {
        println!(
            "Comparing: {} vs {}",
            candidate_path.display(),
            reference_path.display()
        );
        println!();
        print!("{}", report);
    }
    Ok(())
}

/// Run filter command.
fn run_filter(
    config: EnhancementConfig,
    input: &Path,
    output_path: &Path,
    kind: FilterKind,
    channels: Channels,
    output: Output,
) -> anyhow::Result<()> {
    let image = load(input, channels)?;

    let pipeline = EnhancementPipeline::new(config)?;
    let filtered = pipeline.install(|| apply_filter(kind, &image, pipeline.config()))?;
    save(&filtered, output_path)?;

    if !output.quiet && !output.json {
        println!("Applied {:?} filter: {}", kind, output_path.display());
    }
    Ok(())
}

/// Apply one filter with the configured parameters.
fn apply_filter(
    kind: FilterKind,
    image: &PixelBuffer,
    config: &EnhancementConfig,
) -> crate::Result<PixelBuffer> {
    match kind {
        FilterKind::Gaussian => {
            gaussian_blur(image, config.gaussian.kernel_size, config.gaussian.sigma)
        }
        FilterKind::Bilateral => bilateral_filter(image, &config.bilateral),
        FilterKind::BilateralFast => bilateral_filter_fast(image, &config.bilateral),
        FilterKind::Sharpen => sharpen(image, config.kernel_amount),
        FilterKind::Unsharp => unsharp_mask_with_blur(image, &config.gaussian, &config.unsharp),
    }
}

fn print_metrics(report: &QualityReport) {
    if report.psnr.psnr_db.is_infinite() {
        println!("  PSNR:            Infinity");
    } else {
        println!("  PSNR:            {:.4} dB", report.psnr.psnr_db);
    }
    println!("  SSIM:            {:.4}", report.ssim.ssim);
    match report.composite {
        Some(c) => println!("  Composite Score: {:.4}", c),
        None => println!("  Composite Score: n/a"),
    }
}

fn print_parameters(config: &EnhancementConfig) {
    println!("Filter Parameters Used:");
    match config.denoise {
        DenoiseMethod::Gaussian => {
            println!("  Gaussian Blur:");
            println!(
                "    - Kernel Size: {0}x{0}",
                crate::filters::normalize_kernel_size(config.gaussian.kernel_size)
            );
            println!("    - Sigma: {}", config.gaussian.sigma);
        }
        DenoiseMethod::Bilateral | DenoiseMethod::BilateralFast => {
            let params = if config.denoise == DenoiseMethod::BilateralFast {
                config.bilateral.fast()
            } else {
                config.bilateral
            };
            println!("  Bilateral Filter:");
            println!(
                "    - Kernel Size: {0}x{0}",
                crate::filters::normalize_kernel_size(params.kernel_size)
            );
            println!("    - Spatial Sigma: {}", params.sigma_spatial);
            println!("    - Range Sigma: {}", params.sigma_range);
        }
    }
    match config.sharpen {
        SharpenMethod::UnsharpMask => {
            println!("  Unsharp Mask:");
            println!("    - Amount: {}", config.unsharp.amount);
            println!("    - Threshold: {}", config.unsharp.threshold);
        }
        SharpenMethod::Kernel => {
            println!("  Sharpen Kernel:");
            println!("    - Amount: {}", config.kernel_amount);
        }
    }
}

fn print_evaluation(evaluation: &Evaluation, config: &EnhancementConfig) {
    println!("Results Comparison");
    println!("==================");
    println!();
    println!("BASELINE (Degraded vs Clean):");
    print_metrics(&evaluation.baseline);
    println!();
    println!("ENHANCED (Enhanced vs Clean):");
    print_metrics(&evaluation.enhanced);
    println!();

    let delta = evaluation.improvement();
    println!("IMPROVEMENT:");
    println!("  PSNR Improvement:      {:+.4} dB", delta.psnr_db);
    println!("  SSIM Improvement:      {:+.4}", delta.ssim);
    if let Some(c) = delta.composite {
        println!("  Composite Improvement: {:+.4}", c);
    }
    println!();

    if evaluation.improved() {
        println!("TEST RESULT: PASS (enhancement improved image quality)");
    } else {
        println!("TEST RESULT: FAIL (enhancement did not improve image quality)");
    }
    println!();
    print_parameters(config);
    println!();
    println!("Time: {:.2?}", evaluation.output.timings.total());
}

fn print_practical(practical: &PracticalResult, config: &EnhancementConfig) {
    println!("Quality Metrics (Enhanced vs Original):");
    print_metrics(&practical.report);
    println!();
    println!("Quality Assessment:");
    println!("  PSNR Rating: {}", practical.report.psnr.quality_rating());
    println!("  SSIM Rating: {}", practical.report.ssim.quality_rating());
    println!();
    print_parameters(config);
    println!();
    println!("Time: {:.2?}", practical.output.timings.total());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnhanceError;

    fn write_test_images(dir: &Path) -> (PathBuf, PathBuf) {
        let mut clean = PixelBuffer::new(16, 12, Channels::Rgb);
        for y in 0..12 {
            for x in 0..16 {
                for c in 0..3 {
                    clean.set(x, y, c, ((x * 12 + y * 7 + c * 30) % 220) as u8);
                }
            }
        }
        let mut degraded = clean.clone();
        for y in (0..12).step_by(3) {
            for x in (0..16).step_by(4) {
                degraded.set(x, y, 0, 255);
            }
        }

        let clean_path = dir.join("clean.png");
        let degraded_path = dir.join("degraded.png");
        save_image(&clean, &clean_path).unwrap();
        save_image(&degraded, &degraded_path).unwrap();
        (clean_path, degraded_path)
    }

    #[test]
    fn test_parse_test_command() {
        let cli = Cli::try_parse_from([
            "imgenhance",
            "test",
            "--clean",
            "a.png",
            "--degraded",
            "b.png",
            "--sigma",
            "2.0",
            "--denoise",
            "bilateral-fast",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Test {
                clean,
                output,
                params,
                ..
            } => {
                assert_eq!(clean, PathBuf::from("a.png"));
                assert_eq!(output, PathBuf::from("output_enhanced.png"));
                let mut config = EnhancementConfig::default();
                params.apply(&mut config);
                assert_eq!(config.gaussian.sigma, 2.0);
                assert_eq!(config.denoise, DenoiseMethod::BilateralFast);
                assert_eq!(config.unsharp.amount, 1.5);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_filter_kind() {
        let cli = Cli::try_parse_from([
            "imgenhance",
            "filter",
            "-i",
            "in.png",
            "-o",
            "out.png",
            "--kind",
            "bilateral-fast",
            "--threads",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.threads, Some(2));
        assert!(matches!(
            cli.command,
            Commands::Filter {
                kind: FilterKind::BilateralFast,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_filter() {
        assert!(Cli::try_parse_from([
            "imgenhance",
            "filter",
            "-i",
            "in.png",
            "-o",
            "out.png",
            "--kind",
            "median",
        ])
        .is_err());
    }

    #[test]
    fn test_practical_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let (_, degraded) = write_test_images(dir.path());
        let out_dir = dir.path().join("out");

        let cli = Cli::try_parse_from([
            "imgenhance",
            "--quiet",
            "practical",
            "--input",
            degraded.to_str().unwrap(),
            "--output-dir",
            out_dir.to_str().unwrap(),
        ])
        .unwrap();
        run(cli).unwrap();

        let blurred = load_image(out_dir.join("output_blurred.png"), Channels::Rgb).unwrap();
        let enhanced = load_image(out_dir.join("output_enhanced.png"), Channels::Rgb).unwrap();
        assert_eq!((blurred.width(), blurred.height()), (16, 12));
        assert_eq!(enhanced.shape(), blurred.shape());
    }

    #[test]
    fn test_test_mode_writes_enhanced() {
        let dir = tempfile::tempdir().unwrap();
        let (clean, degraded) = write_test_images(dir.path());
        let enhanced = dir.path().join("enhanced.png");

        let cli = Cli::try_parse_from([
            "imgenhance",
            "--quiet",
            "--grayscale",
            "test",
            "--clean",
            clean.to_str().unwrap(),
            "--degraded",
            degraded.to_str().unwrap(),
            "--output",
            enhanced.to_str().unwrap(),
        ])
        .unwrap();
        run(cli).unwrap();

        let written = load_image(&enhanced, Channels::Gray).unwrap();
        assert_eq!((written.width(), written.height()), (16, 12));
    }

    #[test]
    fn test_filter_command_applies_filter() {
        let dir = tempfile::tempdir().unwrap();
        let (clean, _) = write_test_images(dir.path());
        let out = dir.path().join("blurred.png");

        let cli = Cli::try_parse_from([
            "imgenhance",
            "--quiet",
            "filter",
            "--input",
            clean.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--kind",
            "gaussian",
            "--kernel-size",
            "3",
        ])
        .unwrap();
        run(cli).unwrap();

        let source = load_image(&clean, Channels::Rgb).unwrap();
        let expected = gaussian_blur(&source, 3, 1.0).unwrap();
        assert_eq!(load_image(&out, Channels::Rgb).unwrap(), expected);
    }

    #[test]
    fn test_compare_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (clean, _) = write_test_images(dir.path());
        let missing = dir.path().join("missing.png");

        let cli = Cli::try_parse_from([
            "imgenhance",
            "--quiet",
            "compare",
            "--reference",
            clean.to_str().unwrap(),
            "--candidate",
            missing.to_str().unwrap(),
        ])
        .unwrap();
        let err = run(cli).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to load image"));
        assert!(err.downcast_ref::<EnhanceError>().is_some());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (clean, _) = write_test_images(dir.path());
        let out = dir.path().join("x.png");

        let cli = Cli::try_parse_from([
            "imgenhance",
            "--quiet",
            "filter",
            "--input",
            clean.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--kind",
            "gaussian",
            "--sigma",
            "0",
        ])
        .unwrap();
        assert!(run(cli).is_err());
    }
}
