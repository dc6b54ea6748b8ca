//! Image Enhancement CLI Tool
//!
//! A command-line utility that denoises and sharpens images and scores
//! them with PSNR, SSIM and a composite quality score.

use clap::Parser;
use imgenhance::cli::{run, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
