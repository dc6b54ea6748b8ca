//! Bilateral filter (edge-preserving smoothing).
//!
//! Each neighbor `q` of pixel `p` in a square window is weighted by
//!
//! ```text
//! w(p, q) = exp(-d(p, q)² / 2σs²) · exp(-D(p, q)² / 2σr²)
//! ```
//!
//! where `d` is the spatial distance and `D` is the sum of squared
//! per-channel differences between the two pixels. The output is the
//! weight-normalized average of the neighbors. Weights depend on pixel
//! content, so there is no separable fast path: cost is O(W·H·k²).

use rayon::prelude::*;

use crate::config::{check_sigma, BilateralParams};
use crate::error::Result;
use crate::{PixelBuffer, Sample};

use super::convolution::clamp_index;
use super::kernel::normalize_kernel_size;

/// Apply the bilateral filter.
///
/// The window is `kernel_size × kernel_size` (normalized to odd) with
/// clamp-to-edge borders. Both sigmas must be > 0.
pub fn bilateral_filter<T: Sample>(
    image: &PixelBuffer<T>,
    params: &BilateralParams,
) -> Result<PixelBuffer<T>> {
    image.ensure_non_empty("bilateral input")?;
    params.validate()?;

    let shape = image.shape();
    let width = shape.width;
    let height = shape.height;
    let channels = shape.channels.count();
    let row_len = shape.row_len();

    let size = normalize_kernel_size(params.kernel_size);
    let radius = (size / 2) as isize;
    let spatial = spatial_weights(radius, params.sigma_spatial)?;
    let range_denom = check_sigma("bilateral range sigma", params.sigma_range)?;

    let data = image.to_f64();
    let mut output = vec![0.0; data.len()];

    output
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let mut sums = [0.0f64; 3];
            for x in 0..width {
                let center = &data[(y * width + x) * channels..][..channels];
                sums.iter_mut().for_each(|s| *s = 0.0);
                let mut weight_sum = 0.0;

                for ky in -radius..=radius {
                    let ny = clamp_index(y as isize + ky, height);
                    for kx in -radius..=radius {
                        let nx = clamp_index(x as isize + kx, width);
                        let neighbor = &data[(ny * width + nx) * channels..][..channels];

                        let color_dist: f64 = center
                            .iter()
                            .zip(neighbor)
                            .map(|(a, b)| (a - b) * (a - b))
                            .sum();

                        let spatial_w =
                            spatial[((ky + radius) * (2 * radius + 1) + (kx + radius)) as usize];
                        let range_w = (-(color_dist * color_dist) / range_denom).exp();
                        let weight = spatial_w * range_w;

                        for (sum, &v) in sums.iter_mut().zip(neighbor) {
                            *sum += v * weight;
                        }
                        weight_sum += weight;
                    }
                }

                // The center pixel always contributes weight 1, so weight_sum > 0.
                for c in 0..channels {
                    row[x * channels + c] = sums[c] / weight_sum;
                }
            }
        });

    Ok(PixelBuffer::from_f64_slice(shape, &output))
}

/// Bilateral filter with the window capped at 9x9.
///
/// Same algorithm as [`bilateral_filter`], trading quality for speed on
/// large kernel sizes.
pub fn bilateral_filter_fast<T: Sample>(
    image: &PixelBuffer<T>,
    params: &BilateralParams,
) -> Result<PixelBuffer<T>> {
    bilateral_filter(image, &params.fast())
}

/// Row-major spatial weights for offsets in `[-radius, radius]²`.
fn spatial_weights(radius: isize, sigma: f64) -> Result<Vec<f64>> {
    let denom = check_sigma("bilateral spatial sigma", sigma)?;
    Ok((-radius..=radius)
        .flat_map(|dy| {
            (-radius..=radius).map(move |dx| (-((dx * dx + dy * dy) as f64) / denom).exp())
        })
        .collect())
}
