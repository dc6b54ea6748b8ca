//! Convolution engine.
//!
//! All convolutions work on interleaved `f64` planes so the same code serves
//! integer images (filters) and float statistics (SSIM). Borders use
//! clamp-to-edge: a neighbor coordinate outside the image is clamped to
//! `[0, dimension - 1]`. Work is partitioned by output rows; every row is
//! written by exactly one worker.

use rayon::prelude::*;

use crate::error::Result;
use crate::{PixelBuffer, Sample, Shape};

use super::kernel::{Kernel1D, Kernel2D};

/// Clamp a signed coordinate into `[0, len - 1]`.
#[inline]
pub(crate) fn clamp_index(pos: isize, len: usize) -> usize {
    pos.clamp(0, len as isize - 1) as usize
}

/// Apply a 1-D kernel horizontally then vertically.
///
/// The intermediate plane is kept in floating point; only the caller decides
/// whether to narrow the result.
pub(crate) fn separable_plane(data: &[f64], shape: Shape, kernel: &Kernel1D) -> Vec<f64> {
    debug_assert_eq!(data.len(), shape.sample_count());
    if data.is_empty() {
        return Vec::new();
    }

    let width = shape.width;
    let height = shape.height;
    let channels = shape.channels.count();
    let row_len = shape.row_len();
    let weights = kernel.weights();
    let radius = kernel.radius() as isize;

    // Horizontal pass
    let mut temp = vec![0.0; data.len()];
    temp.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let src = &data[y * row_len..(y + 1) * row_len];
            for x in 0..width {
                for c in 0..channels {
                    let mut acc = 0.0;
                    for (k, &w) in weights.iter().enumerate() {
                        let sx = clamp_index(x as isize + k as isize - radius, width);
                        acc += w * src[sx * channels + c];
                    }
                    row[x * channels + c] = acc;
                }
            }
        });

    // Vertical pass
    let mut output = vec![0.0; data.len()];
    output
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for (k, &w) in weights.iter().enumerate() {
                let sy = clamp_index(y as isize + k as isize - radius, height);
                let src = &temp[sy * row_len..(sy + 1) * row_len];
                for (out, &s) in row.iter_mut().zip(src) {
                    *out += w * s;
                }
            }
        });

    output
}

/// Apply a square 2-D kernel directly.
pub(crate) fn direct_plane(data: &[f64], shape: Shape, kernel: &Kernel2D) -> Vec<f64> {
    debug_assert_eq!(data.len(), shape.sample_count());
    if data.is_empty() {
        return Vec::new();
    }

    let width = shape.width;
    let height = shape.height;
    let channels = shape.channels.count();
    let row_len = shape.row_len();
    let size = kernel.size();
    let radius = kernel.radius() as isize;

    let mut output = vec![0.0; data.len()];
    output
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                for c in 0..channels {
                    let mut acc = 0.0;
                    for ky in 0..size {
                        let sy = clamp_index(y as isize + ky as isize - radius, height);
                        for kx in 0..size {
                            let w = kernel.weight(kx, ky);
                            if w == 0.0 {
                                continue;
                            }
                            let sx = clamp_index(x as isize + kx as isize - radius, width);
                            acc += w * data[(sy * width + sx) * channels + c];
                        }
                    }
                    row[x * channels + c] = acc;
                }
            }
        });

    output
}

/// Convolve an image with a separable kernel (two 1-D passes).
///
/// Cost is O(W·H·k) instead of O(W·H·k²). The result has the input's shape
/// and is clamped to the sample range.
pub fn convolve_separable<T: Sample>(
    image: &PixelBuffer<T>,
    kernel: &Kernel1D,
) -> Result<PixelBuffer<T>> {
    image.ensure_non_empty("convolution input")?;
    let result = separable_plane(&image.to_f64(), image.shape(), kernel);
    Ok(PixelBuffer::from_f64_slice(image.shape(), &result))
}

/// Convolve an image with a square 2-D kernel.
///
/// The result has the input's shape and is clamped to the sample range.
pub fn convolve_2d<T: Sample>(image: &PixelBuffer<T>, kernel: &Kernel2D) -> Result<PixelBuffer<T>> {
    image.ensure_non_empty("convolution input")?;
    let result = direct_plane(&image.to_f64(), image.shape(), kernel);
    Ok(PixelBuffer::from_f64_slice(image.shape(), &result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnhanceError;
    use crate::Channels;

    fn ramp(width: usize, height: usize, channels: Channels) -> PixelBuffer {
        let n = width * height * channels.count();
        let samples = (0..n).map(|i| ((i * 37) % 256) as u8).collect();
        PixelBuffer::from_samples(width, height, channels, samples).unwrap()
    }

    #[test]
    fn test_clamp_index() {
        assert_eq!(clamp_index(-3, 5), 0);
        assert_eq!(clamp_index(2, 5), 2);
        assert_eq!(clamp_index(9, 5), 4);
        assert_eq!(clamp_index(1, 1), 0);
    }

    #[test]
    fn test_uniform_image_unchanged() {
        let image = PixelBuffer::filled(9, 7, Channels::Rgb, 123u8);
        let kernel = Kernel1D::gaussian(5, 1.0).unwrap();
        let blurred = convolve_separable(&image, &kernel).unwrap();
        assert_eq!(blurred, image);
    }

    #[test]
    fn test_separable_matches_direct_2d() {
        let image = ramp(13, 9, Channels::Rgb);
        let kernel = Kernel1D::gaussian(5, 1.3).unwrap();
        let data = image.to_f64();

        let separable = separable_plane(&data, image.shape(), &kernel);
        let direct = direct_plane(&data, image.shape(), &Kernel2D::from_outer(&kernel));

        for (a, b) in separable.iter().zip(direct.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let mut image: PixelBuffer = PixelBuffer::new(6, 6, Channels::Rgb);
        for y in 0..6 {
            for x in 0..6 {
                image.set(x, y, 1, 200);
            }
        }
        let kernel = Kernel1D::gaussian(3, 1.0).unwrap();
        let blurred = convolve_separable(&image, &kernel).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                assert_eq!(blurred.get(x, y, 0), 0);
                assert_eq!(blurred.get(x, y, 1), 200);
                assert_eq!(blurred.get(x, y, 2), 0);
            }
        }
    }

    #[test]
    fn test_tiny_images_keep_shape() {
        let kernel = Kernel1D::gaussian(11, 1.5).unwrap();
        let sharpen = Kernel2D::sharpen(1.0).unwrap();
        for &(w, h) in &[(1, 1), (2, 2), (1, 5), (3, 1)] {
            let image = ramp(w, h, Channels::Rgb);
            let blurred = convolve_separable(&image, &kernel).unwrap();
            let sharpened = convolve_2d(&image, &sharpen).unwrap();
            assert_eq!(blurred.shape(), image.shape());
            assert_eq!(sharpened.shape(), image.shape());
        }
    }

    #[test]
    fn test_single_pixel_is_fixed_point() {
        let image = PixelBuffer::from_samples(1, 1, Channels::Gray, vec![42u8]).unwrap();
        let kernel = Kernel1D::gaussian(7, 2.0).unwrap();
        assert_eq!(convolve_separable(&image, &kernel).unwrap(), image);
        let sharpen = Kernel2D::sharpen(3.0).unwrap();
        assert_eq!(convolve_2d(&image, &sharpen).unwrap(), image);
    }

    #[test]
    fn test_output_is_clamped() {
        // A bright dot on black overshoots above 255 and the ring below 0.
        let mut image: PixelBuffer = PixelBuffer::new(5, 5, Channels::Gray);
        image.set(2, 2, 0, 200);
        let kernel = Kernel2D::sharpen(2.0).unwrap();
        let out = convolve_2d(&image, &kernel).unwrap();
        assert_eq!(out.get(2, 2, 0), 255);
        assert_eq!(out.get(1, 2, 0), 0);
        assert_eq!(out.get(0, 0, 0), 0);
    }

    #[test]
    fn test_empty_input_rejected() {
        let image: PixelBuffer = PixelBuffer::new(0, 0, Channels::Gray);
        let kernel = Kernel1D::gaussian(3, 1.0).unwrap();
        assert!(matches!(
            convolve_separable(&image, &kernel),
            Err(EnhanceError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_u16_samples() {
        let image = PixelBuffer::filled(4, 4, Channels::Gray, 60000u16);
        let kernel = Kernel2D::sharpen(1.0).unwrap();
        assert_eq!(convolve_2d(&image, &kernel).unwrap(), image);
    }
}
