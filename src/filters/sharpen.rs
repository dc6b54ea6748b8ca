//! Sharpening filters: unsharp masking and fixed-kernel sharpening.

use rayon::prelude::*;

use crate::config::{check_non_negative, GaussianParams, UnsharpParams};
use crate::error::Result;
use crate::{ensure_same_shape, PixelBuffer, Sample};

use super::convolution::convolve_2d;
use super::gaussian::gaussian_blur;
use super::kernel::Kernel2D;

/// Sharpen by amplifying the difference between an image and its blur.
///
/// Per sample: `detail = original - blurred`; details with
/// `|detail| < threshold` are treated as zero; the result is
/// `clamp(original + amount · detail)`, truncated toward zero on integer
/// sample depths. `amount = 0` returns the original.
/// Large amounts amplify noise and produce ringing at edges.
///
/// # Errors
///
/// `EmptyInput` or `ShapeMismatch` if the two buffers are not comparable,
/// `InvalidParameter` for a negative or non-finite amount or threshold.
pub fn unsharp_mask<T: Sample>(
    original: &PixelBuffer<T>,
    blurred: &PixelBuffer<T>,
    amount: f64,
    threshold: f64,
) -> Result<PixelBuffer<T>> {
    ensure_same_shape(original, blurred)?;
    check_non_negative("unsharp amount", amount)?;
    check_non_negative("unsharp threshold", threshold)?;

    let samples: Vec<T> = original
        .samples()
        .par_iter()
        .zip(blurred.samples().par_iter())
        .map(|(&o, &b)| {
            let o = o.to_f64();
            let mut detail = o - b.to_f64();
            if detail.abs() < threshold {
                detail = 0.0;
            }
            T::from_f64_truncated(o + amount * detail)
        })
        .collect();

    Ok(PixelBuffer {
        shape: original.shape(),
        samples,
    })
}

/// Blur an image with a Gaussian and unsharp-mask it against the blur.
pub fn unsharp_mask_with_blur<T: Sample>(
    image: &PixelBuffer<T>,
    blur: &GaussianParams,
    unsharp: &UnsharpParams,
) -> Result<PixelBuffer<T>> {
    let blurred = gaussian_blur(image, blur.kernel_size, blur.sigma)?;
    unsharp_mask(image, &blurred, unsharp.amount, unsharp.threshold)
}

/// Sharpen with the fixed 3x3 kernel (center `1 + 4a`, orthogonal
/// neighbors `-a`, corners 0).
pub fn sharpen<T: Sample>(image: &PixelBuffer<T>, amount: f64) -> Result<PixelBuffer<T>> {
    image.ensure_non_empty("sharpen input")?;
    let kernel = Kernel2D::sharpen(amount)?;
    convolve_2d(image, &kernel)
}
