//! Gaussian blur.

use crate::error::Result;
use crate::{PixelBuffer, Sample, Shape};

use super::convolution::{convolve_separable, separable_plane};
use super::kernel::Kernel1D;

/// Blur an image with a Gaussian kernel.
///
/// `kernel_size` is normalized to the next odd value, so an even size behaves
/// exactly like the odd size above it. `sigma` must be > 0.
///
/// # Example
///
/// ```rust,ignore
/// use imgenhance::filters::gaussian_blur;
///
/// let blurred = gaussian_blur(&image, 5, 1.0)?;
/// assert_eq!(blurred.shape(), image.shape());
/// ```
pub fn gaussian_blur<T: Sample>(
    image: &PixelBuffer<T>,
    kernel_size: usize,
    sigma: f64,
) -> Result<PixelBuffer<T>> {
    image.ensure_non_empty("gaussian blur input")?;
    let kernel = Kernel1D::gaussian(kernel_size, sigma)?;
    convolve_separable(image, &kernel)
}

/// Gaussian-weighted local mean of a float plane, without narrowing.
///
/// Used for local statistics where values must not be rounded or clamped.
pub(crate) fn gaussian_mean_plane(
    data: &[f64],
    shape: Shape,
    kernel_size: usize,
    sigma: f64,
) -> Result<Vec<f64>> {
    let kernel = Kernel1D::gaussian(kernel_size, sigma)?;
    Ok(separable_plane(data, shape, &kernel))
}
