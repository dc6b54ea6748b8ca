//! Image filters for noise reduction and sharpening.
//!
//! - **Gaussian blur**: separable convolution, used standalone and for SSIM statistics
//! - **Bilateral filter**: edge-preserving smoothing
//! - **Unsharp mask / sharpen**: detail amplification
//!
//! Every filter borrows its input and returns a freshly allocated buffer of
//! the same shape. Borders are handled by clamping coordinates to the edge.
//!
//! # Example
//!
//! ```rust,ignore
//! use imgenhance::filters::{gaussian_blur, unsharp_mask};
//!
//! let blurred = gaussian_blur(&image, 5, 1.0)?;
//! let enhanced = unsharp_mask(&image, &blurred, 1.5, 0.0)?;
//! ```

mod bilateral;
mod convolution;
mod gaussian;
mod kernel;
mod sharpen;

pub use bilateral::{bilateral_filter, bilateral_filter_fast};
pub use convolution::{convolve_2d, convolve_separable};
pub use gaussian::gaussian_blur;
pub use kernel::{normalize_kernel_size, Kernel1D, Kernel2D};
pub use sharpen::{sharpen, unsharp_mask, unsharp_mask_with_blur};

pub(crate) use gaussian::gaussian_mean_plane;
