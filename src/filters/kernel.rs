//! Convolution kernel construction.

use crate::config::{check_kernel_size, check_non_negative, check_sigma};
use crate::error::Result;

/// Force a kernel size to be odd so the kernel has a center tap.
///
/// Even sizes are bumped by one; zero becomes one.
pub fn normalize_kernel_size(size: usize) -> usize {
    if size % 2 == 0 {
        size + 1
    } else {
        size
    }
}

/// Symmetric 1-D kernel with non-negative weights summing to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel1D {
    weights: Vec<f64>,
}

impl Kernel1D {
    /// Build a normalized Gaussian kernel.
    ///
    /// The tap at offset `i` from the center is `exp(-i² / 2σ²)` before
    /// normalization. `sigma` must be finite and > 0 with a representable
    /// `2σ²`, and `size` at most [`MAX_KERNEL_SIZE`](crate::config::MAX_KERNEL_SIZE).
    pub fn gaussian(size: usize, sigma: f64) -> Result<Self> {
        check_kernel_size("gaussian kernel size", size)?;
        let denom = check_sigma("gaussian sigma", sigma)?;

        let size = normalize_kernel_size(size);
        let radius = (size / 2) as i64;

        let mut weights: Vec<f64> = (-radius..=radius)
            .map(|i| (-((i * i) as f64) / denom).exp())
            .collect();

        let sum: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }

        Ok(Self { weights })
    }

    /// Kernel weights from left to right.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of taps (always odd).
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always false; a kernel has at least one tap.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Distance from the center tap to either end.
    pub fn radius(&self) -> usize {
        self.weights.len() / 2
    }
}

/// Square 2-D kernel stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel2D {
    size: usize,
    weights: Vec<f64>,
}

impl Kernel2D {
    /// The 3x3 sharpen kernel.
    ///
    /// ```text
    ///  0   -a    0
    /// -a  1+4a  -a
    ///  0   -a    0
    /// ```
    ///
    /// `amount = 0` gives the identity kernel.
    pub fn sharpen(amount: f64) -> Result<Self> {
        check_non_negative("sharpen amount", amount)?;
        let a = amount;
        Ok(Self {
            size: 3,
            weights: vec![
                0.0, -a, 0.0, //
                -a, 1.0 + 4.0 * a, -a, //
                0.0, -a, 0.0,
            ],
        })
    }

    /// Outer product of a 1-D kernel with itself.
    pub fn from_outer(kernel: &Kernel1D) -> Self {
        let w = kernel.weights();
        let weights = w
            .iter()
            .flat_map(|&row| w.iter().map(move |&col| row * col))
            .collect();
        Self {
            size: w.len(),
            weights,
        }
    }

    /// Side length of the kernel.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Distance from the center tap to an edge.
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Weight at row `ky`, column `kx`.
    #[inline]
    pub fn weight(&self, kx: usize, ky: usize) -> f64 {
        self.weights[ky * self.size + kx]
    }

    /// Row-major weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}
