//! Image file decode/encode glue.
//!
//! Converts between files on disk (any format the `image` crate handles,
//! chosen by extension) and 8-bit [`PixelBuffer`]s.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};

use crate::error::{EnhanceError, Result};
use crate::{Channels, PixelBuffer, Shape};

/// Load an image file, converting it to the requested channel layout.
///
/// Color images loaded as `Gray` are converted to luma; grayscale images
/// loaded as `Rgb` have the gray value replicated. Alpha is dropped.
pub fn load_image<P: AsRef<Path>>(path: P, channels: Channels) -> Result<PixelBuffer> {
    let path = path.as_ref();
    let decoded = image::open(path)?;
    let buffer = from_dynamic(&decoded, channels);
    buffer.ensure_non_empty(&format!("image {}", path.display()))?;
    Ok(buffer)
}

/// Save a buffer to a file; the format follows the file extension.
pub fn save_image<P: AsRef<Path>>(buffer: &PixelBuffer, path: P) -> Result<()> {
    buffer.ensure_non_empty("image to save")?;
    to_dynamic(buffer)?.save(path.as_ref())?;
    Ok(())
}

/// Convert a decoded image to a pixel buffer.
pub fn from_dynamic(image: &DynamicImage, channels: Channels) -> PixelBuffer {
    let (width, height, samples) = match channels {
        Channels::Gray => {
            let gray = image.to_luma8();
            let (w, h) = gray.dimensions();
            (w, h, gray.into_raw())
        }
        Channels::Rgb => {
            let rgb = image.to_rgb8();
            let (w, h) = rgb.dimensions();
            (w, h, rgb.into_raw())
        }
    };

    PixelBuffer {
        shape: Shape::new(width as usize, height as usize, channels),
        samples,
    }
}

/// Convert a pixel buffer to an `image` crate image.
pub fn to_dynamic(buffer: &PixelBuffer) -> Result<DynamicImage> {
    let width = u32::try_from(buffer.width())
        .map_err(|_| EnhanceError::ImageFormat(format!("width {} too large", buffer.width())))?;
    let height = u32::try_from(buffer.height())
        .map_err(|_| EnhanceError::ImageFormat(format!("height {} too large", buffer.height())))?;
    let samples = buffer.samples().to_vec();

    let image = match buffer.channels() {
        Channels::Gray => {
            GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8)
        }
        Channels::Rgb => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
    };

    image.ok_or_else(|| {
        EnhanceError::Internal(format!(
            "sample buffer does not match shape {}",
            buffer.shape()
        ))
    })
}
