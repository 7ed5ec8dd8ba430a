//! Convenience helpers for loading images and masks via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{Image, ImageView, Mask};
use crate::util::{PatchMatchError, PatchMatchResult};
use std::path::Path;

fn open<P: AsRef<Path>>(path: P) -> PatchMatchResult<image::DynamicImage> {
    image::open(path).map_err(|err| PatchMatchError::ImageIo {
        reason: err.to_string(),
    })
}

/// Creates a floating point RGB image from a dynamic image.
pub fn rgb_from_dynamic_image(img: &image::DynamicImage) -> PatchMatchResult<Image<f32>> {
    let rgb = img.to_rgb8();
    let width = rgb.width() as usize;
    let height = rgb.height() as usize;
    let view = ImageView::from_interleaved(rgb.as_raw(), width, height, 3)?;
    Image::from_u8(view)
}

/// Creates a floating point single-channel image from a dynamic image.
pub fn gray_from_dynamic_image(img: &image::DynamicImage) -> PatchMatchResult<Image<f32>> {
    let gray = img.to_luma8();
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let view = ImageView::from_slice(gray.as_raw(), width, height)?;
    Image::from_u8(view)
}

/// Loads an image from disk as 3-channel `f32` samples in `[0, 255]`.
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> PatchMatchResult<Image<f32>> {
    rgb_from_dynamic_image(&open(path)?)
}

/// Loads an image from disk as 1-channel `f32` samples in `[0, 255]`.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> PatchMatchResult<Image<f32>> {
    gray_from_dynamic_image(&open(path)?)
}

/// Loads a mask from disk; non-zero luma is valid.
pub fn load_mask<P: AsRef<Path>>(path: P) -> PatchMatchResult<Mask> {
    let gray = open(path)?.to_luma8();
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    Mask::from_u8(ImageView::from_slice(gray.as_raw(), width, height)?)
}
