//! Image views, masks and patch geometry.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer of interleaved channel
//! samples with an explicit stride. The stride counts samples between the
//! starts of consecutive rows, so a stride larger than `width * channels`
//! represents padded rows.

use crate::util::{PatchMatchError, PatchMatchResult};

pub mod histogram;
pub(crate) mod integral;
#[cfg(feature = "image-io")]
pub mod io;
pub mod mask;
pub mod region;

pub use histogram::{Histogram, HistogramConfig};
pub use integral::IntegralMask;
pub use mask::{Mask, ScanDirection};
pub use region::{PatchRegion, Pixel, Rect};

/// Borrowed multi-channel image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous single-channel view.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> PatchMatchResult<Self> {
        Self::new(data, width, height, 1, width)
    }

    /// Creates a contiguous view of interleaved samples.
    pub fn from_interleaved(
        data: &'a [T],
        width: usize,
        height: usize,
        channels: usize,
    ) -> PatchMatchResult<Self> {
        let row_len = width
            .checked_mul(channels)
            .ok_or(PatchMatchError::InvalidDimensions { width, height })?;
        Self::new(data, width, height, channels, row_len)
    }

    /// Creates a view with an explicit stride measured in samples.
    pub fn new(
        data: &'a [T],
        width: usize,
        height: usize,
        channels: usize,
        stride: usize,
    ) -> PatchMatchResult<Self> {
        let needed = required_len(width, height, channels, stride)?;
        if data.len() < needed {
            return Err(PatchMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the stride in samples between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the channel samples of pixel `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a [T]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = y
            .checked_mul(self.stride)?
            .checked_add(x.checked_mul(self.channels)?)?;
        self.data.get(start..start + self.channels)
    }

    /// Returns the samples of row `y`, `width * channels` long.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * self.channels)?;
        self.data.get(start..end)
    }

    /// Returns the samples of row `dy` of a patch, or `None` if the patch
    /// leaves the image.
    pub fn patch_row(&self, region: PatchRegion, dy: usize) -> Option<&'a [T]> {
        if !region.is_inside(self.width, self.height) || dy >= region.side() {
            return None;
        }
        let row = self.row(region.y0() + dy)?;
        let start = region.x0() * self.channels;
        row.get(start..start + region.side() * self.channels)
    }
}

fn required_len(
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
) -> PatchMatchResult<usize> {
    if width == 0 || height == 0 || channels == 0 {
        return Err(PatchMatchError::InvalidDimensions { width, height });
    }
    let row_len = width
        .checked_mul(channels)
        .ok_or(PatchMatchError::InvalidDimensions { width, height })?;
    if stride < row_len {
        return Err(PatchMatchError::InvalidStride {
            width: row_len,
            stride,
        });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_len))
        .ok_or(PatchMatchError::InvalidDimensions { width, height })
}

/// Owned contiguous multi-channel image.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
    channels: usize,
}

impl<T: Copy> Image<T> {
    /// Wraps an interleaved buffer of exactly `width * height * channels`
    /// samples.
    pub fn new(data: Vec<T>, width: usize, height: usize, channels: usize) -> PatchMatchResult<Self> {
        let needed = required_len(width, height, channels, width.saturating_mul(channels))?;
        if data.len() < needed {
            return Err(PatchMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(PatchMatchError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Creates an image with every sample set to `value`.
    pub fn filled(width: usize, height: usize, channels: usize, value: T) -> PatchMatchResult<Self> {
        let len = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(channels))
            .ok_or(PatchMatchError::InvalidDimensions { width, height })?;
        Self::new(vec![value; len], width, height, channels)
    }

    /// Copies a (possibly strided) view into a contiguous image.
    pub fn from_view(view: ImageView<'_, T>) -> PatchMatchResult<Self> {
        let mut data = Vec::with_capacity(view.width() * view.height() * view.channels());
        for y in 0..view.height() {
            let row = view.row(y).ok_or(PatchMatchError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, view.width(), view.height(), view.channels())
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, T> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            channels: self.channels,
            stride: self.width * self.channels,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the interleaved samples.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns the samples of pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[T]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.channels;
        self.data.get(start..start + self.channels)
    }

    /// Returns the mutable samples of pixel `(x, y)`.
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> Option<&mut [T]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.channels;
        self.data.get_mut(start..start + self.channels)
    }
}

impl Image<f32> {
    /// Converts an 8-bit view to floating point samples.
    pub fn from_u8(view: ImageView<'_, u8>) -> PatchMatchResult<Self> {
        let mut data = Vec::with_capacity(view.width() * view.height() * view.channels());
        for y in 0..view.height() {
            let row = view.row(y).ok_or(PatchMatchError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.as_slice().len(),
            })?;
            data.extend(row.iter().map(|&v| v as f32));
        }
        Self::new(data, view.width(), view.height(), view.channels())
    }
}
