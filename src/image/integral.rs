//! Summed-area table over mask invalidity.
//!
//! `table[(y + 1) * (w + 1) + (x + 1)]` holds the number of invalid pixels in
//! the rectangle `[0, x] x [0, y]`, so any window count costs four lookups.

use crate::image::{Mask, PatchRegion, Rect};

/// Constant-time "is this patch fully valid" queries for a fixed mask.
#[derive(Clone, Debug)]
pub struct IntegralMask {
    table: Vec<u32>,
    width: usize,
    height: usize,
}

impl IntegralMask {
    /// Builds the table for `mask`.
    pub fn new(mask: &Mask) -> Self {
        let width = mask.width();
        let height = mask.height();
        let stride = width + 1;
        let mut table = vec![0u32; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0u32;
            for x in 0..width {
                if !mask.is_valid_at(x, y) {
                    row_sum += 1;
                }
                table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
            }
        }
        Self {
            table,
            width,
            height,
        }
    }

    /// Returns the mask width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the mask height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Counts invalid pixels in `rect`, which must lie inside the extent.
    pub fn count_invalid(&self, rect: Rect) -> u32 {
        debug_assert!(rect.x + rect.width <= self.width && rect.y + rect.height <= self.height);
        if rect.is_empty() {
            return 0;
        }
        let stride = self.width + 1;
        let x0 = rect.x;
        let y0 = rect.y;
        let x1 = rect.x + rect.width;
        let y1 = rect.y + rect.height;
        self.table[y1 * stride + x1] + self.table[y0 * stride + x0]
            - self.table[y0 * stride + x1]
            - self.table[y1 * stride + x0]
    }

    /// Returns true if `region` lies inside the extent with no invalid pixel.
    pub fn is_region_valid(&self, region: PatchRegion) -> bool {
        if !region.is_inside(self.width, self.height) {
            return false;
        }
        let side = region.side();
        self.count_invalid(Rect::new(region.x0(), region.y0(), side, side)) == 0
    }
}
