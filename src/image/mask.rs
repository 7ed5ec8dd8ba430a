//! Boolean validity masks over the image grid.
//!
//! A source mask marks pixels that may belong to a matched patch; a target
//! mask marks pixels that need a match. Pixels outside the extent are never
//! valid.

use crate::image::{ImageView, IntegralMask, PatchRegion, Pixel, Rect};
use crate::util::{PatchMatchError, PatchMatchResult};
use rand::{Rng, RngCore};

/// Raster traversal order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanDirection {
    /// Top-left to bottom-right.
    Forward,
    /// Bottom-right to top-left.
    Backward,
}

impl ScanDirection {
    /// Returns the opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            ScanDirection::Forward => ScanDirection::Backward,
            ScanDirection::Backward => ScanDirection::Forward,
        }
    }
}

/// Per-pixel validity flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    data: Vec<bool>,
    width: usize,
    height: usize,
}

impl Mask {
    /// Creates a mask with every pixel set to `valid`.
    pub fn new_filled(width: usize, height: usize, valid: bool) -> PatchMatchResult<Self> {
        let len = checked_len(width, height)?;
        Ok(Self {
            data: vec![valid; len],
            width,
            height,
        })
    }

    /// Wraps row-major validity flags.
    pub fn from_vec(data: Vec<bool>, width: usize, height: usize) -> PatchMatchResult<Self> {
        let needed = checked_len(width, height)?;
        if data.len() != needed {
            return Err(PatchMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Builds a mask from the first channel of an 8-bit image; non-zero is
    /// valid.
    pub fn from_u8(view: ImageView<'_, u8>) -> PatchMatchResult<Self> {
        let mut data = Vec::with_capacity(view.width() * view.height());
        for y in 0..view.height() {
            for x in 0..view.width() {
                let valid = view.get(x, y).map(|px| px[0] != 0).unwrap_or(false);
                data.push(valid);
            }
        }
        Self::from_vec(data, view.width(), view.height())
    }

    /// Builds a mask from a predicate over pixel coordinates.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> PatchMatchResult<Self>
    where
        F: FnMut(Pixel) -> bool,
    {
        let len = checked_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                data.push(f(Pixel::new(x, y)));
            }
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns the mask width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the mask height.
    pub fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn is_valid_at(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data[y * self.width + x]
    }

    /// Returns true if `pixel` is inside the extent and valid.
    pub fn is_valid(&self, pixel: Pixel) -> bool {
        self.is_valid_at(pixel.x, pixel.y)
    }

    /// Sets the validity of `pixel`; out-of-extent pixels are ignored.
    pub fn set(&mut self, pixel: Pixel, valid: bool) {
        if pixel.is_inside(self.width, self.height) {
            self.data[pixel.y * self.width + pixel.x] = valid;
        }
    }

    /// Returns true if `region` is inside the extent and every pixel of it is
    /// valid.
    pub fn is_region_valid(&self, region: PatchRegion) -> bool {
        region.is_inside(self.width, self.height) && region.pixels().all(|p| self.is_valid(p))
    }

    /// Returns true if at least one pixel is valid.
    pub fn has_valid_pixels(&self) -> bool {
        self.data.iter().any(|&v| v)
    }

    /// Number of valid pixels.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Returns valid pixels in raster order for `direction`.
    pub fn valid_pixels(&self, direction: ScanDirection) -> Vec<Pixel> {
        let mut pixels: Vec<Pixel> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| Pixel::new(x, y)))
            .filter(|&p| self.is_valid(p))
            .collect();
        if direction == ScanDirection::Backward {
            pixels.reverse();
        }
        pixels
    }

    /// Returns a mask with validity flipped everywhere.
    pub fn inverted(&self) -> Self {
        Self {
            data: self.data.iter().map(|&v| !v).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Grows the invalid area (the hole) by `radius` pixels in Chebyshev
    /// distance.
    pub fn expand_hole(&self, radius: usize) -> Self {
        if radius == 0 {
            return self.clone();
        }
        let integral = IntegralMask::new(self);
        let mut data = Vec::with_capacity(self.data.len());
        for y in 0..self.height {
            for x in 0..self.width {
                let window = Rect::around(Pixel::new(x, y), radius, self.width, self.height);
                data.push(integral.count_invalid(window) == 0);
            }
        }
        Self {
            data,
            width: self.width,
            height: self.height,
        }
    }

    /// Pixels whose validity equals `valid` and that have a 4-neighbor of the
    /// opposite validity inside the extent, in forward raster order.
    pub fn boundary(&self, valid: bool) -> Vec<Pixel> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_valid_at(x, y) != valid {
                    continue;
                }
                let p = Pixel::new(x, y);
                let touches = [(-1, 0), (1, 0), (0, -1), (0, 1)].iter().any(|&(dx, dy)| {
                    p.offset(dx, dy)
                        .filter(|n| n.is_inside(self.width, self.height))
                        .map(|n| self.is_valid(n) != valid)
                        .unwrap_or(false)
                });
                if touches {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Every patch of `radius` whose center lies in `search` and whose window
    /// is fully valid, in raster order of centers.
    pub fn fully_valid_regions(&self, search: Rect, radius: usize) -> Vec<PatchRegion> {
        let integral = IntegralMask::new(self);
        collect_valid_regions(&integral, search, radius)
    }

    /// Draws up to `max_attempts` uniform centers in `search` and returns the
    /// first fully valid patch, or `None` if every draw failed.
    pub fn random_valid_patch_in_rect(
        &self,
        rng: &mut dyn RngCore,
        search: Rect,
        radius: usize,
        max_attempts: usize,
    ) -> Option<PatchRegion> {
        random_valid_patch(rng, search, radius, max_attempts, |r| self.is_region_valid(r))
    }

    /// Returns an error unless `self` has the given dimensions.
    pub fn ensure_size(
        &self,
        width: usize,
        height: usize,
        context: &'static str,
    ) -> PatchMatchResult<()> {
        if self.width != width || self.height != height {
            return Err(PatchMatchError::DimensionMismatch {
                width,
                height,
                got_width: self.width,
                got_height: self.height,
                context,
            });
        }
        Ok(())
    }
}

pub(crate) fn collect_valid_regions(
    integral: &IntegralMask,
    search: Rect,
    radius: usize,
) -> Vec<PatchRegion> {
    let y_end = (search.y + search.height).min(integral.height());
    let x_end = (search.x + search.width).min(integral.width());

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (search.y..y_end)
            .into_par_iter()
            .flat_map_iter(move |y| {
                (search.x..x_end)
                    .map(move |x| PatchRegion::around(x, y, radius))
                    .filter(move |r| integral.is_region_valid(*r))
            })
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    {
        (search.y..y_end)
            .flat_map(|y| (search.x..x_end).map(move |x| PatchRegion::around(x, y, radius)))
            .filter(|r| integral.is_region_valid(*r))
            .collect()
    }
}

pub(crate) fn random_valid_patch<F>(
    rng: &mut dyn RngCore,
    search: Rect,
    radius: usize,
    max_attempts: usize,
    mut is_valid: F,
) -> Option<PatchRegion>
where
    F: FnMut(PatchRegion) -> bool,
{
    if search.is_empty() {
        return None;
    }
    for _ in 0..max_attempts {
        let x = rng.random_range(search.x..search.x + search.width);
        let y = rng.random_range(search.y..search.y + search.height);
        let region = PatchRegion::around(x, y, radius);
        if is_valid(region) {
            return Some(region);
        }
    }
    None
}

fn checked_len(width: usize, height: usize) -> PatchMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(PatchMatchError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(PatchMatchError::InvalidDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::{Mask, ScanDirection};
    use crate::image::{PatchRegion, Pixel, Rect};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn square_hole(size: usize, x0: usize, y0: usize, side: usize) -> Mask {
        Mask::from_fn(size, size, |p| {
            !(p.x >= x0 && p.x < x0 + side && p.y >= y0 && p.y < y0 + side)
        })
        .unwrap()
    }

    #[test]
    fn valid_pixels_follow_scan_direction() {
        let mask = Mask::from_fn(3, 2, |p| p.x != 1).unwrap();
        let fwd = mask.valid_pixels(ScanDirection::Forward);
        assert_eq!(
            fwd,
            vec![
                Pixel::new(0, 0),
                Pixel::new(2, 0),
                Pixel::new(0, 1),
                Pixel::new(2, 1)
            ]
        );
        let bwd = mask.valid_pixels(ScanDirection::Backward);
        assert_eq!(bwd.first(), Some(&Pixel::new(2, 1)));
        assert_eq!(bwd.last(), Some(&Pixel::new(0, 0)));
    }

    #[test]
    fn expand_hole_grows_by_radius() {
        let mask = square_hole(9, 4, 4, 1);
        let grown = mask.expand_hole(2);
        assert_eq!(grown.valid_count(), 81 - 25);
        assert!(!grown.is_valid(Pixel::new(2, 2)));
        assert!(grown.is_valid(Pixel::new(1, 4)));
    }

    #[test]
    fn boundary_of_hole_is_ring() {
        let mask = square_hole(7, 2, 2, 3);
        let outer = mask.boundary(true);
        assert_eq!(outer.len(), 12);
        assert!(outer.contains(&Pixel::new(1, 2)));
        assert!(!outer.contains(&Pixel::new(1, 1)));
        let inner = mask.boundary(false);
        assert_eq!(inner.len(), 8);
    }

    #[test]
    fn fully_valid_regions_avoid_hole() {
        let mask = square_hole(8, 3, 3, 2);
        let regions = mask.fully_valid_regions(Rect::extent(8, 8), 1);
        assert!(!regions.is_empty());
        for region in &regions {
            assert!(mask.is_region_valid(*region));
        }
        assert!(!regions.contains(&PatchRegion::around(2, 2, 1)));
        assert!(regions.contains(&PatchRegion::around(1, 1, 1)));
    }

    #[test]
    fn random_patch_respects_mask() {
        let mask = square_hole(16, 4, 4, 8);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            if let Some(region) =
                mask.random_valid_patch_in_rect(&mut rng, Rect::extent(16, 16), 1, 10)
            {
                assert!(mask.is_region_valid(region));
            }
        }
        let none = Mask::new_filled(4, 4, false).unwrap();
        assert!(none
            .random_valid_patch_in_rect(&mut rng, Rect::extent(4, 4), 1, 10)
            .is_none());
    }
}
