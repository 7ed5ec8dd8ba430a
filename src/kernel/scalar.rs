//! Scalar reference kernels.

use crate::candidate::Match;
use crate::image::{ImageView, Mask, PatchRegion};
use crate::kernel::PatchDistance;

/// Sum of squared differences over every channel sample of the patch.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ssd;

impl PatchDistance for Ssd {
    fn distance(
        &self,
        image: ImageView<'_, f32>,
        query: PatchRegion,
        candidate: PatchRegion,
    ) -> f32 {
        if query.radius() != candidate.radius() {
            return Match::INVALID_SCORE;
        }
        let mut sum = 0.0f32;
        for dy in 0..query.side() {
            let (Some(a), Some(b)) = (image.patch_row(query, dy), image.patch_row(candidate, dy))
            else {
                return Match::INVALID_SCORE;
            };
            for (va, vb) in a.iter().zip(b) {
                let d = va - vb;
                sum += d * d;
            }
        }
        sum
    }
}

/// SSD restricted to query pixels that are valid in `mask`.
///
/// Typical use passes the source mask so hole pixels of a target patch do
/// not contribute. A query patch with no valid pixel scores
/// `Match::INVALID_SCORE`.
#[derive(Clone, Debug)]
pub struct MaskedSsd {
    mask: Mask,
}

impl MaskedSsd {
    /// Creates the kernel for `mask`.
    pub fn new(mask: Mask) -> Self {
        Self { mask }
    }

    /// Returns the mask selecting compared query pixels.
    pub fn mask(&self) -> &Mask {
        &self.mask
    }
}

impl PatchDistance for MaskedSsd {
    fn distance(
        &self,
        image: ImageView<'_, f32>,
        query: PatchRegion,
        candidate: PatchRegion,
    ) -> f32 {
        if query.radius() != candidate.radius() {
            return Match::INVALID_SCORE;
        }
        let channels = image.channels();
        let mut sum = 0.0f32;
        let mut used = 0usize;
        for dy in 0..query.side() {
            let (Some(a), Some(b)) = (image.patch_row(query, dy), image.patch_row(candidate, dy))
            else {
                return Match::INVALID_SCORE;
            };
            let y = query.y0() + dy;
            for dx in 0..query.side() {
                if !self.mask.is_valid_at(query.x0() + dx, y) {
                    continue;
                }
                used += 1;
                let start = dx * channels;
                for c in start..start + channels {
                    let d = a[c] - b[c];
                    sum += d * d;
                }
            }
        }
        if used == 0 {
            Match::INVALID_SCORE
        } else {
            sum
        }
    }
}
