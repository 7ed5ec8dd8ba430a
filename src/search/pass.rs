//! State shared by the propagation and random-search passes.

use crate::accept::{AcceptContext, AcceptanceTest};
use crate::candidate::Match;
use crate::field::NnField;
use crate::image::{ImageView, IntegralMask, Mask, PatchRegion, Pixel, ScanDirection};
use crate::kernel::PatchDistance;
use crate::search::update::MatchUpdate;
use rand::RngCore;

/// Counters for one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Target pixels visited.
    pub visited: usize,
    /// Pixels skipped because they already hold an exact match.
    pub skipped_exact: usize,
    /// Candidates applied to the field.
    pub accepted: usize,
    /// Candidates the acceptance test (or update policy) turned down.
    pub rejected: usize,
    /// Candidates dropped before scoring: outside the extent, not fully
    /// source-valid, already present, or unscorable.
    pub discarded: usize,
    /// Random-search radii where no valid region was drawn.
    pub exhausted: usize,
}

/// Iterates `pixels` (stored in forward raster order) in scan order.
pub(crate) fn in_scan_order(
    pixels: &[Pixel],
    direction: ScanDirection,
) -> Box<dyn Iterator<Item = Pixel> + '_> {
    match direction {
        ScanDirection::Forward => Box::new(pixels.iter().copied()),
        ScanDirection::Backward => Box::new(pixels.iter().rev().copied()),
    }
}

/// Borrowed inputs of a pass.
pub(crate) struct PassContext<'a, D: ?Sized> {
    pub image: ImageView<'a, f32>,
    pub source_index: &'a IntegralMask,
    pub target: &'a Mask,
    pub allowed: &'a Mask,
    pub distance: &'a D,
    pub acceptance: &'a dyn AcceptanceTest,
    pub update: &'a dyn MatchUpdate,
    pub patch_radius: usize,
}

impl<D: PatchDistance + ?Sized> PassContext<'_, D> {
    pub(crate) fn query(&self, pixel: Pixel) -> PatchRegion {
        PatchRegion::new(pixel, self.patch_radius)
    }

    /// Returns true if matches held at `neighbor` may flow to other pixels.
    pub(crate) fn may_propagate_from(&self, neighbor: Pixel) -> bool {
        self.allowed.is_valid(neighbor) || self.target.is_valid(neighbor)
    }

    /// Scores `region` for `pixel`, asks the acceptance test and applies the
    /// candidate through the update policy.
    pub(crate) fn offer(
        &self,
        rng: &mut dyn RngCore,
        field: &mut NnField,
        pixel: Pixel,
        region: PatchRegion,
        stats: &mut PassStats,
    ) {
        if !self.source_index.is_region_valid(region) || field[pixel].contains_region(region) {
            stats.discarded += 1;
            return;
        }
        let query = self.query(pixel);
        let candidate = Match::new(region, self.distance.distance(self.image, query, region));
        if !candidate.is_valid() {
            stats.discarded += 1;
            return;
        }
        let current = self.update.incumbent(&field[pixel]).copied();
        let mut ctx = AcceptContext::new(self.image, rng);
        let verdict =
            self.acceptance
                .is_better_with_score(&mut ctx, query, current.as_ref(), &candidate);
        if verdict.accepted
            && self
                .update
                .apply(&mut field[pixel], candidate.verified_with(verdict.score))
        {
            stats.accepted += 1;
        } else {
            stats.rejected += 1;
        }
    }
}
