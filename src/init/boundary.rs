//! Nearest-boundary initialization for inpainting-style holes.

use crate::candidate::Match;
use crate::field::NnField;
use crate::image::PatchRegion;
use crate::init::{InitContext, InitStats, Initializer};
use crate::kernel::score_pairs;
use crate::trace::trace_event;
use crate::util::math::squared_distance;
use crate::util::{PatchMatchError, PatchMatchResult};

/// Assigns each pending pixel the closest fully valid patch just outside
/// the hole.
///
/// The hole (invalid source area) is grown by the patch radius; the valid
/// side of the grown hole's boundary is the set of closest patch centers
/// whose windows avoid the hole. Each pending pixel takes the nearest of them
/// in Euclidean distance, ties going to the earliest in raster order.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundaryInitializer;

impl Initializer for BoundaryInitializer {
    fn initialize(
        &self,
        ctx: &mut InitContext<'_>,
        field: &mut NnField,
    ) -> PatchMatchResult<InitStats> {
        let pending = ctx.pending(field);
        if pending.is_empty() {
            return Ok(InitStats::default());
        }
        let r = ctx.patch_radius;
        let seeds: Vec<_> = ctx
            .source
            .expand_hole(r)
            .boundary(true)
            .into_iter()
            .map(|p| PatchRegion::new(p, r))
            .filter(|region| ctx.source_index.is_region_valid(*region))
            .collect();
        if seeds.is_empty() {
            return Err(PatchMatchError::NoSourceRegions);
        }

        let pairs: Vec<_> = pending
            .iter()
            .filter_map(|&p| {
                seeds
                    .iter()
                    .min_by_key(|s| squared_distance(p, s.center()))
                    .map(|&s| (ctx.query(p), s))
            })
            .collect();
        let scores = score_pairs(ctx.distance, ctx.image, &pairs);
        for (&(query, region), score) in pairs.iter().zip(scores) {
            field.set_match(query.center(), Match::new(region, score));
        }
        trace_event!("init_boundary", pixels = pairs.len(), seeds = seeds.len());
        Ok(InitStats {
            initialized: pairs.len(),
            exhausted: 0,
        })
    }
}
