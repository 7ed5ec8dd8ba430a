//! Random initializers, with and without a histogram gate.

use crate::accept::{AcceptContext, AcceptanceTest, HistogramTest, NeighborHistogramTest};
use crate::candidate::Match;
use crate::field::NnField;
use crate::image::mask::collect_valid_regions;
use crate::image::{PatchRegion, Rect};
use crate::init::{InitContext, InitStats, Initializer};
use crate::kernel::score_pairs;
use crate::trace::trace_event;
use crate::util::{PatchMatchError, PatchMatchResult};
use rand::Rng;

fn source_regions(ctx: &InitContext<'_>) -> PatchMatchResult<Vec<PatchRegion>> {
    let extent = Rect::extent(ctx.image.width(), ctx.image.height());
    let regions = collect_valid_regions(ctx.source_index, extent, ctx.patch_radius);
    if regions.is_empty() {
        return Err(PatchMatchError::NoSourceRegions);
    }
    Ok(regions)
}

/// Assigns each pending pixel a uniformly drawn fully valid source patch.
///
/// Candidates are drawn sequentially from the driver's random source and
/// scored afterwards, in parallel with the `rayon` feature.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomInitializer;

impl Initializer for RandomInitializer {
    fn initialize(
        &self,
        ctx: &mut InitContext<'_>,
        field: &mut NnField,
    ) -> PatchMatchResult<InitStats> {
        let pending = ctx.pending(field);
        if pending.is_empty() {
            return Ok(InitStats::default());
        }
        let regions = source_regions(ctx)?;
        let mut pairs = Vec::with_capacity(pending.len());
        for &p in &pending {
            let pick = ctx.rng.random_range(0..regions.len());
            pairs.push((ctx.query(p), regions[pick]));
        }
        let scores = score_pairs(ctx.distance, ctx.image, &pairs);
        for (&p, (&(_, region), score)) in pending.iter().zip(pairs.iter().zip(scores)) {
            field.set_match(p, Match::new(region, score));
        }
        trace_event!("init_random", pixels = pending.len(), sources = regions.len());
        Ok(InitStats {
            initialized: pending.len(),
            exhausted: 0,
        })
    }
}

/// Random initialization that only keeps draws passing `gate`.
///
/// Each pending pixel gets up to `max_attempts` draws. The first draw the
/// gate accepts is stored verified with the gate's score; if every draw
/// fails, the last one is stored unverified with
/// [`Match::EXHAUSTED_SCORE`] so later passes replace it readily.
#[derive(Clone, Debug)]
pub struct GatedRandomInitializer<A> {
    gate: A,
    max_attempts: usize,
}

/// Random initialization gated by [`HistogramTest`].
pub type RandomHistogramInitializer = GatedRandomInitializer<HistogramTest>;

/// Random initialization gated by [`NeighborHistogramTest`].
pub type RandomNeighborHistogramInitializer = GatedRandomInitializer<NeighborHistogramTest>;

impl<A: AcceptanceTest> GatedRandomInitializer<A> {
    /// Draws allowed per pixel by default.
    pub const DEFAULT_ATTEMPTS: usize = 10;

    /// Creates the initializer with [`Self::DEFAULT_ATTEMPTS`].
    pub fn new(gate: A) -> Self {
        Self {
            gate,
            max_attempts: Self::DEFAULT_ATTEMPTS,
        }
    }

    /// Overrides the per-pixel attempt budget (at least one).
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Returns the gate.
    pub fn gate(&self) -> &A {
        &self.gate
    }
}

impl<A: AcceptanceTest + Default> Default for GatedRandomInitializer<A> {
    fn default() -> Self {
        Self::new(A::default())
    }
}

impl<A: AcceptanceTest> Initializer for GatedRandomInitializer<A> {
    fn initialize(
        &self,
        ctx: &mut InitContext<'_>,
        field: &mut NnField,
    ) -> PatchMatchResult<InitStats> {
        let pending = ctx.pending(field);
        if pending.is_empty() {
            return Ok(InitStats::default());
        }
        let regions = source_regions(ctx)?;
        let mut stats = InitStats::default();
        for p in pending {
            let query = ctx.query(p);
            let mut last = regions[0];
            let mut passed = None;
            for _ in 0..self.max_attempts {
                last = regions[ctx.rng.random_range(0..regions.len())];
                let trial = Match::new(last, 0.0);
                let mut accept_ctx = AcceptContext::new(ctx.image, &mut *ctx.rng);
                let verdict = self.gate.is_better_with_score(&mut accept_ctx, query, None, &trial);
                if verdict.accepted {
                    passed = Some(verdict.score);
                    break;
                }
            }
            let m = match passed {
                Some(verification) => {
                    let score = ctx.distance.distance(ctx.image, query, last);
                    Match::new(last, score).verified_with(verification)
                }
                None => {
                    stats.exhausted += 1;
                    Match::new(last, Match::EXHAUSTED_SCORE)
                }
            };
            field.set_match(p, m);
            stats.initialized += 1;
        }
        trace_event!(
            "init_gated_random",
            pixels = stats.initialized,
            exhausted = stats.exhausted
        );
        Ok(stats)
    }
}
