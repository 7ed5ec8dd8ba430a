//! Histogram-based acceptance tests.
//!
//! These gates ignore the patch distance and compare color distributions,
//! so they are meant to follow an SSD test in a composite.

use crate::accept::{AcceptContext, AcceptanceTest, Verdict};
use crate::candidate::Match;
use crate::image::{Histogram, HistogramConfig, PatchRegion};
use rand::Rng;

const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Accepts when the query and candidate histograms differ by less than
/// `threshold`.
///
/// The difference is an L1 distance over per-channel pixel counts, so it is
/// bounded by `2 * (2r + 1)^2 * channels`. `threshold` must scale with patch
/// area and channel count: the default of 500 only rejects from radius 5 on
/// RGB, but at radius 3 RGB the largest possible difference is 294 and the
/// default never rejects.
#[derive(Clone, Copy, Debug)]
pub struct HistogramTest {
    /// Binning parameters.
    pub histogram: HistogramConfig,
    /// Maximum accepted L1 histogram difference. Absolute, not normalized
    /// by patch area.
    pub threshold: f32,
}

impl Default for HistogramTest {
    fn default() -> Self {
        Self {
            histogram: HistogramConfig::default(),
            threshold: 500.0,
        }
    }
}

impl HistogramTest {
    /// Creates the test with default binning.
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }
}

impl AcceptanceTest for HistogramTest {
    fn is_better_with_score(
        &self,
        ctx: &mut AcceptContext<'_>,
        query: PatchRegion,
        _current: Option<&Match>,
        candidate: &Match,
    ) -> Verdict {
        let q = Histogram::compute(ctx.image, query, &self.histogram);
        let c = Histogram::compute(ctx.image, candidate.region, &self.histogram);
        let diff = q.difference(&c);
        Verdict {
            accepted: diff < self.threshold,
            score: diff,
        }
    }
}

/// Accepts when the candidate is not much further from the query (in
/// histogram terms) than a random neighbor patch of the query is.
///
/// With `d(a, b)` the histogram difference and `n` a patch one pixel away
/// from the query, the test passes iff `d(q, c) < multiplier * d(q, n)`.
/// When `d(q, n)` is zero (flat areas) the test falls back to
/// `d(q, c) < fallback_threshold`. When no neighbor patch fits inside the
/// image the neighbor gate is skipped and the candidate passes.
#[derive(Clone, Copy, Debug)]
pub struct NeighborHistogramTest {
    /// Binning parameters.
    pub histogram: HistogramConfig,
    /// Allowed ratio between candidate and neighbor differences.
    pub multiplier: f32,
    /// Absolute threshold used when the neighbor difference is zero. Like
    /// [`HistogramTest::threshold`] it scales with patch area and channels.
    pub fallback_threshold: f32,
}

impl Default for NeighborHistogramTest {
    fn default() -> Self {
        Self {
            histogram: HistogramConfig::default(),
            multiplier: 2.0,
            fallback_threshold: 500.0,
        }
    }
}

impl NeighborHistogramTest {
    /// Creates the test with default binning and fallback.
    pub fn new(multiplier: f32) -> Self {
        Self {
            multiplier,
            ..Self::default()
        }
    }

    fn random_neighbor(&self, ctx: &mut AcceptContext<'_>, query: PatchRegion) -> Option<PatchRegion> {
        let width = ctx.image.width();
        let height = ctx.image.height();
        let start = ctx.rng.random_range(0..NEIGHBOR_OFFSETS.len());
        (0..NEIGHBOR_OFFSETS.len())
            .map(|i| NEIGHBOR_OFFSETS[(start + i) % NEIGHBOR_OFFSETS.len()])
            .filter_map(|(dx, dy)| query.translated(dx, dy))
            .find(|r| r.is_inside(width, height))
    }
}

impl AcceptanceTest for NeighborHistogramTest {
    fn is_better_with_score(
        &self,
        ctx: &mut AcceptContext<'_>,
        query: PatchRegion,
        _current: Option<&Match>,
        candidate: &Match,
    ) -> Verdict {
        let q = Histogram::compute(ctx.image, query, &self.histogram);
        let c = Histogram::compute(ctx.image, candidate.region, &self.histogram);
        let diff = q.difference(&c);

        let Some(neighbor) = self.random_neighbor(ctx, query) else {
            return Verdict::accept(diff);
        };
        let n = Histogram::compute(ctx.image, neighbor, &self.histogram);
        let neighbor_diff = q.difference(&n);
        let accepted = if neighbor_diff == 0.0 {
            diff < self.fallback_threshold
        } else {
            diff < self.multiplier * neighbor_diff
        };
        Verdict {
            accepted,
            score: diff,
        }
    }
}
