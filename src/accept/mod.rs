//! Acceptance tests gating field updates.
//!
//! Propagation and random search compute a candidate match for a pixel and
//! ask an [`AcceptanceTest`] whether it should replace (or join) the pixel's
//! current matches. Tests compose with [`CompositeTest`]; cheap tests should
//! come first since evaluation stops at the first rejection.

use crate::candidate::Match;
use crate::image::{ImageView, Mask, PatchRegion};
use rand::RngCore;

mod histogram;

pub use histogram::{HistogramTest, NeighborHistogramTest};

/// Inputs shared by every test during one evaluation.
pub struct AcceptContext<'a> {
    /// Image the regions refer to.
    pub image: ImageView<'a, f32>,
    /// Random source owned by the driver.
    pub rng: &'a mut dyn RngCore,
}

impl<'a> AcceptContext<'a> {
    /// Bundles an image view with a random source.
    pub fn new(image: ImageView<'a, f32>, rng: &'a mut dyn RngCore) -> Self {
        Self { image, rng }
    }
}

/// Outcome of a test: whether to accept and the score it measured.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Verdict {
    /// True if the candidate passed.
    pub accepted: bool,
    /// Test-specific score, stored as the match's verification score.
    pub score: f32,
}

impl Verdict {
    /// A passing verdict.
    pub fn accept(score: f32) -> Self {
        Self {
            accepted: true,
            score,
        }
    }

    /// A failing verdict.
    pub fn reject(score: f32) -> Self {
        Self {
            accepted: false,
            score,
        }
    }
}

/// Decides whether `candidate` is better than `current` for `query`.
pub trait AcceptanceTest {
    /// Evaluates the candidate. `current` is `None` when the pixel has no
    /// incumbent to compare against.
    fn is_better_with_score(
        &self,
        ctx: &mut AcceptContext<'_>,
        query: PatchRegion,
        current: Option<&Match>,
        candidate: &Match,
    ) -> Verdict;

    /// Same as [`is_better_with_score`](Self::is_better_with_score) without
    /// the score.
    fn is_better(
        &self,
        ctx: &mut AcceptContext<'_>,
        query: PatchRegion,
        current: Option<&Match>,
        candidate: &Match,
    ) -> bool {
        self.is_better_with_score(ctx, query, current, candidate)
            .accepted
    }
}

impl<T: AcceptanceTest + ?Sized> AcceptanceTest for Box<T> {
    fn is_better_with_score(
        &self,
        ctx: &mut AcceptContext<'_>,
        query: PatchRegion,
        current: Option<&Match>,
        candidate: &Match,
    ) -> Verdict {
        (**self).is_better_with_score(ctx, query, current, candidate)
    }
}

/// Accepts strictly lower patch distances.
#[derive(Clone, Copy, Debug, Default)]
pub struct SsdTest;

impl AcceptanceTest for SsdTest {
    fn is_better_with_score(
        &self,
        _ctx: &mut AcceptContext<'_>,
        _query: PatchRegion,
        current: Option<&Match>,
        candidate: &Match,
    ) -> Verdict {
        let accepted = current.map_or(true, |c| candidate.score < c.score);
        Verdict {
            accepted,
            score: candidate.score,
        }
    }
}

/// Logical AND of several tests, evaluated in order.
#[derive(Default)]
pub struct CompositeTest {
    tests: Vec<Box<dyn AcceptanceTest>>,
}

impl CompositeTest {
    /// Creates an empty composite, which accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a test to the chain.
    pub fn with<T: AcceptanceTest + 'static>(mut self, test: T) -> Self {
        self.tests.push(Box::new(test));
        self
    }

    /// Appends a boxed test to the chain.
    pub fn push(&mut self, test: Box<dyn AcceptanceTest>) {
        self.tests.push(test);
    }

    /// Number of chained tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if no test is chained.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

impl AcceptanceTest for CompositeTest {
    /// The verdict of the first rejecting test, or of the last test when all
    /// pass.
    fn is_better_with_score(
        &self,
        ctx: &mut AcceptContext<'_>,
        query: PatchRegion,
        current: Option<&Match>,
        candidate: &Match,
    ) -> Verdict {
        let mut last = Verdict::accept(candidate.score);
        for test in &self.tests {
            last = test.is_better_with_score(ctx, query, current, candidate);
            if !last.accepted {
                return last;
            }
        }
        last
    }
}

/// Accepts candidates whose center is valid in `mask`.
#[derive(Clone, Debug)]
pub struct SourceRegionTest {
    mask: Mask,
}

impl SourceRegionTest {
    /// Creates the test for `mask`.
    pub fn new(mask: Mask) -> Self {
        Self { mask }
    }
}

impl AcceptanceTest for SourceRegionTest {
    fn is_better_with_score(
        &self,
        _ctx: &mut AcceptContext<'_>,
        _query: PatchRegion,
        _current: Option<&Match>,
        candidate: &Match,
    ) -> Verdict {
        Verdict {
            accepted: self.mask.is_valid(candidate.region.center()),
            score: candidate.score,
        }
    }
}
