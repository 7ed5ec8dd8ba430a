//! Field initializers.
//!
//! Initializers fill target pixels that do not yet hold a valid match. They
//! never overwrite an existing valid match, so several can be chained: the
//! driver always runs [`KnownRegionInitializer`] first and then the
//! configured one.

use crate::candidate::Match;
use crate::field::NnField;
use crate::image::{ImageView, IntegralMask, Mask, PatchRegion, Pixel};
use crate::kernel::PatchDistance;
use crate::util::PatchMatchResult;
use rand::RngCore;

mod boundary;
mod random;

pub use boundary::BoundaryInitializer;
pub use random::{
    GatedRandomInitializer, RandomHistogramInitializer, RandomInitializer,
    RandomNeighborHistogramInitializer,
};

/// Everything an initializer may read, plus the driver's random source.
pub struct InitContext<'a> {
    /// Image the field refers to.
    pub image: ImageView<'a, f32>,
    /// Pixels usable as match sources.
    pub source: &'a Mask,
    /// Summed-area table of `source`, for O(1) patch validity.
    pub source_index: &'a IntegralMask,
    /// Pixels that need a match.
    pub target: &'a Mask,
    /// Patch radius used for every region.
    pub patch_radius: usize,
    /// Distance used to score assigned matches.
    pub distance: &'a dyn PatchDistance,
    /// Random source owned by the driver.
    pub rng: &'a mut dyn RngCore,
}

impl InitContext<'_> {
    /// Query patch of `pixel`.
    pub fn query(&self, pixel: Pixel) -> PatchRegion {
        PatchRegion::new(pixel, self.patch_radius)
    }

    /// Target pixels whose query patch fits inside the image and that hold no
    /// valid match yet, in raster order.
    pub fn pending(&self, field: &NnField) -> Vec<Pixel> {
        let width = self.image.width();
        let height = self.image.height();
        let r = self.patch_radius;
        let mut out = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let p = Pixel::new(x, y);
                if self.target.is_valid(p)
                    && PatchRegion::new(p, r).is_inside(width, height)
                    && !field.has_valid_match(p)
                {
                    out.push(p);
                }
            }
        }
        out
    }
}

/// Counters reported by one initializer run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InitStats {
    /// Pixels that received a match.
    pub initialized: usize,
    /// Pixels that received a fallback match after exhausting their attempts.
    pub exhausted: usize,
}

impl InitStats {
    /// Sums two runs.
    pub fn merged(self, other: InitStats) -> Self {
        Self {
            initialized: self.initialized + other.initialized,
            exhausted: self.exhausted + other.exhausted,
        }
    }
}

/// Assigns starting matches to pixels of a field.
pub trait Initializer {
    /// Fills pixels of `field` that lack a valid match.
    fn initialize(&self, ctx: &mut InitContext<'_>, field: &mut NnField)
        -> PatchMatchResult<InitStats>;
}

impl<T: Initializer + ?Sized> Initializer for Box<T> {
    fn initialize(
        &self,
        ctx: &mut InitContext<'_>,
        field: &mut NnField,
    ) -> PatchMatchResult<InitStats> {
        (**self).initialize(ctx, field)
    }
}

/// Self-matches every pixel whose patch is fully source-valid.
///
/// These matches have score zero and are marked verified, so the passes skip
/// them and they act as propagation seeds for neighboring target pixels.
#[derive(Clone, Copy, Debug, Default)]
pub struct KnownRegionInitializer;

impl Initializer for KnownRegionInitializer {
    fn initialize(
        &self,
        ctx: &mut InitContext<'_>,
        field: &mut NnField,
    ) -> PatchMatchResult<InitStats> {
        let mut stats = InitStats::default();
        for y in 0..field.height() {
            for x in 0..field.width() {
                let p = Pixel::new(x, y);
                let region = ctx.query(p);
                if !ctx.source_index.is_region_valid(region) || field.has_valid_match(p) {
                    continue;
                }
                field.set_match(p, Match::exact(region));
                stats.initialized += 1;
            }
        }
        Ok(stats)
    }
}

/// Runs several initializers in order.
#[derive(Default)]
pub struct InitializerChain {
    stages: Vec<Box<dyn Initializer>>,
}

impl InitializerChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    pub fn then<I: Initializer + 'static>(mut self, init: I) -> Self {
        self.stages.push(Box::new(init));
        self
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the chain has no stage.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Initializer for InitializerChain {
    fn initialize(
        &self,
        ctx: &mut InitContext<'_>,
        field: &mut NnField,
    ) -> PatchMatchResult<InitStats> {
        let mut stats = InitStats::default();
        for stage in &self.stages {
            stats = stats.merged(stage.initialize(ctx, field)?);
        }
        Ok(stats)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::Scene;
    use super::{InitContext, Initializer, InitializerChain, KnownRegionInitializer};
    use crate::field::NnField;
    use crate::image::{ImageView, Pixel};
    use crate::init::RandomInitializer;
    use crate::kernel::Ssd;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn known_region_self_matches_valid_patches() {
        let scene = Scene::new();
        let view = ImageView::from_slice(&scene.image, 16, 16).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = InitContext {
            image: view,
            source: &scene.source,
            source_index: &scene.index,
            target: &scene.target,
            patch_radius: 1,
            distance: &Ssd,
            rng: &mut rng,
        };
        let mut field = NnField::new(16, 16, 1).unwrap();
        let stats = KnownRegionInitializer.initialize(&mut ctx, &mut field).unwrap();
        // Interior pixels whose 3x3 window avoids the hole (6x6 grown by 1).
        assert_eq!(stats.initialized, 14 * 14 - 6 * 6);
        let m = field.best(Pixel::new(2, 2)).unwrap();
        assert!(m.is_exact() && m.verified);
        assert_eq!(m.region.center(), Pixel::new(2, 2));
        assert!(field.best(Pixel::new(5, 5)).is_none());
        assert!(field.best(Pixel::new(0, 0)).is_none());
    }

    #[test]
    fn chain_runs_stages_in_order() {
        let scene = Scene::new();
        let view = ImageView::from_slice(&scene.image, 16, 16).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let mut ctx = InitContext {
            image: view,
            source: &scene.source,
            source_index: &scene.index,
            target: &scene.target,
            patch_radius: 1,
            distance: &Ssd,
            rng: &mut rng,
        };
        let chain = InitializerChain::new()
            .then(KnownRegionInitializer)
            .then(RandomInitializer);
        assert_eq!(chain.len(), 2);
        let mut field = NnField::new(16, 16, 1).unwrap();
        let stats = chain.initialize(&mut ctx, &mut field).unwrap();
        assert_eq!(stats.initialized, 14 * 14 - 6 * 6 + 16);
        for y in 6..10 {
            for x in 6..10 {
                assert!(field.has_valid_match(Pixel::new(x, y)));
            }
        }
    }
}
