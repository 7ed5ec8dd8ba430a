//! The PatchMatch solver.
//!
//! [`PatchMatch`] owns the nearest-neighbor field and alternates propagation
//! (scan direction toggling every round, starting forward) with random
//! search. Every role is a strategy: the patch distance is a type parameter,
//! the acceptance test, initializer, neighbor functor and update policy are
//! boxed trait objects, and the random source is a seedable [`StdRng`].

use crate::accept::{AcceptanceTest, SsdTest};
use crate::field::NnField;
use crate::image::{ImageView, IntegralMask, Mask, PatchRegion, Pixel, ScanDirection};
use crate::init::{InitContext, InitStats, Initializer, KnownRegionInitializer, RandomInitializer};
use crate::kernel::PatchDistance;
use crate::neighbors::{BackwardNeighbors, ForwardNeighbors, NeighborFunctor};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::{PatchMatchError, PatchMatchResult};
use rand::rngs::StdRng;
use rand::SeedableRng;

mod pass;
mod propagation;
mod random;
pub mod update;

pub use pass::PassStats;
pub use random::{search_radii, SearchRadii};
pub use update::{KeepBest, MatchUpdate, ReplaceBest};

use pass::PassContext;

/// Solver parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatchMatchConfig {
    /// Patch radius; patches are `2 * patch_radius + 1` pixels wide.
    pub patch_radius: usize,
    /// Propagation + random-search rounds.
    pub iterations: usize,
    /// Draws per random-search radius before giving up on that radius.
    pub random_search_attempts: usize,
    /// First random-search radius; `max(width, height)` when `None`.
    pub initial_search_radius: Option<usize>,
}

impl Default for PatchMatchConfig {
    fn default() -> Self {
        Self {
            patch_radius: 3,
            iterations: 5,
            random_search_attempts: 5,
            initial_search_radius: None,
        }
    }
}

impl PatchMatchConfig {
    /// Rejects parameter combinations the solver cannot run with.
    pub fn validate(&self) -> PatchMatchResult<()> {
        if self.patch_radius == 0 {
            return Err(PatchMatchError::InvalidConfig {
                reason: "patch_radius must be at least 1",
            });
        }
        if self.random_search_attempts == 0 {
            return Err(PatchMatchError::InvalidConfig {
                reason: "random_search_attempts must be at least 1",
            });
        }
        if self.initial_search_radius == Some(0) {
            return Err(PatchMatchError::InvalidConfig {
                reason: "initial_search_radius must be positive",
            });
        }
        Ok(())
    }
}

/// Solver lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverState {
    /// No field has been computed.
    Uninitialized,
    /// Initialization finished; iterations have not completed.
    Initialized,
    /// The last round accepted no candidate.
    Converged,
    /// All configured rounds ran and the last one still changed the field.
    StoppedAtIterationLimit,
}

/// Counters for one propagation + random-search round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationStats {
    /// Scan direction used by this round.
    pub direction: ScanDirection,
    /// Propagation counters.
    pub propagation: PassStats,
    /// Random-search counters.
    pub random_search: PassStats,
    /// Mean best score over target pixels after the round.
    pub mean_score: Option<f64>,
}

impl IterationStats {
    /// Candidates accepted by either pass.
    pub fn accepted(&self) -> usize {
        self.propagation.accepted + self.random_search.accepted
    }
}

/// Diagnostics of the last `compute` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatchMatchStats {
    /// Self matches assigned by the known-region pass.
    pub known: InitStats,
    /// Output of the configured initializer.
    pub init: InitStats,
    /// Mean best score over target pixels after initialization.
    pub initial_mean_score: Option<f64>,
    /// One entry per round.
    pub iterations: Vec<IterationStats>,
}

impl PatchMatchStats {
    /// Mean best score after the last round, or after initialization if no
    /// round ran.
    pub fn final_mean_score(&self) -> Option<f64> {
        self.iterations
            .last()
            .map_or(self.initial_mean_score, |it| it.mean_score)
    }
}

/// PatchMatch nearest-neighbor field solver.
pub struct PatchMatch<D> {
    distance: D,
    cfg: PatchMatchConfig,
    acceptance: Box<dyn AcceptanceTest>,
    initializer: Box<dyn Initializer>,
    neighbors: Option<Box<dyn NeighborFunctor>>,
    update: Box<dyn MatchUpdate>,
    allowed: Option<Mask>,
    rng: StdRng,
    field: Option<NnField>,
    state: SolverState,
    stats: PatchMatchStats,
}

impl<D: PatchDistance> PatchMatch<D> {
    /// Seed used when none is given.
    pub const DEFAULT_SEED: u64 = 0;

    /// Basic PatchMatch with SSD acceptance and random initialization.
    pub fn new(distance: D, cfg: PatchMatchConfig) -> Self {
        Self {
            distance,
            cfg,
            acceptance: Box::new(SsdTest),
            initializer: Box::new(RandomInitializer),
            neighbors: None,
            update: Box::new(ReplaceBest),
            allowed: None,
            rng: StdRng::seed_from_u64(Self::DEFAULT_SEED),
            field: None,
            state: SolverState::Uninitialized,
            stats: PatchMatchStats::default(),
        }
    }

    /// Generalized PatchMatch keeping the `k` best matches per pixel.
    pub fn generalized(distance: D, cfg: PatchMatchConfig, k: usize) -> Self {
        Self::new(distance, cfg).with_update(KeepBest::new(k))
    }

    /// Replaces the acceptance test.
    pub fn with_acceptance<T: AcceptanceTest + 'static>(mut self, test: T) -> Self {
        self.acceptance = Box::new(test);
        self
    }

    /// Replaces the initializer run after the known-region pass.
    pub fn with_initializer<I: Initializer + 'static>(mut self, init: I) -> Self {
        self.initializer = Box::new(init);
        self
    }

    /// Uses `functor` for every propagation pass instead of the
    /// direction-dependent forward/backward neighbors.
    pub fn with_neighbors<N: NeighborFunctor + 'static>(mut self, functor: N) -> Self {
        self.neighbors = Some(Box::new(functor));
        self
    }

    /// Replaces the update policy.
    pub fn with_update<U: MatchUpdate + 'static>(mut self, update: U) -> Self {
        self.update = Box::new(update);
        self
    }

    /// Restricts which pixels may propagate their matches (in addition to
    /// target pixels). Defaults to the source mask.
    pub fn with_allowed_propagation_mask(mut self, mask: Mask) -> Self {
        self.allowed = Some(mask);
        self
    }

    /// Reseeds the random source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Uses an existing generator.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PatchMatchConfig {
        &self.cfg
    }

    /// Returns the distance.
    pub fn distance(&self) -> &D {
        &self.distance
    }

    /// Returns the current field, if any.
    pub fn field(&self) -> Option<&NnField> {
        self.field.as_ref()
    }

    /// Takes the field out of the solver.
    pub fn into_field(self) -> Option<NnField> {
        self.field
    }

    /// Diagnostics of the last computation.
    pub fn stats(&self) -> &PatchMatchStats {
        &self.stats
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Drops the field and diagnostics. Strategies and the generator are kept.
    pub fn reset(&mut self) {
        self.field = None;
        self.state = SolverState::Uninitialized;
        self.stats = PatchMatchStats::default();
    }

    /// Computes the field for `target` pixels, matching into `source`.
    ///
    /// Runs the known-region pass and the configured initializer (both only
    /// fill pixels without a valid match, so calling again continues from the
    /// current field) and then the configured rounds. A field kept from an
    /// earlier call is rescored against `image` first, and matches that are
    /// no longer fully source-valid are dropped.
    ///
    /// Fails with [`PatchMatchError::NoSourceRegions`] when the source mask
    /// has no fully valid patch; callers should treat that as recoverable.
    pub fn compute(
        &mut self,
        image: ImageView<'_, f32>,
        source: &Mask,
        target: &Mask,
    ) -> PatchMatchResult<&NnField> {
        let _span = trace_span!(
            "patchmatch",
            width = image.width(),
            height = image.height(),
            iterations = self.cfg.iterations
        )
        .entered();
        self.check_inputs(image, source, target)?;
        let source_index = IntegralMask::new(source);
        // A retained field may come from another image or source mask.
        let mut field = match self.field.take() {
            Some(f) if f.width() == image.width() && f.height() == image.height() => {
                self.rescored(image, &source_index, &f)
            }
            _ => NnField::new(image.width(), image.height(), self.update.max_matches())?,
        };

        let mut stats = PatchMatchStats::default();
        {
            let _span = trace_span!("initialize").entered();
            let mut ctx = InitContext {
                image,
                source,
                source_index: &source_index,
                target,
                patch_radius: self.cfg.patch_radius,
                distance: &self.distance,
                rng: &mut self.rng,
            };
            let known = KnownRegionInitializer.initialize(&mut ctx, &mut field);
            let init = known.and_then(|k| {
                stats.known = k;
                self.initializer.initialize(&mut ctx, &mut field)
            });
            match init {
                Ok(s) => stats.init = s,
                Err(err) => {
                    self.field = Some(field);
                    self.state = SolverState::Uninitialized;
                    return Err(err);
                }
            }
            trace_event!(
                "initialized",
                known = stats.known.initialized,
                initialized = stats.init.initialized,
                exhausted = stats.init.exhausted
            );
        }

        self.run(image, source, target, &source_index, field, stats)
    }

    /// Continues from `initial` instead of initializing.
    ///
    /// `initial` is deep-copied and re-bucketed to the update policy's
    /// capacity. Every stored match is rescored against `image`, and matches
    /// whose region is no longer fully source-valid are dropped, so fields
    /// coming from [`NnField::upsampled`] can be fed in directly. Cells whose
    /// own patch does not fit inside the image are cleared.
    pub fn compute_from(
        &mut self,
        image: ImageView<'_, f32>,
        source: &Mask,
        target: &Mask,
        initial: &NnField,
    ) -> PatchMatchResult<&NnField> {
        let _span = trace_span!(
            "patchmatch_from",
            width = image.width(),
            height = image.height(),
            iterations = self.cfg.iterations
        )
        .entered();
        self.check_inputs(image, source, target)?;
        if initial.width() != image.width() || initial.height() != image.height() {
            return Err(PatchMatchError::DimensionMismatch {
                width: image.width(),
                height: image.height(),
                got_width: initial.width(),
                got_height: initial.height(),
                context: "initial field",
            });
        }
        let source_index = IntegralMask::new(source);
        let field = self.rescored(image, &source_index, initial);
        self.run(image, source, target, &source_index, field, PatchMatchStats::default())
    }

    fn check_inputs(
        &self,
        image: ImageView<'_, f32>,
        source: &Mask,
        target: &Mask,
    ) -> PatchMatchResult<()> {
        self.cfg.validate()?;
        source.ensure_size(image.width(), image.height(), "source mask")?;
        target.ensure_size(image.width(), image.height(), "target mask")?;
        if let Some(allowed) = &self.allowed {
            allowed.ensure_size(image.width(), image.height(), "allowed-propagation mask")?;
        }
        Ok(())
    }

    fn rescored(
        &self,
        image: ImageView<'_, f32>,
        source_index: &IntegralMask,
        initial: &NnField,
    ) -> NnField {
        let mut field = initial.with_max_matches(self.update.max_matches());
        let (width, height) = (field.width(), field.height());
        for y in 0..height {
            for x in 0..width {
                let p = Pixel::new(x, y);
                let query = PatchRegion::new(p, self.cfg.patch_radius);
                if field[p].is_empty() {
                    continue;
                }
                if !query.is_inside(width, height) {
                    field[p].clear();
                    continue;
                }
                let kept: Vec<_> = field[p]
                    .iter()
                    .filter(|m| {
                        m.region.radius() == self.cfg.patch_radius
                            && source_index.is_region_valid(m.region)
                    })
                    .map(|m| {
                        let mut m = *m;
                        m.score = self.distance.distance(image, query, m.region);
                        m
                    })
                    .collect();
                let cell = &mut field[p];
                cell.clear();
                for m in kept {
                    cell.add_match(m);
                }
            }
        }
        field
    }

    fn run(
        &mut self,
        image: ImageView<'_, f32>,
        source: &Mask,
        target: &Mask,
        source_index: &IntegralMask,
        mut field: NnField,
        mut stats: PatchMatchStats,
    ) -> PatchMatchResult<&NnField> {
        self.state = SolverState::Initialized;
        let (width, height) = (image.width(), image.height());
        let r = self.cfg.patch_radius;
        let pixels: Vec<Pixel> = target
            .valid_pixels(ScanDirection::Forward)
            .into_iter()
            .filter(|&p| PatchRegion::new(p, r).is_inside(width, height))
            .collect();
        stats.initial_mean_score = field.mean_best_score(target);

        let ctx = PassContext {
            image,
            source_index,
            target,
            allowed: self.allowed.as_ref().unwrap_or(source),
            distance: &self.distance,
            acceptance: self.acceptance.as_ref(),
            update: self.update.as_ref(),
            patch_radius: r,
        };
        let start_radius = self
            .cfg
            .initial_search_radius
            .unwrap_or_else(|| width.max(height));

        let mut direction = ScanDirection::Forward;
        for round in 0..self.cfg.iterations {
            let neighbors: &dyn NeighborFunctor = match (&self.neighbors, direction) {
                (Some(n), _) => n.as_ref(),
                (None, ScanDirection::Forward) => &ForwardNeighbors,
                (None, ScanDirection::Backward) => &BackwardNeighbors,
            };
            let propagation = propagation::propagate(
                &ctx,
                &mut self.rng,
                &mut field,
                &pixels,
                direction,
                neighbors,
            );
            let random_search = random::random_search(
                &ctx,
                &mut self.rng,
                &mut field,
                &pixels,
                direction,
                start_radius,
                self.cfg.random_search_attempts,
            );
            let it = IterationStats {
                direction,
                propagation,
                random_search,
                mean_score: field.mean_best_score(target),
            };
            trace_debug!(
                "iteration",
                round = round,
                accepted = it.accepted(),
                mean_score = it.mean_score.unwrap_or(f64::NAN)
            );
            stats.iterations.push(it);
            direction = direction.flipped();
        }

        self.state = match stats.iterations.last() {
            Some(it) if it.accepted() == 0 => SolverState::Converged,
            _ => SolverState::StoppedAtIterationLimit,
        };
        trace_event!(
            "patchmatch_done",
            rounds = stats.iterations.len(),
            converged = self.state == SolverState::Converged
        );
        self.stats = stats;
        Ok(self.field.insert(field))
    }
}

#[cfg(test)]
mod tests {
    use super::{PatchMatch, PatchMatchConfig, SolverState};
    use crate::field::NnField;
    use crate::image::{ImageView, Mask, Pixel};
    use crate::kernel::Ssd;
    use crate::util::PatchMatchError;

    fn cfg(patch_radius: usize, iterations: usize) -> PatchMatchConfig {
        PatchMatchConfig {
            patch_radius,
            iterations,
            ..PatchMatchConfig::default()
        }
    }

    fn textured(width: usize, height: usize) -> Vec<f32> {
        (0..width * height)
            .map(|i| (((i % width) * 31 + (i / width) * 17) % 97) as f32)
            .collect()
    }

    #[test]
    fn config_validation() {
        assert!(PatchMatchConfig::default().validate().is_ok());
        assert!(matches!(
            cfg(0, 1).validate(),
            Err(PatchMatchError::InvalidConfig { .. })
        ));
        let bad = PatchMatchConfig {
            initial_search_radius: Some(0),
            ..PatchMatchConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn mask_size_mismatch_is_fatal() {
        let data = textured(8, 8);
        let view = ImageView::from_slice(&data, 8, 8).unwrap();
        let source = Mask::new_filled(8, 8, true).unwrap();
        let target = Mask::new_filled(7, 8, true).unwrap();
        let mut pm = PatchMatch::new(Ssd, cfg(1, 1));
        let err = pm.compute(view, &source, &target).unwrap_err();
        assert!(matches!(err, PatchMatchError::DimensionMismatch { .. }));
        assert!(!err.is_recoverable());
        assert_eq!(pm.state(), SolverState::Uninitialized);
    }

    #[test]
    fn state_moves_through_lifecycle() {
        let data = textured(16, 16);
        let view = ImageView::from_slice(&data, 16, 16).unwrap();
        let source = Mask::from_fn(16, 16, |p| p.x < 8).unwrap();
        let target = source.inverted();
        let mut pm = PatchMatch::new(Ssd, cfg(1, 3)).with_seed(7);
        assert_eq!(pm.state(), SolverState::Uninitialized);
        pm.compute(view, &source, &target).unwrap();
        assert!(matches!(
            pm.state(),
            SolverState::Converged | SolverState::StoppedAtIterationLimit
        ));
        assert_eq!(pm.stats().iterations.len(), 3);
        assert!(pm.field().is_some());
        pm.reset();
        assert_eq!(pm.state(), SolverState::Uninitialized);
        assert!(pm.field().is_none());
    }

    #[test]
    fn zero_iterations_only_initializes() {
        let data = textured(12, 12);
        let view = ImageView::from_slice(&data, 12, 12).unwrap();
        let source = Mask::from_fn(12, 12, |p| p.y < 6).unwrap();
        let target = source.inverted();
        let mut pm = PatchMatch::new(Ssd, cfg(1, 0));
        let field = pm.compute(view, &source, &target).unwrap();
        assert!(field.has_valid_match(Pixel::new(5, 9)));
        assert_eq!(pm.state(), SolverState::StoppedAtIterationLimit);
        assert!(pm.stats().iterations.is_empty());
        assert_eq!(
            pm.stats().final_mean_score(),
            pm.stats().initial_mean_score
        );
    }

    #[test]
    fn compute_from_rejects_wrong_size() {
        let data = textured(10, 10);
        let view = ImageView::from_slice(&data, 10, 10).unwrap();
        let mask = Mask::new_filled(10, 10, true).unwrap();
        let initial = NnField::new(5, 5, 1).unwrap();
        let mut pm = PatchMatch::new(Ssd, cfg(1, 1));
        assert!(matches!(
            pm.compute_from(view, &mask, &mask, &initial),
            Err(PatchMatchError::DimensionMismatch { .. })
        ));
    }
}
