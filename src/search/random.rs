//! Random search pass.
//!
//! Each pixel samples candidates in windows of exponentially decreasing size
//! around its current best match, escaping local minima that propagation
//! alone cannot leave.

use crate::field::NnField;
use crate::image::mask::random_valid_patch;
use crate::image::{Pixel, Rect, ScanDirection};
use crate::kernel::PatchDistance;
use crate::search::pass::{in_scan_order, PassContext, PassStats};
use crate::trace::{trace_event, trace_span};
use rand::RngCore;

/// Window radii visited per pixel: `start`, halved until it no longer
/// exceeds `patch_radius`.
#[derive(Clone, Copy, Debug)]
pub struct SearchRadii {
    next: usize,
    patch_radius: usize,
}

impl SearchRadii {
    /// Starts at `start`.
    pub fn new(start: usize, patch_radius: usize) -> Self {
        Self {
            next: start,
            patch_radius,
        }
    }
}

impl Iterator for SearchRadii {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next <= self.patch_radius {
            return None;
        }
        let radius = self.next;
        self.next /= 2;
        Some(radius)
    }
}

/// Radius sequence for a `width x height` image when no override is set.
pub fn search_radii(width: usize, height: usize, patch_radius: usize) -> Vec<usize> {
    SearchRadii::new(width.max(height), patch_radius).collect()
}

/// Runs one random-search pass over `pixels` in `direction`.
///
/// The window center stays at the best match the pixel held when its search
/// began; improvements found at larger radii do not move it.
pub(crate) fn random_search<D: PatchDistance + ?Sized>(
    ctx: &PassContext<'_, D>,
    rng: &mut dyn RngCore,
    field: &mut NnField,
    pixels: &[Pixel],
    direction: ScanDirection,
    start_radius: usize,
    attempts: usize,
) -> PassStats {
    let _span = trace_span!("random_search", pixels = pixels.len(), start_radius = start_radius)
        .entered();
    let width = field.width();
    let height = field.height();
    let mut stats = PassStats::default();

    for p in in_scan_order(pixels, direction) {
        stats.visited += 1;
        let cell = &field[p];
        if cell.has_exact_match() {
            stats.skipped_exact += 1;
            continue;
        }
        let center = cell.best().map_or(p, |m| m.region.center());
        for radius in SearchRadii::new(start_radius, ctx.patch_radius) {
            let window = Rect::around(center, radius, width, height);
            let drawn = random_valid_patch(&mut *rng, window, ctx.patch_radius, attempts, |r| {
                ctx.source_index.is_region_valid(r)
            });
            match drawn {
                Some(region) => ctx.offer(&mut *rng, field, p, region, &mut stats),
                None => stats.exhausted += 1,
            }
        }
    }

    trace_event!(
        "random_search_done",
        accepted = stats.accepted,
        rejected = stats.rejected,
        exhausted = stats.exhausted
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::{random_search, search_radii, SearchRadii};
    use crate::accept::SsdTest;
    use crate::candidate::Match;
    use crate::field::NnField;
    use crate::image::{ImageView, IntegralMask, Mask, PatchRegion, Pixel, ScanDirection};
    use crate::kernel::{PatchDistance, Ssd};
    use crate::search::pass::PassContext;
    use crate::search::update::ReplaceBest;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn radii_halve_until_patch_radius() {
        assert_eq!(search_radii(100, 50, 3), vec![100, 50, 25, 12, 6]);
        assert_eq!(search_radii(4, 4, 3), vec![4]);
        assert!(SearchRadii::new(2, 3).next().is_none());
    }

    #[test]
    fn search_improves_or_keeps_scores() {
        let data: Vec<f32> = (0..400).map(|i| ((i * 37) % 101) as f32).collect();
        let view = ImageView::from_slice(&data, 20, 20).unwrap();
        let source = Mask::from_fn(20, 20, |p| p.x < 10).unwrap();
        let target = source.inverted();
        let index = IntegralMask::new(&source);
        let ctx = PassContext {
            image: view,
            source_index: &index,
            target: &target,
            allowed: &source,
            distance: &Ssd,
            acceptance: &SsdTest,
            update: &ReplaceBest,
            patch_radius: 2,
        };
        let mut field = NnField::new(20, 20, 1).unwrap();
        let start = PatchRegion::around(4, 4, 2);
        let mut pixels = Vec::new();
        for y in 2..18 {
            for x in 11..18 {
                let p = Pixel::new(x, y);
                let score = Ssd.distance(view, PatchRegion::new(p, 2), start);
                field.set_match(p, Match::new(start, score));
                pixels.push(p);
            }
        }
        let before = field.clone();
        let mut rng = StdRng::seed_from_u64(9);
        let stats = random_search(
            &ctx,
            &mut rng,
            &mut field,
            &pixels,
            ScanDirection::Forward,
            20,
            5,
        );
        assert_eq!(stats.visited, pixels.len());
        assert!(stats.accepted > 0);
        for &p in &pixels {
            let old = before.best(p).unwrap();
            let new = field.best(p).unwrap();
            assert!(new.score <= old.score);
            assert!(index.is_region_valid(new.region));
        }
    }

    #[test]
    fn window_follows_best_match_or_falls_back_to_pixel() {
        let data: Vec<f32> = (0..360).map(|i| ((i * 37) % 101) as f32).collect();
        let view = ImageView::from_slice(&data, 30, 12).unwrap();
        let source = Mask::from_fn(30, 12, |p| p.x < 12).unwrap();
        let target = source.inverted();
        let index = IntegralMask::new(&source);
        let ctx = PassContext {
            image: view,
            source_index: &index,
            target: &target,
            allowed: &source,
            distance: &Ssd,
            acceptance: &SsdTest,
            update: &ReplaceBest,
            patch_radius: 1,
        };
        // Both pixels sit far right of the source; only the first holds a match.
        let held = Pixel::new(25, 3);
        let empty = Pixel::new(25, 8);
        let start = PatchRegion::around(5, 5, 1);
        let mut field = NnField::new(30, 12, 1).unwrap();
        let score = Ssd.distance(view, PatchRegion::new(held, 1), start);
        field.set_match(held, Match::new(start, score));

        let mut rng = StdRng::seed_from_u64(5);
        let stats = random_search(
            &ctx,
            &mut rng,
            &mut field,
            &[held, empty],
            ScanDirection::Forward,
            4,
            5,
        );
        // Every window around (5, 5) is fully source-valid; none around
        // (25, 8) reaches the source.
        let radii = SearchRadii::new(4, 1).count();
        assert_eq!(stats.exhausted, radii);
        assert!(field.best(empty).is_none());
        let best = field.best(held).unwrap();
        assert!(best.score <= score);
        assert!(index.is_region_valid(best.region));
    }

    #[test]
    fn no_source_in_reach_counts_exhaustion() {
        let data = vec![1.0f32; 100];
        let view = ImageView::from_slice(&data, 10, 10).unwrap();
        let source = Mask::new_filled(10, 10, false).unwrap();
        let target = Mask::new_filled(10, 10, true).unwrap();
        let index = IntegralMask::new(&source);
        let ctx = PassContext {
            image: view,
            source_index: &index,
            target: &target,
            allowed: &source,
            distance: &Ssd,
            acceptance: &SsdTest,
            update: &ReplaceBest,
            patch_radius: 1,
        };
        let mut field = NnField::new(10, 10, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let stats = random_search(
            &ctx,
            &mut rng,
            &mut field,
            &[Pixel::new(5, 5)],
            ScanDirection::Backward,
            10,
            5,
        );
        // Radii 10, 5, 2.
        assert_eq!(stats.exhausted, 3);
        assert_eq!(stats.accepted, 0);
        assert!(field.best(Pixel::new(5, 5)).is_none());
    }
}
