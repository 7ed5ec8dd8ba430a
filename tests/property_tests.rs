//! Property-based tests for the solver's building blocks.
//!
//! These tests use proptest to check invariants that must hold for any
//! input: match-set bounds, histogram symmetry and the random-search radius
//! schedule.

use patchmatch::lowlevel::{search_radii, Histogram, HistogramConfig};
use patchmatch::{ImageView, Match, MatchSet, PatchRegion};
use proptest::prelude::*;

fn candidate() -> impl Strategy<Value = (usize, usize, f32)> {
    (0usize..6, 0usize..6, 0.0f32..100.0)
}

fn patch_values(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(0.0f32..=255.0, len)
}

proptest! {
    /// Property: after every add the set is bounded, sorted and distinct.
    #[test]
    fn match_set_keeps_bounded_sorted_distinct(
        k in 1usize..5,
        adds in prop::collection::vec(candidate(), 0..40)
    ) {
        let mut set = MatchSet::new(k);
        for (x, y, score) in adds {
            set.add_match(Match::new(PatchRegion::around(x, y, 1), score));
            prop_assert!(set.len() <= k);
            let items = set.as_slice();
            for pair in items.windows(2) {
                prop_assert!(pair[0].score <= pair[1].score);
            }
            for (i, a) in items.iter().enumerate() {
                for b in &items[i + 1..] {
                    prop_assert_ne!(a.region, b.region);
                }
            }
        }
    }

    /// Property: a duplicate region never changes the set.
    #[test]
    fn duplicate_region_is_ignored(
        (x, y, score) in candidate(),
        other in 0.0f32..100.0
    ) {
        let mut set = MatchSet::new(3);
        set.add_match(Match::new(PatchRegion::around(x, y, 1), score));
        let before = set.clone();
        set.add_match(Match::new(PatchRegion::around(x, y, 1), other));
        prop_assert_eq!(set, before);
    }

    /// Property: histogram difference is symmetric and zero on itself.
    #[test]
    fn histogram_difference_is_symmetric(
        a in patch_values(25),
        b in patch_values(25),
        bins in 1usize..32
    ) {
        let cfg = HistogramConfig { bins, ..HistogramConfig::default() };
        let region = PatchRegion::around(2, 2, 2);
        let ha = Histogram::compute(ImageView::from_slice(&a, 5, 5).unwrap(), region, &cfg);
        let hb = Histogram::compute(ImageView::from_slice(&b, 5, 5).unwrap(), region, &cfg);
        prop_assert_eq!(ha.difference(&hb), hb.difference(&ha));
        prop_assert_eq!(ha.difference(&ha), 0.0);
    }

    /// Property: radii start at max(w, h), halve, and stop above the patch
    /// radius.
    #[test]
    fn search_radii_halve_down_to_patch_radius(
        width in 1usize..400,
        height in 1usize..400,
        r in 1usize..8
    ) {
        let radii = search_radii(width, height, r);
        let start = width.max(height);
        if start > r {
            prop_assert_eq!(radii[0], start);
        } else {
            prop_assert!(radii.is_empty());
        }
        for pair in radii.windows(2) {
            prop_assert_eq!(pair[1], pair[0] / 2);
        }
        prop_assert!(radii.iter().all(|&radius| radius > r));
        if let Some(&last) = radii.last() {
            prop_assert!(last / 2 <= r);
        }
    }
}
