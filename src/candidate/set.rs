//! Bounded, sorted, region-deduplicated candidate sets.

use crate::candidate::Match;
use crate::image::PatchRegion;
use std::cmp::Ordering;

fn score_cmp(a: &Match, b: &Match) -> Ordering {
    a.score.total_cmp(&b.score)
}

/// Top-K matches for one pixel, ascending by score.
///
/// Holds at most `max_matches` entries and never two entries with the same
/// region.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchSet {
    max_matches: usize,
    items: Vec<Match>,
}

impl Default for MatchSet {
    fn default() -> Self {
        Self::new(1)
    }
}

impl MatchSet {
    /// Creates an empty set keeping at most `max_matches` (at least 1).
    pub fn new(max_matches: usize) -> Self {
        let max_matches = max_matches.max(1);
        Self {
            max_matches,
            items: Vec::with_capacity(max_matches),
        }
    }

    /// Returns the capacity bound.
    pub fn max_matches(&self) -> usize {
        self.max_matches
    }

    /// Number of stored matches.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no match is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true once `max_matches` entries are stored.
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_matches
    }

    /// Inserts `candidate` unless its region is already present, then sorts
    /// and trims. Returns true if the candidate is still in the set.
    pub fn add_match(&mut self, candidate: Match) -> bool {
        if self.contains_region(candidate.region) {
            return false;
        }
        self.items.push(candidate);
        self.items.sort_by(score_cmp);
        self.items.truncate(self.max_matches);
        self.contains_region(candidate.region)
    }

    /// Replaces the whole content with `candidate`.
    pub fn replace_with(&mut self, candidate: Match) {
        self.items.clear();
        self.items.push(candidate);
    }

    /// Removes every match.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns match `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn get_match(&self, index: usize) -> &Match {
        assert!(
            index < self.items.len(),
            "match index {index} out of range for set of {}",
            self.items.len()
        );
        &self.items[index]
    }

    /// Lowest-score match.
    pub fn best(&self) -> Option<&Match> {
        self.items.first()
    }

    /// Highest-score match.
    pub fn worst(&self) -> Option<&Match> {
        self.items.last()
    }

    /// Returns true if some stored match has `region`.
    pub fn contains_region(&self, region: PatchRegion) -> bool {
        self.items.iter().any(|m| m.region == region)
    }

    /// Returns true if any stored match is verified; false when empty.
    pub fn has_verified_match(&self) -> bool {
        self.items.iter().any(|m| m.verified)
    }

    /// Returns true if the best match has a zero score.
    pub fn has_exact_match(&self) -> bool {
        self.best().is_some_and(Match::is_exact)
    }

    /// Reorders ascending by verification score, ties broken by score.
    pub fn sort_by_verification_score(&mut self) {
        self.items.sort_by(|a, b| {
            a.verification_score
                .total_cmp(&b.verification_score)
                .then_with(|| score_cmp(a, b))
        });
    }

    /// Iterates stored matches in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.items.iter()
    }

    /// Returns the stored matches as a slice.
    pub fn as_slice(&self) -> &[Match] {
        &self.items
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::MatchSet;
    use crate::candidate::Match;
    use crate::image::PatchRegion;

    fn m(x: usize, score: f32) -> Match {
        Match::new(PatchRegion::around(x, 5, 2), score)
    }

    #[test]
    fn keeps_lowest_scores_sorted() {
        let mut set = MatchSet::new(3);
        for (x, score) in [(3, 9.0), (4, 1.0), (5, 7.0), (6, 3.0), (7, 8.0)] {
            set.add_match(m(x, score));
        }
        let scores: Vec<f32> = set.iter().map(|m| m.score).collect();
        assert_eq!(scores, vec![1.0, 3.0, 7.0]);
        assert!(set.is_full());
    }

    #[test]
    fn duplicate_region_is_a_noop() {
        let mut set = MatchSet::new(2);
        assert!(set.add_match(m(3, 5.0)));
        assert!(!set.add_match(m(3, 1.0)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.best().unwrap().score, 5.0);
    }

    #[test]
    fn add_reports_trimmed_candidate() {
        let mut set = MatchSet::new(1);
        assert!(set.add_match(m(3, 2.0)));
        assert!(!set.add_match(m(4, 6.0)));
        assert!(set.add_match(m(5, 1.0)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.best().unwrap().region, PatchRegion::around(5, 5, 2));
    }

    #[test]
    fn verified_queries() {
        let mut set = MatchSet::new(2);
        assert!(!set.has_verified_match());
        set.add_match(m(3, 2.0));
        assert!(!set.has_verified_match());
        set.add_match(m(4, 3.0).verified_with(1.0));
        assert!(set.has_verified_match());
    }

    #[test]
    fn secondary_sort_by_verification() {
        let mut set = MatchSet::new(3);
        set.add_match(m(3, 1.0).verified_with(9.0));
        set.add_match(m(4, 2.0).verified_with(4.0));
        set.add_match(m(5, 3.0).verified_with(6.0));
        set.sort_by_verification_score();
        let xs: Vec<usize> = set.iter().map(|m| m.region.center().x).collect();
        assert_eq!(xs, vec![4, 5, 3]);
    }

    #[test]
    #[should_panic]
    fn get_match_out_of_range_panics() {
        let set = MatchSet::new(2);
        let _ = set.get_match(0);
    }
}
