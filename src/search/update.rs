//! How an accepted candidate enters a pixel's match set.

use crate::candidate::{Match, MatchSet};

/// Update policy shared by propagation and random search.
///
/// The policy picks the incumbent a candidate is compared against and
/// applies accepted candidates to the set.
pub trait MatchUpdate {
    /// Capacity of each per-pixel set under this policy.
    fn max_matches(&self) -> usize;

    /// Match the acceptance test compares against, if any.
    fn incumbent<'s>(&self, set: &'s MatchSet) -> Option<&'s Match>;

    /// Applies an accepted candidate. Returns true if the set changed.
    fn apply(&self, set: &mut MatchSet, candidate: Match) -> bool;
}

impl<T: MatchUpdate + ?Sized> MatchUpdate for Box<T> {
    fn max_matches(&self) -> usize {
        (**self).max_matches()
    }

    fn incumbent<'s>(&self, set: &'s MatchSet) -> Option<&'s Match> {
        (**self).incumbent(set)
    }

    fn apply(&self, set: &mut MatchSet, candidate: Match) -> bool {
        (**self).apply(set, candidate)
    }
}

/// Basic PatchMatch: one match per pixel, replaced by better candidates.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReplaceBest;

impl MatchUpdate for ReplaceBest {
    fn max_matches(&self) -> usize {
        1
    }

    fn incumbent<'s>(&self, set: &'s MatchSet) -> Option<&'s Match> {
        set.best()
    }

    fn apply(&self, set: &mut MatchSet, candidate: Match) -> bool {
        set.replace_with(candidate);
        true
    }
}

/// Generalized PatchMatch: keeps the `k` best matches per pixel.
///
/// Candidates compete with the worst kept match once the set is full and
/// are admitted unconditionally (no incumbent) while it is not.
#[derive(Clone, Copy, Debug)]
pub struct KeepBest {
    k: usize,
}

impl KeepBest {
    /// Keeps `k` matches (at least one).
    pub fn new(k: usize) -> Self {
        Self { k: k.max(1) }
    }

    /// Returns the capacity.
    pub fn k(&self) -> usize {
        self.k
    }
}

impl MatchUpdate for KeepBest {
    fn max_matches(&self) -> usize {
        self.k
    }

    fn incumbent<'s>(&self, set: &'s MatchSet) -> Option<&'s Match> {
        if set.len() >= self.k {
            set.worst()
        } else {
            None
        }
    }

    fn apply(&self, set: &mut MatchSet, candidate: Match) -> bool {
        set.add_match(candidate)
    }
}
