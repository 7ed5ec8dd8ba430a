//! A single patch correspondence.

use crate::image::PatchRegion;

/// Candidate correspondence for one target pixel.
///
/// Lower scores are better. Equality compares `region` and `score` only.
#[derive(Clone, Copy, Debug)]
pub struct Match {
    /// Matched source patch.
    pub region: PatchRegion,
    /// Patch distance to the target patch.
    pub score: f32,
    /// Set once the match passed an acceptance test.
    pub verified: bool,
    /// Score reported by the accepting test (e.g. a histogram difference).
    pub verification_score: f32,
}

impl Match {
    /// Score marking "no match found yet".
    pub const INVALID_SCORE: f32 = f32::INFINITY;

    /// Score recorded when a gated initializer ran out of attempts.
    pub const EXHAUSTED_SCORE: f32 = f32::MAX;

    /// Creates an unverified match.
    pub fn new(region: PatchRegion, score: f32) -> Self {
        Self {
            region,
            score,
            verified: false,
            verification_score: 0.0,
        }
    }

    /// A pixel matched to its own fully valid patch.
    pub fn exact(region: PatchRegion) -> Self {
        Self {
            region,
            score: 0.0,
            verified: true,
            verification_score: 0.0,
        }
    }

    /// Returns the match marked verified with `verification_score`.
    pub fn verified_with(self, verification_score: f32) -> Self {
        Self {
            verified: true,
            verification_score,
            ..self
        }
    }

    /// Returns true unless the score is the invalid sentinel, negative or NaN.
    pub fn is_valid(&self) -> bool {
        self.score >= 0.0 && self.score < Self::INVALID_SCORE
    }

    /// Returns true for a zero-distance match.
    pub fn is_exact(&self) -> bool {
        self.score == 0.0
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.region == other.region && self.score == other.score
    }
}

#[cfg(test)]
mod tests {
    use super::Match;
    use crate::image::PatchRegion;

    #[test]
    fn equality_ignores_verification() {
        let region = PatchRegion::around(4, 4, 1);
        let a = Match::new(region, 3.0);
        let b = Match::new(region, 3.0).verified_with(12.0);
        assert_eq!(a, b);
        assert_ne!(a, Match::new(region, 4.0));
    }

    #[test]
    fn validity_sentinels() {
        let region = PatchRegion::around(4, 4, 1);
        assert!(!Match::new(region, Match::INVALID_SCORE).is_valid());
        assert!(!Match::new(region, f32::NAN).is_valid());
        assert!(Match::new(region, Match::EXHAUSTED_SCORE).is_valid());
        assert!(Match::exact(region).is_exact());
        assert!(Match::exact(region).verified);
    }
}
