//! Patch distance kernels.
//!
//! A kernel scores how dissimilar two equal-size patches of the same image
//! are; lower is better and zero means identical. Both regions are expected
//! to lie inside the image; kernels return `Match::INVALID_SCORE` otherwise.

use crate::image::{ImageView, PatchRegion};

/// Dissimilarity between two patches of one image.
///
/// `Sync` so candidate scoring can fan out across threads with the `rayon`
/// feature.
pub trait PatchDistance: Sync {
    /// Scores `candidate` as a replacement for `query`.
    fn distance(&self, image: ImageView<'_, f32>, query: PatchRegion, candidate: PatchRegion)
        -> f32;
}

impl<D: PatchDistance + ?Sized> PatchDistance for &D {
    fn distance(
        &self,
        image: ImageView<'_, f32>,
        query: PatchRegion,
        candidate: PatchRegion,
    ) -> f32 {
        (**self).distance(image, query, candidate)
    }
}

impl<D: PatchDistance + ?Sized> PatchDistance for Box<D> {
    fn distance(
        &self,
        image: ImageView<'_, f32>,
        query: PatchRegion,
        candidate: PatchRegion,
    ) -> f32 {
        (**self).distance(image, query, candidate)
    }
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub(crate) mod rayon;

pub use scalar::{MaskedSsd, Ssd};

/// Scores `(query, candidate)` pairs in order, in parallel when the `rayon`
/// feature is enabled.
pub(crate) fn score_pairs(
    distance: &dyn PatchDistance,
    image: ImageView<'_, f32>,
    pairs: &[(PatchRegion, PatchRegion)],
) -> Vec<f32> {
    #[cfg(feature = "rayon")]
    {
        self::rayon::score_pairs_par(distance, image, pairs)
    }

    #[cfg(not(feature = "rayon"))]
    {
        pairs
            .iter()
            .map(|&(query, candidate)| distance.distance(image, query, candidate))
            .collect()
    }
}

#[cfg(feature = "simd")]
pub use simd::SsdSimd;
