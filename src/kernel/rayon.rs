//! Rayon-parallel batch scoring (feature-gated).
//!
//! Candidates are drawn sequentially by the caller so the random stream does
//! not depend on thread scheduling; only the distance evaluations fan out.

use crate::image::{ImageView, PatchRegion};
use crate::kernel::PatchDistance;
use rayon::prelude::*;

/// Scores `(query, candidate)` pairs in parallel, preserving order.
pub(crate) fn score_pairs_par(
    distance: &dyn PatchDistance,
    image: ImageView<'_, f32>,
    pairs: &[(PatchRegion, PatchRegion)],
) -> Vec<f32> {
    pairs
        .par_iter()
        .map(|&(query, candidate)| distance.distance(image, query, candidate))
        .collect()
}
