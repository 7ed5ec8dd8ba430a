//! SIMD-accelerated SSD using the `wide` crate.
//!
//! Patch rows are contiguous runs of `side * channels` samples, so the inner
//! loop processes 8 samples at a time with `f32x8` and finishes the row with
//! a scalar remainder.

use crate::candidate::Match;
use crate::image::{ImageView, PatchRegion};
use crate::kernel::PatchDistance;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal sum of f32x8.
#[inline]
fn hsum(v: f32x8) -> f32 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3] + arr[4] + arr[5] + arr[6] + arr[7]
}

/// SIMD SSD; numerically equivalent to [`Ssd`](crate::kernel::Ssd) up to
/// summation order.
#[derive(Clone, Copy, Debug, Default)]
pub struct SsdSimd;

impl PatchDistance for SsdSimd {
    fn distance(
        &self,
        image: ImageView<'_, f32>,
        query: PatchRegion,
        candidate: PatchRegion,
    ) -> f32 {
        if query.radius() != candidate.radius() {
            return Match::INVALID_SCORE;
        }
        let mut acc = f32x8::ZERO;
        let mut rem = 0.0f32;
        for dy in 0..query.side() {
            let (Some(a), Some(b)) = (image.patch_row(query, dy), image.patch_row(candidate, dy))
            else {
                return Match::INVALID_SCORE;
            };
            let len = a.len();
            let simd_end = len / LANES * LANES;
            let mut i = 0;
            while i < simd_end {
                let d = load_f32x8(&a[i..]) - load_f32x8(&b[i..]);
                acc += d * d;
                i += LANES;
            }
            while i < len {
                let d = a[i] - b[i];
                rem += d * d;
                i += 1;
            }
        }
        hsum(acc) + rem
    }
}

#[cfg(test)]
mod tests {
    use super::SsdSimd;
    use crate::image::{ImageView, PatchRegion};
    use crate::kernel::{PatchDistance, Ssd};

    #[test]
    fn simd_matches_scalar() {
        let width = 23;
        let height = 19;
        let data: Vec<f32> = (0..width * height * 3)
            .map(|v| ((v * 31) % 251) as f32)
            .collect();
        let view = ImageView::from_interleaved(&data, width, height, 3).unwrap();
        for (a, b) in [
            (PatchRegion::around(4, 4, 3), PatchRegion::around(15, 11, 3)),
            (PatchRegion::around(2, 2, 2), PatchRegion::around(20, 16, 2)),
            (PatchRegion::around(9, 9, 1), PatchRegion::around(9, 10, 1)),
        ] {
            let scalar = Ssd.distance(view, a, b);
            let simd = SsdSimd.distance(view, a, b);
            assert!((scalar - simd).abs() <= scalar.abs() * 1e-5 + 1e-3);
        }
    }
}
