//! Neighbor functors used by propagation.
//!
//! A functor lists the pixels whose matches are offered to `pixel` during a
//! propagation pass. Results are always inside the image extent.

use crate::image::{Mask, Pixel};

const EIGHT_CONNECTED: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Maps a pixel to the neighbors it may receive matches from.
pub trait NeighborFunctor {
    /// Appends the neighbors of `pixel` to `out` (which is not cleared).
    fn neighbors(&self, pixel: Pixel, width: usize, height: usize, out: &mut Vec<Pixel>);

    /// Convenience wrapper returning a fresh vector.
    fn collect(&self, pixel: Pixel, width: usize, height: usize) -> Vec<Pixel> {
        let mut out = Vec::new();
        self.neighbors(pixel, width, height, &mut out);
        out
    }
}

fn push_offsets(
    pixel: Pixel,
    offsets: &[(isize, isize)],
    width: usize,
    height: usize,
    out: &mut Vec<Pixel>,
) {
    out.extend(
        offsets
            .iter()
            .filter_map(|&(dx, dy)| pixel.offset(dx, dy))
            .filter(|n| n.is_inside(width, height)),
    );
}

/// Left and up; pairs with a forward raster scan.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardNeighbors;

impl NeighborFunctor for ForwardNeighbors {
    fn neighbors(&self, pixel: Pixel, width: usize, height: usize, out: &mut Vec<Pixel>) {
        push_offsets(pixel, &[(-1, 0), (0, -1)], width, height, out);
    }
}

/// Right and down; pairs with a backward raster scan.
#[derive(Clone, Copy, Debug, Default)]
pub struct BackwardNeighbors;

impl NeighborFunctor for BackwardNeighbors {
    fn neighbors(&self, pixel: Pixel, width: usize, height: usize, out: &mut Vec<Pixel>) {
        push_offsets(pixel, &[(1, 0), (0, 1)], width, height, out);
    }
}

/// The full 8-connected neighborhood.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllNeighbors;

impl NeighborFunctor for AllNeighbors {
    fn neighbors(&self, pixel: Pixel, width: usize, height: usize, out: &mut Vec<Pixel>) {
        push_offsets(pixel, &EIGHT_CONNECTED, width, height, out);
    }
}

/// 8-connected neighbors that are valid in the allowed-propagation mask or
/// in the target mask.
#[derive(Clone, Debug)]
pub struct AllowedPropagationNeighbors {
    allowed: Mask,
    target: Mask,
}

impl AllowedPropagationNeighbors {
    /// Creates the functor from both masks.
    pub fn new(allowed: Mask, target: Mask) -> Self {
        Self { allowed, target }
    }
}

impl NeighborFunctor for AllowedPropagationNeighbors {
    fn neighbors(&self, pixel: Pixel, width: usize, height: usize, out: &mut Vec<Pixel>) {
        let start = out.len();
        push_offsets(pixel, &EIGHT_CONNECTED, width, height, out);
        let mut keep = start;
        for i in start..out.len() {
            let n = out[i];
            if self.allowed.is_valid(n) || self.target.is_valid(n) {
                out[keep] = n;
                keep += 1;
            }
        }
        out.truncate(keep);
    }
}
