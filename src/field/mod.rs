//! Nearest-neighbor field storage.
//!
//! The field holds one [`MatchSet`] per pixel of the image extent. Basic
//! PatchMatch keeps one match per pixel; the generalized variant keeps the K
//! best.

use crate::candidate::{Match, MatchSet};
use crate::image::{Mask, Pixel};
use crate::util::math::mean;
use crate::util::{PatchMatchError, PatchMatchResult};
use std::ops::{Index, IndexMut};

mod export;

/// Channels written by [`NnField::to_coordinate_image`].
pub const COORDINATE_CHANNELS: usize = 5;

/// Per-pixel match sets over an image extent.
#[derive(Clone, Debug, PartialEq)]
pub struct NnField {
    width: usize,
    height: usize,
    max_matches: usize,
    cells: Vec<MatchSet>,
}

impl NnField {
    /// Allocates an empty field.
    pub fn new(width: usize, height: usize, max_matches: usize) -> PatchMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(PatchMatchError::InvalidDimensions { width, height });
        }
        let len = width
            .checked_mul(height)
            .ok_or(PatchMatchError::InvalidDimensions { width, height })?;
        Ok(Self {
            width,
            height,
            max_matches: max_matches.max(1),
            cells: vec![MatchSet::new(max_matches); len],
        })
    }

    /// Returns the field width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the field height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the per-pixel capacity.
    pub fn max_matches(&self) -> usize {
        self.max_matches
    }

    /// Returns the set at `pixel`, or `None` outside the extent.
    pub fn get(&self, pixel: Pixel) -> Option<&MatchSet> {
        pixel
            .is_inside(self.width, self.height)
            .then(|| &self.cells[pixel.y * self.width + pixel.x])
    }

    /// Mutable access to the set at `pixel`.
    pub fn get_mut(&mut self, pixel: Pixel) -> Option<&mut MatchSet> {
        if pixel.is_inside(self.width, self.height) {
            Some(&mut self.cells[pixel.y * self.width + pixel.x])
        } else {
            None
        }
    }

    /// Best match at `pixel`.
    pub fn best(&self, pixel: Pixel) -> Option<&Match> {
        self.get(pixel).and_then(MatchSet::best)
    }

    /// Replaces whatever `pixel` holds with `m`. Ignored outside the extent.
    pub fn set_match(&mut self, pixel: Pixel, m: Match) {
        if let Some(cell) = self.get_mut(pixel) {
            cell.replace_with(m);
        }
    }

    /// Returns true if the best match at `pixel` has a valid score.
    pub fn has_valid_match(&self, pixel: Pixel) -> bool {
        self.best(pixel).is_some_and(Match::is_valid)
    }

    /// Iterates `(pixel, set)` in raster order.
    pub fn iter(&self) -> impl Iterator<Item = (Pixel, &MatchSet)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (Pixel::new(i % width, i / width), cell))
    }

    /// Number of non-empty cells.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    /// Mean best score over pixels valid in `mask` holding a valid match.
    pub fn mean_best_score(&self, mask: &Mask) -> Option<f64> {
        mean(
            self.iter()
                .filter(|(p, _)| mask.is_valid(*p))
                .filter_map(|(_, cell)| cell.best())
                .filter(|m| m.is_valid())
                .map(|m| m.score),
        )
    }

    /// Re-buckets every cell into sets of a different capacity.
    pub fn with_max_matches(&self, max_matches: usize) -> Self {
        if max_matches.max(1) == self.max_matches {
            return self.clone();
        }
        let cells = self
            .cells
            .iter()
            .map(|cell| {
                let mut set = MatchSet::new(max_matches);
                for m in cell {
                    set.add_match(*m);
                }
                set
            })
            .collect();
        Self {
            width: self.width,
            height: self.height,
            max_matches: max_matches.max(1),
            cells,
        }
    }
}

impl Index<Pixel> for NnField {
    type Output = MatchSet;

    fn index(&self, pixel: Pixel) -> &MatchSet {
        assert!(
            pixel.is_inside(self.width, self.height),
            "pixel {pixel:?} outside {}x{} field",
            self.width,
            self.height
        );
        &self.cells[pixel.y * self.width + pixel.x]
    }
}

impl IndexMut<Pixel> for NnField {
    fn index_mut(&mut self, pixel: Pixel) -> &mut MatchSet {
        assert!(
            pixel.is_inside(self.width, self.height),
            "pixel {pixel:?} outside {}x{} field",
            self.width,
            self.height
        );
        &mut self.cells[pixel.y * self.width + pixel.x]
    }
}

#[cfg(test)]
mod tests {
    use super::NnField;
    use crate::candidate::Match;
    use crate::image::{Mask, PatchRegion, Pixel};
    use crate::util::PatchMatchError;

    #[test]
    fn rejects_empty_extent() {
        assert_eq!(
            NnField::new(0, 3, 1).err(),
            Some(PatchMatchError::InvalidDimensions { width: 0, height: 3 })
        );
    }

    #[test]
    fn set_and_read_back() {
        let mut field = NnField::new(4, 3, 1).unwrap();
        let p = Pixel::new(2, 1);
        assert!(field.best(p).is_none());
        field.set_match(p, Match::new(PatchRegion::around(1, 1, 1), 4.0));
        assert_eq!(field.best(p).unwrap().score, 4.0);
        assert!(field.has_valid_match(p));
        assert_eq!(field.filled_count(), 1);
        assert!(field.get(Pixel::new(4, 0)).is_none());
    }

    #[test]
    fn mean_score_ignores_invalid_and_masked_out() {
        let mut field = NnField::new(3, 1, 1).unwrap();
        let region = PatchRegion::around(0, 0, 0);
        field.set_match(Pixel::new(0, 0), Match::new(region, 2.0));
        field.set_match(Pixel::new(1, 0), Match::new(region, 4.0));
        field.set_match(Pixel::new(2, 0), Match::new(region, Match::INVALID_SCORE));
        let all = Mask::new_filled(3, 1, true).unwrap();
        assert_eq!(field.mean_best_score(&all), Some(3.0));
        let first = Mask::from_fn(3, 1, |p| p.x == 0).unwrap();
        assert_eq!(field.mean_best_score(&first), Some(2.0));
    }

    #[test]
    fn rebucket_keeps_best_matches() {
        let mut field = NnField::new(1, 1, 3).unwrap();
        let p = Pixel::new(0, 0);
        for (x, score) in [(1, 3.0), (2, 1.0), (3, 2.0)] {
            field[p].add_match(Match::new(PatchRegion::around(x, 0, 0), score));
        }
        let single = field.with_max_matches(1);
        assert_eq!(single.max_matches(), 1);
        assert_eq!(single[p].len(), 1);
        assert_eq!(single.best(p).unwrap().score, 1.0);
    }
}
