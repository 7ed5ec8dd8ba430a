//! Coordinate-image export/import and resolution changes.
//!
//! The exported image stores, per pixel, the best match as
//! `(center_x, center_y, score, verification_score, verified)`. Pixels
//! without a match are written as `(-1, -1, inf, 0, 0)`.

use crate::candidate::Match;
use crate::field::{NnField, COORDINATE_CHANNELS};
use crate::image::{Image, PatchRegion, Pixel};
use crate::util::{PatchMatchError, PatchMatchResult};

impl NnField {
    /// Writes the best match of every pixel as a 5-channel image.
    pub fn to_coordinate_image(&self) -> PatchMatchResult<Image<f32>> {
        let mut data = Vec::with_capacity(self.width() * self.height() * COORDINATE_CHANNELS);
        for (_, cell) in self.iter() {
            match cell.best() {
                Some(m) => data.extend_from_slice(&[
                    m.region.center().x as f32,
                    m.region.center().y as f32,
                    m.score,
                    m.verification_score,
                    if m.verified { 1.0 } else { 0.0 },
                ]),
                None => data.extend_from_slice(&[-1.0, -1.0, Match::INVALID_SCORE, 0.0, 0.0]),
            }
        }
        Image::new(data, self.width(), self.height(), COORDINATE_CHANNELS)
    }

    /// Rebuilds a single-match field from a coordinate image.
    ///
    /// At least three channels `(center_x, center_y, score)` are required;
    /// verification data is read when five are present. Negative centers mark
    /// empty cells.
    pub fn from_coordinate_image(image: &Image<f32>, radius: usize) -> PatchMatchResult<Self> {
        if image.channels() < 3 {
            return Err(PatchMatchError::InvalidConfig {
                reason: "coordinate image needs at least 3 channels",
            });
        }
        let mut field = NnField::new(image.width(), image.height(), 1)?;
        for y in 0..image.height() {
            for x in 0..image.width() {
                let Some(px) = image.pixel(x, y) else {
                    continue;
                };
                if px[0] < 0.0 || px[1] < 0.0 || !px[0].is_finite() || !px[1].is_finite() {
                    continue;
                }
                let region = PatchRegion::around(px[0].round() as usize, px[1].round() as usize, radius);
                let mut m = Match::new(region, px[2]);
                if px.len() >= COORDINATE_CHANNELS {
                    m.verification_score = px[3];
                    m.verified = px[4] != 0.0;
                }
                field.set_match(Pixel::new(x, y), m);
            }
        }
        Ok(field)
    }

    /// Resamples the field to `width x height`, scaling match centers by the
    /// size ratio.
    ///
    /// Intended for multi-resolution callers that feed a coarse field into
    /// `PatchMatch::compute_from`; scores are reset to
    /// `Match::INVALID_SCORE` because they do not carry over between levels,
    /// and regions take `radius`.
    pub fn upsampled(&self, width: usize, height: usize, radius: usize) -> PatchMatchResult<Self> {
        let mut out = NnField::new(width, height, self.max_matches())?;
        let sx = self.width() as f64 / width as f64;
        let sy = self.height() as f64 / height as f64;
        for y in 0..height {
            for x in 0..width {
                let src = Pixel::new(
                    ((x as f64 * sx) as usize).min(self.width() - 1),
                    ((y as f64 * sy) as usize).min(self.height() - 1),
                );
                let dx = x as f64 - src.x as f64 / sx;
                let dy = y as f64 - src.y as f64 / sy;
                let target = Pixel::new(x, y);
                for m in &self[src] {
                    let c = m.region.center();
                    let cx = (c.x as f64 / sx + dx).round().clamp(0.0, (width - 1) as f64);
                    let cy = (c.y as f64 / sy + dy).round().clamp(0.0, (height - 1) as f64);
                    let region = PatchRegion::around(cx as usize, cy as usize, radius);
                    out[target].add_match(Match::new(region, Match::INVALID_SCORE));
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::candidate::Match;
    use crate::field::NnField;
    use crate::image::{PatchRegion, Pixel};

    #[test]
    fn coordinate_image_layout() {
        let mut field = NnField::new(2, 1, 1).unwrap();
        field.set_match(
            Pixel::new(0, 0),
            Match::new(PatchRegion::around(7, 3, 2), 12.5).verified_with(4.0),
        );
        let img = field.to_coordinate_image().unwrap();
        assert_eq!(img.channels(), 5);
        assert_eq!(img.pixel(0, 0).unwrap(), &[7.0, 3.0, 12.5, 4.0, 1.0]);
        assert_eq!(img.pixel(1, 0).unwrap()[0], -1.0);

        let back = NnField::from_coordinate_image(&img, 2).unwrap();
        let m = back.best(Pixel::new(0, 0)).unwrap();
        assert_eq!(m.region, PatchRegion::around(7, 3, 2));
        assert_eq!(m.score, 12.5);
        assert!(m.verified);
        assert!(back.best(Pixel::new(1, 0)).is_none());
    }

    #[test]
    fn upsample_doubles_offsets() {
        let mut coarse = NnField::new(4, 4, 1).unwrap();
        coarse.set_match(Pixel::new(1, 1), Match::new(PatchRegion::around(3, 2, 1), 0.0));
        let fine = coarse.upsampled(8, 8, 2).unwrap();
        let m = fine.best(Pixel::new(2, 2)).unwrap();
        assert_eq!(m.region, PatchRegion::around(6, 4, 2));
        assert_eq!(m.score, Match::INVALID_SCORE);
        let m = fine.best(Pixel::new(3, 3)).unwrap();
        assert_eq!(m.region, PatchRegion::around(7, 5, 2));
    }
}
