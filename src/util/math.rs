//! Small numeric helpers shared by the solver.

use crate::image::Pixel;

/// Squared Euclidean distance between two pixels.
pub(crate) fn squared_distance(a: Pixel, b: Pixel) -> usize {
    let dx = a.x.abs_diff(b.x);
    let dy = a.y.abs_diff(b.y);
    dx * dx + dy * dy
}

/// Arithmetic mean, `None` for an empty input.
pub(crate) fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f32>,
{
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for value in values {
        sum += value as f64;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}
