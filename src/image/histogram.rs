//! Per-channel 1D color histograms over patch regions.
//!
//! Each channel gets `bins` equal-width bins over `[range_min, range_max]`;
//! the channel histograms are concatenated. Samples outside the range are
//! clamped into the first or last bin.

use crate::image::{ImageView, PatchRegion};

/// Binning parameters shared by histogram-based tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistogramConfig {
    /// Bins per channel.
    pub bins: usize,
    /// Lower edge of the first bin.
    pub range_min: f32,
    /// Upper edge of the last bin.
    pub range_max: f32,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bins: 20,
            range_min: 0.0,
            range_max: 255.0,
        }
    }
}

/// Concatenated per-channel bin counts.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    counts: Vec<f32>,
}

impl Histogram {
    /// Histograms the pixels of `region`. Pixels outside the image are
    /// skipped.
    pub fn compute(image: ImageView<'_, f32>, region: PatchRegion, cfg: &HistogramConfig) -> Self {
        let bins = cfg.bins.max(1);
        let channels = image.channels();
        let mut counts = vec![0.0f32; bins * channels];
        let span = cfg.range_max - cfg.range_min;
        let scale = if span > 0.0 { bins as f32 / span } else { 0.0 };

        for pixel in region.pixels() {
            let Some(samples) = image.get(pixel.x, pixel.y) else {
                continue;
            };
            for (c, &value) in samples.iter().enumerate() {
                let pos = ((value - cfg.range_min) * scale).floor();
                let bin = if pos.is_nan() || pos < 0.0 {
                    0
                } else {
                    (pos as usize).min(bins - 1)
                };
                counts[c * bins + bin] += 1.0;
            }
        }
        Self { counts }
    }

    /// Returns the bin counts.
    pub fn counts(&self) -> &[f32] {
        &self.counts
    }

    /// Total number of samples counted.
    pub fn total(&self) -> f32 {
        self.counts.iter().sum()
    }

    /// L1 distance between two histograms; symmetric.
    ///
    /// Histograms of different lengths are compared over the shorter prefix
    /// and the remaining bins of the longer one count in full.
    pub fn difference(&self, other: &Histogram) -> f32 {
        let (short, long) = if self.counts.len() <= other.counts.len() {
            (&self.counts, &other.counts)
        } else {
            (&other.counts, &self.counts)
        };
        let shared: f32 = short
            .iter()
            .zip(long.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        let tail: f32 = long[short.len()..].iter().map(|v| v.abs()).sum();
        shared + tail
    }
}
