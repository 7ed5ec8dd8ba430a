//! PatchMatch is a CPU nearest-neighbor field solver for image patches.
//!
//! For every target pixel the solver finds source patches of the same image
//! that look alike under a pluggable patch distance, alternating propagation
//! of good matches between neighbors with random search at decreasing radii.
//! The generalized variant keeps the K best matches per pixel. Candidate
//! scoring during initialization runs in parallel with the `rayon` feature,
//! and `simd` enables a vectorized SSD kernel.

pub mod accept;
pub mod candidate;
pub mod field;
pub mod image;
pub mod init;
pub mod kernel;
pub mod lowlevel;
pub mod neighbors;
pub mod search;
mod trace;
pub mod util;

pub use accept::{
    AcceptContext, AcceptanceTest, CompositeTest, HistogramTest, NeighborHistogramTest,
    SourceRegionTest, SsdTest, Verdict,
};
pub use candidate::{Match, MatchSet};
pub use field::NnField;
pub use image::{Image, ImageView, Mask, PatchRegion, Pixel};
pub use init::{
    BoundaryInitializer, InitializerChain, KnownRegionInitializer, RandomHistogramInitializer,
    RandomInitializer, RandomNeighborHistogramInitializer,
};
pub use kernel::{MaskedSsd, PatchDistance, Ssd};
pub use search::{
    KeepBest, PatchMatch, PatchMatchConfig, PatchMatchStats, ReplaceBest, SolverState,
};
pub use util::{PatchMatchError, PatchMatchResult, Severity};

#[cfg(feature = "image-io")]
pub use image::io;
