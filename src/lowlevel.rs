//! Low-level building blocks for custom solvers.
//!
//! These items back the passes of [`PatchMatch`](crate::PatchMatch) and are
//! exposed for callers composing their own strategies (custom acceptance
//! tests, initializers or update policies). Most users should prefer the
//! top-level `PatchMatch` API.

pub use crate::image::{Histogram, HistogramConfig, IntegralMask, Rect, ScanDirection};
pub use crate::init::{GatedRandomInitializer, InitContext, InitStats, Initializer};
pub use crate::neighbors::{
    AllNeighbors, AllowedPropagationNeighbors, BackwardNeighbors, ForwardNeighbors,
    NeighborFunctor,
};
pub use crate::search::{search_radii, IterationStats, MatchUpdate, PassStats, SearchRadii};
