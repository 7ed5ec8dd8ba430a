//! Match candidates and bounded per-pixel candidate sets.

pub mod matches;
pub mod set;

pub use matches::Match;
pub use set::MatchSet;
