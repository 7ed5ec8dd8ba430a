//! Error types for patchmatch.

use thiserror::Error;

/// Result alias for patchmatch operations.
pub type PatchMatchResult<T> = std::result::Result<T, PatchMatchError>;

/// How a caller is expected to treat an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Misconfiguration or invalid input; propagate to the top level.
    Fatal,
    /// Expected outcome a multi-level caller may skip over.
    Recoverable,
}

/// Errors that can occur when computing a nearest-neighbor field.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PatchMatchError {
    /// Width or height is zero, or the element count overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than one row of interleaved samples.
    #[error("invalid stride {stride} for row length {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer holds fewer samples than the view requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Two inputs that must share a pixel grid do not.
    #[error("{context} is {got_width}x{got_height}, expected {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
        context: &'static str,
    },
    /// A configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: &'static str },
    /// The source mask contains no fully valid patch to match against.
    #[error("no valid source regions")]
    NoSourceRegions,
    /// Loading or decoding an image failed.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}

impl PatchMatchError {
    /// Classifies the error for orchestration code.
    pub fn severity(&self) -> Severity {
        match self {
            PatchMatchError::NoSourceRegions => Severity::Recoverable,
            _ => Severity::Fatal,
        }
    }

    /// Returns true when the caller may treat the error as "nothing to fill".
    pub fn is_recoverable(&self) -> bool {
        self.severity() == Severity::Recoverable
    }
}

#[cfg(test)]
mod tests {
    use super::{PatchMatchError, Severity};

    #[test]
    fn only_empty_source_is_recoverable() {
        assert!(PatchMatchError::NoSourceRegions.is_recoverable());
        let err = PatchMatchError::InvalidConfig {
            reason: "patch_radius must be >= 1",
        };
        assert_eq!(err.severity(), Severity::Fatal);
        assert!(!err.is_recoverable());
    }
}
