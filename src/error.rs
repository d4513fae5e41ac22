use alloc::string::String;
use enough::StopReason;

use crate::context::Severity;
use crate::pixel::ElementType;

/// Errors from array-to-raster constitution and raster-to-array extraction.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RasterError {
    #[error("invalid channel layout: {0}")]
    InvalidLayout(String),

    #[error("palette has {colors} colors, at most {max} supported")]
    TooManyColors { colors: usize, max: usize },

    #[error("invalid array shape: {0}")]
    InvalidShape(String),

    #[error("unsupported element type {0:?}: only unsigned integers, floats or doubles accepted")]
    UnsupportedType(ElementType),

    #[error("allocation failed: {0}")]
    AllocationFailure(String),

    #[error("raster exception ({severity:?}): {reason}{}", fmt_description(.description))]
    Collaborator {
        severity: Severity,
        reason: String,
        description: Option<String>,
    },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("element type mismatch: expected {expected:?}, got {actual:?}")]
    ElementMismatch {
        expected: ElementType,
        actual: ElementType,
    },

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

fn fmt_description(description: &Option<String>) -> String {
    match description {
        Some(d) => alloc::format!(" ({d})"),
        None => String::new(),
    }
}

impl From<StopReason> for RasterError {
    fn from(r: StopReason) -> Self {
        RasterError::Cancelled(r)
    }
}
