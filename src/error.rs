//! Error types for geo predicate planning and filtering.

use thiserror::Error;

/// Errors surfaced while deriving index tokens for a geo predicate.
///
/// Per-candidate decode failures during the exact-match scan are *not*
/// represented here: the scan swallows them and drops the candidate,
/// since a single malformed stored value must not abort a whole query.
#[derive(Error, Debug)]
pub enum GeoFilterError {
    /// Predicate invoked with the wrong number of arguments.
    #[error("{func} function requires {expected} arguments, but got {got}")]
    InvalidArgumentCount {
        func: String,
        expected: usize,
        got: usize,
    },

    /// Distance literal failed to parse or is not positive.
    #[error("Invalid distance: {0}")]
    InvalidDistance(String),

    /// Geometry kind is unusable for the predicate, or unrecognized entirely.
    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    /// A geometry value could not be decoded into a usable region
    /// (WKT parse failure, degenerate ring, ...).
    #[error("Geometry decode error: {0}")]
    GeometryDecode(String),

    /// Predicate name is not a geo predicate.
    #[error("Unknown geo predicate: {0}")]
    UnknownPredicate(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for geo filter operations.
pub type Result<T> = std::result::Result<T, GeoFilterError>;
