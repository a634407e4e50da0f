//! Frame and series errors.

use thiserror::Error;

/// Result type for frame operations.
pub type FrameResult<T> = Result<T, FrameError>;

/// Errors raised while building or indexing numeric frames.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    /// Wrong number of months or hours.
    #[error("Invalid frame shape for {what}: expected {expected}, got {actual}")]
    Shape {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Month key outside 1..=12 or not a number.
    #[error("Invalid month: {month}")]
    Month { month: String },

    /// Hour outside 0..=23.
    #[error("Invalid hour: {hour}")]
    Hour { hour: usize },

    /// Interval samples not strictly ascending.
    #[error("Interval samples out of order at index {index}")]
    Unsorted { index: usize },

    /// Interval samples not evenly spaced.
    #[error(
        "Interval samples unevenly spaced at index {index}: expected {expected_s}s, got {actual_s}s"
    )]
    UnevenSpacing {
        index: usize,
        expected_s: i64,
        actual_s: i64,
    },

    /// Spacing is not a whole number of minutes.
    #[error("Interval spacing of {seconds}s is not a whole number of minutes")]
    FractionalPeriod { seconds: i64 },

    /// Timestamp text could not be parsed.
    #[error("Invalid timestamp: {value}")]
    Timestamp { value: String },

    /// Element-wise arithmetic between series of different lengths.
    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}
