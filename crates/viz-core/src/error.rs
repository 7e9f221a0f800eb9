use thiserror::Error;

/// Errors raised by the curve engine.
///
/// Geometry and layout violations are reported instead of being allowed to
/// read out of bounds or write a corrupted texture column.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VizError {
    #[error("point sequence has {len} points, at least 2 are required")]
    MalformedSequence { len: usize },

    #[error("instrument pair ({from}, {to}) is out of range for {count} instruments")]
    PairOutOfRange { from: usize, to: usize, count: usize },

    #[error("state has {actual} instruments, expected {expected}")]
    InstrumentCountMismatch { expected: usize, actual: usize },

    #[error("control points line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, VizError>;
