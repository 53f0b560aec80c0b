//! Error types for sequence traversal and conversion.

use thiserror::Error;

/// Errors raised while traversing or materializing a sequence.
///
/// None of these are retried internally. They surface at the point of
/// traversal and are left for the caller to handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeqError {
    /// A fixed-count or single-element assertion saw a different count.
    #[error("expected {expected} element(s), found {actual}")]
    Cardinality { expected: usize, actual: usize },

    /// An insertion or removal index outside the legal bound.
    #[error("{op} index {index} is out of range for a sequence of length {len}")]
    Range {
        op: RangeOp,
        index: usize,
        len: usize,
    },

    /// A run-once sequence was traversed a second time.
    #[error("sequence can only be traversed once")]
    Reuse,

    /// A strict set or map conversion met the same key twice.
    #[error("duplicate key: {key}")]
    Duplicate { key: String },
}

/// The positional operation that produced a [`SeqError::Range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Insert,
    Remove,
}

impl std::fmt::Display for RangeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeOp::Insert => f.write_str("insert"),
            RangeOp::Remove => f.write_str("remove"),
        }
    }
}

/// Result type alias for sequence operations.
pub type Result<T> = std::result::Result<T, SeqError>;
