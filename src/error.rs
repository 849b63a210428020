//! Error types for proxima.

use thiserror::Error;

/// Errors that can occur while building or querying a k-NN graph index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Not enough items to fill a working neighbor heap.
    ///
    /// Compiling with `k` reported neighbors gives every item `2·k` working
    /// slots, so the store must hold at least `2·k + 1` items.
    #[error("item pool too small: compiling needs {required} items, store has {available}")]
    InsufficientPool { required: usize, available: usize },

    /// The item store was mutated after the last compile; queries are
    /// rejected until `compile` succeeds again.
    #[error("index is stale: call compile() after inserting items")]
    NotCompiled,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Exact and compiled rank lists disagree in length during error-ratio
    /// comparison. This signals a bug in the index, not bad input.
    #[error("rank list length mismatch: exact has {exact} entries, compiled has {approx}")]
    LengthMismatch { exact: usize, approx: usize },
}

/// Result type alias for proxima operations.
pub type Result<T> = std::result::Result<T, GraphError>;
