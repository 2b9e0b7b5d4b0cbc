//! Error types for index construction and hierarchy queries

use thiserror::Error;

/// Errors raised by the neighborhood and Louvain indices
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The host graph could not supply a consistent node/edge enumeration
    #[error("invalid input graph: {0}")]
    InvalidInput(String),

    /// The index kind does not match the host graph's direction
    #[error("expected a {expected} graph, got a {found} one")]
    DirectionMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The requested hierarchy level is not retained by the index
    #[error("level {requested} is not available (current level is {current})")]
    LevelUnavailable { requested: usize, current: usize },
}

/// Result alias for index operations
pub type IndexResult<T> = std::result::Result<T, IndexError>;
