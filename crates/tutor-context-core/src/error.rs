//! Error types for the retrieval pipeline.

use thiserror::Error;

/// Result type alias using the pipeline's [`RetrievalError`].
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors produced by the retrieval pipeline and its gateways.
///
/// The first two variants are environmental: the orchestrator recovers from
/// them locally (empty context, empty scope) instead of propagating them.
/// [`InvalidInput`](RetrievalError::InvalidInput) indicates a caller bug and
/// is always surfaced.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The embedding provider failed or timed out.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// A scoped vector search failed or timed out.
    #[error("search unavailable: {0}")]
    SearchUnavailable(String),

    /// The caller passed structurally invalid arguments.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
