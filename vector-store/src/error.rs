//! Error types for vector store operations.

use clause_radar_embeddings::EmbeddingError;
use thiserror::Error;

/// Result type alias for vector store operations.
pub type Result<T> = std::result::Result<T, VectorStoreError>;

/// Errors that can occur while talking to the vector store.
#[derive(Error, Debug)]
pub enum VectorStoreError {
    /// Client could not be built from the given settings.
    #[error("invalid vector store configuration: {0}")]
    InvalidConfig(String),

    /// Creating or validating the backing index failed.
    #[error("failed to provision index {name}: {reason}")]
    Provision { name: String, reason: String },

    /// Index was created but never reported ready.
    #[error("index {name} not ready after {checks} status checks")]
    NotReady { name: String, checks: u32 },

    /// Index does not exist.
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// A batch write failed. Batches before `batch_index` are committed.
    #[error(
        "upsert failed at batch {batch_index} of {total_batches} ({committed_batches} committed): {source}"
    )]
    Upsert {
        batch_index: usize,
        total_batches: usize,
        committed_batches: usize,
        source: Box<VectorStoreError>,
    },

    /// A similarity query failed.
    #[error("query with top_k={top_k} failed: {source}")]
    Query {
        top_k: usize,
        source: Box<VectorStoreError>,
    },

    /// `top_k` must be at least one.
    #[error("top_k must be at least 1")]
    InvalidTopK,

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Non-success HTTP status.
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<EmbeddingError> for VectorStoreError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::DimensionMismatch { expected, actual } => {
                Self::DimensionMismatch { expected, actual }
            }
            other => Self::InvalidResponse(other.to_string()),
        }
    }
}
