//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur while producing an embedding.
///
/// None of these are retried locally; the caller decides whether to retry
/// or abort the batch.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Provider rejected the credentials.
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// API request failed.
    #[error("API request failed with status {status}: {body}")]
    ApiRequest { status: u16, body: String },

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Provider returned an empty vector.
    #[error("provider returned an empty embedding")]
    EmptyEmbedding,

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Nothing to embed.
    #[error("cannot embed empty text")]
    EmptyInput,

    /// Provider unreachable or the connection broke mid-request.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
