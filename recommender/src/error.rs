//! Error types for the contract recommender.

use clause_radar_embeddings::EmbeddingError;
use clause_radar_vector_store::VectorStoreError;
use thiserror::Error;

/// Result type alias for recommender operations.
pub type Result<T> = std::result::Result<T, RecommenderError>;

/// Errors that can occur while indexing or searching contracts.
#[derive(Error, Debug)]
pub enum RecommenderError {
    /// Required settings are absent.
    #[error("missing required configuration: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    /// A setting is present but unusable.
    #[error("invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    /// A document could not be turned into text.
    #[error("failed to extract text from {document_id}: {reason}")]
    Extraction { document_id: String, reason: String },

    /// Embedding a snippet or query failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Provisioning, upsert or query against the vector store failed.
    #[error("vector store request failed: {0}")]
    VectorStore(#[from] VectorStoreError),

    /// Query text was blank.
    #[error("query text is empty")]
    EmptyQuery,

    /// Recommender was built without a required component.
    #[error("recommender is missing its {0}")]
    MissingComponent(&'static str),
}
