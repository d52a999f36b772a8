//! # Embeddings
//!
//! Embedding generation and per-session caching for ClauseRadar.
//!
//! ## Features
//!
//! - **Embedding Gateway**: Turn snippet or query text into a dense vector
//!   through an external provider (Google Generative Language API)
//! - **Task Hints**: Each call site chooses the provider task type
//! - **Caching**: Content-hash keyed cache so a snippet is embedded at most
//!   once per session
//! - **Similarity**: Vector math shared with the in-memory vector store
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  snippet ──► ContentHash ──► EmbeddingCache ──► Embedding       │
//! │                                   │ miss                        │
//! │                                   ▼                             │
//! │                          EmbeddingProvider (Gemini)             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod error;
pub mod provider;
pub mod similarity;

pub use cache::{CacheStats, CachedProvider, ContentHash, EmbeddingCache};
pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, EmbeddingRequest, GeminiConfig, GeminiProvider, TaskType};
pub use similarity::{SimilarityResult, chunk_list, cosine_similarity};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
