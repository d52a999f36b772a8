//! # ClauseRadar
//!
//! Finds clauses across a pile of contracts. Users supply documents and a
//! list of keywords; the text around each keyword is embedded and stored in
//! a vector index, and free-text queries return the closest snippets.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Contract Recommender                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  write path                                                     │
//! │  Document ─► TextExtractor ─► find_snippet ─► EmbeddingCache    │
//! │                                                   │             │
//! │                                                   ▼             │
//! │                                            VectorStore::upsert  │
//! │                                                                 │
//! │  read path                                                      │
//! │  query ─► EmbeddingProvider ─► VectorStore::query ─► matches    │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clause_radar::{Config, ContractRecommender, Document, parse_keywords};
//!
//! let config = Config::from_env()?;
//! let recommender = ContractRecommender::from_config(&config).await?;
//!
//! let keywords = parse_keywords("Effective Date, Termination");
//! recommender.index_contracts(&[Document::new("NDA1", bytes)], &keywords).await?;
//!
//! let matches = recommender.recommend("notice period", 5).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod indexer;
pub mod query;
pub mod snippet;

pub use config::{Config, IndexingSettings};
pub use engine::{ContractRecommender, ContractRecommenderBuilder};
pub use error::{RecommenderError, Result};
pub use extract::{Document, PdfTextExtractor, PlainTextExtractor, TextExtractor};
pub use indexer::{IndexReport, SkippedDocument, record_id};
pub use query::MatchResult;
pub use snippet::{find_snippet, parse_keywords};

// Re-export from dependencies for convenience
pub use clause_radar_embeddings::{ContentHash, EmbeddingProvider, TaskType};
pub use clause_radar_vector_store::{IndexSpec, IndexStats, Metric, VectorStore};
