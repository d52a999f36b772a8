//! # Vector Store
//!
//! Gateway to the vector database that holds mined contract snippets.
//!
//! - **[`VectorStore`]**: the narrow interface the orchestrators depend on
//!   (provision, batched upsert, top-k query, stats)
//! - **[`PineconeStore`]**: hosted Pinecone index over its REST API
//! - **[`InMemoryVectorStore`]**: brute-force store for tests and offline runs
//!
//! ```text
//!  IndexRecord ──► upsert (batched) ──► backing index
//!  query vector ──► query(top_k) ──► ScoredRecord (descending score)
//! ```

pub mod error;
pub mod memory;
pub mod pinecone;
pub mod record;
pub mod store;

pub use error::{Result, VectorStoreError};
pub use memory::InMemoryVectorStore;
pub use pinecone::{PineconeConfig, PineconeStore};
pub use record::{IndexRecord, IndexSpec, IndexStats, Metadata, Metric, ScoredRecord, UpsertSummary};
pub use store::VectorStore;

/// Batch size used when the caller has no preference.
pub const DEFAULT_UPSERT_BATCH_SIZE: usize = 100;
