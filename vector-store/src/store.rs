//! The vector store gateway trait.

use async_trait::async_trait;
use clause_radar_embeddings::similarity::chunk_list;
use tracing::{debug, warn};

use crate::error::{Result, VectorStoreError};
use crate::record::{IndexRecord, IndexSpec, IndexStats, ScoredRecord, UpsertSummary};

/// Gateway to a vector database.
///
/// Implementors provide the raw operations (`write_batch`, `search`);
/// batching, `top_k` validation and error context live in the provided
/// methods so every backend behaves the same way.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the backing index if it does not exist yet. Safe to call on
    /// every startup.
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<()>;

    /// Write one batch, returning how many records the store accepted.
    async fn write_batch(&self, batch: &[IndexRecord]) -> Result<usize>;

    /// Nearest neighbours of `vector`, highest score first. `top_k` is
    /// already validated.
    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>>;

    /// Vector counts.
    async fn stats(&self) -> Result<IndexStats>;

    /// Namespace that reads and writes go to; `""` is the default one.
    fn namespace(&self) -> &str {
        ""
    }

    /// Write `records` in consecutive batches of `batch_size`.
    ///
    /// Batches are written sequentially. When one fails, the batches before
    /// it stay committed and the error names the failing batch.
    async fn upsert(&self, records: &[IndexRecord], batch_size: usize) -> Result<UpsertSummary> {
        let total_batches = chunk_list(records, batch_size).count();
        let mut summary = UpsertSummary::default();

        for (batch_index, batch) in chunk_list(records, batch_size).enumerate() {
            match self.write_batch(batch).await {
                Ok(upserted) => {
                    summary.batches += 1;
                    summary.upserted += upserted;
                    debug!(batch_index, upserted, "upserted batch");
                }
                Err(source) => {
                    warn!(batch_index, total_batches, error = %source, "upsert batch failed");
                    return Err(VectorStoreError::Upsert {
                        batch_index,
                        total_batches,
                        committed_batches: summary.batches,
                        source: Box::new(source),
                    });
                }
            }
        }

        Ok(summary)
    }

    /// Up to `top_k` nearest records in the store's descending-score order.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        if top_k == 0 {
            return Err(VectorStoreError::InvalidTopK);
        }
        self.search(vector, top_k)
            .await
            .map_err(|source| VectorStoreError::Query {
                top_k,
                source: Box::new(source),
            })
    }
}
