//! In-memory [`VectorStore`] for tests and offline runs.
//!
//! Records live in a `BTreeMap` behind a `tokio::sync::RwLock`; search is
//! brute force over every stored vector using the index metric.

use std::collections::BTreeMap;

use async_trait::async_trait;
use clause_radar_embeddings::similarity::{
    ScoreFn, cosine_similarity, dot_product, euclidean_similarity, find_top_k,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Result, VectorStoreError};
use crate::record::{IndexRecord, IndexSpec, IndexStats, Metric, ScoredRecord};
use crate::store::VectorStore;

/// A vector store that keeps everything in process memory.
#[derive(Default)]
pub struct InMemoryVectorStore {
    spec: RwLock<Option<IndexSpec>>,
    entries: RwLock<BTreeMap<String, IndexRecord>>,
}

impl InMemoryVectorStore {
    /// Create a store with no index provisioned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose index already exists.
    pub fn with_index(spec: IndexSpec) -> Self {
        Self {
            spec: RwLock::new(Some(spec)),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored vectors.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Get a record by ID.
    pub async fn get(&self, id: &str) -> Option<IndexRecord> {
        self.entries.read().await.get(id).cloned()
    }

    /// All stored IDs in sorted order.
    pub async fn ids(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    async fn provisioned(&self) -> Result<IndexSpec> {
        self.spec
            .read()
            .await
            .clone()
            .ok_or_else(|| VectorStoreError::IndexNotFound("in-memory".to_string()))
    }
}

fn score_fn(metric: Metric) -> ScoreFn {
    match metric {
        Metric::Cosine => cosine_similarity,
        Metric::Euclidean => euclidean_similarity,
        Metric::DotProduct => dot_product,
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<()> {
        let mut current = self.spec.write().await;
        match current.as_ref() {
            Some(existing) if existing.dimension != spec.dimension => {
                Err(VectorStoreError::Provision {
                    name: spec.name.clone(),
                    reason: format!(
                        "existing index has dimension {}, requested {}",
                        existing.dimension, spec.dimension
                    ),
                })
            }
            Some(_) => Ok(()),
            None => {
                info!(index = %spec.name, dimension = spec.dimension, "created in-memory index");
                *current = Some(spec.clone());
                Ok(())
            }
        }
    }

    async fn write_batch(&self, batch: &[IndexRecord]) -> Result<usize> {
        let spec = self.provisioned().await?;
        if let Some(bad) = batch.iter().find(|r| r.values.len() != spec.dimension) {
            return Err(VectorStoreError::DimensionMismatch {
                expected: spec.dimension,
                actual: bad.values.len(),
            });
        }

        let mut entries = self.entries.write().await;
        for record in batch {
            entries.insert(record.id.clone(), record.clone());
        }
        debug!("Stored {} records in memory", batch.len());
        Ok(batch.len())
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        let spec = self.provisioned().await?;
        if vector.len() != spec.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: spec.dimension,
                actual: vector.len(),
            });
        }

        let entries = self.entries.read().await;
        let candidates = entries
            .values()
            .map(|r| (r.id.as_str(), r.values.as_slice()));
        let ranked = find_top_k(vector, candidates, top_k, score_fn(spec.metric))?;

        Ok(ranked
            .into_iter()
            .filter_map(|hit| {
                entries.get(&hit.id).map(|record| ScoredRecord {
                    id: hit.id,
                    score: hit.score,
                    metadata: record.metadata.clone(),
                })
            })
            .collect())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let spec = self.spec.read().await.clone();
        let count = self.entries.read().await.len() as u64;
        let mut namespaces = BTreeMap::new();
        if count > 0 {
            namespaces.insert(String::new(), count);
        }
        Ok(IndexStats {
            total_vector_count: count,
            dimension: spec.map(|s| s.dimension),
            namespaces,
        })
    }
}
