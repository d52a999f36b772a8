//! Records, index settings and statistics exchanged with the store.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Open, string-keyed metadata attached to every vector.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Distance metric the index is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    #[serde(rename = "dotproduct")]
    DotProduct,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::DotProduct => "dotproduct",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" => Ok(Self::Euclidean),
            "dotproduct" | "dot_product" => Ok(Self::DotProduct),
            other => Err(format!(
                "unknown metric '{other}', expected cosine, euclidean or dotproduct"
            )),
        }
    }
}

/// Everything needed to create the backing index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name.
    pub name: String,

    /// Vector length.
    pub dimension: usize,

    /// Similarity metric.
    pub metric: Metric,

    /// Cloud provider (`aws`, `gcp`, `azure`).
    pub cloud: String,

    /// Cloud region.
    pub region: String,
}

/// A vector plus the metadata that identifies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Caller-chosen identifier; writing an existing id overwrites it.
    pub id: String,

    /// The embedding.
    pub values: Vec<f32>,

    /// Attached metadata.
    pub metadata: Metadata,
}

/// One match returned from a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Vector counts reported by the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Vectors across all namespaces.
    pub total_vector_count: u64,

    /// Index dimension, if reported.
    pub dimension: Option<usize>,

    /// Vectors per namespace (the default namespace is `""`).
    pub namespaces: BTreeMap<String, u64>,
}

impl IndexStats {
    /// Vectors in `namespace`. Falls back to the total when the store
    /// reports no per-namespace breakdown.
    pub fn namespace_count(&self, namespace: &str) -> u64 {
        match self.namespaces.get(namespace) {
            Some(&count) => count,
            None if self.namespaces.is_empty() => self.total_vector_count,
            None => 0,
        }
    }
}

/// Outcome of a batched upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Batches written.
    pub batches: usize,

    /// Records acknowledged by the store.
    pub upserted: usize,
}
