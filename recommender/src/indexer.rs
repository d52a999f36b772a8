//! Indexing orchestrator: documents and keywords in, index records out.
//!
//! ```text
//!  Document ──► TextExtractor ──► find_snippet(keyword) ──► ContentHash
//!                                                             │
//!                      VectorStore::upsert ◄── IndexRecord ◄── cache / embed
//! ```

use std::collections::HashMap;

use clause_radar_vector_store::{IndexRecord, Metadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::engine::ContractRecommender;
use crate::error::Result;
use crate::extract::Document;
use crate::snippet::find_snippet;

/// Metadata key holding the document identifier.
pub const META_CONTRACT_ID: &str = "contract_id";
/// Metadata key holding the keyword that produced the snippet.
pub const META_KEYWORD: &str = "keyword";
/// Metadata key holding the snippet text.
pub const META_SNIPPET: &str = "snippet";

/// Record id for a (document, keyword) pair.
pub fn record_id(document_id: &str, keyword: &str) -> String {
    format!("{document_id}::{keyword}")
}

/// A document left out of an indexing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub document_id: String,
    pub reason: String,
}

/// Outcome of [`ContractRecommender::index_contracts`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    /// Documents whose text was extracted.
    pub documents: usize,

    /// Keywords searched in each document.
    pub keywords: usize,

    /// Ids written to the store, in upsert order.
    pub record_ids: Vec<String>,

    /// (document, keyword) pairs without a match.
    pub misses: usize,

    /// Upsert requests sent.
    pub batches: usize,

    /// Documents that could not be read.
    pub skipped: Vec<SkippedDocument>,
}

impl IndexReport {
    /// Records written.
    pub fn records(&self) -> usize {
        self.record_ids.len()
    }
}

impl ContractRecommender {
    /// Mine a snippet for every (document, keyword) pair, embed it and
    /// upsert the resulting records.
    ///
    /// Documents are keyed by id: when two share an id the later one
    /// replaces the earlier, keeping the earlier one's position. Documents
    /// that fail extraction are skipped and listed in the report.
    /// Embedding failures abort the run before anything is written; an
    /// upsert failure names the failing batch.
    pub async fn index_contracts(
        &self,
        documents: &[Document],
        keywords: &[String],
    ) -> Result<IndexReport> {
        let mut report = IndexReport {
            keywords: keywords.len(),
            ..IndexReport::default()
        };
        let mut records: Vec<IndexRecord> = Vec::new();

        for document in unique_by_id(documents) {
            let full_text = match self.extractor.extract(document) {
                Ok(text) => text,
                Err(e) => {
                    warn!(document = %document.id, error = %e, "skipping unreadable document");
                    report.skipped.push(SkippedDocument {
                        document_id: document.id.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            report.documents += 1;

            for keyword in keywords {
                let Some(snippet) = find_snippet(&full_text, keyword) else {
                    debug!(document = %document.id, keyword = %keyword, "keyword not found");
                    report.misses += 1;
                    continue;
                };

                let values = self
                    .embedder
                    .embed(&snippet, self.settings.document_task)
                    .await?;

                let mut metadata = Metadata::new();
                metadata.insert(META_CONTRACT_ID.to_string(), Value::from(document.id.as_str()));
                metadata.insert(META_KEYWORD.to_string(), Value::from(keyword.as_str()));
                metadata.insert(META_SNIPPET.to_string(), Value::from(snippet));

                records.push(IndexRecord {
                    id: record_id(&document.id, keyword),
                    values,
                    metadata,
                });
            }
        }

        if records.is_empty() {
            info!(
                documents = report.documents,
                skipped = report.skipped.len(),
                "no snippets mined, nothing to upsert"
            );
            return Ok(report);
        }

        let summary = self
            .store
            .upsert(&records, self.settings.batch_size)
            .await?;
        report.batches = summary.batches;
        report.record_ids = records.into_iter().map(|record| record.id).collect();

        info!(
            documents = report.documents,
            keywords = report.keywords,
            records = report.records(),
            batches = report.batches,
            skipped = report.skipped.len(),
            "Indexed contracts"
        );
        Ok(report)
    }
}

/// Collapse documents sharing an id, last one wins.
fn unique_by_id(documents: &[Document]) -> Vec<&Document> {
    let mut slots: HashMap<&str, usize> = HashMap::with_capacity(documents.len());
    let mut unique: Vec<&Document> = Vec::with_capacity(documents.len());
    for document in documents {
        match slots.get(document.id.as_str()) {
            Some(&slot) => {
                debug!(document = %document.id, "replacing document with the same id");
                unique[slot] = document;
            }
            None => {
                slots.insert(document.id.as_str(), unique.len());
                unique.push(document);
            }
        }
    }
    unique
}
