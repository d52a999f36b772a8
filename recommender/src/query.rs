//! Query orchestrator: free text in, ranked snippets out.

use clause_radar_embeddings::EmbeddingRequest;
use clause_radar_vector_store::{Metadata, ScoredRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::ContractRecommender;
use crate::error::{RecommenderError, Result};
use crate::indexer::{META_CONTRACT_ID, META_KEYWORD, META_SNIPPET};

/// One ranked snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub contract_id: String,
    pub keyword: String,
    pub score: f32,
    pub snippet: String,
}

impl From<ScoredRecord> for MatchResult {
    fn from(record: ScoredRecord) -> Self {
        let field = |metadata: &Metadata, key: &str| {
            metadata
                .get(key)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            contract_id: field(&record.metadata, META_CONTRACT_ID),
            keyword: field(&record.metadata, META_KEYWORD),
            score: record.score,
            snippet: field(&record.metadata, META_SNIPPET),
        }
    }
}

impl ContractRecommender {
    /// Embed `query_text` and return up to `top_k` nearest snippets in the
    /// store's descending-score order.
    ///
    /// The query embedding is never cached.
    pub async fn recommend(&self, query_text: &str, top_k: usize) -> Result<Vec<MatchResult>> {
        if query_text.trim().is_empty() {
            return Err(RecommenderError::EmptyQuery);
        }

        let request = EmbeddingRequest::new(query_text).with_task_type(self.settings.query_task);
        let vector = self.embedder.provider().embed(request).await?;

        let matches = self.store.query(&vector, top_k).await?;
        debug!(top_k, matches = matches.len(), "query answered");

        Ok(matches.into_iter().map(MatchResult::from).collect())
    }
}
