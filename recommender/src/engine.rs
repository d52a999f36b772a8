//! Contract recommender engine.

use std::sync::Arc;

use clause_radar_embeddings::{CacheStats, CachedProvider, EmbeddingProvider, GeminiProvider};
use clause_radar_vector_store::{IndexSpec, IndexStats, PineconeStore, VectorStore};
use tracing::{debug, info};

use crate::config::{Config, IndexingSettings};
use crate::error::{RecommenderError, Result};
use crate::extract::{PdfTextExtractor, TextExtractor};

/// Mines, embeds and indexes contract snippets, and answers similarity
/// queries against them.
///
/// Owns the session embedding cache; the vector store holds the durable
/// records. The indexing and query orchestrators live in
/// [`crate::indexer`] and [`crate::query`].
pub struct ContractRecommender {
    /// Embedding provider plus the per-session snippet cache.
    pub(crate) embedder: CachedProvider,

    /// Vector database gateway.
    pub(crate) store: Arc<dyn VectorStore>,

    /// Document to text.
    pub(crate) extractor: Arc<dyn TextExtractor>,

    /// Batch size and task hints.
    pub(crate) settings: IndexingSettings,

    /// Index the store was provisioned with.
    pub(crate) index: IndexSpec,
}

impl ContractRecommender {
    /// Create a new recommender builder.
    pub fn builder() -> ContractRecommenderBuilder {
        ContractRecommenderBuilder::new()
    }

    /// Wire the production gateways (Gemini, Pinecone, PDF) from `config`
    /// and provision the index.
    pub async fn from_config(config: &Config) -> Result<Self> {
        info!(
            index = %config.index.name,
            model = %config.gemini.model,
            "Initializing contract recommender"
        );

        let provider = GeminiProvider::new(config.gemini.clone())?;
        let store = PineconeStore::new(config.pinecone.clone(), config.index.name.clone())?;

        Self::builder()
            .with_embedder(Arc::new(provider))
            .with_store(Arc::new(store))
            .with_extractor(Arc::new(PdfTextExtractor))
            .with_index(config.index.clone())
            .with_settings(config.indexing)
            .build()
            .await
    }

    /// Index statistics from the store.
    pub async fn stats(&self) -> Result<IndexStats> {
        Ok(self.store.stats().await?)
    }

    /// Clamp a requested result count to `[1, max(n, 1)]`, where `n` is
    /// the number of vectors in the store's namespace.
    pub async fn clamp_top_k(&self, requested: usize) -> Result<usize> {
        let stats = self.stats().await?;
        let available = stats.namespace_count(self.store.namespace());
        let available = usize::try_from(available).unwrap_or(usize::MAX);
        let clamped = requested.clamp(1, available.max(1));
        if clamped != requested {
            debug!(requested, clamped, available, "clamped top_k");
        }
        Ok(clamped)
    }

    /// Embedding cache counters for this session.
    pub async fn cache_stats(&self) -> CacheStats {
        self.embedder.cache().stats().await
    }

    /// The provisioned index.
    pub fn index(&self) -> &IndexSpec {
        &self.index
    }

    /// Active settings.
    pub fn settings(&self) -> IndexingSettings {
        self.settings
    }
}

/// Builder for [`ContractRecommender`].
pub struct ContractRecommenderBuilder {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    extractor: Arc<dyn TextExtractor>,
    index: Option<IndexSpec>,
    settings: IndexingSettings,
}

impl ContractRecommenderBuilder {
    /// Create a new builder. The extractor defaults to PDF.
    pub fn new() -> Self {
        Self {
            embedder: None,
            store: None,
            extractor: Arc::new(PdfTextExtractor),
            index: None,
            settings: IndexingSettings::default(),
        }
    }

    /// Set the embedding provider.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector store.
    pub fn with_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the text extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Set the index to provision.
    pub fn with_index(mut self, index: IndexSpec) -> Self {
        self.index = Some(index);
        self
    }

    /// Set batch size and task hints.
    pub fn with_settings(mut self, settings: IndexingSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the recommender, creating the index if it does not exist.
    pub async fn build(self) -> Result<ContractRecommender> {
        let embedder = self
            .embedder
            .ok_or(RecommenderError::MissingComponent("embedding provider"))?;
        let store = self
            .store
            .ok_or(RecommenderError::MissingComponent("vector store"))?;
        let index = self
            .index
            .ok_or(RecommenderError::MissingComponent("index settings"))?;

        if embedder.dimension() != index.dimension {
            return Err(RecommenderError::InvalidConfig {
                key: "dimension".to_string(),
                reason: format!(
                    "embedding provider returns {} values, index expects {}",
                    embedder.dimension(),
                    index.dimension
                ),
            });
        }

        store.ensure_index(&index).await?;
        info!(
            index = %index.name,
            provider = embedder.name(),
            batch_size = self.settings.batch_size,
            "Contract recommender ready"
        );

        Ok(ContractRecommender {
            embedder: CachedProvider::new(embedder),
            store,
            extractor: self.extractor,
            settings: self.settings,
            index,
        })
    }
}

impl Default for ContractRecommenderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
