//! Embedding providers.
//!
//! The gateway trait is deliberately narrow: text in, fixed-length vector
//! out. The only production implementation talks to the Google Generative
//! Language `embedContent` endpoint.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Hint telling the provider how the embedding will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// Text that will be stored and searched over.
    #[default]
    RetrievalDocument,
    /// Text used to search stored documents.
    RetrievalQuery,
    /// Symmetric similarity between two texts.
    SemanticSimilarity,
    Classification,
    Clustering,
}

impl TaskType {
    /// Wire name sent to the provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            Self::RetrievalQuery => "RETRIEVAL_QUERY",
            Self::SemanticSimilarity => "SEMANTIC_SIMILARITY",
            Self::Classification => "CLASSIFICATION",
            Self::Clustering => "CLUSTERING",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    /// Accepts either the wire name or its lowercase form
    /// (`retrieval_document`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RETRIEVAL_DOCUMENT" => Ok(Self::RetrievalDocument),
            "RETRIEVAL_QUERY" => Ok(Self::RetrievalQuery),
            "SEMANTIC_SIMILARITY" => Ok(Self::SemanticSimilarity),
            "CLASSIFICATION" => Ok(Self::Classification),
            "CLUSTERING" => Ok(Self::Clustering),
            other => Err(format!("unknown task type: {other}")),
        }
    }
}

/// Request for generating an embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// How the vector will be used.
    pub task_type: TaskType,
}

impl EmbeddingRequest {
    /// Create a request with the default (`RETRIEVAL_DOCUMENT`) hint.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            task_type: TaskType::default(),
        }
    }

    /// Set the task hint.
    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }
}

/// Gateway to an external embedding provider.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Model identifier used for every call.
    fn model(&self) -> &str;

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Generate an embedding for the given text.
    async fn embed(&self, request: EmbeddingRequest) -> Result<Embedding>;
}

/// Connection settings for [`GeminiProvider`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`.
    pub api_key: String,

    /// Model name, with or without the `models/` prefix.
    pub model: String,

    /// API base URL up to and including the version segment.
    pub base_url: String,

    /// Expected vector length.
    pub dimension: usize,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &'static str = "models/embedding-001";

    /// Settings for the public endpoint and default model.
    pub fn new(api_key: impl Into<String>, dimension: usize) -> Self {
        Self {
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            dimension,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Google Generative Language embedding provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    dimension: usize,
}

impl GeminiProvider {
    /// Create a provider from explicit settings.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let model = if config.model.starts_with("models/") {
            config.model
        } else {
            format!("models/{}", config.model)
        };
        let endpoint = format!(
            "{}/{model}:embedContent",
            config.base_url.trim_end_matches('/')
        );
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key: config.api_key,
            model,
            endpoint,
            dimension: config.dimension,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<Embedding> {
        if request.text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        debug!(
            model = %self.model,
            task_type = %request.task_type,
            chars = request.text.chars().count(),
            "requesting embedding"
        );

        let body = EmbedContentRequest {
            model: &self.model,
            content: Content {
                parts: vec![Part {
                    text: &request.text,
                }],
            },
            task_type: request.task_type,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Unauthorized(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let parsed: EmbedContentResponse = serde_json::from_str(&text)
            .map_err(|e| EmbeddingError::InvalidResponse(format!("{e}: {text}")))?;
        let embedding = parsed.embedding.values;

        if embedding.is_empty() {
            return Err(EmbeddingError::EmptyEmbedding);
        }
        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        Ok(embedding)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}
