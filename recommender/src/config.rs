//! Configuration for the contract recommender.
//!
//! Everything is read once at startup, from the process environment or any
//! other key lookup, and handed to the gateway constructors.

use std::str::FromStr;
use std::time::Duration;

use clause_radar_embeddings::{GeminiConfig, TaskType};
use clause_radar_vector_store::{DEFAULT_UPSERT_BATCH_SIZE, IndexSpec, Metric, PineconeConfig};

use crate::error::{RecommenderError, Result};

pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
pub const PINECONE_INDEX: &str = "PINECONE_INDEX";
pub const PINECONE_DIMENSION: &str = "PINECONE_DIMENSION";
pub const PINECONE_METRIC: &str = "PINECONE_METRIC";
pub const PINECONE_CLOUD: &str = "PINECONE_CLOUD";
pub const PINECONE_REGION: &str = "PINECONE_REGION";

pub const EMBEDDING_MODEL: &str = "EMBEDDING_MODEL";
pub const GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";
pub const PINECONE_CONTROLLER_URL: &str = "PINECONE_CONTROLLER_URL";
pub const PINECONE_NAMESPACE: &str = "PINECONE_NAMESPACE";
pub const UPSERT_BATCH_SIZE: &str = "UPSERT_BATCH_SIZE";
pub const DOCUMENT_TASK_TYPE: &str = "DOCUMENT_TASK_TYPE";
pub const QUERY_TASK_TYPE: &str = "QUERY_TASK_TYPE";
pub const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

/// Variables without which the recommender cannot start.
pub const REQUIRED_VARS: [&str; 7] = [
    GOOGLE_API_KEY,
    PINECONE_API_KEY,
    PINECONE_INDEX,
    PINECONE_DIMENSION,
    PINECONE_METRIC,
    PINECONE_CLOUD,
    PINECONE_REGION,
];

/// Full recommender configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Embedding provider settings.
    pub gemini: GeminiConfig,

    /// Vector store connection settings.
    pub pinecone: PineconeConfig,

    /// Backing index to provision.
    pub index: IndexSpec,

    /// Indexing and query behaviour.
    pub indexing: IndexingSettings,
}

/// Knobs for the orchestrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexingSettings {
    /// Records per upsert request.
    pub batch_size: usize,

    /// Task hint used when embedding mined snippets.
    pub document_task: TaskType,

    /// Task hint used when embedding search queries.
    pub query_task: TaskType,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_UPSERT_BATCH_SIZE,
            document_task: TaskType::RetrievalDocument,
            query_task: TaskType::RetrievalDocument,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Blank values count as absent.
    ///
    /// Every missing required variable is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let missing: Vec<String> = REQUIRED_VARS
            .into_iter()
            .filter(|&key| get(key).is_none())
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            return Err(RecommenderError::MissingConfig(missing));
        }

        let required = |key: &str| get(key).unwrap_or_default();

        let dimension: usize = parse(PINECONE_DIMENSION, &required(PINECONE_DIMENSION))?;
        if dimension == 0 {
            return Err(invalid(PINECONE_DIMENSION, "must be greater than zero"));
        }
        let metric: Metric = parse(PINECONE_METRIC, &required(PINECONE_METRIC))?;

        let timeout_secs: u64 = match get(HTTP_TIMEOUT_SECS) {
            Some(raw) => parse(HTTP_TIMEOUT_SECS, &raw)?,
            None => 30,
        };
        if timeout_secs == 0 {
            return Err(invalid(HTTP_TIMEOUT_SECS, "must be greater than zero"));
        }
        let timeout = Duration::from_secs(timeout_secs);

        let mut gemini =
            GeminiConfig::new(required(GOOGLE_API_KEY), dimension).with_timeout(timeout);
        if let Some(model) = get(EMBEDDING_MODEL) {
            gemini = gemini.with_model(model);
        }
        if let Some(url) = get(GEMINI_BASE_URL) {
            gemini = gemini.with_base_url(check_url(GEMINI_BASE_URL, url)?);
        }

        let mut pinecone = PineconeConfig::new(required(PINECONE_API_KEY)).with_timeout(timeout);
        if let Some(url) = get(PINECONE_CONTROLLER_URL) {
            pinecone = pinecone.with_controller_url(check_url(PINECONE_CONTROLLER_URL, url)?);
        }
        if let Some(namespace) = get(PINECONE_NAMESPACE) {
            pinecone = pinecone.with_namespace(namespace);
        }

        let mut indexing = IndexingSettings::default();
        if let Some(raw) = get(UPSERT_BATCH_SIZE) {
            indexing.batch_size = parse(UPSERT_BATCH_SIZE, &raw)?;
            if indexing.batch_size == 0 {
                return Err(invalid(UPSERT_BATCH_SIZE, "must be greater than zero"));
            }
        }
        if let Some(raw) = get(DOCUMENT_TASK_TYPE) {
            indexing.document_task = parse(DOCUMENT_TASK_TYPE, &raw)?;
        }
        if let Some(raw) = get(QUERY_TASK_TYPE) {
            indexing.query_task = parse(QUERY_TASK_TYPE, &raw)?;
        }

        Ok(Self {
            gemini,
            pinecone,
            index: IndexSpec {
                name: required(PINECONE_INDEX),
                dimension,
                metric,
                cloud: required(PINECONE_CLOUD),
                region: required(PINECONE_REGION),
            },
            indexing,
        })
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> RecommenderError {
    RecommenderError::InvalidConfig {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| invalid(key, format!("'{raw}': {e}")))
}

fn check_url(key: &str, raw: String) -> Result<String> {
    url::Url::parse(&raw).map_err(|e| invalid(key, format!("'{raw}': {e}")))?;
    Ok(raw)
}
