//! Pinecone serverless index over the REST API.
//!
//! Two planes are involved:
//!
//! ```text
//!  control plane (api.pinecone.io)      data plane (index host)
//!  ─────────────────────────────        ───────────────────────
//!  GET  /indexes/{name}  describe       POST /vectors/upsert
//!  POST /indexes         create         POST /query
//!                                       POST /describe_index_stats
//! ```
//!
//! The data-plane host is learned from the describe call and cached for the
//! lifetime of the store.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, VectorStoreError};
use crate::record::{IndexRecord, IndexSpec, IndexStats, Metric, ScoredRecord};
use crate::store::VectorStore;

/// Connection settings for [`PineconeStore`].
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    /// API key sent as `Api-Key`.
    pub api_key: String,

    /// Control plane base URL.
    pub controller_url: String,

    /// Namespace for reads and writes. Empty means the default namespace.
    pub namespace: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Delay between readiness checks after creating an index.
    pub ready_poll_interval: Duration,

    /// Readiness checks before giving up.
    pub ready_max_checks: u32,

    /// Value of `X-Pinecone-API-Version`.
    pub api_version: String,
}

impl PineconeConfig {
    pub const DEFAULT_CONTROLLER_URL: &'static str = "https://api.pinecone.io";
    pub const DEFAULT_API_VERSION: &'static str = "2024-07";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            controller_url: Self::DEFAULT_CONTROLLER_URL.to_string(),
            namespace: String::new(),
            timeout: Duration::from_secs(30),
            ready_poll_interval: Duration::from_secs(1),
            ready_max_checks: 60,
            api_version: Self::DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Set the control plane URL.
    pub fn with_controller_url(mut self, url: impl Into<String>) -> Self {
        self.controller_url = url.into();
        self
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set readiness polling.
    pub fn with_ready_polling(mut self, interval: Duration, max_checks: u32) -> Self {
        self.ready_poll_interval = interval;
        self.ready_max_checks = max_checks;
        self
    }
}

/// A [`VectorStore`] backed by one Pinecone index.
pub struct PineconeStore {
    client: reqwest::Client,
    config: PineconeConfig,
    index_name: String,
    host: RwLock<Option<String>>,
}

impl PineconeStore {
    /// Build a client for `index_name`. No network traffic happens here.
    pub fn new(config: PineconeConfig, index_name: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(&config.api_key)
                .map_err(|e| VectorStoreError::InvalidConfig(format!("api key: {e}")))?,
        );
        headers.insert(
            "X-Pinecone-API-Version",
            HeaderValue::from_str(&config.api_version)
                .map_err(|e| VectorStoreError::InvalidConfig(format!("api version: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            config,
            index_name: index_name.into(),
            host: RwLock::new(None),
        })
    }

    /// Name of the backing index.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn controller(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.controller_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn namespace_param(&self) -> Option<&str> {
        (!self.config.namespace.is_empty()).then_some(self.config.namespace.as_str())
    }

    /// Describe the index, or `None` when it does not exist.
    async fn describe_index(&self) -> Result<Option<IndexDescription>> {
        let url = self.controller(&format!("indexes/{}", self.index_name));
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response).await.map(Some)
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        let body = CreateIndexRequest {
            name: &spec.name,
            dimension: spec.dimension,
            metric: spec.metric,
            spec: ServerlessSpec {
                serverless: CloudRegion {
                    cloud: &spec.cloud,
                    region: &spec.region,
                },
            },
        };

        let response = self
            .client
            .post(self.controller("indexes"))
            .json(&body)
            .send()
            .await?;

        // Another process may have created it between describe and create.
        if response.status() == StatusCode::CONFLICT {
            debug!(index = %spec.name, "index already exists");
            return Ok(());
        }
        check_status(response).await.map(|_| ())
    }

    async fn wait_until_ready(&self) -> Result<IndexDescription> {
        for check in 1..=self.config.ready_max_checks {
            if let Some(description) = self.describe_index().await? {
                if description.status.ready {
                    return Ok(description);
                }
                debug!(
                    index = %self.index_name,
                    check,
                    state = %description.status.state,
                    "waiting for index"
                );
            }
            tokio::time::sleep(self.config.ready_poll_interval).await;
        }

        Err(VectorStoreError::NotReady {
            name: self.index_name.clone(),
            checks: self.config.ready_max_checks,
        })
    }

    async fn remember_host(&self, host: &str) -> String {
        let url = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };
        *self.host.write().await = Some(url.clone());
        url
    }

    /// Data plane base URL, resolving it on first use.
    async fn host(&self) -> Result<String> {
        if let Some(host) = self.host.read().await.as_ref() {
            return Ok(host.clone());
        }
        match self.describe_index().await? {
            Some(description) => Ok(self.remember_host(&description.host).await),
            None => Err(VectorStoreError::IndexNotFound(self.index_name.clone())),
        }
    }

    async fn data_plane<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}/{path}", self.host().await?);
        let response = self.client.post(&url).json(body).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<()> {
        if spec.name != self.index_name {
            return Err(VectorStoreError::Provision {
                name: spec.name.clone(),
                reason: format!("store is bound to index {}", self.index_name),
            });
        }

        let description = match self.describe_index().await {
            Ok(description) => description,
            Err(e) => {
                return Err(VectorStoreError::Provision {
                    name: spec.name.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let description = match description {
            Some(existing) => {
                if existing.dimension != spec.dimension {
                    return Err(VectorStoreError::Provision {
                        name: spec.name.clone(),
                        reason: format!(
                            "existing index has dimension {}, requested {}",
                            existing.dimension, spec.dimension
                        ),
                    });
                }
                if existing.metric != spec.metric {
                    warn!(
                        index = %spec.name,
                        existing = %existing.metric,
                        requested = %spec.metric,
                        "index metric differs from configuration"
                    );
                }
                debug!(index = %spec.name, "index exists");
                existing
            }
            None => {
                info!(
                    index = %spec.name,
                    dimension = spec.dimension,
                    metric = %spec.metric,
                    cloud = %spec.cloud,
                    region = %spec.region,
                    "creating index"
                );
                self.create_index(spec)
                    .await
                    .map_err(|e| VectorStoreError::Provision {
                        name: spec.name.clone(),
                        reason: e.to_string(),
                    })?;
                self.wait_until_ready().await?
            }
        };

        self.remember_host(&description.host).await;
        Ok(())
    }

    async fn write_batch(&self, batch: &[IndexRecord]) -> Result<usize> {
        let body = UpsertRequest {
            vectors: batch,
            namespace: self.namespace_param(),
        };
        let response: UpsertResponse = self.data_plane("vectors/upsert", &body).await?;
        Ok(response.upserted_count)
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            namespace: self.namespace_param(),
        };
        let response: QueryResponse = self.data_plane("query", &body).await?;
        Ok(response.matches)
    }

    fn namespace(&self) -> &str {
        &self.config.namespace
    }

    async fn stats(&self) -> Result<IndexStats> {
        let response: StatsResponse = self
            .data_plane("describe_index_stats", &serde_json::json!({}))
            .await?;
        Ok(IndexStats {
            total_vector_count: response.total_vector_count,
            dimension: response.dimension,
            namespaces: response
                .namespaces
                .into_iter()
                .map(|(name, summary)| (name, summary.vector_count))
                .collect(),
        })
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(VectorStoreError::Api {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let text = check_status(response).await?.text().await?;
    serde_json::from_str(&text)
        .map_err(|e| VectorStoreError::InvalidResponse(format!("{e}: {text}")))
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: Metric,
    spec: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    serverless: CloudRegion<'a>,
}

#[derive(Debug, Serialize)]
struct CloudRegion<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
    dimension: usize,
    #[serde(default)]
    metric: Metric,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [IndexRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceSummary>,
    dimension: Option<usize>,
    #[serde(default)]
    total_vector_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceSummary {
    #[serde(default)]
    vector_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Metadata;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn spec() -> IndexSpec {
        IndexSpec {
            name: "contracts".to_string(),
            dimension: 3,
            metric: Metric::Cosine,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    fn store_for(server: &MockServer) -> PineconeStore {
        PineconeStore::new(
            PineconeConfig::new("pc-key")
                .with_controller_url(server.uri())
                .with_ready_polling(Duration::from_millis(5), 3),
            "contracts",
        )
        .unwrap()
    }

    fn description(server: &MockServer, ready: bool) -> serde_json::Value {
        json!({
            "name": "contracts",
            "dimension": 3,
            "metric": "cosine",
            "host": server.uri(),
            "status": { "ready": ready, "state": if ready { "Ready" } else { "Initializing" } }
        })
    }

    async fn mount_existing_index(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/indexes/contracts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(description(server, true)))
            .mount(server)
            .await;
    }

    fn record(id: &str) -> IndexRecord {
        let mut metadata = Metadata::new();
        metadata.insert("contract_id".to_string(), json!("acme"));
        IndexRecord {
            id: id.to_string(),
            values: vec![0.1, 0.2, 0.3],
            metadata,
        }
    }

    #[tokio::test]
    async fn test_ensure_index_creates_missing_index() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/contracts"))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/indexes"))
            .and(header("Api-Key", "pc-key"))
            .and(body_json(json!({
                "name": "contracts",
                "dimension": 3,
                "metric": "cosine",
                "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } }
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        mount_existing_index(&server).await;

        store_for(&server).ensure_index(&spec()).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_index_leaves_existing_index() {
        let server = MockServer::start().await;
        mount_existing_index(&server).await;
        Mock::given(method("POST"))
            .and(path("/indexes"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let store = store_for(&server);
        store.ensure_index(&spec()).await.unwrap();
        store.ensure_index(&spec()).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_index_rejects_dimension_change() {
        let server = MockServer::start().await;
        mount_existing_index(&server).await;

        let mut wider = spec();
        wider.dimension = 768;
        let err = store_for(&server).ensure_index(&wider).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::Provision { .. }));
    }

    #[tokio::test]
    async fn test_ensure_index_times_out_when_never_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/contracts"))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/indexes"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/indexes/contracts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(description(&server, false)))
            .mount(&server)
            .await;

        let err = store_for(&server).ensure_index(&spec()).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::NotReady { checks: 3, .. }));
    }

    #[tokio::test]
    async fn test_upsert_reports_failing_batch() {
        let server = MockServer::start().await;
        mount_existing_index(&server).await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .and(body_partial_json(json!({ "vectors": [{ "id": "a" }, { "id": "b" }] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upsertedCount": 2 })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .and(body_partial_json(json!({ "vectors": [{ "id": "c" }] })))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let err = store
            .upsert(&[record("a"), record("b"), record("c")], 2)
            .await
            .unwrap_err();

        match err {
            VectorStoreError::Upsert {
                batch_index,
                total_batches,
                committed_batches,
                source,
            } => {
                assert_eq!((batch_index, total_batches, committed_batches), (1, 2, 1));
                assert!(matches!(*source, VectorStoreError::Api { status: 500, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_upsert_omits_default_namespace() {
        let server = MockServer::start().await;
        mount_existing_index(&server).await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .and(body_json(json!({
                "vectors": [{
                    "id": "a",
                    "values": [0.1, 0.2, 0.3],
                    "metadata": { "contract_id": "acme" }
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upsertedCount": 1 })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = store_for(&server).upsert(&[record("a")], 100).await.unwrap();
        assert_eq!(summary.upserted, 1);
    }

    #[tokio::test]
    async fn test_query_maps_matches() {
        let server = MockServer::start().await;
        mount_existing_index(&server).await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_partial_json(json!({
                "topK": 2,
                "includeMetadata": true,
                "namespace": "legal"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [
                    { "id": "acme#warranty", "score": 0.91, "metadata": { "keyword": "warranty" } },
                    { "id": "beta#warranty", "score": 0.72 }
                ],
                "namespace": "legal"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = PineconeStore::new(
            PineconeConfig::new("pc-key")
                .with_controller_url(server.uri())
                .with_namespace("legal"),
            "contracts",
        )
        .unwrap();
        let matches = store.query(&[0.1, 0.2, 0.3], 2).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "acme#warranty");
        assert_eq!(matches[0].metadata.get("keyword"), Some(&json!("warranty")));
        assert!(matches[1].metadata.is_empty());
    }

    #[tokio::test]
    async fn test_query_without_index_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/contracts"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = store_for(&server).query(&[0.1, 0.2, 0.3], 1).await.unwrap_err();
        match err {
            VectorStoreError::Query { source, .. } => {
                assert!(matches!(*source, VectorStoreError::IndexNotFound(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_stats() {
        let server = MockServer::start().await;
        mount_existing_index(&server).await;
        Mock::given(method("POST"))
            .and(path("/describe_index_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "namespaces": { "": { "vectorCount": 12 } },
                "dimension": 3,
                "indexFullness": 0.0,
                "totalVectorCount": 12
            })))
            .mount(&server)
            .await;

        let stats = store_for(&server).stats().await.unwrap();
        assert_eq!(stats.total_vector_count, 12);
        assert_eq!(stats.dimension, Some(3));
        assert_eq!(stats.namespaces.get(""), Some(&12));
    }

    #[tokio::test]
    async fn test_garbled_stats_body_is_invalid_response() {
        let server = MockServer::start().await;
        mount_existing_index(&server).await;
        Mock::given(method("POST"))
            .and(path("/describe_index_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = store_for(&server).stats().await.unwrap_err();
        assert!(
            matches!(err, VectorStoreError::InvalidResponse(ref body) if body.contains("gateway"))
        );
    }

    #[test]
    fn test_store_reports_configured_namespace() {
        let store = PineconeStore::new(
            PineconeConfig::new("pc-key").with_namespace("legal"),
            "contracts",
        )
        .unwrap();
        assert_eq!(VectorStore::namespace(&store), "legal");
        assert_eq!(store.namespace_param(), Some("legal"));
    }
}
