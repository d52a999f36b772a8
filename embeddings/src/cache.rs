//! Session-scoped embedding cache keyed by snippet content hash.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use crate::Embedding;
use crate::error::Result;
use crate::provider::{EmbeddingProvider, EmbeddingRequest, TaskType};

/// Hex-encoded SHA-256 digest of a text's UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash the given text.
    pub fn of(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// The 64-character hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache for embeddings to avoid redundant API calls.
///
/// Entries live for as long as the cache does; there is no eviction. Every
/// hash owns a once-cell, so concurrent callers racing on the same hash
/// share a single compute.
#[derive(Default)]
pub struct EmbeddingCache {
    cells: Mutex<HashMap<ContentHash, Arc<OnceCell<Embedding>>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl EmbeddingCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached vector for `hash`, or run `compute` and remember
    /// its result.
    ///
    /// A failing `compute` leaves the entry empty so a later call can retry.
    pub async fn get_or_compute<F, Fut>(&self, hash: &ContentHash, compute: F) -> Result<Embedding>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Embedding>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry(hash.clone()).or_default())
        };

        let mut computed = false;
        let embedding = cell
            .get_or_try_init(|| {
                computed = true;
                compute()
            })
            .await?;

        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(hash = %hash, "embedding cache miss");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(hash = %hash, "embedding cache hit");
        }

        Ok(embedding.clone())
    }

    /// Look up a vector without computing anything.
    pub async fn get(&self, hash: &ContentHash) -> Option<Embedding> {
        let cells = self.cells.lock().await;
        cells.get(hash).and_then(|cell| cell.get().cloned())
    }

    /// Check if an embedding is cached.
    pub async fn contains(&self, hash: &ContentHash) -> bool {
        self.get(hash).await.is_some()
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let cells = self.cells.lock().await;
        CacheStats {
            entries: cells.values().filter(|cell| cell.initialized()).count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Statistics about the embedding cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cached vectors.
    pub entries: usize,

    /// Lookups served without calling the provider.
    pub hits: usize,

    /// Lookups that called the provider.
    pub misses: usize,
}

/// A provider wrapped with a content-hash cache.
pub struct CachedProvider {
    provider: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
}

impl CachedProvider {
    /// Create a new cached provider with an empty cache.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            cache: EmbeddingCache::new(),
        }
    }

    /// Embed `text`, calling the provider only if this exact text has not
    /// been embedded before.
    pub async fn embed(&self, text: &str, task_type: TaskType) -> Result<Embedding> {
        let hash = ContentHash::of(text);
        self.cache
            .get_or_compute(&hash, || {
                self.provider
                    .embed(EmbeddingRequest::new(text).with_task_type(task_type))
            })
            .await
    }

    /// The wrapped provider, for uncached calls.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Get the underlying cache.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_hash_is_stable() {
        let a = ContentHash::of("Effective Date: Jan 1, 2024");
        let b = ContentHash::of("Effective Date: Jan 1, 2024");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert_ne!(a, ContentHash::of("Effective Date: Jan 2, 2024"));
    }

    #[test]
    fn test_hash_known_digest() {
        assert_eq!(
            ContentHash::of("").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_compute_runs_once_per_hash() {
        let cache = EmbeddingCache::new();
        let hash = ContentHash::of("snippet");
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_compute(&hash, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1.0, 2.0, 3.0])
            })
            .await
            .unwrap();
        let second = cache
            .get_or_compute(&hash, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![9.0, 9.0, 9.0])
            })
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.stats().await,
            CacheStats {
                entries: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[tokio::test]
    async fn test_failed_compute_is_not_cached() {
        let cache = EmbeddingCache::new();
        let hash = ContentHash::of("flaky");

        let err = cache
            .get_or_compute(&hash, || async { Err(EmbeddingError::EmptyEmbedding) })
            .await;
        assert!(err.is_err());
        assert!(!cache.contains(&hash).await);

        let retried = cache
            .get_or_compute(&hash, || async { Ok(vec![0.5]) })
            .await
            .unwrap();
        assert_eq!(retried, vec![0.5]);
        assert_eq!(cache.get(&hash).await, Some(vec![0.5]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_compute() {
        let cache = Arc::new(EmbeddingCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let hash = ContentHash::of("raced");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            let hash = hash.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(&hash, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(vec![4.0, 2.0])
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), vec![4.0, 2.0]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
