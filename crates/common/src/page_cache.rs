//! Full-page response cache.
//!
//! Rendered pages are stored under a key derived from the request path
//! (including the query string) and served verbatim until their TTL runs
//! out. Two stores are provided:
//!
//! - [`MemoryPageCache`]: a map inside the server process
//! - [`RedisPageCache`]: shared across processes via Redis
//!
//! Both support [`PageCacheStore::flush`], which invalidates every entry at
//! once. A race between a slow render and a flush can leave one stale page
//! behind for at most one TTL window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Uri;
use bytes::Bytes;
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{AppError, AppResult};

/// A rendered page as it was sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    /// `Content-Type` header of the original response.
    pub content_type: String,
    /// Response body.
    pub body: Bytes,
}

/// Derive the cache key for a request.
///
/// Two requests share an entry exactly when their path and query string
/// are identical.
#[must_use]
pub fn cache_key(uri: &Uri) -> String {
    let path_and_query = uri
        .path_and_query()
        .map_or_else(|| uri.path(), |pq| pq.as_str());
    format!("page:{path_and_query}")
}

/// Key-value store with per-entry TTL.
#[async_trait::async_trait]
pub trait PageCacheStore: Send + Sync {
    /// Fetch a live entry.
    async fn get(&self, key: &str) -> AppResult<Option<CachedPage>>;

    /// Store an entry that expires after `ttl`.
    async fn set(&self, key: &str, page: CachedPage, ttl: Duration) -> AppResult<()>;

    /// Invalidate every entry.
    async fn flush(&self) -> AppResult<()>;
}

/// Page cache handle shared through application state.
#[derive(Clone)]
pub struct PageCache {
    store: Arc<dyn PageCacheStore>,
    ttl: Duration,
}

impl PageCache {
    /// Create a page cache over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn PageCacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// In-process cache, mostly useful for single-node deployments and tests.
    #[must_use]
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryPageCache::new()), ttl)
    }

    /// TTL applied to every stored page.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a live entry.
    pub async fn get(&self, key: &str) -> AppResult<Option<CachedPage>> {
        self.store.get(key).await
    }

    /// Store a page with the configured TTL.
    pub async fn set(&self, key: &str, page: CachedPage) -> AppResult<()> {
        self.store.set(key, page, self.ttl).await
    }

    /// Invalidate every cached page.
    pub async fn flush(&self) -> AppResult<()> {
        self.store.flush().await?;
        info!("Flushed page cache");
        Ok(())
    }
}

struct MemoryEntry {
    page: CachedPage,
    expires_at: Instant,
}

/// In-process page cache.
#[derive(Default)]
pub struct MemoryPageCache {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryPageCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PageCacheStore for MemoryPageCache {
    async fn get(&self, key: &str) -> AppResult<Option<CachedPage>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    debug!(key = %key, "Page cache hit");
                    return Ok(Some(entry.page.clone()));
                }
                Some(_) => {}
                None => {
                    debug!(key = %key, "Page cache miss");
                    return Ok(None);
                }
            }
        }

        // Expired: drop it unless someone refreshed it meanwhile
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        debug!(key = %key, "Page cache entry expired");
        Ok(None)
    }

    async fn set(&self, key: &str, page: CachedPage, ttl: Duration) -> AppResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key.to_string(),
            MemoryEntry {
                page,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn flush(&self) -> AppResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPage {
    content_type: String,
    body: String,
}

/// Redis-backed page cache.
///
/// Keys are namespaced by a generation counter; flushing bumps the counter
/// so every older entry becomes unreachable and ages out on its own TTL.
#[derive(Clone)]
pub struct RedisPageCache {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisPageCache {
    /// Create a Redis page cache using `prefix` for all keys.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
        }
    }

    fn generation_key(prefix: &str) -> String {
        format!("{prefix}:page-cache:generation")
    }

    fn entry_key(prefix: &str, generation: i64, key: &str) -> String {
        format!("{prefix}:page-cache:{generation}:{key}")
    }

    async fn generation(&self) -> AppResult<i64> {
        let generation: Option<i64> = self
            .redis
            .get(Self::generation_key(&self.prefix))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        Ok(generation.unwrap_or(0))
    }
}

#[async_trait::async_trait]
impl PageCacheStore for RedisPageCache {
    async fn get(&self, key: &str) -> AppResult<Option<CachedPage>> {
        let generation = self.generation().await?;
        let raw: Option<String> = self
            .redis
            .get(Self::entry_key(&self.prefix, generation, key))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;

        let Some(raw) = raw else {
            debug!(key = %key, "Page cache miss");
            return Ok(None);
        };

        let stored: StoredPage =
            serde_json::from_str(&raw).map_err(|e| AppError::Cache(e.to_string()))?;
        debug!(key = %key, "Page cache hit");
        Ok(Some(CachedPage {
            content_type: stored.content_type,
            body: Bytes::from(stored.body),
        }))
    }

    async fn set(&self, key: &str, page: CachedPage, ttl: Duration) -> AppResult<()> {
        let body = String::from_utf8(page.body.to_vec())
            .map_err(|_| AppError::Cache("page body is not valid UTF-8".to_string()))?;
        let raw = serde_json::to_string(&StoredPage {
            content_type: page.content_type,
            body,
        })
        .map_err(|e| AppError::Cache(e.to_string()))?;

        let generation = self.generation().await?;
        let ttl_secs = ttl.as_secs().max(1) as i64;

        self.redis
            .set::<(), _, _>(
                Self::entry_key(&self.prefix, generation, key),
                raw,
                Some(Expiration::EX(ttl_secs)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn flush(&self) -> AppResult<()> {
        let generation: i64 = self
            .redis
            .incr(Self::generation_key(&self.prefix))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        debug!(generation, "Advanced page cache generation");
        Ok(())
    }
}
