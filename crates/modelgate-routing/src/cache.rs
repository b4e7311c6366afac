//! Classification cache
//!
//! TTL cache keyed by a hash of the last user message, so identical
//! trailing prompts classify identically regardless of earlier turns.
//! The primary backend is Redis; when Redis cannot be reached at startup
//! the in-memory backend is used for the rest of the process lifetime.
//! Flapping between backends would produce inconsistent cache visibility,
//! so there is no runtime re-election.
//!
//! Backend failures on individual reads/writes are logged and treated as
//! misses/no-ops; the cache never fails a request.

use crate::error::{Error, Result};
use crate::message::{last_user_text, ChatMessage};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default TTL for cached classification results
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

const KEY_PREFIX: &str = "modelgate:classify:";

/// Async TTL key-value store for classification results
#[async_trait]
pub trait ClassificationCache: Send + Sync {
    /// Get a value; expired or missing entries return `None`
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value with a TTL
    async fn set(&self, key: &str, value: &str, ttl: Duration);

    /// Remove a value
    async fn delete(&self, key: &str);

    /// Backend name, for health reporting
    fn backend(&self) -> &'static str;
}

/// Stable cache key over the last user message text
#[must_use]
pub fn cache_key(messages: &[ChatMessage]) -> String {
    let text = last_user_text(messages).unwrap_or_default();
    let payload = serde_json::json!({ "message": text }).to_string();
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Redis backend
// ============================================================================

/// Redis-backed classification cache (primary backend)
pub struct RedisCache {
    client: redis::Client,
    prefix: String,
}

impl RedisCache {
    /// Open a client and verify the server is reachable.
    ///
    /// # Errors
    ///
    /// Returns a cache error when the URL is invalid or the server does
    /// not answer a PING.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::Cache(format!("invalid Redis URL: {e}")))?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Cache(format!("Redis connection failed: {e}")))?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| Error::Cache(format!("Redis PING failed: {e}")))?;
        Ok(Self {
            client,
            prefix: KEY_PREFIX.to_string(),
        })
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Cache(format!("Redis connection failed: {e}")))
    }
}

#[async_trait]
impl ClassificationCache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = match self.connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "cache read skipped");
                return None;
            }
        };
        match redis::cmd("GET")
            .arg(self.build_key(key))
            .query_async::<Option<String>>(&mut conn)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Redis GET failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let mut conn = match self.connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "cache write skipped");
                return;
            }
        };
        if let Err(e) = redis::cmd("SETEX")
            .arg(self.build_key(key))
            .arg(ttl.as_secs().max(1))
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
        {
            warn!(error = %e, "Redis SETEX failed");
        }
    }

    async fn delete(&self, key: &str) {
        let mut conn = match self.connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "cache delete skipped");
                return;
            }
        };
        if let Err(e) = redis::cmd("DEL")
            .arg(self.build_key(key))
            .query_async::<i64>(&mut conn)
            .await
        {
            warn!(error = %e, "Redis DEL failed");
        }
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// A cached value with an optional expiry
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process TTL cache (fallback backend).
///
/// Expired entries are treated as misses and lazily evicted on the next
/// read of their key.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries (test/diagnostics helper)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ClassificationCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Lazy eviction of the expired entry.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        None
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(Instant::now() + ttl)
        };
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    async fn delete(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// ============================================================================
// Startup election
// ============================================================================

/// Pick the cache backend once at startup.
///
/// A configured but unreachable Redis pins the in-memory backend for the
/// process lifetime; there is no per-call retry or re-election.
pub async fn connect_cache(redis_url: Option<&str>) -> std::sync::Arc<dyn ClassificationCache> {
    if let Some(url) = redis_url {
        match RedisCache::connect(url).await {
            Ok(cache) => {
                info!("classification cache using Redis backend");
                return std::sync::Arc::new(cache);
            }
            Err(e) => {
                warn!(error = %e, "Redis unreachable; using in-memory classification cache");
            }
        }
    } else {
        debug!("no Redis URL configured; using in-memory classification cache");
    }
    std::sync::Arc::new(MemoryCache::new())
}
