//! Thread-safe in-memory key-value store
//!
//! Implements the full [`CacheStorage`] contract including the atomic
//! operations the distributed lock and idempotency gate rely on. The
//! single write lock around the map is what makes `set_if_absent` and
//! `delete_if_value` atomic here; a networked backend gets the same
//! guarantees from SET NX EX and a compare-and-delete script.
//!
//! Expired entries are dropped lazily on access.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use verdict_types::error::{Result, VerdictError};
use verdict_types::ports::CacheStorage;

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            data,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| Instant::now() >= exp).unwrap_or(false)
    }

    fn remaining_ttl(&self) -> Option<Duration> {
        self.expires_at.and_then(|exp| exp.checked_duration_since(Instant::now()))
    }
}

/// Thread-safe in-memory cache storage
#[derive(Clone, Default)]
pub struct MemoryCacheStorage {
    store: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryCacheStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.values().filter(|e| !e.is_expired()).count()
    }

    /// True when no live entries exist
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop expired entries; returns how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired());
        before - store.len()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let store = self.store.read().await;
        match store.get(key) {
            Some(entry) if entry.is_expired() => {
                drop(store);
                self.store.write().await.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.data.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut store = self.store.write().await;
        store.insert(key.to_string(), Entry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<bool> {
        let mut store = self.store.write().await;
        match store.get(key) {
            Some(entry) if !entry.is_expired() => Ok(false),
            _ => {
                store.insert(key.to_string(), Entry::new(value.to_vec(), ttl));
                Ok(true)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.remove(key);
        Ok(())
    }

    async fn delete_if_value(&self, key: &str, expected: &[u8]) -> Result<bool> {
        let mut store = self.store.write().await;
        match store.get(key) {
            Some(entry) if !entry.is_expired() && entry.data == expected => {
                store.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let store = self.store.read().await;
        match store.get(key) {
            Some(entry) if entry.is_expired() => {
                drop(store);
                self.store.write().await.remove(key);
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<i64> {
        let mut store = self.store.write().await;
        let current = match store.get(key) {
            Some(entry) if !entry.is_expired() => String::from_utf8(entry.data.clone())
                .map_err(|e| VerdictError::Cache(format!("invalid UTF-8 counter: {e}")))?
                .parse::<i64>()
                .map_err(|e| VerdictError::Cache(format!("not a number: {e}")))?,
            _ => 0,
        };
        let next = current + delta;
        // Counter keeps whatever expiry it already had; a fresh counter has none
        let expires_at = store.get(key).filter(|e| !e.is_expired()).and_then(|e| e.expires_at);
        store.insert(
            key.to_string(),
            Entry {
                data: next.to_string().into_bytes(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut store = self.store.write().await;
        match store.get_mut(key) {
            Some(entry) if entry.is_expired() => {
                store.remove(key);
                Ok(false)
            }
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let store = self.store.read().await;
        Ok(store.get(key).filter(|e| !e.is_expired()).and_then(Entry::remaining_ttl))
    }
}
