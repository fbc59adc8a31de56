//! Backend-agnostic key-value storage interface
//!
//! The core's idempotency cache, workflow snapshot store, distributed
//! lock, and rate limiter all run on this contract. The atomic operations
//! (`set_if_absent`, `delete_if_value`, `incr`) must be atomic with
//! respect to each other; on a networked backend they map to SET NX EX
//! and a compare-and-delete script.
//!
//! Key namespaces used by the core:
//! `idempotency:{tenant}:{key}`, `event:{tenant}:{event_id}`,
//! `workflow:{event_id}`, `workflow:compliance:{event_id}`, `lock:{key}`,
//! `rate:tenant:{tenant}`.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Backend-agnostic key-value storage interface.
///
/// Implementations must be thread-safe and treat values as opaque bytes.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Retrieve a value by key. `Ok(None)` when missing or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value, optionally with a TTL
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Atomically store a value only when the key is absent.
    ///
    /// Returns `true` when the value was stored, `false` when the key was
    /// already present.
    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<bool>;

    /// Delete a key (no error when it does not exist)
    async fn delete(&self, key: &str) -> Result<()>;

    /// Atomically delete a key only when its current value equals
    /// `expected`. Returns `true` when the key was deleted.
    async fn delete_if_value(&self, key: &str, expected: &[u8]) -> Result<bool>;

    /// Check if a key exists and is not expired
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Atomically increment a numeric value; missing keys start at zero.
    /// Returns the value after the increment.
    async fn incr(&self, key: &str, delta: i64) -> Result<i64>;

    /// Set an expiration on an existing key. Returns `false` when the key
    /// does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Remaining time-to-live for a key, when the backend tracks one
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Health check for the backend
    async fn health_check(&self) -> Result<bool> {
        const HEALTH_KEY: &str = "__health_check__";
        self.set(HEALTH_KEY, b"ok", Some(Duration::from_secs(1))).await?;
        self.delete(HEALTH_KEY).await?;
        Ok(true)
    }
}
