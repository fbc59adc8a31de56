//! Distributed lock over the key-value port
//!
//! Acquisition is an atomic set-if-absent of `lock:{key}` with a random
//! holder token and a TTL; release is an atomic compare-and-delete
//! against that token, so a holder whose TTL already expired cannot
//! delete a lock a new holder has since taken. The TTL is the absolute
//! upper bound on lock lifetime.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use verdict_types::error::Result;
use verdict_types::ports::CacheStorage;

const LOCK_PREFIX: &str = "lock:";

/// Cross-process mutual exclusion backed by [`CacheStorage`]
pub struct DistributedLock {
    backend: Arc<dyn CacheStorage>,
    tokens: DashMap<String, String>,
}

impl DistributedLock {
    /// Create a lock manager over the given backend
    pub fn new(backend: Arc<dyn CacheStorage>) -> Self {
        Self {
            backend,
            tokens: DashMap::new(),
        }
    }

    fn full_key(key: &str) -> String {
        format!("{LOCK_PREFIX}{key}")
    }

    /// Try to acquire `key` for at most `ttl`.
    ///
    /// Returns `true` when acquired, `false` when another holder has it.
    pub async fn acquire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let token = Uuid::new_v4().to_string();
        let acquired = self
            .backend
            .set_if_absent(&Self::full_key(key), token.as_bytes(), Some(ttl))
            .await?;
        if acquired {
            debug!(lock = %key, "acquired");
            self.tokens.insert(key.to_string(), token);
        }
        Ok(acquired)
    }

    /// Release `key` if this instance still holds it.
    ///
    /// A no-op when the lock expired and was re-acquired elsewhere.
    pub async fn release(&self, key: &str) -> Result<()> {
        if let Some((_, token)) = self.tokens.remove(key) {
            let released = self
                .backend
                .delete_if_value(&Self::full_key(key), token.as_bytes())
                .await?;
            debug!(lock = %key, released, "release");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_cache::MemoryCacheStorage;

    fn lock_pair() -> (DistributedLock, DistributedLock) {
        let backend: Arc<dyn CacheStorage> = Arc::new(MemoryCacheStorage::new());
        (
            DistributedLock::new(backend.clone()),
            DistributedLock::new(backend),
        )
    }

    #[tokio::test]
    async fn acquire_is_exclusive() {
        let (holder, contender) = lock_pair();
        assert!(holder.acquire("workflow:evt-1", Duration::from_secs(5)).await.unwrap());
        assert!(!contender.acquire("workflow:evt-1", Duration::from_secs(5)).await.unwrap());
    }

    #[tokio::test]
    async fn release_frees_the_key() {
        let (holder, contender) = lock_pair();
        assert!(holder.acquire("workflow:evt-1", Duration::from_secs(5)).await.unwrap());
        holder.release("workflow:evt-1").await.unwrap();
        assert!(contender.acquire("workflow:evt-1", Duration::from_secs(5)).await.unwrap());
    }

    #[tokio::test]
    async fn stale_holder_cannot_release_new_owner() {
        let (stale, fresh) = lock_pair();
        assert!(stale.acquire("job", Duration::from_millis(30)).await.unwrap());
        tokio::time::sleep(Duration::from_millis(60)).await;

        // TTL expired; a new holder takes the lock
        assert!(fresh.acquire("job", Duration::from_secs(5)).await.unwrap());

        // The stale holder's release must not remove the new lock
        stale.release("job").await.unwrap();
        assert!(!stale.acquire("job", Duration::from_secs(5)).await.unwrap());
    }

    #[tokio::test]
    async fn release_without_acquire_is_noop() {
        let (holder, _) = lock_pair();
        holder.release("never-held").await.unwrap();
    }
}
