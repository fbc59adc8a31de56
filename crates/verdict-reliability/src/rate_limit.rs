//! Per-tenant sliding-window rate limiter
//!
//! Every check appends the current instant to the tenant's window, evicts
//! entries older than the cutoff, and compares the window size to the
//! limit. The window backend is a trait so a shared store can hold the
//! windows when limiting must span processes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use verdict_types::error::{Result, VerdictError};

const KEY_PREFIX: &str = "rate:tenant:";

/// Backend holding sliding windows of request timestamps
#[async_trait]
pub trait RateLimitWindow: Send + Sync {
    /// Append "now" to the window for `key`, evict entries older than
    /// `window`, and return the resulting window size
    async fn incr_window(&self, key: &str, window: Duration) -> Result<usize>;

    /// Current window size without recording a request
    async fn current(&self, key: &str) -> Result<usize>;
}

/// Single-process window backend
#[derive(Default)]
pub struct MemoryRateLimitWindow {
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl MemoryRateLimitWindow {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitWindow for MemoryRateLimitWindow {
    async fn incr_window(&self, key: &str, window: Duration) -> Result<usize> {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let entries = windows.entry(key.to_string()).or_default();
        entries.retain(|t| now.duration_since(*t) < window);
        entries.push(now);
        Ok(entries.len())
    }

    async fn current(&self, key: &str) -> Result<usize> {
        let windows = self.windows.lock();
        Ok(windows.get(key).map(Vec::len).unwrap_or(0))
    }
}

/// Per-tenant rate limiter over a sliding window
pub struct TenantRateLimiter {
    backend: Box<dyn RateLimitWindow>,
    requests_per_window: usize,
    window: Duration,
}

impl TenantRateLimiter {
    /// Create a limiter allowing `requests_per_window` per tenant per
    /// `window`
    pub fn new(
        backend: Box<dyn RateLimitWindow>,
        requests_per_window: usize,
        window: Duration,
    ) -> Self {
        Self {
            backend,
            requests_per_window,
            window,
        }
    }

    fn key(tenant_id: &str) -> String {
        format!("{KEY_PREFIX}{tenant_id}")
    }

    /// Record a request and report whether it is within the limit
    pub async fn allow_request(&self, tenant_id: &str) -> Result<bool> {
        let count = self
            .backend
            .incr_window(&Self::key(tenant_id), self.window)
            .await?;
        let allowed = count <= self.requests_per_window;
        if !allowed {
            debug!(tenant_id, count, limit = self.requests_per_window, "rate limit exceeded");
        }
        Ok(allowed)
    }

    /// Record a request and fail with [`VerdictError::RateLimitExceeded`]
    /// when the tenant is over its limit
    pub async fn check(&self, tenant_id: &str) -> Result<()> {
        if self.allow_request(tenant_id).await? {
            Ok(())
        } else {
            Err(VerdictError::RateLimitExceeded {
                tenant_id: tenant_id.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(limit: usize, window: Duration) -> TenantRateLimiter {
        TenantRateLimiter::new(Box::new(MemoryRateLimitWindow::new()), limit, window)
    }

    #[tokio::test]
    async fn allows_up_to_the_limit() {
        let limiter = limiter(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.allow_request("tenant-a").await.unwrap());
        }
        assert!(!limiter.allow_request("tenant-a").await.unwrap());
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let limiter = limiter(1, Duration::from_secs(60));
        assert!(limiter.allow_request("tenant-a").await.unwrap());
        assert!(!limiter.allow_request("tenant-a").await.unwrap());
        assert!(limiter.allow_request("tenant-b").await.unwrap());
    }

    #[tokio::test]
    async fn window_slides() {
        let limiter = limiter(1, Duration::from_millis(50));
        assert!(limiter.allow_request("tenant-a").await.unwrap());
        assert!(!limiter.allow_request("tenant-a").await.unwrap());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(limiter.allow_request("tenant-a").await.unwrap());
    }

    #[tokio::test]
    async fn check_surfaces_typed_error() {
        let limiter = limiter(1, Duration::from_secs(60));
        limiter.check("tenant-a").await.unwrap();
        let err = limiter.check("tenant-a").await.unwrap_err();
        assert!(matches!(err, VerdictError::RateLimitExceeded { tenant_id } if tenant_id == "tenant-a"));
    }
}
