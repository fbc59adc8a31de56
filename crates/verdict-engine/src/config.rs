//! Typed engine configuration
//!
//! Defaults match the production contract (300 s idempotency TTL, 3600 s
//! snapshot TTL). Loading these from files or the environment is the
//! outer shell's job; the engine only consumes the typed values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-tenant rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per tenant per window
    pub requests_per_window: usize,
    /// Window length in seconds
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 100,
            window_seconds: 60,
        }
    }
}

/// Bulkhead admission control
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkheadConfig {
    /// Concurrent submissions allowed
    pub max_concurrent: usize,
    /// Submissions allowed to wait for a slot
    pub max_queued: usize,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            max_queued: 100,
        }
    }
}

/// Publisher circuit breaker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Open-state cooldown in milliseconds
    pub recovery_timeout_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_ms: 30_000,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Idempotency response cache TTL in seconds
    pub idempotency_ttl_secs: u64,
    /// Workflow dispatch lock TTL in seconds
    pub workflow_lock_ttl_secs: u64,
    /// Worker shards for tenant partitioning
    pub num_partitions: u64,
    /// Per-tenant rate limiting
    pub rate_limit: RateLimitConfig,
    /// Bulkhead admission control
    pub bulkhead: BulkheadConfig,
    /// Publisher circuit breaker
    pub breaker: BreakerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idempotency_ttl_secs: 300,
            workflow_lock_ttl_secs: 60,
            num_partitions: 16,
            rate_limit: RateLimitConfig::default(),
            bulkhead: BulkheadConfig::default(),
            breaker: BreakerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Idempotency TTL as a [`Duration`]
    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_ttl_secs)
    }

    /// Workflow lock TTL as a [`Duration`]
    pub fn workflow_lock_ttl(&self) -> Duration {
        Duration::from_secs(self.workflow_lock_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_contract() {
        let config = EngineConfig::default();
        assert_eq!(config.idempotency_ttl(), Duration::from_secs(300));
        assert_eq!(config.rate_limit.requests_per_window, 100);
        assert_eq!(config.bulkhead.max_concurrent, 10);
        assert_eq!(config.breaker.failure_threshold, 5);
    }

    #[test]
    fn deserializes_from_json() {
        let config: EngineConfig = serde_json::from_str(
            r#"{
                "idempotency_ttl_secs": 120,
                "workflow_lock_ttl_secs": 30,
                "num_partitions": 4,
                "rate_limit": {"requests_per_window": 5, "window_seconds": 10},
                "bulkhead": {"max_concurrent": 2, "max_queued": 3},
                "breaker": {"failure_threshold": 3, "recovery_timeout_ms": 50}
            }"#,
        )
        .unwrap();
        assert_eq!(config.num_partitions, 4);
        assert_eq!(config.breaker.recovery_timeout_ms, 50);
    }
}
