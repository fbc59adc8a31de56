//! # Verdict Reliability
//!
//! The scalability and resilience substrate protecting the governed
//! event-processing engine: circuit breaker, bulkhead, distributed lock,
//! per-tenant rate limiter, tenant partitioner, autoscaling policy, and
//! the health aggregator.
//!
//! Everything here is backend-agnostic: the distributed lock and rate
//! limiter run over the [`verdict_types::CacheStorage`] port, and the
//! health aggregator composes injected probes. No globals.

pub mod autoscale;
pub mod bulkhead;
pub mod circuit_breaker;
pub mod health;
pub mod lock;
pub mod partition;
pub mod rate_limit;

pub use autoscale::{AutoscalingPolicy, MetricsSnapshot, ScalingAction, ScalingDecision};
pub use bulkhead::Bulkhead;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, Clock, SystemClock};
pub use health::{ComponentHealth, HealthAggregator, HealthProbe, SystemHealth};
pub use lock::DistributedLock;
pub use partition::WorkloadPartitioner;
pub use rate_limit::{MemoryRateLimitWindow, RateLimitWindow, TenantRateLimiter};
