//! Health aggregation
//!
//! Composes injected probes (cache, event store, publisher), the
//! workflow backlog, and circuit-breaker states into one serializable
//! report. A failed probe degrades the overall status; breaker state is
//! reported but does not degrade on its own (an open breaker is the
//! system protecting itself, not the system being down).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bulkhead::Bulkhead;
use crate::circuit_breaker::CircuitBreaker;
use verdict_types::error::Result;

/// A named readiness check for one dependency
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// `Ok(true)` healthy, `Ok(false)` unhealthy, `Err` unreachable
    async fn check(&self) -> Result<bool>;
}

/// Health of a single component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// `ok`, `unhealthy`, or `error`
    pub status: String,
    /// Failure detail when not `ok`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentHealth {
    fn ok() -> Self {
        Self {
            status: "ok".into(),
            detail: None,
        }
    }

    fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            status: "unhealthy".into(),
            detail: Some(detail.into()),
        }
    }

    fn error(detail: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            detail: Some(detail.into()),
        }
    }
}

/// Aggregated system health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    /// Per-component probe results
    pub components: BTreeMap<String, ComponentHealth>,
    /// Workflow submissions waiting for a bulkhead slot
    pub workflow_backlog: Option<usize>,
    /// Circuit breaker name → state
    pub circuit_breakers: BTreeMap<String, String>,
    /// `ok` or `degraded`
    pub status: String,
}

/// Composes injected probes into a [`SystemHealth`] report
#[derive(Default)]
pub struct HealthAggregator {
    probes: Vec<(String, Arc<dyn HealthProbe>)>,
    breakers: Vec<Arc<CircuitBreaker>>,
    backlog: Option<Arc<Bulkhead>>,
}

impl HealthAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named dependency probe
    pub fn with_probe(mut self, name: impl Into<String>, probe: Arc<dyn HealthProbe>) -> Self {
        self.probes.push((name.into(), probe));
        self
    }

    /// Report the state of a circuit breaker
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breakers.push(breaker);
        self
    }

    /// Report the queue depth of the workflow bulkhead
    pub fn with_backlog(mut self, bulkhead: Arc<Bulkhead>) -> Self {
        self.backlog = Some(bulkhead);
        self
    }

    /// Run all probes and aggregate
    pub async fn system_health(&self) -> SystemHealth {
        let mut components = BTreeMap::new();
        let mut degraded = false;

        for (name, probe) in &self.probes {
            let health = match probe.check().await {
                Ok(true) => ComponentHealth::ok(),
                Ok(false) => {
                    degraded = true;
                    ComponentHealth::unhealthy("probe reported unhealthy")
                }
                Err(e) => {
                    degraded = true;
                    ComponentHealth::error(e.to_string())
                }
            };
            components.insert(name.clone(), health);
        }

        let mut circuit_breakers = BTreeMap::new();
        for breaker in &self.breakers {
            circuit_breakers.insert(
                breaker.name().to_string(),
                breaker.state().await.as_str().to_string(),
            );
        }

        SystemHealth {
            components,
            workflow_backlog: self.backlog.as_ref().map(|b| b.queued()),
            circuit_breakers,
            status: if degraded { "degraded" } else { "ok" }.to_string(),
        }
    }
}
