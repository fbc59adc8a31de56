//! Workflow state snapshot store
//!
//! Serialized final states keyed `workflow:{event_id}` (risk) and
//! `workflow:compliance:{event_id}` (compliance) with a one-hour TTL.
//! Written only by the runtime on completion; the presence of a snapshot
//! is the workflow's idempotency gate.

use std::sync::Arc;
use std::time::Duration;

use verdict_types::error::Result;
use verdict_types::ports::CacheStorage;

use crate::state::{ComplianceState, RiskState};

/// Snapshot TTL: one hour
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(3_600);

const KEY_PREFIX: &str = "workflow";

/// Snapshot storage over the key-value port
pub struct WorkflowStateStore {
    cache: Arc<dyn CacheStorage>,
    ttl: Duration,
}

impl WorkflowStateStore {
    /// Create a store with the standard one-hour TTL
    pub fn new(cache: Arc<dyn CacheStorage>) -> Self {
        Self {
            cache,
            ttl: SNAPSHOT_TTL,
        }
    }

    /// Create a store with a custom TTL (tests)
    pub fn with_ttl(cache: Arc<dyn CacheStorage>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    fn risk_key(event_id: &str) -> String {
        format!("{KEY_PREFIX}:{event_id}")
    }

    fn compliance_key(event_id: &str) -> String {
        format!("{KEY_PREFIX}:compliance:{event_id}")
    }

    /// Cached risk state for an event, if a run already completed
    pub async fn get_risk_state(&self, event_id: &str) -> Result<Option<RiskState>> {
        match self.cache.get(&Self::risk_key(event_id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Snapshot a completed risk state
    pub async fn set_risk_state(&self, event_id: &str, state: &RiskState) -> Result<()> {
        let bytes = serde_json::to_vec(state)?;
        self.cache.set(&Self::risk_key(event_id), &bytes, Some(self.ttl)).await
    }

    /// Cached compliance state for an event, if a run already completed
    pub async fn get_compliance_state(&self, event_id: &str) -> Result<Option<ComplianceState>> {
        match self.cache.get(&Self::compliance_key(event_id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Snapshot a completed compliance state
    pub async fn set_compliance_state(&self, event_id: &str, state: &ComplianceState) -> Result<()> {
        let bytes = serde_json::to_vec(state)?;
        self.cache
            .set(&Self::compliance_key(event_id), &bytes, Some(self.ttl))
            .await
    }
}
