//! Workflow dispatch
//!
//! Implements the [`WorkflowTrigger`] port: loads the persisted event,
//! builds the matching workflow state, and runs the risk or compliance
//! pipeline under the `workflow:{event_id}` distributed lock so two
//! processes cannot double-execute one event. The lock is released on
//! every exit path; its TTL is the hard upper bound either way.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use verdict_reliability::DistributedLock;
use verdict_types::error::{Result, VerdictError};
use verdict_types::event::{EventKind, EventRecord};
use verdict_types::ports::{EventRepository, WorkflowTrigger};
use verdict_workflow::{ComplianceState, ComplianceWorkflow, RiskState, RiskWorkflow};

/// Dispatches persisted events into the matching workflow
pub struct WorkflowDispatcher {
    repository: Arc<dyn EventRepository>,
    risk_workflow: Arc<RiskWorkflow>,
    compliance_workflow: Arc<ComplianceWorkflow>,
    lock: Arc<DistributedLock>,
    lock_ttl: Duration,
}

impl WorkflowDispatcher {
    /// Wire the dispatcher against the store, the two workflows, and the
    /// distributed lock
    pub fn new(
        repository: Arc<dyn EventRepository>,
        risk_workflow: Arc<RiskWorkflow>,
        compliance_workflow: Arc<ComplianceWorkflow>,
        lock: Arc<DistributedLock>,
        lock_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            risk_workflow,
            compliance_workflow,
            lock,
            lock_ttl,
        }
    }

    /// The workflow input: the classification `event_type` carried in the
    /// event metadata (defaulting to `standard`) plus the metadata itself
    fn raw_event(record: &EventRecord) -> serde_json::Value {
        let event_type = record
            .metadata
            .as_ref()
            .and_then(|m| m.get("event_type"))
            .and_then(|v| v.as_str())
            .unwrap_or("standard");
        json!({
            "event_type": event_type,
            "metadata": record.metadata.clone().unwrap_or_else(|| json!({})),
        })
    }

    fn regulatory_flags(record: &EventRecord) -> Vec<String> {
        record
            .metadata
            .as_ref()
            .and_then(|m| m.get("regulatory_flags"))
            .and_then(|v| v.as_array())
            .map(|flags| {
                flags
                    .iter()
                    .filter_map(|f| f.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn run_locked(&self, record: &EventRecord) -> Result<()> {
        let lock_key = format!("workflow:{}", record.event_id);
        if !self.lock.acquire(&lock_key, self.lock_ttl).await? {
            info!(event_id = %record.event_id, "workflow already running elsewhere, skipping");
            return Ok(());
        }

        let outcome = match &record.kind {
            EventKind::Risk { .. } => {
                let state = RiskState::new(
                    record.event_id.clone(),
                    record.tenant_id.clone(),
                    record.correlation_id.clone(),
                    Self::raw_event(record),
                );
                self.risk_workflow.run(state).await.map(|_| ())
            }
            EventKind::Compliance { .. } => {
                let mut state = ComplianceState::new(
                    record.event_id.clone(),
                    record.tenant_id.clone(),
                    record.correlation_id.clone(),
                    Self::raw_event(record),
                );
                state.regulatory_flags = Self::regulatory_flags(record);
                self.compliance_workflow.run(state).await.map(|_| ())
            }
        };

        // Release on success and failure alike; the TTL only backstops a
        // crashed holder
        self.lock.release(&lock_key).await?;
        outcome
    }
}

#[async_trait]
impl WorkflowTrigger for WorkflowDispatcher {
    async fn start(&self, event_id: &str, tenant_id: &str) -> Result<()> {
        debug!(event_id, tenant_id, "workflow dispatch");
        let record = self
            .repository
            .get(tenant_id, event_id)
            .await?
            .ok_or_else(|| VerdictError::NotFound(format!("Event not found: {event_id}")))?;
        self.run_locked(&record).await
    }
}
