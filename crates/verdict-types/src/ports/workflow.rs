//! Workflow trigger port
//!
//! The ingestion transaction dispatches the workflow through this trait;
//! dispatch failures are audited and swallowed, because the persisted
//! event plus the published message are the authoritative artifacts and a
//! bus subscriber can re-trigger the run.

use async_trait::async_trait;

use crate::error::Result;

/// Port for starting a workflow run for a persisted event
#[async_trait]
pub trait WorkflowTrigger: Send + Sync {
    /// Start the workflow for the given event and tenant
    async fn start(&self, event_id: &str, tenant_id: &str) -> Result<()>;
}
