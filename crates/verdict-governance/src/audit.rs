//! Audit logging
//!
//! [`AuditLogger`] stamps and writes immutable [`AuditRecord`]s through
//! the [`AuditSink`] port. [`MemoryAuditSink`] is the in-process
//! append-only store; records are cloned out, never handed back by
//! mutable reference.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use verdict_types::audit::AuditRecord;
use verdict_types::error::Result;
use verdict_types::ports::AuditSink;

/// Writes immutable audit records via a sink.
///
/// Every record carries who, what, when (UTC), why, and the correlation
/// id.
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
}

impl AuditLogger {
    /// Create a logger over the given sink
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Construct and append one audit record stamped with the current
    /// UTC time
    #[allow(clippy::too_many_arguments)]
    pub async fn log_action(
        &self,
        actor: &str,
        tenant_id: &str,
        action: &str,
        resource_type: &str,
        resource_id: &str,
        reason: Option<&str>,
        correlation_id: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<()> {
        debug!(actor, tenant_id, action, resource_id, correlation_id, "audit");
        let record = AuditRecord::new(
            actor,
            tenant_id,
            action,
            resource_type,
            resource_id,
            reason.map(str::to_string),
            correlation_id,
            metadata,
        );
        self.sink.append(record).await
    }
}

/// In-process append-only audit store
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, record: AuditRecord) -> Result<()> {
        self.records.lock().push(record);
        Ok(())
    }

    async fn records(&self) -> Result<Vec<AuditRecord>> {
        Ok(self.records.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn appends_in_order() {
        let sink = Arc::new(MemoryAuditSink::new());
        let logger = AuditLogger::new(sink.clone());
        logger
            .log_action("workflow", "tenant-a", "context_retrieved", "workflow", "evt-1", None, "corr-1", None)
            .await
            .unwrap();
        logger
            .log_action(
                "workflow",
                "tenant-a",
                "decision_made",
                "workflow",
                "evt-1",
                Some("risk_decision"),
                "corr-1",
                Some(json!({"final_decision": "APPROVED"})),
            )
            .await
            .unwrap();

        let records = sink.records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action, "context_retrieved");
        assert_eq!(records[1].action, "decision_made");
        assert_eq!(records[1].reason.as_deref(), Some("risk_decision"));
    }
}
