//! Immutable audit record
//!
//! Who, what, when (UTC), why, correlation id. No setters are exposed;
//! an updated record is always a newly constructed one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable audit record stored append-only by an [`crate::ports::AuditSink`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Who performed the action
    pub actor: String,
    /// Owning tenant
    pub tenant_id: String,
    /// What happened, e.g. `event_created`, `model_approved`
    pub action: String,
    /// Kind of resource acted on, e.g. `event`, `model`, `workflow`
    pub resource_type: String,
    /// Identifier of the resource acted on
    pub resource_id: String,
    /// Why, if a reason was given
    pub reason: Option<String>,
    /// Request correlation id
    pub correlation_id: String,
    /// Action-specific structured context
    pub metadata: Option<serde_json::Value>,
    /// When, in UTC
    pub timestamp_utc: DateTime<Utc>,
}

impl AuditRecord {
    /// Construct a record stamped with the current UTC time
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        actor: impl Into<String>,
        tenant_id: impl Into<String>,
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        reason: Option<String>,
        correlation_id: impl Into<String>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            actor: actor.into(),
            tenant_id: tenant_id.into(),
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            reason,
            correlation_id: correlation_id.into(),
            metadata,
            timestamp_utc: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_utc_timestamp() {
        let record = AuditRecord::new(
            "workflow",
            "tenant-a",
            "decision_made",
            "workflow",
            "evt-1",
            Some("risk_decision".into()),
            "corr-1",
            None,
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["actor"], "workflow");
        assert_eq!(value["action"], "decision_made");
        // chrono serializes DateTime<Utc> as RFC 3339 / ISO-8601
        assert!(value["timestamp_utc"].as_str().unwrap().contains('T'));
    }
}
