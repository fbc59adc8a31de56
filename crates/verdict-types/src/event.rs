//! Domain model for events
//!
//! Pure business semantics: lifecycle status with a validated transition
//! graph, the risk/compliance variant payloads, and the wire-level shapes
//! the engine persists and publishes. All timestamps are UTC; all enum
//! statuses serialize lowercase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VerdictError};

/// Lifecycle status for domain events. Transitions are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Persisted at the ingestion boundary; first stored state
    Received,
    /// Created but not yet persisted by the ingestion transaction
    Created,
    /// Passed domain validation
    Validated,
    /// Workflow in flight
    Processing,
    /// Terminal: workflow approved
    Approved,
    /// Terminal: workflow rejected
    Rejected,
    /// Terminal: workflow failed
    Failed,
}

impl EventStatus {
    /// Lowercase wire name, identical to the serde representation
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Received => "received",
            EventStatus::Created => "created",
            EventStatus::Validated => "validated",
            EventStatus::Processing => "processing",
            EventStatus::Approved => "approved",
            EventStatus::Rejected => "rejected",
            EventStatus::Failed => "failed",
        }
    }

    /// True if the lifecycle graph allows moving from `self` to `next`.
    ///
    /// Terminal states (`approved`, `rejected`, `failed`) have no outgoing
    /// edges.
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        use EventStatus::*;
        match self {
            Received | Created => matches!(next, Validated | Rejected),
            Validated => matches!(next, Processing),
            Processing => matches!(next, Approved | Rejected | Failed),
            Approved | Rejected | Failed => false,
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant-specific payload, discriminated by `event_type` on the wire
/// (`RiskEvent` / `ComplianceEvent`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum EventKind {
    /// Risk-related event
    #[serde(rename = "RiskEvent")]
    Risk {
        /// Optional score in `[0, 100]`
        risk_score: Option<f64>,
        /// Free-form category, e.g. `"fraud"`
        category: Option<String>,
    },
    /// Compliance-related event
    #[serde(rename = "ComplianceEvent")]
    Compliance {
        /// Reference to the regulation driving the event
        regulation_ref: Option<String>,
        /// Compliance classification
        compliance_type: Option<String>,
    },
}

impl EventKind {
    /// Wire discriminator (`RiskEvent` / `ComplianceEvent`)
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::Risk { .. } => "RiskEvent",
            EventKind::Compliance { .. } => "ComplianceEvent",
        }
    }

    /// Topic routing key used when broadcasting the created event
    pub fn routing_key(&self) -> &'static str {
        match self {
            EventKind::Risk { .. } => "risk.created",
            EventKind::Compliance { .. } => "compliance.created",
        }
    }
}

/// An event as submitted by a caller, before the ingestion transaction
/// assigns identity and persists it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    /// Owning tenant; must be non-empty
    pub tenant_id: String,
    /// JSON-object metadata; may be absent
    pub metadata: Option<serde_json::Value>,
    /// Schema version supplied by the caller; must be non-empty
    pub version: String,
    /// Variant payload
    #[serde(flatten)]
    pub kind: EventKind,
}

/// A persisted event. Identity is `(tenant_id, event_id)`; status must be
/// changed only through [`EventRecord::transition_to`] to enforce the
/// lifecycle rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique event identifier (UUID v4)
    pub event_id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Request correlation id carried from ingress
    pub correlation_id: String,
    /// Lifecycle status; `received` at the ingestion boundary
    pub status: EventStatus,
    /// UTC creation timestamp
    pub created_at: DateTime<Utc>,
    /// JSON-object metadata; may be absent
    pub metadata: Option<serde_json::Value>,
    /// Schema version supplied by the caller
    pub version: String,
    /// Variant payload
    #[serde(flatten)]
    pub kind: EventKind,
}

impl EventRecord {
    /// Materialize a draft with a fresh event id, status `received`, and
    /// the given correlation id
    pub fn from_draft(draft: EventDraft, correlation_id: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            tenant_id: draft.tenant_id,
            correlation_id: correlation_id.into(),
            status: EventStatus::Received,
            created_at: Utc::now(),
            metadata: draft.metadata,
            version: draft.version,
            kind: draft.kind,
        }
    }

    /// Transition to a new status if the lifecycle graph allows it
    pub fn transition_to(&mut self, next: EventStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(VerdictError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Response returned by the ingestion transaction and cached under the
/// idempotency key. A replayed submission returns this byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResponse {
    /// Unique event identifier
    pub event_id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Lifecycle status at response time
    pub status: EventStatus,
    /// UTC creation timestamp
    pub created_at: DateTime<Utc>,
    /// JSON-object metadata; may be absent
    pub metadata: Option<serde_json::Value>,
    /// Schema version supplied by the caller
    pub version: String,
}

impl From<&EventRecord> for EventResponse {
    fn from(record: &EventRecord) -> Self {
        Self {
            event_id: record.event_id.clone(),
            tenant_id: record.tenant_id.clone(),
            status: record.status,
            created_at: record.created_at,
            metadata: record.metadata.clone(),
            version: record.version.clone(),
        }
    }
}

/// Payload broadcast on the topic bus when an event is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedMessage {
    /// Unique event identifier
    pub event_id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Request correlation id
    pub correlation_id: String,
    /// Wire discriminator (`RiskEvent` / `ComplianceEvent`)
    pub event_type: String,
    /// Lifecycle status at publish time (lowercase)
    pub status: EventStatus,
}

impl PublishedMessage {
    /// Build the broadcast payload for a freshly persisted event
    pub fn for_event(record: &EventRecord) -> Self {
        Self {
            event_id: record.event_id.clone(),
            tenant_id: record.tenant_id.clone(),
            correlation_id: record.correlation_id.clone(),
            event_type: record.kind.type_name().to_string(),
            status: record.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk_draft() -> EventDraft {
        EventDraft {
            tenant_id: "tenant-a".into(),
            metadata: None,
            version: "1.0".into(),
            kind: EventKind::Risk {
                risk_score: Some(40.0),
                category: Some("fraud".into()),
            },
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&EventStatus::Received).unwrap();
        assert_eq!(json, "\"received\"");
    }

    #[test]
    fn kind_discriminator_on_wire() {
        let record = EventRecord::from_draft(risk_draft(), "corr-1");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["event_type"], "RiskEvent");
        assert_eq!(value["status"], "received");
        assert_eq!(value["risk_score"], 40.0);
    }

    #[test]
    fn record_round_trips() {
        let record = EventRecord::from_draft(risk_draft(), "corr-1");
        let json = serde_json::to_string(&record).unwrap();
        let back: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_id, record.event_id);
        assert_eq!(back.kind, record.kind);
    }

    #[test]
    fn allowed_transitions() {
        let mut record = EventRecord::from_draft(risk_draft(), "corr-1");
        record.transition_to(EventStatus::Validated).unwrap();
        record.transition_to(EventStatus::Processing).unwrap();
        record.transition_to(EventStatus::Approved).unwrap();
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        let mut record = EventRecord::from_draft(risk_draft(), "corr-1");
        record.transition_to(EventStatus::Rejected).unwrap();
        let err = record.transition_to(EventStatus::Validated).unwrap_err();
        assert!(matches!(err, VerdictError::InvalidStatusTransition { .. }));
    }

    #[test]
    fn skipping_validation_is_rejected() {
        let mut record = EventRecord::from_draft(risk_draft(), "corr-1");
        assert!(record.transition_to(EventStatus::Processing).is_err());
        assert_eq!(record.status, EventStatus::Received);
    }

    #[test]
    fn routing_keys() {
        assert_eq!(risk_draft().kind.routing_key(), "risk.created");
        let compliance = EventKind::Compliance {
            regulation_ref: Some("SOX-404".into()),
            compliance_type: None,
        };
        assert_eq!(compliance.routing_key(), "compliance.created");
    }
}
