//! Workflow state containers
//!
//! Fully serializable so a snapshot can round-trip through the state
//! store. Transitions never mutate the input state; nodes clone, update,
//! and return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use verdict_monitoring::EvaluationResult;

/// Node identifiers in execution order
pub const NODE_ORDER: [&str; 5] = [
    "retrieval",
    "policy_validation",
    "risk_scoring",
    "guardrails",
    "decision",
];

/// Outcome of the policy-validation node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyResult {
    /// No policy rule fired
    #[serde(rename = "PASS")]
    Pass,
    /// A policy rule fired
    #[serde(rename = "FAIL")]
    Fail,
}

impl PolicyResult {
    /// Uppercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyResult::Pass => "PASS",
            PolicyResult::Fail => "FAIL",
        }
    }
}

/// Outcome of the guardrails node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardrailResult {
    /// No guardrail fired
    #[serde(rename = "OK")]
    Ok,
    /// A guardrail fired
    #[serde(rename = "VIOLATION")]
    Violation,
}

impl GuardrailResult {
    /// Uppercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            GuardrailResult::Ok => "OK",
            GuardrailResult::Violation => "VIOLATION",
        }
    }
}

/// Final workflow decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Automatically approved
    #[serde(rename = "APPROVED")]
    Approved,
    /// Escalated to a human approver
    #[serde(rename = "REQUIRE_APPROVAL")]
    RequireApproval,
}

impl Decision {
    /// Uppercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approved => "APPROVED",
            Decision::RequireApproval => "REQUIRE_APPROVAL",
        }
    }
}

/// One audit-trail entry, appended by exactly one node.
///
/// The presence of an entry for a node is the runtime's resume marker:
/// that node will not run again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailEntry {
    /// Node that executed
    pub node: String,
    /// What it did, e.g. `context_retrieved`
    pub action: String,
    /// When (UTC)
    pub at: DateTime<Utc>,
    /// Model version pinned for the run
    pub model_version: String,
    /// Prompt version pinned for the run
    pub prompt_version: u32,
    /// Node execution time in milliseconds
    pub execution_ms: f64,
    /// Node output, e.g. `{"policy_result": "PASS"}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_output: Option<serde_json::Value>,
}

/// State for the risk workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    /// Event this run belongs to
    pub event_id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Request correlation id
    pub correlation_id: String,
    /// The submitted event as raw JSON (`event_type`, `metadata`, ...)
    pub raw_event: serde_json::Value,
    /// Output of the retrieval node
    pub retrieved_context: Option<String>,
    /// Output of the policy-validation node
    pub policy_result: Option<PolicyResult>,
    /// Output of the risk-scoring node
    pub risk_score: Option<f64>,
    /// Output of the guardrails node
    pub guardrail_result: Option<GuardrailResult>,
    /// Output of the decision node
    pub final_decision: Option<Decision>,
    /// Model version pinned for the run
    pub model_version: String,
    /// Prompt version pinned for the run
    pub prompt_version: u32,
    /// Append-only per-node trail; doubles as the resume marker
    pub audit_trail: Vec<TrailEntry>,
    /// Client idempotency key, when known
    pub idempotency_key: Option<String>,
    /// Quality scores attached after the run, when evaluation is wired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationResult>,
}

impl RiskState {
    /// Fresh state for an event, with built-in default versions
    pub fn new(
        event_id: impl Into<String>,
        tenant_id: impl Into<String>,
        correlation_id: impl Into<String>,
        raw_event: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            tenant_id: tenant_id.into(),
            correlation_id: correlation_id.into(),
            raw_event,
            retrieved_context: None,
            policy_result: None,
            risk_score: None,
            guardrail_result: None,
            final_decision: None,
            model_version: crate::runtime::DEFAULT_MODEL_VERSION.to_string(),
            prompt_version: crate::runtime::DEFAULT_PROMPT_VERSION,
            audit_trail: Vec::new(),
            idempotency_key: None,
            evaluation: None,
        }
    }

    /// True if the trail already contains an entry for `node`
    pub fn has_node(&self, node: &str) -> bool {
        self.audit_trail.iter().any(|e| e.node == node)
    }
}

/// State for the compliance workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceState {
    /// Event this run belongs to
    pub event_id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Request correlation id
    pub correlation_id: String,
    /// The submitted event as raw JSON
    pub raw_event: serde_json::Value,
    /// Output of the retrieval node
    pub retrieved_context: Option<String>,
    /// Output of the policy-validation node
    pub policy_result: Option<PolicyResult>,
    /// Output of the risk-scoring node
    pub risk_score: Option<f64>,
    /// Output of the guardrails node
    pub guardrail_result: Option<GuardrailResult>,
    /// Regulatory flags raised for this event; any flag escalates
    pub regulatory_flags: Vec<String>,
    /// Mirror of the escalation decision
    pub approval_required: bool,
    /// Output of the decision node
    pub final_decision: Option<Decision>,
    /// Model version pinned for the run
    pub model_version: String,
    /// Prompt version pinned for the run
    pub prompt_version: u32,
    /// Append-only per-node trail; doubles as the resume marker
    pub audit_trail: Vec<TrailEntry>,
    /// Client idempotency key, when known
    pub idempotency_key: Option<String>,
    /// Quality scores attached after the run, when evaluation is wired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationResult>,
}

impl ComplianceState {
    /// Fresh state for an event, with built-in default versions
    pub fn new(
        event_id: impl Into<String>,
        tenant_id: impl Into<String>,
        correlation_id: impl Into<String>,
        raw_event: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            tenant_id: tenant_id.into(),
            correlation_id: correlation_id.into(),
            raw_event,
            retrieved_context: None,
            policy_result: None,
            risk_score: None,
            guardrail_result: None,
            regulatory_flags: Vec::new(),
            approval_required: false,
            final_decision: None,
            model_version: crate::runtime::DEFAULT_MODEL_VERSION.to_string(),
            prompt_version: crate::runtime::DEFAULT_PROMPT_VERSION,
            audit_trail: Vec::new(),
            idempotency_key: None,
            evaluation: None,
        }
    }

    /// True if the trail already contains an entry for `node`
    pub fn has_node(&self, node: &str) -> bool {
        self.audit_trail.iter().any(|e| e.node == node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enums_use_uppercase_wire_names() {
        assert_eq!(serde_json::to_string(&PolicyResult::Fail).unwrap(), "\"FAIL\"");
        assert_eq!(serde_json::to_string(&GuardrailResult::Ok).unwrap(), "\"OK\"");
        assert_eq!(
            serde_json::to_string(&Decision::RequireApproval).unwrap(),
            "\"REQUIRE_APPROVAL\""
        );
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = RiskState::new("evt-1", "tenant-a", "corr-1", json!({"event_type": "standard"}));
        state.policy_result = Some(PolicyResult::Pass);
        state.audit_trail.push(TrailEntry {
            node: "policy_validation".into(),
            action: "policy_validated".into(),
            at: Utc::now(),
            model_version: state.model_version.clone(),
            prompt_version: state.prompt_version,
            execution_ms: 0.1,
            stage_output: Some(json!({"policy_result": "PASS"})),
        });

        let bytes = serde_json::to_vec(&state).unwrap();
        let back: RiskState = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, state);
        assert!(back.has_node("policy_validation"));
        assert!(!back.has_node("decision"));
    }
}
