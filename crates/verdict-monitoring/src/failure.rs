//! Failure classification
//!
//! Maps every [`VerdictError`] variant to exactly one taxonomy category
//! for metrics (`failure_count{category}`) and audits. Unknown shapes go
//! to `UNEXPECTED_ERROR`.

use serde::{Deserialize, Serialize};

use verdict_types::error::VerdictError;

/// Failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureCategory {
    /// Input violates a domain rule; client fix required
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// RBAC denial, tenant isolation breach, unapproved model use
    #[serde(rename = "POLICY_VIOLATION")]
    PolicyViolation,
    /// Risk threshold breach; distinct class, not retryable
    #[serde(rename = "HIGH_RISK")]
    HighRisk,
    /// Idempotency conflict or workflow state transition error
    #[serde(rename = "WORKFLOW_ERROR")]
    Workflow,
    /// Encryption setup, serialization, storage plumbing
    #[serde(rename = "INFRA_ERROR")]
    Infra,
    /// Broker unreachable or publish rejected; retryable
    #[serde(rename = "MESSAGING_ERROR")]
    Messaging,
    /// Anything unclassified
    #[serde(rename = "UNEXPECTED_ERROR")]
    Unexpected,
}

impl FailureCategory {
    /// Uppercase wire name, identical to the serde representation
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCategory::Validation => "VALIDATION_ERROR",
            FailureCategory::PolicyViolation => "POLICY_VIOLATION",
            FailureCategory::HighRisk => "HIGH_RISK",
            FailureCategory::Workflow => "WORKFLOW_ERROR",
            FailureCategory::Infra => "INFRA_ERROR",
            FailureCategory::Messaging => "MESSAGING_ERROR",
            FailureCategory::Unexpected => "UNEXPECTED_ERROR",
        }
    }
}

/// Map an error to its taxonomy category
pub fn classify(error: &VerdictError) -> FailureCategory {
    match error {
        VerdictError::BadRequest(_)
        | VerdictError::Validation(_)
        | VerdictError::InvalidTenant(_)
        | VerdictError::InvalidMetadata(_)
        | VerdictError::NotFound(_) => FailureCategory::Validation,
        VerdictError::RiskThreshold { .. } => FailureCategory::HighRisk,
        VerdictError::Authorization(_)
        | VerdictError::TenantIsolation(_)
        | VerdictError::ModelNotApproved(_)
        | VerdictError::InvalidModelState(_) => FailureCategory::PolicyViolation,
        VerdictError::InvalidStatusTransition { .. }
        | VerdictError::WorkflowState(_)
        | VerdictError::IdempotencyConflict(_) => FailureCategory::Workflow,
        VerdictError::Encryption(_)
        | VerdictError::Serialization(_)
        | VerdictError::Cache(_)
        | VerdictError::Storage(_)
        | VerdictError::Configuration(_)
        | VerdictError::RateLimitExceeded { .. }
        | VerdictError::BulkheadFull(_) => FailureCategory::Infra,
        VerdictError::Messaging(_) | VerdictError::CircuitOpen(_) => FailureCategory::Messaging,
        VerdictError::Other(_) => FailureCategory::Unexpected,
    }
}
