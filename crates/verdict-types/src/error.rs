//! Error types for the Verdict service
//!
//! A single unified error enum keeps the taxonomy in one place: the
//! failure classifier, the ingress status mapping, and the retry policy
//! all branch on these variants.

use thiserror::Error;

use crate::event::EventStatus;

/// Result type alias using [`VerdictError`]
pub type Result<T> = std::result::Result<T, VerdictError>;

/// Main error type for Verdict operations
#[derive(Error, Debug)]
pub enum VerdictError {
    /// Malformed request surface: missing or empty mandatory headers
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Domain validation failed (client must fix the payload)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Tenant identifier is missing or empty
    #[error("Invalid tenant: {0}")]
    InvalidTenant(String),

    /// Event metadata violates domain rules
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Risk score outside the allowed bounds
    #[error("risk_score must be between 0 and 100, got {score}")]
    RiskThreshold {
        /// The offending score
        score: f64,
    },

    /// Event status transition not allowed by the lifecycle graph
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status
        from: EventStatus,
        /// Requested status
        to: EventStatus,
    },

    /// Role does not have permission for the action
    #[error("Authorization denied: {0}")]
    Authorization(String),

    /// Cross-tenant access attempt
    #[error("Tenant isolation violated: {0}")]
    TenantIsolation(String),

    /// Encryption or decryption failure (missing key, wrong key, corrupt data)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Attempt to deploy or use a model that is not approved
    #[error("Model not approved: {0}")]
    ModelNotApproved(String),

    /// Model registry state transition not allowed (e.g. approve twice)
    #[error("Invalid model state: {0}")]
    InvalidModelState(String),

    /// Approval or workflow state transition not allowed
    #[error("Workflow state error: {0}")]
    WorkflowState(String),

    /// Idempotency state is inconsistent
    #[error("Idempotency conflict: {0}")]
    IdempotencyConflict(String),

    /// Broker unreachable or publish rejected; retryable
    #[error("Messaging failure: {0}")]
    Messaging(String),

    /// Key-value store operation failed
    #[error("Cache operation failed: {0}")]
    Cache(String),

    /// Event store operation failed
    #[error("Storage operation failed: {0}")]
    Storage(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded for a tenant
    #[error("Rate limit exceeded for tenant: {tenant_id}")]
    RateLimitExceeded {
        /// Tenant identifier
        tenant_id: String,
    },

    /// Circuit breaker rejected the call without invoking the dependency
    #[error("Circuit breaker open: {0}")]
    CircuitOpen(String),

    /// Bulkhead concurrency and queue capacity exhausted
    #[error("Bulkhead rejected submission: {0}")]
    BulkheadFull(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error from anyhow for interoperability
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VerdictError {
    /// Check if the error is retryable by the caller with the same
    /// idempotency key
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VerdictError::Messaging(_) | VerdictError::Cache(_) | VerdictError::CircuitOpen(_)
        )
    }

    /// Check if the error is a client error (the request must change
    /// before a retry can succeed)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VerdictError::BadRequest(_)
                | VerdictError::Validation(_)
                | VerdictError::InvalidTenant(_)
                | VerdictError::InvalidMetadata(_)
                | VerdictError::RiskThreshold { .. }
                | VerdictError::NotFound(_)
        )
    }

    /// Status code surfaced to the HTTP collaborator.
    ///
    /// Only the codes named by the ingress contract are produced here;
    /// everything unmapped is a 500.
    pub fn ingress_status(&self) -> u16 {
        match self {
            VerdictError::BadRequest(_) => 400,
            VerdictError::NotFound(_) => 404,
            VerdictError::Validation(_)
            | VerdictError::InvalidTenant(_)
            | VerdictError::InvalidMetadata(_)
            | VerdictError::RiskThreshold { .. }
            | VerdictError::InvalidStatusTransition { .. } => 422,
            VerdictError::Messaging(_) => 503,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(VerdictError::Messaging("down".into()).is_retryable());
        assert!(VerdictError::CircuitOpen("publisher".into()).is_retryable());
        assert!(!VerdictError::Validation("bad".into()).is_retryable());
    }

    #[test]
    fn client_errors() {
        assert!(VerdictError::InvalidTenant("empty".into()).is_client_error());
        assert!(VerdictError::NotFound("event".into()).is_client_error());
        assert!(!VerdictError::Messaging("down".into()).is_client_error());
    }

    #[test]
    fn ingress_status_mapping() {
        assert_eq!(VerdictError::BadRequest("no header".into()).ingress_status(), 400);
        assert_eq!(VerdictError::NotFound("event".into()).ingress_status(), 404);
        assert_eq!(VerdictError::RiskThreshold { score: 120.0 }.ingress_status(), 422);
        assert_eq!(VerdictError::Messaging("down".into()).ingress_status(), 503);
        assert_eq!(
            VerdictError::TenantIsolation("mismatch".into()).ingress_status(),
            500
        );
    }
}
