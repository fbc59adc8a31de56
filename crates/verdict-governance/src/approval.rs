//! Approval workflow
//!
//! Human-in-the-loop gating: requests start `PENDING`, decisions come
//! only from roles the RBAC matrix grants `approve` to, and a decided
//! request is terminal. The decided record replaces the pending one but
//! preserves `request_id` and `created_at`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::audit::AuditLogger;
use verdict_security::{check_permission, Role};
use verdict_types::error::{Result, VerdictError};

/// Status of an approval request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalStatus {
    /// Awaiting a decision
    Pending,
    /// Terminal: approved
    Approved,
    /// Terminal: rejected
    Rejected,
}

/// A single approval request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Caller-supplied request identifier
    pub request_id: String,
    /// Kind of resource awaiting approval
    pub resource_type: String,
    /// Identifier of that resource
    pub resource_id: String,
    /// Who asked
    pub requested_by: String,
    /// Current status
    pub status: ApprovalStatus,
    /// When the request was created (UTC)
    pub created_at: DateTime<Utc>,
    /// Who decided, once decided
    pub decided_by: Option<String>,
    /// When the decision happened (UTC)
    pub decided_at: Option<DateTime<Utc>>,
    /// Reason attached to the request or decision
    pub reason: Option<String>,
}

/// Storage for approval requests
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Insert or replace the record for `request_id`
    async fn save(&self, request: ApprovalRequest) -> Result<()>;

    /// Fetch a request by id
    async fn get(&self, request_id: &str) -> Result<Option<ApprovalRequest>>;
}

/// In-process approval store
#[derive(Default)]
pub struct MemoryApprovalStore {
    requests: Mutex<Vec<ApprovalRequest>>,
}

impl MemoryApprovalStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApprovalStore for MemoryApprovalStore {
    async fn save(&self, request: ApprovalRequest) -> Result<()> {
        let mut requests = self.requests.lock();
        if let Some(slot) = requests.iter_mut().find(|r| r.request_id == request.request_id) {
            *slot = request;
        } else {
            requests.push(request);
        }
        Ok(())
    }

    async fn get(&self, request_id: &str) -> Result<Option<ApprovalRequest>> {
        let requests = self.requests.lock();
        Ok(requests.iter().find(|r| r.request_id == request_id).cloned())
    }
}

/// RBAC-gated approval state machine
pub struct ApprovalWorkflow {
    store: Arc<dyn ApprovalStore>,
    audit: AuditLogger,
}

impl ApprovalWorkflow {
    /// Create a workflow over a store and an audit logger
    pub fn new(store: Arc<dyn ApprovalStore>, audit: AuditLogger) -> Self {
        Self { store, audit }
    }

    /// Create a `PENDING` request. There is no auto-approve path.
    #[allow(clippy::too_many_arguments)]
    pub async fn request_approval(
        &self,
        request_id: &str,
        resource_type: &str,
        resource_id: &str,
        requested_by: &str,
        tenant_id: &str,
        correlation_id: &str,
        reason: Option<&str>,
    ) -> Result<ApprovalRequest> {
        let request = ApprovalRequest {
            request_id: request_id.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            requested_by: requested_by.to_string(),
            status: ApprovalStatus::Pending,
            created_at: Utc::now(),
            decided_by: None,
            decided_at: None,
            reason: reason.map(str::to_string),
        };
        self.store.save(request.clone()).await?;
        self.audit
            .log_action(
                requested_by,
                tenant_id,
                "approval_requested",
                resource_type,
                resource_id,
                reason,
                correlation_id,
                Some(serde_json::json!({"request_id": request_id})),
            )
            .await?;
        Ok(request)
    }

    /// Approve a pending request. The decider's role must carry the
    /// `approve` permission.
    #[allow(clippy::too_many_arguments)]
    pub async fn approve(
        &self,
        request_id: &str,
        approver_role: Role,
        approver_id: &str,
        tenant_id: &str,
        correlation_id: &str,
        reason: Option<&str>,
    ) -> Result<ApprovalRequest> {
        self.decide(
            request_id,
            approver_role,
            approver_id,
            tenant_id,
            correlation_id,
            reason,
            ApprovalStatus::Approved,
            "approval_approved",
        )
        .await
    }

    /// Reject a pending request. Same permission as approving.
    #[allow(clippy::too_many_arguments)]
    pub async fn reject(
        &self,
        request_id: &str,
        rejector_role: Role,
        rejector_id: &str,
        tenant_id: &str,
        correlation_id: &str,
        reason: Option<&str>,
    ) -> Result<ApprovalRequest> {
        self.decide(
            request_id,
            rejector_role,
            rejector_id,
            tenant_id,
            correlation_id,
            reason,
            ApprovalStatus::Rejected,
            "approval_rejected",
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn decide(
        &self,
        request_id: &str,
        role: Role,
        decider_id: &str,
        tenant_id: &str,
        correlation_id: &str,
        reason: Option<&str>,
        status: ApprovalStatus,
        action: &str,
    ) -> Result<ApprovalRequest> {
        check_permission(role, "approve")?;
        let request = self
            .store
            .get(request_id)
            .await?
            .ok_or_else(|| VerdictError::WorkflowState(format!("Approval request not found: {request_id}")))?;
        if request.status != ApprovalStatus::Pending {
            return Err(VerdictError::WorkflowState(format!(
                "Request not pending: {request_id} (status={:?})",
                request.status
            )));
        }
        let decided = ApprovalRequest {
            status,
            decided_by: Some(decider_id.to_string()),
            decided_at: Some(Utc::now()),
            reason: reason.map(str::to_string),
            ..request
        };
        self.store.save(decided.clone()).await?;
        self.audit
            .log_action(
                decider_id,
                tenant_id,
                action,
                &decided.resource_type,
                &decided.resource_id,
                reason,
                correlation_id,
                Some(serde_json::json!({"request_id": request_id})),
            )
            .await?;
        Ok(decided)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use verdict_types::AuditSink;

    fn workflow() -> (ApprovalWorkflow, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        let workflow = ApprovalWorkflow::new(
            Arc::new(MemoryApprovalStore::new()),
            AuditLogger::new(sink.clone()),
        );
        (workflow, sink)
    }

    #[tokio::test]
    async fn request_then_approve() {
        let (workflow, sink) = workflow();
        let request = workflow
            .request_approval("req-1", "model", "risk-model@1", "alice", "tenant-a", "corr-1", None)
            .await
            .unwrap();
        assert_eq!(request.status, ApprovalStatus::Pending);

        let decided = workflow
            .approve("req-1", Role::Approver, "bob", "tenant-a", "corr-2", Some("looks good"))
            .await
            .unwrap();
        assert_eq!(decided.status, ApprovalStatus::Approved);
        assert_eq!(decided.decided_by.as_deref(), Some("bob"));
        assert_eq!(decided.request_id, request.request_id);
        assert_eq!(decided.created_at, request.created_at);

        let actions: Vec<String> = sink
            .records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.action)
            .collect();
        assert_eq!(actions, ["approval_requested", "approval_approved"]);
    }

    #[tokio::test]
    async fn viewer_cannot_decide() {
        let (workflow, _) = workflow();
        workflow
            .request_approval("req-1", "model", "m@1", "alice", "tenant-a", "corr-1", None)
            .await
            .unwrap();
        let err = workflow
            .approve("req-1", Role::Viewer, "eve", "tenant-a", "corr-2", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VerdictError::Authorization(_)));
    }

    #[tokio::test]
    async fn decided_requests_are_terminal() {
        let (workflow, _) = workflow();
        workflow
            .request_approval("req-1", "model", "m@1", "alice", "tenant-a", "corr-1", None)
            .await
            .unwrap();
        workflow
            .reject("req-1", Role::Admin, "root", "tenant-a", "corr-2", Some("nope"))
            .await
            .unwrap();
        let err = workflow
            .approve("req-1", Role::Admin, "root", "tenant-a", "corr-3", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VerdictError::WorkflowState(_)));
    }

    #[tokio::test]
    async fn deciding_unknown_request_fails() {
        let (workflow, _) = workflow();
        let err = workflow
            .approve("missing", Role::Admin, "root", "tenant-a", "corr-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VerdictError::WorkflowState(_)));
    }
}
