//! # Verdict Governance
//!
//! Governance primitives the workflow depends on for version pinning and
//! human-in-the-loop gating: the immutable audit trail, the model
//! registry (approval-gated deployment), the prompt registry (monotonic
//! immutable versions), and the RBAC-gated approval workflow.
//!
//! Every mutation in this crate emits an audit record.

pub mod approval;
pub mod audit;
pub mod model_registry;
pub mod prompt_registry;

pub use approval::{ApprovalRequest, ApprovalStatus, ApprovalStore, ApprovalWorkflow, MemoryApprovalStore};
pub use audit::{AuditLogger, MemoryAuditSink};
pub use model_registry::{MemoryModelStore, ModelRecord, ModelRegistry, ModelRegistryStore, ModelStatus};
pub use prompt_registry::{MemoryPromptStore, PromptRecord, PromptRegistry, PromptStore};
