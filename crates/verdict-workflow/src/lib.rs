//! # Verdict Workflow
//!
//! The deterministic five-stage reasoning pipeline:
//! retrieval → policy validation → risk scoring → guardrails → decision.
//!
//! States are immutable values: every node returns a *new* state with one
//! more audit-trail entry, which doubles as the resume marker — a node
//! whose entry is already present is skipped, so a partially executed
//! workflow picks up exactly where it stopped. A completed run is
//! snapshotted into the state store and replayed verbatim on the next
//! invocation for the same event.

pub mod compliance_nodes;
pub mod nodes;
pub mod runtime;
pub mod state;
pub mod store;

pub use runtime::{
    ComplianceWorkflow, ObservabilityHooks, RiskWorkflow, DEFAULT_MODEL_VERSION,
    DEFAULT_PROMPT_VERSION,
};
pub use state::{ComplianceState, Decision, GuardrailResult, PolicyResult, RiskState, TrailEntry};
pub use store::WorkflowStateStore;
