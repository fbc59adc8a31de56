//! Workflow runtime
//!
//! Orchestrates the five nodes for one event: snapshot gate, version
//! resolution against the registries, resumable sequential execution
//! (nodes already present in the audit trail are skipped), observability
//! hooks, and the final snapshot write.
//!
//! The runtime knows the observability pieces only as optional handles
//! wired in by the caller; nothing here constructs them.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use verdict_governance::{AuditLogger, ModelRegistry, PromptRegistry};
use verdict_monitoring::{
    classify, CostTracker, EvaluationService, GenerationLog, MetricsCollector, SpanGuard,
    SpanRecorder,
};
use verdict_types::error::Result;

use crate::compliance_nodes;
use crate::nodes;
use crate::state::{ComplianceState, Decision, RiskState};
use crate::store::WorkflowStateStore;

/// Built-in model version when no registry record resolves
pub const DEFAULT_MODEL_VERSION: &str = "simulated@1";
/// Built-in prompt version when no registry record resolves
pub const DEFAULT_PROMPT_VERSION: u32 = 1;

/// Fixed per-request cost attribution
const REQUEST_COST: f64 = 0.01;
/// Simulated token counts for the generation log
const SIMULATED_INPUT_TOKENS: u64 = 100;
const SIMULATED_OUTPUT_TOKENS: u64 = 50;

/// Optional observability handles wired in by the caller
#[derive(Default, Clone)]
pub struct ObservabilityHooks {
    /// Counter/histogram registry
    pub metrics: Option<Arc<MetricsCollector>>,
    /// Hierarchical span recorder
    pub spans: Option<Arc<SpanRecorder>>,
    /// Cost attribution ledger
    pub cost: Option<Arc<CostTracker>>,
    /// Simulated generation log
    pub generation_log: Option<Arc<GenerationLog>>,
    /// Decision quality scoring
    pub evaluation: Option<Arc<EvaluationService>>,
}

impl ObservabilityHooks {
    fn on_entry(&self, tenant_id: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.increment_labeled("request_count", "tenant", tenant_id);
            metrics.increment("workflow_execution_count");
        }
    }

    fn on_node_done(&self, node: &str, elapsed_ms: f64) {
        if let Some(metrics) = &self.metrics {
            metrics.observe_latency("node_execution_latency", elapsed_ms, Some(node));
            metrics.increment("model_usage_count");
            metrics.increment("prompt_usage_count");
        }
    }

    fn on_failure(&self, error: &verdict_types::VerdictError) {
        if let Some(metrics) = &self.metrics {
            metrics.increment_labeled("failure_count", "category", classify(error).as_str());
        }
    }

    fn node_span(&self, node: &str, root: Option<&SpanGuard>) -> Option<SpanGuard> {
        match (&self.spans, root) {
            (Some(spans), Some(root)) => {
                Some(spans.start_span(node, Some(&root.trace_id), Some(&root.span_id), &[]))
            }
            _ => None,
        }
    }
}

macro_rules! run_node {
    ($self:ident, $root:expr, $current:ident, $name:literal, $node_fn:path) => {
        if !$current.has_node($name) {
            let _span = $self.hooks.node_span($name, $root.as_ref());
            let node_start = Instant::now();
            $current = $node_fn(&$current, &$self.audit).await?;
            $self
                .hooks
                .on_node_done($name, node_start.elapsed().as_secs_f64() * 1000.0);
        }
    };
}

/// Orchestrated risk workflow. Idempotent: a cached snapshot for the
/// event id is returned verbatim, running no node and writing no audit.
pub struct RiskWorkflow {
    audit: AuditLogger,
    store: Option<Arc<WorkflowStateStore>>,
    model_registry: Option<Arc<ModelRegistry>>,
    prompt_registry: Option<Arc<PromptRegistry>>,
    hooks: ObservabilityHooks,
}

impl RiskWorkflow {
    /// Create a bare workflow (no snapshot store, registries, or hooks)
    pub fn new(audit: AuditLogger) -> Self {
        Self {
            audit,
            store: None,
            model_registry: None,
            prompt_registry: None,
            hooks: ObservabilityHooks::default(),
        }
    }

    /// Enable the snapshot idempotency gate
    pub fn with_store(mut self, store: Arc<WorkflowStateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Resolve versions against the governance registries
    pub fn with_registries(
        mut self,
        model_registry: Arc<ModelRegistry>,
        prompt_registry: Arc<PromptRegistry>,
    ) -> Self {
        self.model_registry = Some(model_registry);
        self.prompt_registry = Some(prompt_registry);
        self
    }

    /// Wire observability hooks
    pub fn with_hooks(mut self, hooks: ObservabilityHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Run the workflow for `state.event_id`.
    ///
    /// Nodes whose trail entry already exists are skipped, so a state
    /// carrying a partial trail resumes from where it stopped.
    pub async fn run(&self, state: RiskState) -> Result<RiskState> {
        self.hooks.on_entry(&state.tenant_id);

        if let Some(store) = &self.store {
            if let Some(cached) = store.get_risk_state(&state.event_id).await? {
                info!(
                    event_id = %state.event_id,
                    correlation_id = %state.correlation_id,
                    "workflow_idempotent_skip"
                );
                return Ok(cached);
            }
        }

        let state = self.resolve_versions(state).await;
        let request_start = Instant::now();
        let root = self.hooks.spans.as_ref().map(|spans| {
            spans.start_span(
                "risk_workflow",
                None,
                None,
                &[
                    ("tenant_id", state.tenant_id.as_str()),
                    ("correlation_id", state.correlation_id.as_str()),
                ],
            )
        });

        match self.run_nodes(state, &root).await {
            Ok(mut current) => {
                drop(root);
                self.finish(&mut current, request_start).await?;
                if let Some(store) = &self.store {
                    store.set_risk_state(&current.event_id, &current).await?;
                }
                Ok(current)
            }
            Err(e) => {
                error!(error = %e, "risk workflow node failed");
                self.hooks.on_failure(&e);
                Err(e)
            }
        }
    }

    async fn run_nodes(
        &self,
        state: RiskState,
        root: &Option<SpanGuard>,
    ) -> Result<RiskState> {
        let mut current = state;
        run_node!(self, root, current, "retrieval", nodes::retrieve_context);
        run_node!(self, root, current, "policy_validation", nodes::validate_policy);
        run_node!(self, root, current, "risk_scoring", nodes::score_risk);
        run_node!(self, root, current, "guardrails", nodes::apply_guardrails);
        run_node!(self, root, current, "decision", nodes::make_decision);
        Ok(current)
    }

    async fn resolve_versions(&self, mut state: RiskState) -> RiskState {
        if let Some(registry) = &self.model_registry {
            if let Ok(record) = registry.get_approved("risk-model", None).await {
                state.model_version = format!("{}@{}", record.model_name, record.version);
            }
        }
        if let Some(registry) = &self.prompt_registry {
            if let Ok(Some(prompt)) = registry.get_prompt("risk-prompt", None).await {
                state.prompt_version = prompt.version;
            }
        }
        state
    }

    async fn finish(&self, current: &mut RiskState, request_start: Instant) -> Result<()> {
        let latency_ms = request_start.elapsed().as_secs_f64() * 1000.0;

        if let Some(metrics) = &self.hooks.metrics {
            if current.final_decision == Some(Decision::RequireApproval) {
                metrics.increment("approval_required_count");
            }
            metrics.observe_latency("request_latency", latency_ms, None);
        }
        if let Some(cost) = &self.hooks.cost {
            cost.add_cost(
                &current.tenant_id,
                REQUEST_COST,
                Some(&current.model_version),
                Some(&current.event_id),
            );
        }
        if let Some(log) = &self.hooks.generation_log {
            log.log_generation(
                &current.event_id,
                &current.tenant_id,
                current.prompt_version,
                &current.model_version,
                SIMULATED_INPUT_TOKENS,
                SIMULATED_OUTPUT_TOKENS,
                latency_ms,
            );
        }
        if let Some(evaluation) = &self.hooks.evaluation {
            let result = evaluation
                .evaluate_decision(
                    &current.tenant_id,
                    &current.event_id,
                    &current.correlation_id,
                    current.final_decision.map(Decision::as_str).unwrap_or(""),
                    current.policy_result.map(|p| p.as_str()).unwrap_or(""),
                    current.guardrail_result.map(|g| g.as_str()).unwrap_or(""),
                    current.risk_score,
                )
                .await?;
            current.evaluation = Some(result);
        }
        Ok(())
    }
}

/// Orchestrated compliance workflow; same shape as [`RiskWorkflow`] with
/// the compliance nodes and snapshot keys
pub struct ComplianceWorkflow {
    audit: AuditLogger,
    store: Option<Arc<WorkflowStateStore>>,
    model_registry: Option<Arc<ModelRegistry>>,
    prompt_registry: Option<Arc<PromptRegistry>>,
    hooks: ObservabilityHooks,
}

impl ComplianceWorkflow {
    /// Create a bare workflow (no snapshot store, registries, or hooks)
    pub fn new(audit: AuditLogger) -> Self {
        Self {
            audit,
            store: None,
            model_registry: None,
            prompt_registry: None,
            hooks: ObservabilityHooks::default(),
        }
    }

    /// Enable the snapshot idempotency gate
    pub fn with_store(mut self, store: Arc<WorkflowStateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Resolve versions against the governance registries
    pub fn with_registries(
        mut self,
        model_registry: Arc<ModelRegistry>,
        prompt_registry: Arc<PromptRegistry>,
    ) -> Self {
        self.model_registry = Some(model_registry);
        self.prompt_registry = Some(prompt_registry);
        self
    }

    /// Wire observability hooks
    pub fn with_hooks(mut self, hooks: ObservabilityHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Run the workflow for `state.event_id`; snapshot-gated and
    /// resumable exactly like the risk variant
    pub async fn run(&self, state: ComplianceState) -> Result<ComplianceState> {
        self.hooks.on_entry(&state.tenant_id);

        if let Some(store) = &self.store {
            if let Some(cached) = store.get_compliance_state(&state.event_id).await? {
                info!(
                    event_id = %state.event_id,
                    correlation_id = %state.correlation_id,
                    "workflow_idempotent_skip"
                );
                return Ok(cached);
            }
        }

        let state = self.resolve_versions(state).await;
        let request_start = Instant::now();
        let root = self.hooks.spans.as_ref().map(|spans| {
            spans.start_span(
                "compliance_workflow",
                None,
                None,
                &[
                    ("tenant_id", state.tenant_id.as_str()),
                    ("correlation_id", state.correlation_id.as_str()),
                ],
            )
        });

        match self.run_nodes(state, &root).await {
            Ok(mut current) => {
                drop(root);
                self.finish(&mut current, request_start).await?;
                if let Some(store) = &self.store {
                    store.set_compliance_state(&current.event_id, &current).await?;
                }
                Ok(current)
            }
            Err(e) => {
                error!(error = %e, "compliance workflow node failed");
                self.hooks.on_failure(&e);
                Err(e)
            }
        }
    }

    async fn run_nodes(
        &self,
        state: ComplianceState,
        root: &Option<SpanGuard>,
    ) -> Result<ComplianceState> {
        let mut current = state;
        run_node!(self, root, current, "retrieval", compliance_nodes::retrieve_context);
        run_node!(self, root, current, "policy_validation", compliance_nodes::validate_policy);
        run_node!(self, root, current, "risk_scoring", compliance_nodes::score_risk);
        run_node!(self, root, current, "guardrails", compliance_nodes::apply_guardrails);
        run_node!(self, root, current, "decision", compliance_nodes::make_decision);
        Ok(current)
    }

    async fn resolve_versions(&self, mut state: ComplianceState) -> ComplianceState {
        if let Some(registry) = &self.model_registry {
            if let Ok(record) = registry.get_approved("compliance-model", None).await {
                state.model_version = format!("{}@{}", record.model_name, record.version);
            }
        }
        if let Some(registry) = &self.prompt_registry {
            if let Ok(Some(prompt)) = registry.get_prompt("compliance-prompt", None).await {
                state.prompt_version = prompt.version;
            }
        }
        state
    }

    async fn finish(&self, current: &mut ComplianceState, request_start: Instant) -> Result<()> {
        let latency_ms = request_start.elapsed().as_secs_f64() * 1000.0;

        if let Some(metrics) = &self.hooks.metrics {
            if current.final_decision == Some(Decision::RequireApproval) {
                metrics.increment("approval_required_count");
            }
            metrics.observe_latency("request_latency", latency_ms, None);
        }
        if let Some(cost) = &self.hooks.cost {
            cost.add_cost(
                &current.tenant_id,
                REQUEST_COST,
                Some(&current.model_version),
                Some(&current.event_id),
            );
        }
        if let Some(log) = &self.hooks.generation_log {
            log.log_generation(
                &current.event_id,
                &current.tenant_id,
                current.prompt_version,
                &current.model_version,
                SIMULATED_INPUT_TOKENS,
                SIMULATED_OUTPUT_TOKENS,
                latency_ms,
            );
        }
        if let Some(evaluation) = &self.hooks.evaluation {
            let result = evaluation
                .evaluate_decision(
                    &current.tenant_id,
                    &current.event_id,
                    &current.correlation_id,
                    current.final_decision.map(Decision::as_str).unwrap_or(""),
                    current.policy_result.map(|p| p.as_str()).unwrap_or(""),
                    current.guardrail_result.map(|g| g.as_str()).unwrap_or(""),
                    current.risk_score,
                )
                .await?;
            current.evaluation = Some(result);
        }
        Ok(())
    }
}
