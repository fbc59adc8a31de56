//! Workflow runtime integration tests: full pipeline runs, snapshot
//! idempotency, resume from a partial trail, version resolution, and
//! observability wiring.

use std::sync::Arc;

use serde_json::json;

use verdict_cache::MemoryCacheStorage;
use verdict_governance::{
    AuditLogger, MemoryAuditSink, MemoryModelStore, MemoryPromptStore, ModelRegistry,
    PromptRegistry,
};
use verdict_monitoring::{CostTracker, EvaluationService, GenerationLog, MetricsCollector, SpanRecorder};
use verdict_types::AuditSink;
use verdict_workflow::state::NODE_ORDER;
use verdict_workflow::{
    ComplianceState, ComplianceWorkflow, Decision, GuardrailResult, ObservabilityHooks,
    PolicyResult, RiskState, RiskWorkflow, TrailEntry, WorkflowStateStore,
};

fn audit_pair() -> (AuditLogger, Arc<MemoryAuditSink>) {
    let sink = Arc::new(MemoryAuditSink::new());
    (AuditLogger::new(sink.clone()), sink)
}

fn risk_state(event_id: &str, raw: serde_json::Value) -> RiskState {
    RiskState::new(event_id, "test-tenant", "corr-1", raw)
}

#[tokio::test]
async fn standard_event_runs_all_five_nodes_and_approves() {
    let (audit, sink) = audit_pair();
    let workflow = RiskWorkflow::new(audit);

    let result = workflow
        .run(risk_state("evt-1", json!({"event_type": "standard"})))
        .await
        .unwrap();

    assert_eq!(result.final_decision, Some(Decision::Approved));
    assert_eq!(result.risk_score, Some(30.0));
    assert_eq!(result.policy_result, Some(PolicyResult::Pass));
    assert_eq!(result.guardrail_result, Some(GuardrailResult::Ok));
    let nodes: Vec<&str> = result.audit_trail.iter().map(|e| e.node.as_str()).collect();
    assert_eq!(nodes, NODE_ORDER);
    assert_eq!(sink.records().await.unwrap().len(), 5);
}

#[tokio::test]
async fn sensitive_category_requires_approval() {
    // Policy FAIL, score 70, guardrails OK, decision REQUIRE_APPROVAL
    let (audit, _) = audit_pair();
    let workflow = RiskWorkflow::new(audit);

    let result = workflow
        .run(risk_state(
            "evt-1",
            json!({"event_type": "standard", "metadata": {"category": "sensitive"}}),
        ))
        .await
        .unwrap();

    assert_eq!(result.policy_result, Some(PolicyResult::Fail));
    assert_eq!(result.risk_score, Some(70.0));
    assert_eq!(result.guardrail_result, Some(GuardrailResult::Ok));
    assert_eq!(result.final_decision, Some(Decision::RequireApproval));
}

#[tokio::test]
async fn high_risk_event_trips_guardrails() {
    let (audit, _) = audit_pair();
    let workflow = RiskWorkflow::new(audit);

    let result = workflow
        .run(risk_state("evt-1", json!({"event_type": "high_risk"})))
        .await
        .unwrap();

    assert_eq!(result.risk_score, Some(85.0));
    assert_eq!(result.guardrail_result, Some(GuardrailResult::Violation));
    assert_eq!(result.final_decision, Some(Decision::RequireApproval));
}

#[tokio::test]
async fn snapshot_replays_verbatim_without_reexecution() {
    let (audit, sink) = audit_pair();
    let store = Arc::new(WorkflowStateStore::new(Arc::new(MemoryCacheStorage::new())));
    let workflow = RiskWorkflow::new(audit).with_store(store);

    let first = workflow
        .run(risk_state("evt-1", json!({"event_type": "standard"})))
        .await
        .unwrap();
    let audits_after_first = sink.records().await.unwrap().len();

    let second = workflow
        .run(risk_state("evt-1", json!({"event_type": "high_risk"})))
        .await
        .unwrap();

    // The cached state wins, raw_event differences notwithstanding
    assert_eq!(second, first);
    assert_eq!(sink.records().await.unwrap().len(), audits_after_first);
}

#[tokio::test]
async fn resumes_from_partial_trail_without_rerunning_nodes() {
    let (audit, sink) = audit_pair();
    let workflow = RiskWorkflow::new(audit);

    // A previous invocation already ran retrieval and produced "x"
    let mut state = risk_state("evt-1", json!({"event_type": "standard"}));
    state.retrieved_context = Some("x".into());
    state.audit_trail.push(TrailEntry {
        node: "retrieval".into(),
        action: "context_retrieved".into(),
        at: chrono::Utc::now(),
        model_version: state.model_version.clone(),
        prompt_version: state.prompt_version,
        execution_ms: 0.1,
        stage_output: Some(json!({"retrieved_context": "x"})),
    });

    let result = workflow.run(state).await.unwrap();

    // Retrieval did not run again: context kept, no second trail entry
    assert_eq!(result.retrieved_context.as_deref(), Some("x"));
    assert_eq!(
        result.audit_trail.iter().filter(|e| e.node == "retrieval").count(),
        1
    );
    assert_eq!(result.final_decision, Some(Decision::Approved));
    // Only the four remaining nodes audited
    assert_eq!(sink.records().await.unwrap().len(), 4);
}

#[tokio::test]
async fn resolves_versions_from_registries() {
    let (audit, sink) = audit_pair();
    let logger = AuditLogger::new(sink.clone());
    let model_registry = Arc::new(ModelRegistry::new(
        Arc::new(MemoryModelStore::new()),
        logger.clone(),
    ));
    let prompt_registry = Arc::new(PromptRegistry::new(
        Arc::new(MemoryPromptStore::new()),
        logger.clone(),
    ));

    model_registry.register("risk-model", "3", "sha256:abc").await.unwrap();
    model_registry
        .approve("risk-model", "3", "approver", "test-tenant", "corr-0", None)
        .await
        .unwrap();
    prompt_registry
        .register_prompt("risk-prompt", "Risk", "v1", "initial", "alice", "test-tenant", "corr-0")
        .await
        .unwrap();
    prompt_registry
        .update_prompt("risk-prompt", "v2", "tuned", "alice", "test-tenant", "corr-0")
        .await
        .unwrap();

    let workflow = RiskWorkflow::new(audit).with_registries(model_registry, prompt_registry);
    let result = workflow
        .run(risk_state("evt-1", json!({"event_type": "standard"})))
        .await
        .unwrap();

    assert_eq!(result.model_version, "risk-model@3");
    assert_eq!(result.prompt_version, 2);
    assert!(result.audit_trail.iter().all(|e| e.model_version == "risk-model@3"));
}

#[tokio::test]
async fn unapproved_model_falls_back_to_default() {
    let (audit, sink) = audit_pair();
    let logger = AuditLogger::new(sink);
    let model_registry = Arc::new(ModelRegistry::new(
        Arc::new(MemoryModelStore::new()),
        logger.clone(),
    ));
    let prompt_registry = Arc::new(PromptRegistry::new(
        Arc::new(MemoryPromptStore::new()),
        logger,
    ));
    model_registry.register("risk-model", "1", "sha").await.unwrap();

    let workflow = RiskWorkflow::new(audit).with_registries(model_registry, prompt_registry);
    let result = workflow
        .run(risk_state("evt-1", json!({"event_type": "standard"})))
        .await
        .unwrap();

    assert_eq!(result.model_version, verdict_workflow::DEFAULT_MODEL_VERSION);
    assert_eq!(result.prompt_version, verdict_workflow::DEFAULT_PROMPT_VERSION);
}

#[tokio::test]
async fn observability_hooks_record_the_run() {
    let (audit, _) = audit_pair();
    let metrics = Arc::new(MetricsCollector::new());
    let spans = Arc::new(SpanRecorder::new());
    let cost = Arc::new(CostTracker::default());
    let generation_log = Arc::new(GenerationLog::new());
    let hooks = ObservabilityHooks {
        metrics: Some(metrics.clone()),
        spans: Some(spans.clone()),
        cost: Some(cost.clone()),
        generation_log: Some(generation_log.clone()),
        evaluation: Some(Arc::new(EvaluationService::new())),
    };

    let workflow = RiskWorkflow::new(audit).with_hooks(hooks);
    let result = workflow
        .run(risk_state("evt-1", json!({"event_type": "high_risk"})))
        .await
        .unwrap();

    assert_eq!(metrics.counter("workflow_execution_count"), 1.0);
    assert_eq!(metrics.labeled_counter("request_count", "tenant", "test-tenant"), 1.0);
    assert_eq!(metrics.counter("approval_required_count"), 1.0);
    assert_eq!(metrics.counter("model_usage_count"), 5.0);

    let export = metrics.export();
    assert_eq!(export.histograms["request_latency"].count, 1);
    assert!(export.histograms.contains_key("node_execution_latency:node=decision"));

    // One trace: root workflow span plus five node children
    let traces = spans.traces();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].spans.len(), 6);
    assert_eq!(traces[0].spans[0].name, "risk_workflow");
    assert!(traces[0].spans.iter().all(|s| s.end_time_utc.is_some()));

    assert!((cost.tenant_cost("test-tenant") - 0.01).abs() < 1e-9);
    assert_eq!(generation_log.generations().len(), 1);

    // Evaluation attached to the final state
    let evaluation = result.evaluation.unwrap();
    assert_eq!(evaluation.policy_alignment_score, 1.0);
    assert_eq!(evaluation.guardrail_score, 0.0);
}

#[tokio::test]
async fn compliance_flags_escalate_and_snapshot_separately() {
    let (audit, _) = audit_pair();
    let cache = Arc::new(MemoryCacheStorage::new());
    let store = Arc::new(WorkflowStateStore::new(cache));
    let workflow = ComplianceWorkflow::new(audit).with_store(store.clone());

    let mut state = ComplianceState::new(
        "evt-1",
        "test-tenant",
        "corr-1",
        json!({"event_type": "low_risk"}),
    );
    state.regulatory_flags = vec!["SOX-404".into()];

    let result = workflow.run(state).await.unwrap();
    assert_eq!(result.final_decision, Some(Decision::RequireApproval));
    assert!(result.approval_required);

    // Snapshot landed under the compliance key, not the risk key
    assert!(store.get_compliance_state("evt-1").await.unwrap().is_some());
    assert!(store.get_risk_state("evt-1").await.unwrap().is_none());
}
