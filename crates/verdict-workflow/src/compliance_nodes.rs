//! Compliance workflow nodes
//!
//! Same pipeline as the risk nodes with the compliance state; the
//! decision additionally escalates whenever regulatory flags are present
//! and mirrors the escalation in `approval_required`.

use std::time::Instant;

use chrono::Utc;
use serde_json::json;

use crate::nodes::{rules, HIGH_RISK_THRESHOLD, WORKFLOW_ACTOR};
use crate::state::{ComplianceState, Decision, GuardrailResult, PolicyResult, TrailEntry};
use verdict_governance::AuditLogger;
use verdict_types::error::Result;

fn elapsed_ms(start: Instant) -> f64 {
    (start.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

fn trail_entry(
    state: &ComplianceState,
    node: &str,
    action: &str,
    execution_ms: f64,
    stage_output: serde_json::Value,
) -> TrailEntry {
    TrailEntry {
        node: node.to_string(),
        action: action.to_string(),
        at: Utc::now(),
        model_version: state.model_version.clone(),
        prompt_version: state.prompt_version,
        execution_ms,
        stage_output: Some(stage_output),
    }
}

async fn audit_node(
    audit: &AuditLogger,
    state: &ComplianceState,
    action: &str,
    reason: &str,
    execution_ms: f64,
    stage_output: &serde_json::Value,
) -> Result<()> {
    let mut metadata = json!({
        "model_version": state.model_version,
        "prompt_version": state.prompt_version,
        "execution_ms": execution_ms,
    });
    if let (Some(target), Some(source)) = (metadata.as_object_mut(), stage_output.as_object()) {
        for (k, v) in source {
            target.insert(k.clone(), v.clone());
        }
    }
    audit
        .log_action(
            WORKFLOW_ACTOR,
            &state.tenant_id,
            action,
            "workflow",
            &state.event_id,
            Some(reason),
            &state.correlation_id,
            Some(metadata),
        )
        .await
}

/// Simulated vector retrieval for the compliance pipeline
pub async fn retrieve_context(state: &ComplianceState, audit: &AuditLogger) -> Result<ComplianceState> {
    let start = Instant::now();
    let context = rules::context_for(&state.tenant_id, &state.raw_event);
    let ms = elapsed_ms(start);
    let output = json!({"retrieved_context": context});
    audit_node(audit, state, "context_retrieved", "vector_retrieval_simulated", ms, &output).await?;

    let mut next = state.clone();
    next.retrieved_context = Some(context);
    next.audit_trail.push(trail_entry(state, "retrieval", "context_retrieved", ms, output));
    Ok(next)
}

/// Rule-based policy validation for the compliance pipeline
pub async fn validate_policy(state: &ComplianceState, audit: &AuditLogger) -> Result<ComplianceState> {
    let start = Instant::now();
    let policy_result = rules::policy_for(&state.raw_event);
    let ms = elapsed_ms(start);
    let output = json!({"policy_result": policy_result.as_str()});
    audit_node(audit, state, "policy_validated", "rule_based_validation", ms, &output).await?;

    let mut next = state.clone();
    next.policy_result = Some(policy_result);
    next.audit_trail
        .push(trail_entry(state, "policy_validation", "policy_validated", ms, output));
    Ok(next)
}

/// Deterministic risk scoring for the compliance pipeline
pub async fn score_risk(state: &ComplianceState, audit: &AuditLogger) -> Result<ComplianceState> {
    let start = Instant::now();
    let risk_score = rules::score_for(&state.raw_event);
    let ms = elapsed_ms(start);
    let output = json!({"risk_score": risk_score});
    audit_node(audit, state, "risk_scored", "deterministic_scoring", ms, &output).await?;

    let mut next = state.clone();
    next.risk_score = Some(risk_score);
    next.audit_trail.push(trail_entry(state, "risk_scoring", "risk_scored", ms, output));
    Ok(next)
}

/// Guardrails for the compliance pipeline
pub async fn apply_guardrails(state: &ComplianceState, audit: &AuditLogger) -> Result<ComplianceState> {
    let start = Instant::now();
    let guardrail_result = rules::guardrail_for(state.risk_score.unwrap_or(0.0), &state.raw_event);
    let ms = elapsed_ms(start);
    let output = json!({"guardrail_result": guardrail_result.as_str()});
    audit_node(audit, state, "guardrails_applied", "threshold_and_pattern_check", ms, &output).await?;

    let mut next = state.clone();
    next.guardrail_result = Some(guardrail_result);
    next.audit_trail
        .push(trail_entry(state, "guardrails", "guardrails_applied", ms, output));
    Ok(next)
}

/// Compliance decision: escalate on a policy failure, a high score, a
/// guardrail violation, or any regulatory flag; `approval_required`
/// mirrors the escalation
pub async fn make_decision(state: &ComplianceState, audit: &AuditLogger) -> Result<ComplianceState> {
    let start = Instant::now();
    let policy_fail = state.policy_result == Some(PolicyResult::Fail);
    let high_risk = state.risk_score.unwrap_or(0.0) >= HIGH_RISK_THRESHOLD;
    let violation = state.guardrail_result == Some(GuardrailResult::Violation);
    let flagged = !state.regulatory_flags.is_empty();
    let escalate = policy_fail || high_risk || violation || flagged;
    let decision = if escalate {
        Decision::RequireApproval
    } else {
        Decision::Approved
    };
    let ms = elapsed_ms(start);
    let output = json!({
        "final_decision": decision.as_str(),
        "approval_required": escalate,
    });
    audit_node(audit, state, "decision_made", "compliance_decision", ms, &output).await?;

    let mut next = state.clone();
    next.final_decision = Some(decision);
    next.approval_required = escalate;
    next.audit_trail.push(trail_entry(state, "decision", "decision_made", ms, output));
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use verdict_governance::MemoryAuditSink;

    fn audit() -> AuditLogger {
        AuditLogger::new(Arc::new(MemoryAuditSink::new()))
    }

    fn state(raw: serde_json::Value) -> ComplianceState {
        ComplianceState::new("evt-1", "tenant-a", "corr-1", raw)
    }

    #[tokio::test]
    async fn regulatory_flags_force_escalation() {
        let audit = audit();
        let mut s = state(json!({"event_type": "low_risk"}));
        s.policy_result = Some(PolicyResult::Pass);
        s.risk_score = Some(15.0);
        s.guardrail_result = Some(GuardrailResult::Ok);
        s.regulatory_flags = vec!["GDPR".into()];

        let next = make_decision(&s, &audit).await.unwrap();
        assert_eq!(next.final_decision, Some(Decision::RequireApproval));
        assert!(next.approval_required);
    }

    #[tokio::test]
    async fn clean_event_is_approved() {
        let audit = audit();
        let mut s = state(json!({"event_type": "standard"}));
        s.policy_result = Some(PolicyResult::Pass);
        s.risk_score = Some(30.0);
        s.guardrail_result = Some(GuardrailResult::Ok);

        let next = make_decision(&s, &audit).await.unwrap();
        assert_eq!(next.final_decision, Some(Decision::Approved));
        assert!(!next.approval_required);
    }

    #[tokio::test]
    async fn pipeline_nodes_mirror_risk_rules() {
        let audit = audit();
        let s = state(json!({"metadata": {"category": "sensitive"}}));
        let s = retrieve_context(&s, &audit).await.unwrap();
        let s = validate_policy(&s, &audit).await.unwrap();
        let s = score_risk(&s, &audit).await.unwrap();
        assert_eq!(s.policy_result, Some(PolicyResult::Fail));
        assert_eq!(s.risk_score, Some(70.0));
        assert_eq!(s.audit_trail.len(), 3);
    }
}
