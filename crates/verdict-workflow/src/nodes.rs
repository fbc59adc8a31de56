//! Risk workflow nodes
//!
//! Each node is a deterministic transformation `(state, audit) → new
//! state`: outputs derive only from `raw_event` and prior state fields,
//! never from wall-clock randomness. Every node appends one trail entry
//! and emits one audit record with the same fields, then returns a new
//! state value; the input state is untouched.

use std::time::Instant;

use chrono::Utc;
use serde_json::json;

use crate::state::{Decision, GuardrailResult, PolicyResult, RiskState, TrailEntry};
use verdict_governance::AuditLogger;
use verdict_types::error::Result;

/// Actor recorded on every node audit
pub const WORKFLOW_ACTOR: &str = "workflow";
/// Risk score at or above which guardrails and the decision escalate
pub const HIGH_RISK_THRESHOLD: f64 = 75.0;

pub(crate) mod rules {
    //! Pure decision rules shared by the risk and compliance pipelines

    use super::{GuardrailResult, PolicyResult, HIGH_RISK_THRESHOLD};

    fn metadata(raw: &serde_json::Value) -> Option<&serde_json::Map<String, serde_json::Value>> {
        raw.get("metadata").and_then(|m| m.as_object())
    }

    fn metadata_flag(raw: &serde_json::Value, key: &str) -> bool {
        metadata(raw)
            .and_then(|m| m.get(key))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn metadata_category(raw: &serde_json::Value) -> Option<&str> {
        metadata(raw).and_then(|m| m.get("category")).and_then(|v| v.as_str())
    }

    pub fn event_type<'a>(raw: &'a serde_json::Value, default: &'a str) -> &'a str {
        raw.get("event_type").and_then(|v| v.as_str()).unwrap_or(default)
    }

    pub fn context_for(tenant_id: &str, raw: &serde_json::Value) -> String {
        format!("simulated_context:{tenant_id}:{}", event_type(raw, "unknown"))
    }

    pub fn policy_for(raw: &serde_json::Value) -> PolicyResult {
        if metadata_flag(raw, "policy_override") || metadata_category(raw) == Some("sensitive") {
            PolicyResult::Fail
        } else {
            PolicyResult::Pass
        }
    }

    pub fn score_for(raw: &serde_json::Value) -> f64 {
        let kind = event_type(raw, "standard");
        if kind == "high_risk" {
            85.0
        } else if metadata_category(raw) == Some("sensitive") {
            70.0
        } else if kind == "low_risk" {
            15.0
        } else {
            30.0
        }
    }

    pub fn guardrail_for(risk_score: f64, raw: &serde_json::Value) -> GuardrailResult {
        if risk_score >= HIGH_RISK_THRESHOLD || metadata_flag(raw, "blocked_pattern") {
            GuardrailResult::Violation
        } else {
            GuardrailResult::Ok
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    (start.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

fn trail_entry(
    state: &RiskState,
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
    state: &RiskState,
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

/// Simulated vector retrieval. Deterministic.
pub async fn retrieve_context(state: &RiskState, audit: &AuditLogger) -> Result<RiskState> {
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

/// Rule-based policy validation. `FAIL` on a policy override or a
/// sensitive category.
pub async fn validate_policy(state: &RiskState, audit: &AuditLogger) -> Result<RiskState> {
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

/// Deterministic risk scoring from the event type and metadata category
pub async fn score_risk(state: &RiskState, audit: &AuditLogger) -> Result<RiskState> {
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

/// Guardrails: a violation on a high score or a blocked pattern
pub async fn apply_guardrails(state: &RiskState, audit: &AuditLogger) -> Result<RiskState> {
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

/// Final decision: escalate on a policy failure, a high score, or a
/// guardrail violation; otherwise approve
pub async fn make_decision(state: &RiskState, audit: &AuditLogger) -> Result<RiskState> {
    let start = Instant::now();
    let policy_fail = state.policy_result == Some(PolicyResult::Fail);
    let high_risk = state.risk_score.unwrap_or(0.0) >= HIGH_RISK_THRESHOLD;
    let violation = state.guardrail_result == Some(GuardrailResult::Violation);
    let decision = if policy_fail || high_risk || violation {
        Decision::RequireApproval
    } else {
        Decision::Approved
    };
    let ms = elapsed_ms(start);
    let output = json!({"final_decision": decision.as_str()});
    audit_node(audit, state, "decision_made", "risk_decision", ms, &output).await?;

    let mut next = state.clone();
    next.final_decision = Some(decision);
    next.audit_trail.push(trail_entry(state, "decision", "decision_made", ms, output));
    Ok(next)
}
