//! Decision quality scoring
//!
//! Deterministic scores in `[0, 1]` derived purely from the decision
//! inputs, rounded to four decimal places. When an audit sink is wired,
//! every evaluation emits an `evaluation_completed` record.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use verdict_types::audit::AuditRecord;
use verdict_types::error::Result;
use verdict_types::ports::AuditSink;

/// Result of evaluating one decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Mean of policy, guardrail, and normalized-risk signals
    pub confidence_score: f64,
    /// 1.0 when the policy check passed
    pub policy_alignment_score: f64,
    /// 1.0 when no guardrail fired
    pub guardrail_score: f64,
    /// Mean of confidence, policy alignment, and guardrail scores
    pub overall_quality_score: f64,
}

/// Deterministic decision evaluator
#[derive(Default)]
pub struct EvaluationService {
    audit: Option<Arc<dyn AuditSink>>,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

impl EvaluationService {
    /// Create an evaluator without audit emission
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an evaluator that audits every evaluation
    pub fn with_audit(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit: Some(audit) }
    }

    /// Score one decision.
    ///
    /// All scores are pure functions of the inputs; the same decision
    /// always evaluates to the same scores.
    #[allow(clippy::too_many_arguments)]
    pub async fn evaluate_decision(
        &self,
        tenant_id: &str,
        event_id: &str,
        correlation_id: &str,
        final_decision: &str,
        policy_result: &str,
        guardrail_result: &str,
        risk_score: Option<f64>,
    ) -> Result<EvaluationResult> {
        let policy_ok = if policy_result == "PASS" { 1.0 } else { 0.0 };
        let guardrail_ok = if guardrail_result == "OK" { 1.0 } else { 0.0 };
        let risk_normalized = 1.0 - risk_score.unwrap_or(0.0) / 100.0;
        let confidence = (policy_ok + guardrail_ok + risk_normalized) / 3.0;
        let overall = (confidence + policy_ok + guardrail_ok) / 3.0;

        let result = EvaluationResult {
            confidence_score: round4(confidence),
            policy_alignment_score: policy_ok,
            guardrail_score: guardrail_ok,
            overall_quality_score: round4(overall),
        };

        if let Some(audit) = &self.audit {
            audit
                .append(AuditRecord::new(
                    "evaluation_service",
                    tenant_id,
                    "evaluation_completed",
                    "workflow",
                    event_id,
                    Some("quality_scoring".into()),
                    correlation_id,
                    Some(serde_json::json!({
                        "evaluation": result,
                        "final_decision": final_decision,
                    })),
                ))
                .await?;
        }

        Ok(result)
    }
}
