//! Simulated generation log
//!
//! Records one generation entry per workflow run (prompt and model
//! versions, token counts, estimated cost, latency) the way an LLM
//! observability backend would, but entirely in-process. Cost flows
//! through the [`CostTracker`] when one is wired.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::cost::{CostTracker, DEFAULT_RATE_PER_1K_TOKENS};
use crate::metrics::MetricsCollector;

/// Single generation log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// Event the generation belongs to
    pub event_id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Prompt version used
    pub prompt_version: u32,
    /// Model version used
    pub model_version: String,
    /// Simulated input token count
    pub input_tokens: u64,
    /// Simulated output token count
    pub output_tokens: u64,
    /// Deterministic cost estimate
    pub estimated_cost: f64,
    /// Wall-clock latency of the run
    pub latency_ms: f64,
}

/// In-memory generation log
#[derive(Default)]
pub struct GenerationLog {
    cost_tracker: Option<Arc<CostTracker>>,
    metrics: Option<Arc<MetricsCollector>>,
    generations: Mutex<Vec<GenerationRecord>>,
}

impl GenerationLog {
    /// Create a standalone log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log wired to cost tracking and metrics
    pub fn with_hooks(
        cost_tracker: Option<Arc<CostTracker>>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            cost_tracker,
            metrics,
            generations: Mutex::new(Vec::new()),
        }
    }

    /// Log one generation; returns the estimated cost
    #[allow(clippy::too_many_arguments)]
    pub fn log_generation(
        &self,
        event_id: &str,
        tenant_id: &str,
        prompt_version: u32,
        model_version: &str,
        input_tokens: u64,
        output_tokens: u64,
        latency_ms: f64,
    ) -> f64 {
        let cost = match &self.cost_tracker {
            Some(tracker) => tracker.add_cost_from_tokens(
                tenant_id,
                input_tokens,
                output_tokens,
                Some(model_version),
                Some(event_id),
            ),
            None => {
                (input_tokens + output_tokens) as f64 / 1000.0 * DEFAULT_RATE_PER_1K_TOKENS
            }
        };

        self.generations.lock().push(GenerationRecord {
            event_id: event_id.to_string(),
            tenant_id: tenant_id.to_string(),
            prompt_version,
            model_version: model_version.to_string(),
            input_tokens,
            output_tokens,
            estimated_cost: cost,
            latency_ms,
        });

        if let Some(metrics) = &self.metrics {
            metrics.increment("model_usage_count");
            metrics.increment("prompt_usage_count");
        }

        cost
    }

    /// All logged generations
    pub fn generations(&self) -> Vec<GenerationRecord> {
        self.generations.lock().clone()
    }

    /// Clear the log (tests)
    pub fn reset(&self) {
        self.generations.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_and_costs() {
        let cost = Arc::new(CostTracker::default());
        let metrics = Arc::new(MetricsCollector::new());
        let log = GenerationLog::with_hooks(Some(cost.clone()), Some(metrics.clone()));

        let estimated = log.log_generation("evt-1", "tenant-a", 1, "simulated@1", 100, 50, 12.5);
        assert!((estimated - 0.0003).abs() < 1e-12);
        assert!((cost.tenant_cost("tenant-a") - 0.0003).abs() < 1e-12);
        assert_eq!(metrics.counter("model_usage_count"), 1.0);

        let records = log.generations();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model_version, "simulated@1");
        assert_eq!(records[0].input_tokens, 100);
    }

    #[test]
    fn standalone_log_estimates_without_tracker() {
        let log = GenerationLog::new();
        let estimated = log.log_generation("evt-1", "tenant-a", 1, "simulated@1", 500, 500, 1.0);
        assert!((estimated - 0.002).abs() < 1e-12);
    }
}
