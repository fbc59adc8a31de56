//! Autoscaling policy
//!
//! A pure function from a metrics snapshot to a scaling decision. Any one
//! breached signal scales up (when below the replica ceiling); scaling
//! down needs every present signal comfortably low. Same input, same
//! decision and reason string.

use serde::{Deserialize, Serialize};

/// Scaling decision kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingAction {
    /// Add a replica
    ScaleUp,
    /// Remove a replica
    ScaleDown,
    /// Leave the fleet as is
    NoAction,
}

/// Decision plus a deterministic human-readable reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingDecision {
    /// What to do
    pub action: ScalingAction,
    /// Why, phrased from the triggering signal
    pub reason: String,
}

/// Input for a scaling evaluation; a missing value means "no signal"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// CPU utilization percentage
    pub cpu_usage_pct: Option<f64>,
    /// 99th-percentile request latency in milliseconds
    pub request_latency_p99_ms: Option<f64>,
    /// Failure rate in `[0, 1]`
    pub failure_rate: Option<f64>,
    /// Pending work items
    pub queue_depth: Option<u64>,
    /// Replicas currently running
    pub current_replicas: u32,
}

/// Threshold-driven deterministic scaling policy
#[derive(Debug, Clone)]
pub struct AutoscalingPolicy {
    cpu_up: f64,
    cpu_down: f64,
    latency_up_ms: f64,
    failure_up: f64,
    queue_up: u64,
    min_replicas: u32,
    max_replicas: u32,
}

impl Default for AutoscalingPolicy {
    fn default() -> Self {
        Self {
            cpu_up: 70.0,
            cpu_down: 30.0,
            latency_up_ms: 500.0,
            failure_up: 0.05,
            queue_up: 50,
            min_replicas: 1,
            max_replicas: 20,
        }
    }
}

impl AutoscalingPolicy {
    /// Create a policy with explicit thresholds
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cpu_up: f64,
        cpu_down: f64,
        latency_up_ms: f64,
        failure_up: f64,
        queue_up: u64,
        min_replicas: u32,
        max_replicas: u32,
    ) -> Self {
        Self {
            cpu_up,
            cpu_down,
            latency_up_ms,
            failure_up,
            queue_up,
            min_replicas,
            max_replicas,
        }
    }

    /// Evaluate a snapshot. Scale-up wins on any breached signal; scale-
    /// down requires all present signals below half of their up
    /// thresholds (CPU specifically below its own down threshold).
    pub fn evaluate(&self, m: &MetricsSnapshot) -> ScalingDecision {
        let has_headroom = m.current_replicas < self.max_replicas;

        if let Some(cpu) = m.cpu_usage_pct {
            if cpu >= self.cpu_up && has_headroom {
                return ScalingDecision {
                    action: ScalingAction::ScaleUp,
                    reason: format!("cpu_usage={cpu}% >= {}%", self.cpu_up),
                };
            }
        }
        if let Some(latency) = m.request_latency_p99_ms {
            if latency >= self.latency_up_ms && has_headroom {
                return ScalingDecision {
                    action: ScalingAction::ScaleUp,
                    reason: format!("latency_p99={latency}ms >= {}ms", self.latency_up_ms),
                };
            }
        }
        if let Some(rate) = m.failure_rate {
            if rate >= self.failure_up && has_headroom {
                return ScalingDecision {
                    action: ScalingAction::ScaleUp,
                    reason: format!("failure_rate={rate} >= {}", self.failure_up),
                };
            }
        }
        if let Some(depth) = m.queue_depth {
            if depth >= self.queue_up && has_headroom {
                return ScalingDecision {
                    action: ScalingAction::ScaleUp,
                    reason: format!("queue_depth={depth} >= {}", self.queue_up),
                };
            }
        }

        if m.current_replicas <= self.min_replicas {
            return ScalingDecision {
                action: ScalingAction::NoAction,
                reason: "at min_replicas".into(),
            };
        }

        let cpu_low = m.cpu_usage_pct.map(|c| c <= self.cpu_down).unwrap_or(true);
        let latency_low = m
            .request_latency_p99_ms
            .map(|l| l < self.latency_up_ms * 0.5)
            .unwrap_or(true);
        let failure_low = m.failure_rate.map(|r| r < self.failure_up * 0.5).unwrap_or(true);
        let queue_low = m
            .queue_depth
            .map(|d| (d as f64) < self.queue_up as f64 * 0.5)
            .unwrap_or(true);

        if cpu_low && latency_low && failure_low && queue_low {
            ScalingDecision {
                action: ScalingAction::ScaleDown,
                reason: "all metrics below scale-down thresholds".into(),
            }
        } else {
            ScalingDecision {
                action: ScalingAction::NoAction,
                reason: "no scaling signal".into(),
            }
        }
    }
}
