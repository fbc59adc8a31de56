//! In-memory metrics registry
//!
//! Prometheus-style counters and histograms without the export side: a
//! short-held mutex around every update, labeled counters keyed
//! `{name}:{label}={value}`, and a snapshot export for health surfaces
//! and tests.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Default)]
struct Registry {
    counters: BTreeMap<String, f64>,
    labeled: BTreeMap<String, BTreeMap<String, f64>>,
    histograms: BTreeMap<String, Vec<f64>>,
}

/// Thread-safe counter/histogram registry
#[derive(Default)]
pub struct MetricsCollector {
    registry: Mutex<Registry>,
}

/// Count/sum/values snapshot of one histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSummary {
    /// Number of observations
    pub count: usize,
    /// Sum of observations
    pub sum: f64,
    /// Raw observed values
    pub values: Vec<f64>,
}

/// Point-in-time export of all metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsExport {
    /// Unlabeled counters
    pub counters: BTreeMap<String, f64>,
    /// Labeled counters, name → (`{name}:{label}={value}` → count)
    pub counters_by_labels: BTreeMap<String, BTreeMap<String, f64>>,
    /// Histograms keyed by name (plus `:node={n}` for node latencies)
    pub histograms: BTreeMap<String, HistogramSummary>,
}

impl MetricsCollector {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment an unlabeled counter by one
    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1.0);
    }

    /// Increment an unlabeled counter
    pub fn increment_by(&self, name: &str, value: f64) {
        let mut registry = self.registry.lock();
        *registry.counters.entry(name.to_string()).or_insert(0.0) += value;
    }

    /// Increment a labeled counter (e.g. `request_count` with
    /// `tenant=tenant-a`, `failure_count` with `category=...`)
    pub fn increment_labeled(&self, name: &str, label: &str, value: &str) {
        let key = format!("{name}:{label}={value}");
        let mut registry = self.registry.lock();
        *registry
            .labeled
            .entry(name.to_string())
            .or_default()
            .entry(key)
            .or_insert(0.0) += 1.0;
    }

    /// Record a latency observation, optionally bucketed per node
    pub fn observe_latency(&self, name: &str, latency_ms: f64, node: Option<&str>) {
        let bucket = match node {
            Some(node) => format!("{name}:node={node}"),
            None => name.to_string(),
        };
        let mut registry = self.registry.lock();
        registry.histograms.entry(bucket).or_default().push(latency_ms);
    }

    /// Value of an unlabeled counter (zero when never incremented)
    pub fn counter(&self, name: &str) -> f64 {
        self.registry.lock().counters.get(name).copied().unwrap_or(0.0)
    }

    /// Value of one labeled counter entry
    pub fn labeled_counter(&self, name: &str, label: &str, value: &str) -> f64 {
        let key = format!("{name}:{label}={value}");
        self.registry
            .lock()
            .labeled
            .get(name)
            .and_then(|m| m.get(&key))
            .copied()
            .unwrap_or(0.0)
    }

    /// Snapshot everything
    pub fn export(&self) -> MetricsExport {
        let registry = self.registry.lock();
        MetricsExport {
            counters: registry.counters.clone(),
            counters_by_labels: registry.labeled.clone(),
            histograms: registry
                .histograms
                .iter()
                .map(|(k, v)| {
                    (
                        k.clone(),
                        HistogramSummary {
                            count: v.len(),
                            sum: v.iter().sum(),
                            values: v.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Clear all metrics (tests)
    pub fn reset(&self) {
        let mut registry = self.registry.lock();
        registry.counters.clear();
        registry.labeled.clear();
        registry.histograms.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsCollector::new();
        metrics.increment("workflow_execution_count");
        metrics.increment("workflow_execution_count");
        metrics.increment_by("workflow_execution_count", 3.0);
        assert_eq!(metrics.counter("workflow_execution_count"), 5.0);
        assert_eq!(metrics.counter("never_touched"), 0.0);
    }

    #[test]
    fn labeled_counters_are_dimensional() {
        let metrics = MetricsCollector::new();
        metrics.increment_labeled("request_count", "tenant", "tenant-a");
        metrics.increment_labeled("request_count", "tenant", "tenant-a");
        metrics.increment_labeled("request_count", "tenant", "tenant-b");
        assert_eq!(metrics.labeled_counter("request_count", "tenant", "tenant-a"), 2.0);
        assert_eq!(metrics.labeled_counter("request_count", "tenant", "tenant-b"), 1.0);
    }

    #[test]
    fn histogram_summaries() {
        let metrics = MetricsCollector::new();
        metrics.observe_latency("node_execution_latency", 2.0, Some("retrieval"));
        metrics.observe_latency("node_execution_latency", 4.0, Some("retrieval"));
        metrics.observe_latency("request_latency", 10.0, None);

        let export = metrics.export();
        let node = &export.histograms["node_execution_latency:node=retrieval"];
        assert_eq!(node.count, 2);
        assert_eq!(node.sum, 6.0);
        assert_eq!(export.histograms["request_latency"].count, 1);
    }

    #[test]
    fn reset_clears_everything() {
        let metrics = MetricsCollector::new();
        metrics.increment("a");
        metrics.observe_latency("b", 1.0, None);
        metrics.reset();
        let export = metrics.export();
        assert!(export.counters.is_empty());
        assert!(export.histograms.is_empty());
    }
}
