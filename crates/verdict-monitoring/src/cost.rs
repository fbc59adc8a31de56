//! Cost attribution
//!
//! Tracks cost per tenant, per model version, and per request.
//! Estimation is deterministic: token count times a fixed rate.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Default rate per 1000 tokens
pub const DEFAULT_RATE_PER_1K_TOKENS: f64 = 0.002;

#[derive(Default)]
struct Ledger {
    cumulative: f64,
    by_tenant: BTreeMap<String, f64>,
    by_model: BTreeMap<String, f64>,
    by_request: BTreeMap<String, f64>,
}

/// Point-in-time export of all attributed cost
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostExport {
    /// Total across all tenants
    pub cumulative: f64,
    /// Per-tenant totals
    pub by_tenant: BTreeMap<String, f64>,
    /// Per-model-version totals
    pub by_model: BTreeMap<String, f64>,
    /// Per-request totals
    pub by_request: BTreeMap<String, f64>,
}

/// Thread-safe cost ledger
pub struct CostTracker {
    rate_per_1k: f64,
    ledger: Mutex<Ledger>,
}

impl Default for CostTracker {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_PER_1K_TOKENS)
    }
}

impl CostTracker {
    /// Create a tracker with the given per-1k-token rate
    pub fn new(rate_per_1k_tokens: f64) -> Self {
        Self {
            rate_per_1k: rate_per_1k_tokens,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Record a cost, optionally attributed to a model version and a
    /// request
    pub fn add_cost(
        &self,
        tenant_id: &str,
        amount: f64,
        model_version: Option<&str>,
        request_id: Option<&str>,
    ) {
        let mut ledger = self.ledger.lock();
        ledger.cumulative += amount;
        *ledger.by_tenant.entry(tenant_id.to_string()).or_insert(0.0) += amount;
        if let Some(model) = model_version {
            *ledger.by_model.entry(model.to_string()).or_insert(0.0) += amount;
        }
        if let Some(request) = request_id {
            *ledger.by_request.entry(request.to_string()).or_insert(0.0) += amount;
        }
    }

    /// Compute cost from token counts, record it, and return it
    pub fn add_cost_from_tokens(
        &self,
        tenant_id: &str,
        input_tokens: u64,
        output_tokens: u64,
        model_version: Option<&str>,
        request_id: Option<&str>,
    ) -> f64 {
        let amount = (input_tokens + output_tokens) as f64 / 1000.0 * self.rate_per_1k;
        self.add_cost(tenant_id, amount, model_version, request_id);
        amount
    }

    /// Total cost for a tenant
    pub fn tenant_cost(&self, tenant_id: &str) -> f64 {
        self.ledger.lock().by_tenant.get(tenant_id).copied().unwrap_or(0.0)
    }

    /// Total cost across all tenants
    pub fn cumulative(&self) -> f64 {
        self.ledger.lock().cumulative
    }

    /// Cost attributed to one request
    pub fn request_cost(&self, request_id: &str) -> f64 {
        self.ledger.lock().by_request.get(request_id).copied().unwrap_or(0.0)
    }

    /// Snapshot the whole ledger
    pub fn export(&self) -> CostExport {
        let ledger = self.ledger.lock();
        CostExport {
            cumulative: ledger.cumulative,
            by_tenant: ledger.by_tenant.clone(),
            by_model: ledger.by_model.clone(),
            by_request: ledger.by_request.clone(),
        }
    }

    /// Clear the ledger (tests)
    pub fn reset(&self) {
        let mut ledger = self.ledger.lock();
        ledger.cumulative = 0.0;
        ledger.by_tenant.clear();
        ledger.by_model.clear();
        ledger.by_request.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribution_accumulates() {
        let tracker = CostTracker::default();
        tracker.add_cost("tenant-a", 0.01, Some("simulated@1"), Some("evt-1"));
        tracker.add_cost("tenant-a", 0.01, Some("simulated@1"), Some("evt-2"));
        tracker.add_cost("tenant-b", 0.05, None, None);

        assert!((tracker.tenant_cost("tenant-a") - 0.02).abs() < 1e-9);
        assert!((tracker.cumulative() - 0.07).abs() < 1e-9);
        assert!((tracker.request_cost("evt-1") - 0.01).abs() < 1e-9);
        let export = tracker.export();
        assert!((export.by_model["simulated@1"] - 0.02).abs() < 1e-9);
    }

    #[test]
    fn token_cost_is_deterministic() {
        let tracker = CostTracker::default();
        let cost = tracker.add_cost_from_tokens("tenant-a", 100, 50, Some("simulated@1"), Some("evt-1"));
        // 150 tokens at 0.002 per 1k
        assert!((cost - 0.0003).abs() < 1e-12);
        assert!((tracker.tenant_cost("tenant-a") - 0.0003).abs() < 1e-12);
    }
}
