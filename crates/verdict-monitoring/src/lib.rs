//! # Verdict Monitoring
//!
//! In-process observability core: counters and histograms, hierarchical
//! spans, per-tenant cost attribution, failure classification, decision
//! evaluation, and the simulated generation log. Aggregation happens
//! in-process; export is out of scope.
//!
//! The workflow runtime never depends on concrete observability types
//! directly at the call sites that matter — it receives optional handles
//! to the pieces defined here, keeping the dependency inverted.

pub mod cost;
pub mod evaluation;
pub mod failure;
pub mod generation;
pub mod metrics;
pub mod spans;

pub use cost::CostTracker;
pub use evaluation::{EvaluationResult, EvaluationService};
pub use failure::{classify, FailureCategory};
pub use generation::{GenerationLog, GenerationRecord};
pub use metrics::{HistogramSummary, MetricsCollector, MetricsExport};
pub use spans::{Span, SpanGuard, SpanRecorder, Trace};
