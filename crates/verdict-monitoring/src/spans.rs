//! In-memory hierarchical span recorder
//!
//! Trace-id propagation and workflow → node span hierarchy, recorded
//! in-process; no OTLP export. A [`SpanGuard`] ends its span on drop so
//! spans close on every exit path, including errors.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Single span with timing and attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    /// Unique span id
    pub span_id: String,
    /// Trace the span belongs to
    pub trace_id: String,
    /// Operation name (workflow or node)
    pub name: String,
    /// Parent span, when nested
    pub parent_span_id: Option<String>,
    /// Start time (UTC)
    pub start_time_utc: DateTime<Utc>,
    /// End time; `None` while open
    pub end_time_utc: Option<DateTime<Utc>>,
    /// Key-value attributes (tenant, correlation id, versions)
    pub attributes: BTreeMap<String, String>,
}

impl Span {
    /// Wall-clock duration once the span is closed
    pub fn duration_ms(&self) -> Option<f64> {
        self.end_time_utc
            .map(|end| (end - self.start_time_utc).num_microseconds().unwrap_or(0) as f64 / 1000.0)
    }
}

/// A trace: all spans sharing one trace id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    /// Trace identifier
    pub trace_id: String,
    /// Spans in start order
    pub spans: Vec<Span>,
}

/// Records spans in memory
#[derive(Default)]
pub struct SpanRecorder {
    traces: Mutex<Vec<Trace>>,
}

impl SpanRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a span. A `None` trace id starts a new trace. The returned
    /// guard closes the span when dropped.
    pub fn start_span(
        self: &Arc<Self>,
        name: &str,
        trace_id: Option<&str>,
        parent_span_id: Option<&str>,
        attributes: &[(&str, &str)],
    ) -> SpanGuard {
        let span_id = Uuid::new_v4().to_string();
        let trace_id = trace_id.map(str::to_string).unwrap_or_else(|| Uuid::new_v4().to_string());
        let span = Span {
            span_id: span_id.clone(),
            trace_id: trace_id.clone(),
            name: name.to_string(),
            parent_span_id: parent_span_id.map(str::to_string),
            start_time_utc: Utc::now(),
            end_time_utc: None,
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };

        let mut traces = self.traces.lock();
        match traces.iter_mut().find(|t| t.trace_id == trace_id) {
            Some(trace) => trace.spans.push(span),
            None => traces.push(Trace {
                trace_id: trace_id.clone(),
                spans: vec![span],
            }),
        }

        SpanGuard {
            recorder: Arc::clone(self),
            span_id,
            trace_id,
        }
    }

    fn end_span(&self, trace_id: &str, span_id: &str) {
        let mut traces = self.traces.lock();
        if let Some(span) = traces
            .iter_mut()
            .find(|t| t.trace_id == trace_id)
            .and_then(|t| t.spans.iter_mut().find(|s| s.span_id == span_id))
        {
            if span.end_time_utc.is_none() {
                span.end_time_utc = Some(Utc::now());
            }
        }
    }

    /// All recorded traces
    pub fn traces(&self) -> Vec<Trace> {
        self.traces.lock().clone()
    }

    /// One trace by id
    pub fn trace(&self, trace_id: &str) -> Option<Trace> {
        self.traces.lock().iter().find(|t| t.trace_id == trace_id).cloned()
    }

    /// Clear recorded traces (tests)
    pub fn reset(&self) {
        self.traces.lock().clear();
    }
}

/// Open span handle; ends the span on drop
pub struct SpanGuard {
    recorder: Arc<SpanRecorder>,
    /// Span identifier, usable as a parent for child spans
    pub span_id: String,
    /// Trace identifier to propagate into children
    pub trace_id: String,
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.recorder.end_span(&self.trace_id, &self.span_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_spans_share_a_trace() {
        let recorder = Arc::new(SpanRecorder::new());
        let root = recorder.start_span(
            "risk_workflow",
            None,
            None,
            &[("tenant_id", "tenant-a"), ("correlation_id", "corr-1")],
        );
        let child = recorder.start_span(
            "retrieval",
            Some(&root.trace_id),
            Some(&root.span_id),
            &[],
        );
        let trace_id = root.trace_id.clone();
        drop(child);
        drop(root);

        let trace = recorder.trace(&trace_id).unwrap();
        assert_eq!(trace.spans.len(), 2);
        assert_eq!(trace.spans[0].name, "risk_workflow");
        assert_eq!(
            trace.spans[1].parent_span_id.as_deref(),
            Some(trace.spans[0].span_id.as_str())
        );
        assert!(trace.spans.iter().all(|s| s.end_time_utc.is_some()));
        assert!(trace.spans[0].duration_ms().is_some());
    }

    #[test]
    fn attributes_are_recorded() {
        let recorder = Arc::new(SpanRecorder::new());
        let guard = recorder.start_span("risk_workflow", None, None, &[("tenant_id", "t")]);
        let trace_id = guard.trace_id.clone();
        drop(guard);
        let trace = recorder.trace(&trace_id).unwrap();
        assert_eq!(trace.spans[0].attributes["tenant_id"], "t");
    }
}
