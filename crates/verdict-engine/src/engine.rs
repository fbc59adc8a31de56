//! Engine composition root
//!
//! Constructs the process-wide collaborators exactly once and passes
//! them by reference; no singletons hide inside request paths. The
//! submit path follows the system data flow: per-tenant rate limit →
//! tenant partition → bulkhead admission → ingestion transaction.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use verdict_cache::MemoryCacheStorage;
use verdict_governance::{
    ApprovalWorkflow, AuditLogger, MemoryApprovalStore, MemoryAuditSink, MemoryModelStore,
    MemoryPromptStore, ModelRegistry, PromptRegistry,
};
use verdict_monitoring::{
    CostTracker, EvaluationService, GenerationLog, MetricsCollector, SpanRecorder,
};
use verdict_reliability::{
    Bulkhead, CircuitBreaker, CircuitBreakerConfig, DistributedLock, HealthAggregator,
    MemoryRateLimitWindow, SystemHealth, TenantRateLimiter, WorkloadPartitioner,
};
use verdict_types::audit::AuditRecord;
use verdict_types::context::RequestContext;
use verdict_types::error::Result;
use verdict_types::event::{EventDraft, EventResponse};
use verdict_types::ports::{CacheStorage, EventPublisher, EventRepository};
use verdict_workflow::{ComplianceWorkflow, ObservabilityHooks, RiskWorkflow, WorkflowStateStore};

use crate::config::EngineConfig;
use crate::dispatch::WorkflowDispatcher;
use crate::health::{CacheProbe, EventStoreProbe, PublisherProbe};
use crate::publish::CircuitBreakerPublisher;
use crate::service::EventService;
use crate::store::MemoryEventStore;

/// The assembled governed-decision engine
pub struct Engine {
    cache: Arc<dyn CacheStorage>,
    repository: Arc<dyn EventRepository>,
    audit_sink: Arc<MemoryAuditSink>,
    service: EventService,
    rate_limiter: TenantRateLimiter,
    partitioner: WorkloadPartitioner,
    bulkhead: Arc<Bulkhead>,
    breaker: Arc<CircuitBreaker>,
    snapshots: Arc<WorkflowStateStore>,
    model_registry: Arc<ModelRegistry>,
    prompt_registry: Arc<PromptRegistry>,
    approvals: ApprovalWorkflow,
    metrics: Arc<MetricsCollector>,
    spans: Arc<SpanRecorder>,
    cost: Arc<CostTracker>,
    health: HealthAggregator,
}

impl Engine {
    /// Assemble an engine around a broker publisher adapter.
    ///
    /// Everything else (cache, event store, audit sink, registries,
    /// workflows, substrate) is built here, once.
    pub fn new(config: EngineConfig, broker: Arc<dyn EventPublisher>) -> Result<Self> {
        let cache: Arc<dyn CacheStorage> = Arc::new(MemoryCacheStorage::new());
        let repository: Arc<dyn EventRepository> = Arc::new(MemoryEventStore::new());
        let audit_sink = Arc::new(MemoryAuditSink::new());
        let audit = AuditLogger::new(audit_sink.clone());

        let metrics = Arc::new(MetricsCollector::new());
        let spans = Arc::new(SpanRecorder::new());
        let cost = Arc::new(CostTracker::default());
        let generation_log = Arc::new(GenerationLog::with_hooks(Some(cost.clone()), None));
        let hooks = ObservabilityHooks {
            metrics: Some(metrics.clone()),
            spans: Some(spans.clone()),
            cost: Some(cost.clone()),
            generation_log: Some(generation_log),
            evaluation: Some(Arc::new(EvaluationService::with_audit(audit_sink.clone()))),
        };

        let breaker = Arc::new(CircuitBreaker::new(
            "publisher",
            CircuitBreakerConfig {
                failure_threshold: config.breaker.failure_threshold,
                recovery_timeout: Duration::from_millis(config.breaker.recovery_timeout_ms),
            },
        ));
        let publisher: Arc<dyn EventPublisher> = Arc::new(
            CircuitBreakerPublisher::new(broker.clone(), breaker.clone())
                .with_metrics(metrics.clone()),
        );

        let model_registry = Arc::new(ModelRegistry::new(
            Arc::new(MemoryModelStore::new()),
            audit.clone(),
        ));
        let prompt_registry = Arc::new(PromptRegistry::new(
            Arc::new(MemoryPromptStore::new()),
            audit.clone(),
        ));
        let approvals = ApprovalWorkflow::new(Arc::new(MemoryApprovalStore::new()), audit.clone());

        let snapshots = Arc::new(WorkflowStateStore::new(cache.clone()));
        let risk_workflow = Arc::new(
            RiskWorkflow::new(audit.clone())
                .with_store(snapshots.clone())
                .with_registries(model_registry.clone(), prompt_registry.clone())
                .with_hooks(hooks.clone()),
        );
        let compliance_workflow = Arc::new(
            ComplianceWorkflow::new(audit.clone())
                .with_store(snapshots.clone())
                .with_registries(model_registry.clone(), prompt_registry.clone())
                .with_hooks(hooks),
        );

        let lock = Arc::new(DistributedLock::new(cache.clone()));
        let dispatcher = Arc::new(WorkflowDispatcher::new(
            repository.clone(),
            risk_workflow,
            compliance_workflow,
            lock,
            config.workflow_lock_ttl(),
        ));

        let service = EventService::new(
            repository.clone(),
            publisher.clone(),
            cache.clone(),
            dispatcher,
            audit,
            config.idempotency_ttl(),
        );

        let rate_limiter = TenantRateLimiter::new(
            Box::new(MemoryRateLimitWindow::new()),
            config.rate_limit.requests_per_window,
            Duration::from_secs(config.rate_limit.window_seconds),
        );
        let partitioner = WorkloadPartitioner::new(config.num_partitions)?;
        let bulkhead = Arc::new(Bulkhead::new(
            "ingestion",
            config.bulkhead.max_concurrent,
            config.bulkhead.max_queued,
        ));

        let health = HealthAggregator::new()
            .with_probe("cache", Arc::new(CacheProbe(cache.clone())))
            .with_probe("event_store", Arc::new(EventStoreProbe(repository.clone())))
            .with_probe("publisher", Arc::new(PublisherProbe(broker)))
            .with_breaker(breaker.clone())
            .with_backlog(bulkhead.clone());

        Ok(Self {
            cache,
            repository,
            audit_sink,
            service,
            rate_limiter,
            partitioner,
            bulkhead,
            breaker,
            snapshots,
            model_registry,
            prompt_registry,
            approvals,
            metrics,
            spans,
            cost,
            health,
        })
    }

    /// Submit an event through the full admission path: rate limit,
    /// partition, bulkhead, ingestion transaction.
    pub async fn submit_event(
        &self,
        draft: EventDraft,
        context: &RequestContext,
    ) -> Result<EventResponse> {
        if let Err(e) = self.rate_limiter.check(&context.tenant_id).await {
            self.metrics
                .increment_labeled("rate_limit_exceeded", "tenant", &context.tenant_id);
            return Err(e);
        }

        let partition = self.partitioner.partition(&context.tenant_id);
        debug!(
            tenant_id = %context.tenant_id,
            partition,
            correlation_id = %context.correlation_id,
            "request admitted"
        );

        self.bulkhead
            .submit(|| self.service.create_event(draft, context))
            .await
    }

    /// Fetch an event for the requesting tenant
    pub async fn get_event(&self, tenant_id: &str, event_id: &str) -> Result<EventResponse> {
        self.service.get_event(tenant_id, event_id).await
    }

    /// Aggregate system health
    pub async fn health(&self) -> SystemHealth {
        self.health.system_health().await
    }

    /// All audit records appended so far
    pub async fn audit_records(&self) -> Result<Vec<AuditRecord>> {
        use verdict_types::ports::AuditSink;
        self.audit_sink.records().await
    }

    /// Key-value store handle (idempotency, snapshots, locks)
    pub fn cache(&self) -> Arc<dyn CacheStorage> {
        Arc::clone(&self.cache)
    }

    /// Durable event store handle
    pub fn repository(&self) -> Arc<dyn EventRepository> {
        Arc::clone(&self.repository)
    }

    /// Workflow snapshot store handle
    pub fn snapshots(&self) -> Arc<WorkflowStateStore> {
        Arc::clone(&self.snapshots)
    }

    /// Model registry handle
    pub fn model_registry(&self) -> Arc<ModelRegistry> {
        Arc::clone(&self.model_registry)
    }

    /// Prompt registry handle
    pub fn prompt_registry(&self) -> Arc<PromptRegistry> {
        Arc::clone(&self.prompt_registry)
    }

    /// Approval workflow handle
    pub fn approvals(&self) -> &ApprovalWorkflow {
        &self.approvals
    }

    /// Metrics registry handle
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    /// Span recorder handle
    pub fn spans(&self) -> Arc<SpanRecorder> {
        Arc::clone(&self.spans)
    }

    /// Cost ledger handle
    pub fn cost(&self) -> Arc<CostTracker> {
        Arc::clone(&self.cost)
    }

    /// Publisher circuit breaker handle
    pub fn breaker(&self) -> Arc<CircuitBreaker> {
        Arc::clone(&self.breaker)
    }
}
