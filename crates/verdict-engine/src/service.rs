//! Event application service — the ingestion transaction boundary
//!
//! Orchestration only: no transport, no direct infrastructure. The
//! transaction order is load-bearing:
//!
//! 1. idempotency probe (no side effects)
//! 2. persist with status `received` (primary source of truth)
//! 3. publish (failure aborts the transaction, nothing cached)
//! 4. workflow dispatch (best-effort; failures audited and swallowed)
//! 5. `event_created` audit
//! 6. idempotency cache write (TTL 300 s)
//! 7. return the response
//!
//! Persisting before publishing guarantees a stored event for every
//! message the broker accepted; caching only after publishing guarantees
//! a retried client never sees success without broadcast.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use verdict_governance::AuditLogger;
use verdict_security::validate_access;
use verdict_types::context::RequestContext;
use verdict_types::error::{Result, VerdictError};
use verdict_types::event::{EventDraft, EventRecord, EventResponse, PublishedMessage};
use verdict_types::ports::publisher::EXCHANGE_RISK_EVENTS;
use verdict_types::ports::{CacheStorage, EventPublisher, EventRepository, WorkflowTrigger};
use verdict_types::validate::validate_draft;

const IDEMPOTENCY_PREFIX: &str = "idempotency:";
/// Actor recorded on ingestion audits
const SERVICE_ACTOR: &str = "event_service";

fn idempotency_key(tenant_id: &str, key: &str) -> String {
    format!("{IDEMPOTENCY_PREFIX}{tenant_id}:{key}")
}

/// Application-layer orchestration of event creation and lookup
pub struct EventService {
    repository: Arc<dyn EventRepository>,
    publisher: Arc<dyn EventPublisher>,
    cache: Arc<dyn CacheStorage>,
    workflow_trigger: Arc<dyn WorkflowTrigger>,
    audit: AuditLogger,
    idempotency_ttl: Duration,
}

impl EventService {
    /// Wire the service against its collaborators
    pub fn new(
        repository: Arc<dyn EventRepository>,
        publisher: Arc<dyn EventPublisher>,
        cache: Arc<dyn CacheStorage>,
        workflow_trigger: Arc<dyn WorkflowTrigger>,
        audit: AuditLogger,
        idempotency_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            publisher,
            cache,
            workflow_trigger,
            audit,
            idempotency_ttl,
        }
    }

    /// Idempotent create. If the transaction returns a response, the
    /// event was persisted *and* published; if it fails after
    /// persistence, no idempotency record exists and a retry with the
    /// same key re-executes.
    pub async fn create_event(
        &self,
        draft: EventDraft,
        context: &RequestContext,
    ) -> Result<EventResponse> {
        let tenant_id = &context.tenant_id;
        let correlation_id = &context.correlation_id;
        let idem_key = context.idempotency_key()?;

        // Step 1 — idempotency probe; a hit replays the original response
        let cache_key = idempotency_key(tenant_id, idem_key);
        info!(tenant_id, correlation_id, "idempotency_check");
        if let Some(cached) = self.cache.get(&cache_key).await? {
            info!(tenant_id, correlation_id, "idempotent_replay");
            return Ok(serde_json::from_slice(&cached)?);
        }

        // Step 2 — validate, then persist; the store commits before
        // anything is published
        validate_draft(&draft)?;
        validate_access(&draft.tenant_id, tenant_id)?;
        let record = EventRecord::from_draft(draft, correlation_id.clone());
        self.repository.save(&record).await?;
        info!(tenant_id, correlation_id, event_id = %record.event_id, "event_persisted");

        // Step 3 — publish; failure aborts the transaction and the
        // idempotency cache stays unwritten so a retry re-executes
        let message = PublishedMessage::for_event(&record);
        self.publisher
            .publish(
                EXCHANGE_RISK_EVENTS,
                record.kind.routing_key(),
                &message,
                idem_key,
            )
            .await
            .map_err(|e| {
                error!(
                    tenant_id,
                    correlation_id,
                    event_id = %record.event_id,
                    error = %e,
                    "event_creation_failed"
                );
                VerdictError::Messaging(format!("Publish failed: {e}"))
            })?;
        info!(tenant_id, correlation_id, event_id = %record.event_id, "event_published");

        // Step 4 — workflow dispatch; best-effort, the persisted event and
        // the published message are the authoritative artifacts
        if let Err(e) = self
            .workflow_trigger
            .start(&record.event_id, &record.tenant_id)
            .await
        {
            error!(
                tenant_id,
                correlation_id,
                event_id = %record.event_id,
                error = %e,
                "workflow_trigger_failed"
            );
            self.audit
                .log_action(
                    SERVICE_ACTOR,
                    tenant_id,
                    "workflow_trigger_failed",
                    "event",
                    &record.event_id,
                    Some(&e.to_string()),
                    correlation_id,
                    None,
                )
                .await?;
        } else {
            info!(tenant_id, correlation_id, event_id = %record.event_id, "workflow_triggered");
        }

        // Step 5 — audit the creation
        self.audit
            .log_action(
                SERVICE_ACTOR,
                tenant_id,
                "event_created",
                "event",
                &record.event_id,
                None,
                correlation_id,
                Some(serde_json::json!({
                    "event_type": record.kind.type_name(),
                    "status": record.status,
                })),
            )
            .await?;

        // Step 6 — cache the response for idempotent replay
        let response = EventResponse::from(&record);
        self.cache
            .set(
                &cache_key,
                &serde_json::to_vec(&response)?,
                Some(self.idempotency_ttl),
            )
            .await?;
        info!(tenant_id, correlation_id, event_id = %record.event_id, "idempotency_cached");

        // Step 7
        Ok(response)
    }

    /// Fetch an event by id for the requesting tenant.
    ///
    /// Fails with [`VerdictError::NotFound`] when absent; a record owned
    /// by another tenant is indistinguishable from an absent one at the
    /// store, and the isolation check guards the remaining paths.
    pub async fn get_event(&self, tenant_id: &str, event_id: &str) -> Result<EventResponse> {
        let record = self
            .repository
            .get(tenant_id, event_id)
            .await?
            .ok_or_else(|| VerdictError::NotFound(format!("Event not found: {event_id}")))?;
        validate_access(&record.tenant_id, tenant_id)?;
        Ok(EventResponse::from(&record))
    }
}
