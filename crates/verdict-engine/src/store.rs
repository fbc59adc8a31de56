//! Durable event store
//!
//! The primary source of truth for persisted events, keyed by
//! `(tenant_id, event_id)` so cross-tenant collisions cannot exist. The
//! key-value cache never holds event records; it only ever caches the
//! idempotency response.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use verdict_types::error::Result;
use verdict_types::event::EventRecord;
use verdict_types::ports::EventRepository;

/// In-process durable event store
#[derive(Default)]
pub struct MemoryEventStore {
    events: DashMap<(String, String), EventRecord>,
}

impl MemoryEventStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted events across all tenants
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing is persisted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl EventRepository for MemoryEventStore {
    async fn save(&self, record: &EventRecord) -> Result<()> {
        debug!(
            tenant_id = %record.tenant_id,
            event_id = %record.event_id,
            status = %record.status,
            "event persisted"
        );
        self.events.insert(
            (record.tenant_id.clone(), record.event_id.clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn get(&self, tenant_id: &str, event_id: &str) -> Result<Option<EventRecord>> {
        Ok(self
            .events
            .get(&(tenant_id.to_string(), event_id.to_string()))
            .map(|entry| entry.clone()))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
