//! Event repository port
//!
//! The durable event store is the primary source of truth for persisted
//! events; the key-value cache never stores event records, only the
//! idempotency response. Keys are `(tenant_id, event_id)` so cross-tenant
//! collisions are impossible by construction.

use async_trait::async_trait;

use crate::error::Result;
use crate::event::EventRecord;

/// Port for persisting and retrieving domain events
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Persist an event. The record carries status `received` at the
    /// ingestion boundary; the store commits before the caller proceeds.
    async fn save(&self, record: &EventRecord) -> Result<()>;

    /// Fetch an event by tenant and id; `Ok(None)` when absent
    async fn get(&self, tenant_id: &str, event_id: &str) -> Result<Option<EventRecord>>;

    /// Health check for the backing store
    async fn health_check(&self) -> Result<bool>;
}
