//! Broker publisher port
//!
//! One durable topic exchange (`risk_events`); routing keys
//! `risk.created` / `compliance.created`; persistent delivery; the
//! client's idempotency key echoed as a message header so consumers can
//! dedupe replays.

use async_trait::async_trait;

use crate::error::Result;
use crate::event::PublishedMessage;

/// Exchange every created event is broadcast on
pub const EXCHANGE_RISK_EVENTS: &str = "risk_events";

/// Port for the messaging collaborator. Any surfaced error aborts the
/// ingestion transaction as a messaging failure.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a persistent message to `exchange` under `routing_key`,
    /// carrying `idempotency_key` as a message header
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: &PublishedMessage,
        idempotency_key: &str,
    ) -> Result<()>;

    /// Health check for the broker connection
    async fn health_check(&self) -> Result<bool>;
}
