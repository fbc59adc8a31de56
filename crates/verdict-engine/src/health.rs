//! Health probe adapters
//!
//! Wraps the cache, event store, and publisher ports as
//! [`HealthProbe`]s for the reliability aggregator.

use std::sync::Arc;

use async_trait::async_trait;

use verdict_reliability::HealthProbe;
use verdict_types::error::Result;
use verdict_types::ports::{CacheStorage, EventPublisher, EventRepository};

/// Probe over the key-value store
pub struct CacheProbe(pub Arc<dyn CacheStorage>);

#[async_trait]
impl HealthProbe for CacheProbe {
    async fn check(&self) -> Result<bool> {
        self.0.health_check().await
    }
}

/// Probe over the durable event store
pub struct EventStoreProbe(pub Arc<dyn EventRepository>);

#[async_trait]
impl HealthProbe for EventStoreProbe {
    async fn check(&self) -> Result<bool> {
        self.0.health_check().await
    }
}

/// Probe over the broker publisher
pub struct PublisherProbe(pub Arc<dyn EventPublisher>);

#[async_trait]
impl HealthProbe for PublisherProbe {
    async fn check(&self) -> Result<bool> {
        self.0.health_check().await
    }
}
