//! Broker publishing
//!
//! [`MemoryEventPublisher`] stands in for the AMQP collaborator (one
//! durable topic exchange, persistent messages, the idempotency key as a
//! message header) and supports failure injection for tests.
//! [`CircuitBreakerPublisher`] wraps any publisher with the breaker so a
//! broken broker fast-fails instead of hanging every request.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use verdict_monitoring::MetricsCollector;
use verdict_reliability::CircuitBreaker;
use verdict_types::error::{Result, VerdictError};
use verdict_types::event::PublishedMessage;
use verdict_types::ports::EventPublisher;

/// One captured publish
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPublish {
    /// Exchange the message went to
    pub exchange: String,
    /// Topic routing key
    pub routing_key: String,
    /// Broadcast payload
    pub message: PublishedMessage,
    /// Idempotency header echoed from the request
    pub idempotency_key: String,
}

/// In-memory topic publisher with failure injection
#[derive(Default)]
pub struct MemoryEventPublisher {
    published: Mutex<Vec<CapturedPublish>>,
    fail_with: Mutex<Option<String>>,
}

impl MemoryEventPublisher {
    /// Create a publisher that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail with `reason`; `None` restores
    /// normal operation
    pub fn set_failure(&self, reason: Option<&str>) {
        *self.fail_with.lock() = reason.map(str::to_string);
    }

    /// Everything published so far
    pub fn published(&self) -> Vec<CapturedPublish> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl EventPublisher for MemoryEventPublisher {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: &PublishedMessage,
        idempotency_key: &str,
    ) -> Result<()> {
        if let Some(reason) = self.fail_with.lock().clone() {
            warn!(exchange, routing_key, "injected publish failure");
            return Err(VerdictError::Messaging(reason));
        }
        debug!(exchange, routing_key, event_id = %message.event_id, "published");
        self.published.lock().push(CapturedPublish {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            message: message.clone(),
            idempotency_key: idempotency_key.to_string(),
        });
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.fail_with.lock().is_none())
    }
}

/// Publisher wrapped by a circuit breaker.
///
/// On reconnects and outages the breaker's state is the source of truth
/// for admission: an open circuit rejects publishes without touching the
/// broker until the cooldown elapses.
pub struct CircuitBreakerPublisher {
    inner: Arc<dyn EventPublisher>,
    breaker: Arc<CircuitBreaker>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl CircuitBreakerPublisher {
    /// Wrap `inner` with `breaker`
    pub fn new(inner: Arc<dyn EventPublisher>, breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            inner,
            breaker,
            metrics: None,
        }
    }

    /// Count breaker outcomes (`circuit_breaker_success` /
    /// `circuit_breaker_failure`, labeled by breaker name)
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The wrapping breaker, for health reporting
    pub fn breaker(&self) -> Arc<CircuitBreaker> {
        Arc::clone(&self.breaker)
    }
}

#[async_trait]
impl EventPublisher for CircuitBreakerPublisher {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: &PublishedMessage,
        idempotency_key: &str,
    ) -> Result<()> {
        let outcome = self
            .breaker
            .call(|| self.inner.publish(exchange, routing_key, message, idempotency_key))
            .await;
        if let Some(metrics) = &self.metrics {
            match &outcome {
                Ok(()) => {
                    metrics.increment_labeled("circuit_breaker_success", "name", self.breaker.name())
                }
                // A fast-failed call never reached the dependency
                Err(VerdictError::CircuitOpen(_)) => {}
                Err(_) => {
                    metrics.increment_labeled("circuit_breaker_failure", "name", self.breaker.name())
                }
            }
        }
        outcome
    }

    async fn health_check(&self) -> Result<bool> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use verdict_reliability::CircuitBreakerConfig;
    use verdict_types::event::EventStatus;

    fn message() -> PublishedMessage {
        PublishedMessage {
            event_id: "evt-1".into(),
            tenant_id: "tenant-a".into(),
            correlation_id: "corr-1".into(),
            event_type: "RiskEvent".into(),
            status: EventStatus::Received,
        }
    }

    #[tokio::test]
    async fn captures_publishes() {
        let publisher = MemoryEventPublisher::new();
        publisher
            .publish("risk_events", "risk.created", &message(), "key-1")
            .await
            .unwrap();
        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].routing_key, "risk.created");
        assert_eq!(published[0].idempotency_key, "key-1");
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_messaging() {
        let publisher = MemoryEventPublisher::new();
        publisher.set_failure(Some("broker unreachable"));
        let err = publisher
            .publish("risk_events", "risk.created", &message(), "key-1")
            .await
            .unwrap_err();
        assert!(matches!(err, VerdictError::Messaging(_)));
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn breaker_opens_after_repeated_failures() {
        let inner = Arc::new(MemoryEventPublisher::new());
        inner.set_failure(Some("down"));
        let breaker = Arc::new(CircuitBreaker::new(
            "publisher",
            CircuitBreakerConfig {
                failure_threshold: 2,
                recovery_timeout: Duration::from_secs(30),
            },
        ));
        let wrapped = CircuitBreakerPublisher::new(inner.clone(), breaker);

        for _ in 0..2 {
            assert!(wrapped
                .publish("risk_events", "risk.created", &message(), "k")
                .await
                .is_err());
        }
        // Breaker now rejects without reaching the inner publisher
        inner.set_failure(None);
        let err = wrapped
            .publish("risk_events", "risk.created", &message(), "k")
            .await
            .unwrap_err();
        assert!(matches!(err, VerdictError::CircuitOpen(_)));
        assert!(inner.published().is_empty());
    }
}
