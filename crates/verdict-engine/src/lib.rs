//! # Verdict Engine
//!
//! The governed event-processing engine. Ties the substrate together:
//! a request is rate-limited per tenant, partitioned, admitted through
//! the bulkhead, and runs the ingestion transaction — idempotency gate,
//! durable persist, circuit-breaker-wrapped publish, best-effort
//! workflow dispatch, audit, idempotency cache write.
//!
//! HTTP transport, configuration loading, and the real broker and
//! key-value servers stay outside; this crate consumes their ports.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod health;
pub mod publish;
pub mod service;
pub mod store;

pub use config::EngineConfig;
pub use dispatch::WorkflowDispatcher;
pub use engine::Engine;
pub use publish::{CircuitBreakerPublisher, MemoryEventPublisher};
pub use service::EventService;
pub use store::MemoryEventStore;
