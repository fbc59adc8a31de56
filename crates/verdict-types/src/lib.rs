//! # Verdict Types
//!
//! Shared types and traits for the Verdict governed-decision service.
//! This crate holds the domain model, the central error type, and the
//! backend-agnostic port traits that the infrastructure crates implement,
//! breaking circular dependencies between the engine and its adapters.
//!
//! ## Organization
//!
//! - `event`: domain events, status lifecycle, wire-level response shapes
//! - `audit`: the immutable audit record
//! - `context`: ingress request context (tenant, idempotency, correlation)
//! - `error`: error types and result alias
//! - `ports`: port traits for cache, repository, publisher, audit, workflow
//! - `validate`: pure domain validation rules

pub mod audit;
pub mod context;
pub mod error;
pub mod event;
pub mod ports;
pub mod validate;

pub use audit::AuditRecord;
pub use context::{RequestContext, HEADER_CORRELATION_ID, HEADER_IDEMPOTENCY_KEY, HEADER_TENANT_ID};
pub use error::{Result, VerdictError};
pub use event::{EventDraft, EventKind, EventRecord, EventResponse, EventStatus, PublishedMessage};
pub use ports::{AuditSink, CacheStorage, EventPublisher, EventRepository, WorkflowTrigger};
