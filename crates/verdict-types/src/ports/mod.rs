//! Port interfaces for dependency inversion
//!
//! Backend-agnostic trait definitions; concrete implementations live in
//! their infrastructure crates. Everything here is `Send + Sync` and
//! async-first, since every port operation is a suspension point.

pub mod audit;
pub mod cache;
pub mod publisher;
pub mod repository;
pub mod workflow;

pub use audit::AuditSink;
pub use cache::CacheStorage;
pub use publisher::EventPublisher;
pub use repository::EventRepository;
pub use workflow::WorkflowTrigger;
