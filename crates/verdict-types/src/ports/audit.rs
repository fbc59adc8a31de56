//! Audit sink port
//!
//! Append-only; records are immutable after construction. Implementations
//! must never expose mutation of stored records.

use async_trait::async_trait;

use crate::audit::AuditRecord;
use crate::error::Result;

/// Port for the append-only audit store
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append a record. Existing records are never rewritten.
    async fn append(&self, record: AuditRecord) -> Result<()>;

    /// All records appended so far, in order
    async fn records(&self) -> Result<Vec<AuditRecord>>;
}
