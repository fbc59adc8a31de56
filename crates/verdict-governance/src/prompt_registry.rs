//! Prompt registry
//!
//! Versioned prompt tracking: registration stores version 1, every
//! update appends version `n+1`, previous versions stay immutable. Every
//! mutation records the change reason and author and emits an audit
//! record.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::audit::AuditLogger;
use verdict_types::error::{Result, VerdictError};

/// One immutable version of a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    /// Stable prompt identifier
    pub prompt_id: String,
    /// Human-readable name, fixed at registration
    pub name: String,
    /// Monotonic version, starting at 1
    pub version: u32,
    /// Prompt content for this version
    pub content: String,
    /// Why this version exists
    pub change_reason: String,
    /// Who wrote it
    pub author: String,
    /// When this version was created (UTC)
    pub created_at: DateTime<Utc>,
}

/// Storage for versioned prompts; previous versions are never rewritten
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Append a new version
    async fn save(&self, record: PromptRecord) -> Result<()>;

    /// Fetch a version; latest when `version` is `None`
    async fn get(&self, prompt_id: &str, version: Option<u32>) -> Result<Option<PromptRecord>>;
}

/// In-process prompt store
#[derive(Default)]
pub struct MemoryPromptStore {
    records: Mutex<Vec<PromptRecord>>,
}

impl MemoryPromptStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PromptStore for MemoryPromptStore {
    async fn save(&self, record: PromptRecord) -> Result<()> {
        self.records.lock().push(record);
        Ok(())
    }

    async fn get(&self, prompt_id: &str, version: Option<u32>) -> Result<Option<PromptRecord>> {
        let records = self.records.lock();
        let mut matching: Vec<&PromptRecord> =
            records.iter().filter(|r| r.prompt_id == prompt_id).collect();
        matching.sort_by_key(|r| r.version);
        Ok(match version {
            Some(v) => matching.iter().find(|r| r.version == v).map(|r| (*r).clone()),
            None => matching.last().map(|r| (*r).clone()),
        })
    }
}

/// Versioned prompt tracking with audited mutations
pub struct PromptRegistry {
    store: Arc<dyn PromptStore>,
    audit: AuditLogger,
}

impl PromptRegistry {
    /// Create a registry over a store and an audit logger
    pub fn new(store: Arc<dyn PromptStore>, audit: AuditLogger) -> Self {
        Self { store, audit }
    }

    /// Register the first version of a prompt (version 1)
    #[allow(clippy::too_many_arguments)]
    pub async fn register_prompt(
        &self,
        prompt_id: &str,
        name: &str,
        content: &str,
        change_reason: &str,
        author: &str,
        tenant_id: &str,
        correlation_id: &str,
    ) -> Result<PromptRecord> {
        let record = PromptRecord {
            prompt_id: prompt_id.to_string(),
            name: name.to_string(),
            version: 1,
            content: content.to_string(),
            change_reason: change_reason.to_string(),
            author: author.to_string(),
            created_at: Utc::now(),
        };
        self.store.save(record.clone()).await?;
        self.audit
            .log_action(
                author,
                tenant_id,
                "prompt_registered",
                "prompt",
                &format!("{prompt_id}@1"),
                Some(change_reason),
                correlation_id,
                Some(serde_json::json!({"prompt_id": prompt_id, "version": 1, "author": author})),
            )
            .await?;
        Ok(record)
    }

    /// Create version `n+1` from the latest version `n`. The previous
    /// versions remain readable and unchanged.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_prompt(
        &self,
        prompt_id: &str,
        content: &str,
        change_reason: &str,
        author: &str,
        tenant_id: &str,
        correlation_id: &str,
    ) -> Result<PromptRecord> {
        let latest = self
            .store
            .get(prompt_id, None)
            .await?
            .ok_or_else(|| VerdictError::NotFound(format!("Prompt not found: {prompt_id}")))?;
        let next_version = latest.version + 1;
        let record = PromptRecord {
            prompt_id: prompt_id.to_string(),
            name: latest.name.clone(),
            version: next_version,
            content: content.to_string(),
            change_reason: change_reason.to_string(),
            author: author.to_string(),
            created_at: Utc::now(),
        };
        self.store.save(record.clone()).await?;
        self.audit
            .log_action(
                author,
                tenant_id,
                "prompt_updated",
                "prompt",
                &format!("{prompt_id}@{next_version}"),
                Some(change_reason),
                correlation_id,
                Some(serde_json::json!({
                    "prompt_id": prompt_id,
                    "version": next_version,
                    "author": author,
                    "previous_version": latest.version,
                })),
            )
            .await?;
        Ok(record)
    }

    /// Fetch a version; latest when `version` is `None`
    pub async fn get_prompt(
        &self,
        prompt_id: &str,
        version: Option<u32>,
    ) -> Result<Option<PromptRecord>> {
        self.store.get(prompt_id, version).await
    }
}
