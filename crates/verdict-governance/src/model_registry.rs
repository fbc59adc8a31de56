//! Model registry
//!
//! Tracks model versions and their approval state. Only `APPROVED`
//! records are deployable; an `APPROVED` record cannot be re-approved and
//! a `REJECTED` one can never be approved. Approvals and rejections emit
//! audit records.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::audit::AuditLogger;
use verdict_types::error::{Result, VerdictError};

/// Approval state of a registered model version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelStatus {
    /// Registered, awaiting review
    Pending,
    /// Reviewed and deployable
    Approved,
    /// Reviewed and barred from deployment
    Rejected,
}

/// Registered model version. Immutable; decisions produce replacement
/// records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Model name
    pub model_name: String,
    /// Version label
    pub version: String,
    /// Artifact checksum recorded at registration
    pub checksum: String,
    /// When the version was registered (UTC)
    pub created_at: DateTime<Utc>,
    /// Approval state
    pub status: ModelStatus,
    /// Who approved, when approved
    pub approved_by: Option<String>,
    /// When the approval happened (UTC)
    pub approved_at: Option<DateTime<Utc>>,
}

impl ModelRecord {
    /// Only approved records may be deployed
    pub fn is_deployable(&self) -> bool {
        self.status == ModelStatus::Approved
    }
}

/// Storage for model records
#[async_trait]
pub trait ModelRegistryStore: Send + Sync {
    /// Insert or replace the record for `(model_name, version)`
    async fn save(&self, record: ModelRecord) -> Result<()>;

    /// Fetch a specific version
    async fn get(&self, model_name: &str, version: &str) -> Result<Option<ModelRecord>>;

    /// Fetch the most recently registered version of a model
    async fn get_latest(&self, model_name: &str) -> Result<Option<ModelRecord>>;
}

/// In-process model record store
#[derive(Default)]
pub struct MemoryModelStore {
    // (name, version) -> record; insertion order tracked for get_latest
    records: Mutex<Vec<((String, String), ModelRecord)>>,
}

impl MemoryModelStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModelRegistryStore for MemoryModelStore {
    async fn save(&self, record: ModelRecord) -> Result<()> {
        let key = (record.model_name.clone(), record.version.clone());
        let mut records = self.records.lock();
        if let Some(slot) = records.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = record;
        } else {
            records.push((key, record));
        }
        Ok(())
    }

    async fn get(&self, model_name: &str, version: &str) -> Result<Option<ModelRecord>> {
        let records = self.records.lock();
        Ok(records
            .iter()
            .find(|((n, v), _)| n == model_name && v == version)
            .map(|(_, r)| r.clone()))
    }

    async fn get_latest(&self, model_name: &str) -> Result<Option<ModelRecord>> {
        let records = self.records.lock();
        Ok(records
            .iter()
            .rev()
            .find(|((n, _), _)| n == model_name)
            .map(|(_, r)| r.clone()))
    }
}

/// Approval-gated model version tracking
pub struct ModelRegistry {
    store: Arc<dyn ModelRegistryStore>,
    audit: AuditLogger,
}

impl ModelRegistry {
    /// Create a registry over a store and an audit logger
    pub fn new(store: Arc<dyn ModelRegistryStore>, audit: AuditLogger) -> Self {
        Self { store, audit }
    }

    /// Register a new model version with status `PENDING`
    pub async fn register(
        &self,
        model_name: &str,
        version: &str,
        checksum: &str,
    ) -> Result<ModelRecord> {
        let record = ModelRecord {
            model_name: model_name.to_string(),
            version: version.to_string(),
            checksum: checksum.to_string(),
            created_at: Utc::now(),
            status: ModelStatus::Pending,
            approved_by: None,
            approved_at: None,
        };
        self.store.save(record.clone()).await?;
        Ok(record)
    }

    /// Approve a pending version. Emits a `model_approved` audit record.
    ///
    /// Fails when the version is unknown, already approved, or rejected.
    #[allow(clippy::too_many_arguments)]
    pub async fn approve(
        &self,
        model_name: &str,
        version: &str,
        approved_by: &str,
        tenant_id: &str,
        correlation_id: &str,
        reason: Option<&str>,
    ) -> Result<ModelRecord> {
        let existing = self.existing(model_name, version).await?;
        match existing.status {
            ModelStatus::Approved => {
                return Err(VerdictError::InvalidModelState(format!(
                    "Model already approved: {model_name}@{version}"
                )))
            }
            ModelStatus::Rejected => {
                return Err(VerdictError::InvalidModelState(format!(
                    "Cannot approve rejected model: {model_name}@{version}"
                )))
            }
            ModelStatus::Pending => {}
        }
        let approved = ModelRecord {
            status: ModelStatus::Approved,
            approved_by: Some(approved_by.to_string()),
            approved_at: Some(Utc::now()),
            ..existing
        };
        self.store.save(approved.clone()).await?;
        self.audit
            .log_action(
                approved_by,
                tenant_id,
                "model_approved",
                "model",
                &format!("{model_name}@{version}"),
                reason,
                correlation_id,
                Some(serde_json::json!({"model_name": model_name, "version": version})),
            )
            .await?;
        Ok(approved)
    }

    /// Reject a version that is not already rejected. Emits a
    /// `model_rejected` audit record.
    #[allow(clippy::too_many_arguments)]
    pub async fn reject(
        &self,
        model_name: &str,
        version: &str,
        rejected_by: &str,
        tenant_id: &str,
        correlation_id: &str,
        reason: Option<&str>,
    ) -> Result<ModelRecord> {
        let existing = self.existing(model_name, version).await?;
        if existing.status == ModelStatus::Rejected {
            return Err(VerdictError::InvalidModelState(format!(
                "Model already rejected: {model_name}@{version}"
            )));
        }
        let rejected = ModelRecord {
            status: ModelStatus::Rejected,
            approved_by: None,
            approved_at: None,
            ..existing
        };
        self.store.save(rejected.clone()).await?;
        self.audit
            .log_action(
                rejected_by,
                tenant_id,
                "model_rejected",
                "model",
                &format!("{model_name}@{version}"),
                reason,
                correlation_id,
                Some(serde_json::json!({"model_name": model_name, "version": version})),
            )
            .await?;
        Ok(rejected)
    }

    /// Fetch a record; latest version when `version` is `None`
    pub async fn get(&self, model_name: &str, version: Option<&str>) -> Result<Option<ModelRecord>> {
        match version {
            Some(v) => self.store.get(model_name, v).await,
            None => self.store.get_latest(model_name).await,
        }
    }

    /// Fetch a record and enforce deployability.
    ///
    /// Fails with [`VerdictError::ModelNotApproved`] unless the record
    /// exists with status `APPROVED`.
    pub async fn get_approved(
        &self,
        model_name: &str,
        version: Option<&str>,
    ) -> Result<ModelRecord> {
        let record = self
            .get(model_name, version)
            .await?
            .ok_or_else(|| VerdictError::ModelNotApproved(format!("Model not found: {model_name}")))?;
        if !record.is_deployable() {
            return Err(VerdictError::ModelNotApproved(format!(
                "Cannot deploy unapproved model: {}@{}",
                record.model_name, record.version
            )));
        }
        Ok(record)
    }

    async fn existing(&self, model_name: &str, version: &str) -> Result<ModelRecord> {
        self.store.get(model_name, version).await?.ok_or_else(|| {
            VerdictError::InvalidModelState(format!("Model not found: {model_name}@{version}"))
        })
    }
}
