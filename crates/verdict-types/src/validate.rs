//! Pure domain validation rules
//!
//! No infrastructure access; every function returns a typed error the
//! caller surfaces as a 422.

use crate::error::{Result, VerdictError};
use crate::event::{EventDraft, EventKind};

/// Lower risk score bound (inclusive)
pub const RISK_SCORE_MIN: f64 = 0.0;
/// Upper risk score bound (inclusive)
pub const RISK_SCORE_MAX: f64 = 100.0;

/// Tenant constraint: must not be empty
pub fn validate_tenant_id(tenant_id: &str) -> Result<()> {
    if tenant_id.trim().is_empty() {
        return Err(VerdictError::InvalidTenant("tenant_id must not be empty".into()));
    }
    Ok(())
}

/// Risk score, when present, must lie in `[0, 100]`
pub fn validate_risk_score(risk_score: Option<f64>) -> Result<()> {
    match risk_score {
        Some(score) if !(RISK_SCORE_MIN..=RISK_SCORE_MAX).contains(&score) => {
            Err(VerdictError::RiskThreshold { score })
        }
        _ => Ok(()),
    }
}

/// Metadata, when present, must be a JSON object
pub fn validate_metadata(metadata: Option<&serde_json::Value>) -> Result<()> {
    match metadata {
        Some(value) if !value.is_object() => Err(VerdictError::InvalidMetadata(
            "metadata must be a JSON object".into(),
        )),
        _ => Ok(()),
    }
}

/// Version constraint: must be set and non-empty
pub fn validate_version(version: &str) -> Result<()> {
    if version.trim().is_empty() {
        return Err(VerdictError::Validation("version must be set and non-empty".into()));
    }
    Ok(())
}

/// Validate a creation request: tenant, variant-specific rules, metadata,
/// version
pub fn validate_draft(draft: &EventDraft) -> Result<()> {
    validate_tenant_id(&draft.tenant_id)?;
    if let EventKind::Risk { risk_score, .. } = &draft.kind {
        validate_risk_score(*risk_score)?;
    }
    validate_metadata(draft.metadata.as_ref())?;
    validate_version(&draft.version)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(score: Option<f64>) -> EventDraft {
        EventDraft {
            tenant_id: "tenant-a".into(),
            metadata: Some(json!({"category": "fraud"})),
            version: "1.0".into(),
            kind: EventKind::Risk {
                risk_score: score,
                category: None,
            },
        }
    }

    #[test]
    fn accepts_valid_draft() {
        validate_draft(&draft(Some(75.5))).unwrap();
        validate_draft(&draft(None)).unwrap();
    }

    #[test]
    fn rejects_empty_tenant() {
        let mut d = draft(None);
        d.tenant_id = "  ".into();
        assert!(matches!(
            validate_draft(&d).unwrap_err(),
            VerdictError::InvalidTenant(_)
        ));
    }

    #[test]
    fn rejects_out_of_bounds_score() {
        assert!(validate_risk_score(Some(100.1)).is_err());
        assert!(validate_risk_score(Some(-0.1)).is_err());
        validate_risk_score(Some(0.0)).unwrap();
        validate_risk_score(Some(100.0)).unwrap();
    }

    #[test]
    fn rejects_non_object_metadata() {
        let mut d = draft(None);
        d.metadata = Some(json!([1, 2, 3]));
        assert!(matches!(
            validate_draft(&d).unwrap_err(),
            VerdictError::InvalidMetadata(_)
        ));
    }

    #[test]
    fn rejects_blank_version() {
        let mut d = draft(None);
        d.version = String::new();
        assert!(validate_draft(&d).is_err());
    }
}
