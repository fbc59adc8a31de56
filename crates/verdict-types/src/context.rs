//! Ingress request context
//!
//! The HTTP collaborator hands the core a header map; this module pulls
//! out the tenant, the idempotency key, and the correlation id (minting
//! one when absent) and enforces the mandatory-header rules.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{Result, VerdictError};

/// Mandatory tenant header
pub const HEADER_TENANT_ID: &str = "X-Tenant-ID";
/// Mandatory (for create operations) idempotency header
pub const HEADER_IDEMPOTENCY_KEY: &str = "X-Idempotency-Key";
/// Optional correlation header; echoed on the response
pub const HEADER_CORRELATION_ID: &str = "X-Correlation-ID";

/// Per-request context extracted at ingress and propagated through logs,
/// audits, and broker headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Owning tenant; never empty
    pub tenant_id: String,
    /// Trace identifier; generated when the caller omitted one
    pub correlation_id: String,
    /// Client-supplied retry token; present for create operations
    pub idempotency_key: Option<String>,
}

impl RequestContext {
    /// Extract a context from ingress headers.
    ///
    /// `require_idempotency` is true for create operations, where a
    /// missing or empty `X-Idempotency-Key` is a 400.
    pub fn from_headers(
        headers: &HashMap<String, String>,
        require_idempotency: bool,
    ) -> Result<Self> {
        let tenant_id = non_empty(headers, HEADER_TENANT_ID)?;
        let idempotency_key = if require_idempotency {
            Some(non_empty(headers, HEADER_IDEMPOTENCY_KEY)?)
        } else {
            headers
                .get(HEADER_IDEMPOTENCY_KEY)
                .filter(|v| !v.trim().is_empty())
                .cloned()
        };
        let correlation_id = headers
            .get(HEADER_CORRELATION_ID)
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(Self {
            tenant_id,
            correlation_id,
            idempotency_key,
        })
    }

    /// Idempotency key, or an error when the operation needs one
    pub fn idempotency_key(&self) -> Result<&str> {
        self.idempotency_key.as_deref().ok_or_else(|| {
            VerdictError::BadRequest(format!("missing header {HEADER_IDEMPOTENCY_KEY}"))
        })
    }
}

fn non_empty(headers: &HashMap<String, String>, name: &str) -> Result<String> {
    match headers.get(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.clone()),
        Some(_) => Err(VerdictError::BadRequest(format!("empty header {name}"))),
        None => Err(VerdictError::BadRequest(format!("missing header {name}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn extracts_all_headers() {
        let h = headers(&[
            (HEADER_TENANT_ID, "tenant-a"),
            (HEADER_IDEMPOTENCY_KEY, "key-1"),
            (HEADER_CORRELATION_ID, "corr-1"),
        ]);
        let ctx = RequestContext::from_headers(&h, true).unwrap();
        assert_eq!(ctx.tenant_id, "tenant-a");
        assert_eq!(ctx.idempotency_key.as_deref(), Some("key-1"));
        assert_eq!(ctx.correlation_id, "corr-1");
    }

    #[test]
    fn generates_correlation_id_when_absent() {
        let h = headers(&[(HEADER_TENANT_ID, "tenant-a"), (HEADER_IDEMPOTENCY_KEY, "k")]);
        let ctx = RequestContext::from_headers(&h, true).unwrap();
        assert!(Uuid::parse_str(&ctx.correlation_id).is_ok());
    }

    #[test]
    fn missing_tenant_is_bad_request() {
        let h = headers(&[(HEADER_IDEMPOTENCY_KEY, "k")]);
        let err = RequestContext::from_headers(&h, true).unwrap_err();
        assert_eq!(err.ingress_status(), 400);
    }

    #[test]
    fn empty_idempotency_key_is_bad_request_for_creates() {
        let h = headers(&[(HEADER_TENANT_ID, "tenant-a"), (HEADER_IDEMPOTENCY_KEY, "  ")]);
        assert!(RequestContext::from_headers(&h, true).is_err());
        // Reads do not need the key at all
        let h = headers(&[(HEADER_TENANT_ID, "tenant-a")]);
        let ctx = RequestContext::from_headers(&h, false).unwrap();
        assert!(ctx.idempotency_key.is_none());
    }
}
