//! Tenant isolation
//!
//! Every entity belongs to exactly one tenant; a cross-tenant read or
//! mutation is a fatal error, never a filtered result.

use verdict_types::error::{Result, VerdictError};

/// Fail with [`VerdictError::TenantIsolation`] unless the requesting
/// tenant matches the resource's tenant exactly. Both must be non-empty.
pub fn validate_access(resource_tenant: &str, request_tenant: &str) -> Result<()> {
    if resource_tenant.is_empty() || request_tenant.is_empty() {
        return Err(VerdictError::TenantIsolation(
            "resource_tenant and request_tenant must be non-empty".into(),
        ));
    }
    if resource_tenant != request_tenant {
        return Err(VerdictError::TenantIsolation(format!(
            "access denied: resource tenant '{resource_tenant}' does not match request tenant '{request_tenant}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_tenants_pass() {
        validate_access("tenant-a", "tenant-a").unwrap();
    }

    #[test]
    fn mismatch_is_fatal() {
        let err = validate_access("tenant-a", "tenant-b").unwrap_err();
        assert!(matches!(err, VerdictError::TenantIsolation(_)));
    }

    #[test]
    fn empty_tenants_are_fatal() {
        assert!(validate_access("", "tenant-a").is_err());
        assert!(validate_access("tenant-a", "").is_err());
    }
}
