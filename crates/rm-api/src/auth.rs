use axum::http::HeaderMap;

use rm_domain::{RoleSet, TenantId};

const TENANT_HEADER: &str = "x-tenant-id";
const ROLES_HEADER: &str = "x-roles";

/// Extracts the caller's tenant id the way every inventory call and RPC in
/// this workspace carries it (§6.3): a header on ingress, falling back to
/// the reserved default tenant only when the deployment is permissive.
/// Returns `None` when no tenant id can be resolved — callers turn that into
/// `Unauthenticated`.
pub fn extract_tenant(headers: &HeaderMap, permissive_default_tenant: bool) -> Option<TenantId> {
    let header_value = headers.get(TENANT_HEADER).and_then(|v| v.to_str().ok());
    match header_value {
        Some(s) if !s.is_empty() => Some(TenantId::new(s)),
        _ if permissive_default_tenant => Some(TenantId::reserved_default()),
        _ => None,
    }
}

/// Extracts the caller's role set from a comma-separated header. Absent
/// entirely means an empty `RoleSet`, which only matters once RBAC is
/// enabled (§4.E.1).
pub fn extract_roles(headers: &HeaderMap) -> RoleSet {
    let roles = headers
        .get(ROLES_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').map(str::trim).filter(|r| !r.is_empty()).map(str::to_string).collect::<Vec<_>>())
        .unwrap_or_default();
    RoleSet::new(roles)
}
