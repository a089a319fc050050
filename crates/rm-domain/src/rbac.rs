/// The caller's role set, extracted alongside the tenant id at the RPC
/// boundary (§4.E.1's "applied when enabled" RBAC gate). An empty set is
/// the default for callers that never populate it — harmless unless
/// `rbac_enabled` is also set, in which case every request needs a role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(Vec<String>);

impl RoleSet {
    pub fn new(roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        RoleSet(roles.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.iter().any(|r| r == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_matches_exact_role_only() {
        let roles = RoleSet::new(["maintenance-writer"]);
        assert!(roles.contains("maintenance-writer"));
        assert!(!roles.contains("telemetry-reader"));
    }

    #[test]
    fn empty_set_contains_nothing() {
        assert!(!RoleSet::default().contains("anything"));
    }
}
