use std::sync::Arc;

use rm_cache::ProfileCache;
use rm_domain::{Clock, HostGuid, RoleSet, TelemetryRelation, TenantId};
use rm_graph::NodeRef;
use rm_inventory::InventoryGateway;

use crate::config::{dedupe, flatten_profile, TelemetryConfigEntry};
use crate::error::TelemetryError;

/// The role a caller must hold to invoke `GetTelemetryConfigByGUID` when
/// RBAC is enabled (§4.E.1, supplemented per §9's open RBAC question).
pub const REQUIRED_ROLE: &str = "telemetry-reader";

/// The `GetTelemetryConfigByGUID` request contract (§6.1).
#[derive(Debug, Clone)]
pub struct GetTelemetryConfigRequest {
    pub tenant_id: Option<TenantId>,
    pub roles: RoleSet,
    pub host_guid: HostGuid,
}

#[derive(Debug, Clone, Default)]
pub struct GetTelemetryConfigResponse {
    pub config: Vec<TelemetryConfigEntry>,
    pub timestamp: i64,
}

/// Resolves and flattens the full telemetry configuration reachable from a
/// host's ancestor chain and its bound instance (§4.C, §6.1).
pub struct TelemetryHandler<G: InventoryGateway> {
    inventory: Arc<G>,
    profiles: Arc<ProfileCache<G>>,
    clock: Arc<dyn Clock>,
    rbac_enabled: bool,
}

impl<G: InventoryGateway> TelemetryHandler<G> {
    pub fn new(
        inventory: Arc<G>,
        profiles: Arc<ProfileCache<G>>,
        clock: Arc<dyn Clock>,
        rbac_enabled: bool,
    ) -> Self {
        Self { inventory, profiles, clock, rbac_enabled }
    }

    pub async fn handle(
        &self,
        request: GetTelemetryConfigRequest,
    ) -> Result<GetTelemetryConfigResponse, TelemetryError> {
        let tenant = request
            .tenant_id
            .ok_or_else(|| TelemetryError::Unauthenticated("missing tenant id".to_string()))?;

        if self.rbac_enabled && !request.roles.contains(REQUIRED_ROLE) {
            return Err(TelemetryError::PermissionDenied(format!(
                "caller lacks required role '{REQUIRED_ROLE}'"
            )));
        }

        let host = self.inventory.get_host_by_uuid(&tenant, &request.host_guid).await?;
        let chain = self.inventory.get_tree_hierarchy(&tenant, &host.host_id).await?;

        let mut profiles = Vec::new();
        for node in &chain {
            let relation = match node {
                NodeRef::Host(_) => continue,
                NodeRef::Site(site_id) => TelemetryRelation::Site(site_id.clone()),
                NodeRef::Region(region_id) => TelemetryRelation::Region(region_id.clone()),
            };
            profiles.extend(self.profiles.profiles_for_relation(&tenant, &relation).await);
        }

        if let Some(instance) = self.inventory.find_instance_by_host(&tenant, &host.host_id).await? {
            let relation = TelemetryRelation::Instance(instance.instance_id.clone());
            profiles.extend(self.profiles.profiles_for_relation(&tenant, &relation).await);
        }

        let mut entries = Vec::new();
        for profile in &profiles {
            let Some(group) = self.profiles.group(&tenant, &profile.group).await else {
                tracing::warn!(group = %profile.group, "telemetry profile references an unknown group, skipping");
                continue;
            };
            entries.extend(flatten_profile(profile, &group));
        }

        Ok(GetTelemetryConfigResponse { config: dedupe(entries), timestamp: self.clock.now_unix() })
    }
}
