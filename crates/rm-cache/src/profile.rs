use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use rm_domain::{GroupId, ProfileId, TelemetryGroup, TelemetryProfile, TelemetryRelation, TenantId};
use rm_inventory::{InventoryError, InventoryEvent, InventoryGateway, Page, ResourceKind};
use tokio::sync::{oneshot, RwLock};
use tracing::warn;

#[derive(Default)]
struct TenantProfiles {
    profiles: HashMap<ProfileId, TelemetryProfile>,
    groups: HashMap<GroupId, TelemetryGroup>,
    by_relation: HashMap<String, HashSet<ProfileId>>,
}

impl TenantProfiles {
    fn insert_profile(&mut self, profile: TelemetryProfile) {
        self.by_relation
            .entry(relation_key(&profile.relation))
            .or_default()
            .insert(profile.profile_id.clone());
        self.profiles.insert(profile.profile_id.clone(), profile);
    }
}

/// Relation-keyed string so `Instance`/`Site`/`Region` targets share one
/// index without a trait object (§4.C).
fn relation_key(relation: &TelemetryRelation) -> String {
    match relation {
        TelemetryRelation::Instance(id) => format!("instance:{id}"),
        TelemetryRelation::Site(id) => format!("site:{id}"),
        TelemetryRelation::Region(id) => format!("region:{id}"),
    }
}

/// Tenant-partitioned projection of telemetry profiles and groups (§4.C),
/// indexed by relation target so `ListTelemetryProfilesByHostAndInstance`-
/// style lookups never walk the full profile set. Group membership is
/// resolved via `groups` directly rather than a separate group→profile
/// reverse index, since a full-tenant resweep (not an incremental splice)
/// rebuilds both maps together on every `TelemetryGroup` change.
pub struct ProfileCache<G: InventoryGateway> {
    inventory: Arc<G>,
    tenants: RwLock<HashMap<TenantId, TenantProfiles>>,
    tracked_tenants: Vec<TenantId>,
}

impl<G: InventoryGateway> ProfileCache<G> {
    pub fn new(inventory: Arc<G>, tracked_tenants: Vec<TenantId>) -> Self {
        Self { inventory, tenants: RwLock::new(HashMap::new()), tracked_tenants }
    }

    pub async fn profiles_for_relation(
        &self,
        tenant: &TenantId,
        relation: &TelemetryRelation,
    ) -> Vec<TelemetryProfile> {
        let guard = self.tenants.read().await;
        let Some(t) = guard.get(tenant) else { return Vec::new() };
        t.by_relation
            .get(&relation_key(relation))
            .into_iter()
            .flatten()
            .filter_map(|id| t.profiles.get(id).cloned())
            .collect()
    }

    pub async fn group(&self, tenant: &TenantId, group_id: &GroupId) -> Option<TelemetryGroup> {
        let guard = self.tenants.read().await;
        guard.get(tenant).and_then(|t| t.groups.get(group_id).cloned())
    }

    pub async fn full_resweep(&self) -> Result<(), InventoryError> {
        for tenant in &self.tracked_tenants {
            self.resweep_tenant(tenant).await?;
        }
        Ok(())
    }

    async fn resweep_tenant(&self, tenant: &TenantId) -> Result<(), InventoryError> {
        let mut built = TenantProfiles::default();

        let mut offset = 0;
        loop {
            let page = self
                .inventory
                .list_telemetry_profiles(tenant, Page { offset, limit: 200 })
                .await?;
            let got = page.items.len() as u32;
            for profile in page.items {
                built.insert_profile(profile);
            }
            if !page.has_next || got == 0 {
                break;
            }
            offset += got;
        }

        for group in self.inventory.list_telemetry_groups(tenant).await? {
            built.groups.insert(group.group_id.clone(), group);
        }

        let mut guard = self.tenants.write().await;
        guard.insert(tenant.clone(), built);
        Ok(())
    }

    pub async fn run(
        self: Arc<Self>,
        mut events: tokio::sync::mpsc::Receiver<InventoryEvent>,
        resweep_interval: Duration,
        mut term: oneshot::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(resweep_interval);
        ticker.tick().await;

        if let Err(err) = self.full_resweep().await {
            warn!(?err, "initial profile cache resweep failed");
        }

        loop {
            tokio::select! {
                maybe_event = events.recv() => {
                    match maybe_event {
                        Some(event) if matches!(event.kind, ResourceKind::TelemetryProfile | ResourceKind::TelemetryGroup) => {
                            if let Err(err) = self.resweep_tenant(&event.tenant_id).await {
                                warn!(?err, tenant = %event.tenant_id, "profile cache refresh failed");
                            }
                        }
                        Some(_) => continue,
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.full_resweep().await {
                        warn!(?err, "periodic profile cache resweep failed");
                    }
                }
                _ = &mut term => break,
            }
        }
    }
}
