use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rm_domain::{HostId, ScheduleId, ScheduleTarget, SiteId, TenantId};
use rm_inventory::{InventoryError, InventoryEvent, InventoryGateway, Page, ResourceKind};
use tokio::sync::{oneshot, RwLock};
use tracing::{debug, warn};

#[derive(Default)]
struct TenantSchedules {
    singles: HashMap<ScheduleId, rm_domain::SingleSchedule>,
    repeated: HashMap<ScheduleId, rm_domain::RepeatedSchedule>,
}

/// Tenant-partitioned, in-memory projection of schedule resources (§4.B).
/// Kept current by a periodic full resweep plus inventory change events;
/// every read goes through a single lock around the tenant map, never the
/// inventory service itself.
pub struct ScheduleCache<G: InventoryGateway> {
    inventory: Arc<G>,
    tenants: RwLock<HashMap<TenantId, TenantSchedules>>,
    tracked_tenants: Vec<TenantId>,
}

impl<G: InventoryGateway> ScheduleCache<G> {
    pub fn new(inventory: Arc<G>, tracked_tenants: Vec<TenantId>) -> Self {
        Self { inventory, tenants: RwLock::new(HashMap::new()), tracked_tenants }
    }

    /// All single schedules whose target matches `host_id`, directly or via
    /// the host's site (§4.B's `HasHostID` union filter).
    pub async fn single_schedules_for_host(
        &self,
        tenant: &TenantId,
        host_id: &HostId,
        host_site_id: Option<&SiteId>,
    ) -> Vec<rm_domain::SingleSchedule> {
        let guard = self.tenants.read().await;
        guard
            .get(tenant)
            .map(|t| {
                t.singles
                    .values()
                    .filter(|s| target_matches_host(&s.target, host_id, host_site_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn repeated_schedules_for_host(
        &self,
        tenant: &TenantId,
        host_id: &HostId,
        host_site_id: Option<&SiteId>,
    ) -> Vec<rm_domain::RepeatedSchedule> {
        let guard = self.tenants.read().await;
        guard
            .get(tenant)
            .map(|t| {
                t.repeated
                    .values()
                    .filter(|s| target_matches_host(&s.target, host_id, host_site_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Full resweep of every tracked tenant, paging through the gateway
    /// until it reports no further pages (§4.B).
    pub async fn full_resweep(&self) -> Result<(), InventoryError> {
        for tenant in &self.tracked_tenants {
            self.resweep_tenant(tenant).await?;
        }
        Ok(())
    }

    async fn resweep_tenant(&self, tenant: &TenantId) -> Result<(), InventoryError> {
        let mut singles = HashMap::new();
        let mut offset = 0;
        loop {
            let page = self
                .inventory
                .list_single_schedules(tenant, None, None, Page { offset, limit: 200 })
                .await?;
            let got = page.items.len() as u32;
            for s in page.items {
                singles.insert(s.schedule_id.clone(), s);
            }
            if !page.has_next || got == 0 {
                break;
            }
            offset += got;
        }

        let mut repeated = HashMap::new();
        offset = 0;
        loop {
            let page = self
                .inventory
                .list_repeated_schedules(tenant, None, None, Page { offset, limit: 200 })
                .await?;
            let got = page.items.len() as u32;
            for s in page.items {
                repeated.insert(s.schedule_id.clone(), s);
            }
            if !page.has_next || got == 0 {
                break;
            }
            offset += got;
        }

        let mut guard = self.tenants.write().await;
        guard.insert(tenant.clone(), TenantSchedules { singles, repeated });
        Ok(())
    }

    fn apply_event(&self, tenant: &TenantId, _event_kind: ResourceKind) {
        debug!(%tenant, "schedule cache will resweep tenant on next event-driven pass");
    }

    /// Drains `events`, refreshing the affected tenant whenever a schedule
    /// resource changes, and performs a full resweep every `resweep_interval`.
    /// Exits when `term` fires (§4.D's northbound driver shape, reused here
    /// for cache refresh).
    pub async fn run(
        self: Arc<Self>,
        mut events: tokio::sync::mpsc::Receiver<InventoryEvent>,
        resweep_interval: Duration,
        mut term: oneshot::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(resweep_interval);
        ticker.tick().await; // first tick fires immediately; consume it

        if let Err(err) = self.full_resweep().await {
            warn!(?err, "initial schedule cache resweep failed");
        }

        loop {
            tokio::select! {
                maybe_event = events.recv() => {
                    match maybe_event {
                        Some(event) if matches!(event.kind, ResourceKind::SingleSchedule | ResourceKind::RepeatedSchedule) => {
                            self.apply_event(&event.tenant_id, event.kind);
                            if let Err(err) = self.resweep_tenant(&event.tenant_id).await {
                                warn!(?err, tenant = %event.tenant_id, "schedule cache refresh failed");
                            }
                        }
                        Some(_) => continue,
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.full_resweep().await {
                        warn!(?err, "periodic schedule cache resweep failed");
                    }
                }
                _ = &mut term => break,
            }
        }
    }
}

/// A schedule targets a host either directly or transitively through its
/// site (§4.B). `ScheduleTarget::None` matches nothing — it exists for
/// schedules that are in an inconsistent state and awaiting correction.
fn target_matches_host(target: &ScheduleTarget, host_id: &HostId, host_site_id: Option<&SiteId>) -> bool {
    match target {
        ScheduleTarget::Host(h) => h == host_id,
        ScheduleTarget::Site(s) => host_site_id == Some(s),
        ScheduleTarget::None => false,
    }
}
