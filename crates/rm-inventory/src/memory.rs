use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rm_domain::{
    GroupId, Host, HostGuid, HostId, Instance, InstanceId, IpAddress, IpAddressId,
    OSUpdateRun, OperatingSystem, OsId, ProfileId, RegionId, RepeatedSchedule, RunId, SiteId,
    SingleSchedule, TelemetryGroup, TelemetryProfile, TenantId,
};
use rm_graph::{HierarchyGraph, HostSiteEdge, NodeRef, RegionParentEdge, SiteRegionEdge};
use tokio::sync::{mpsc, RwLock};

use crate::error::InventoryError;
use crate::event::{ChangeKind, InventoryEvent, ResourceKind};
use crate::gateway::{FieldMask, InventoryGateway, Page, PagedResult};

#[derive(Default)]
struct Tenant {
    hosts: HashMap<HostId, Host>,
    hosts_by_guid: HashMap<HostGuid, HostId>,
    instances: HashMap<InstanceId, Instance>,
    instances_by_host: HashMap<HostId, InstanceId>,
    operating_systems: HashMap<OsId, OperatingSystem>,
    update_runs: HashMap<RunId, OSUpdateRun>,
    single_schedules: HashMap<rm_domain::ScheduleId, SingleSchedule>,
    repeated_schedules: HashMap<rm_domain::ScheduleId, RepeatedSchedule>,
    ip_addresses: HashMap<IpAddressId, IpAddress>,
    telemetry_profiles: HashMap<ProfileId, TelemetryProfile>,
    telemetry_groups: HashMap<GroupId, TelemetryGroup>,
    site_regions: HashMap<SiteId, Option<RegionId>>,
    region_parents: HashMap<RegionId, Option<RegionId>>,
}

#[derive(Default)]
struct Inner {
    tenants: HashMap<TenantId, Tenant>,
    subscribers: Vec<mpsc::Sender<InventoryEvent>>,
}

/// In-memory stand-in for the inventory service, used by tests and by the
/// local driver path. Enforces the same tenant-isolation behavior real
/// inventory does: a lookup for a resource that exists under a different
/// tenant comes back `NotFound`, never `PermissionDenied` (§6.3).
#[derive(Clone, Default)]
pub struct InMemoryInventory {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    async fn publish(&self, event: InventoryEvent) {
        let guard = self.inner.read().await;
        for tx in &guard.subscribers {
            let _ = tx.try_send(event.clone());
        }
    }

    pub async fn seed_host(&self, host: Host) {
        let mut guard = self.inner.write().await;
        let tenant = guard.tenants.entry(host.tenant_id.clone()).or_default();
        tenant.hosts_by_guid.insert(host.uuid.clone(), host.host_id.clone());
        tenant.hosts.insert(host.host_id.clone(), host);
    }

    pub async fn seed_instance(&self, instance: Instance) {
        let mut guard = self.inner.write().await;
        let tenant = guard.tenants.entry(instance.tenant_id.clone()).or_default();
        tenant
            .instances_by_host
            .insert(instance.host_id.clone(), instance.instance_id.clone());
        tenant.instances.insert(instance.instance_id.clone(), instance);
    }

    pub async fn seed_operating_system(&self, os: OperatingSystem) {
        let mut guard = self.inner.write().await;
        let tenant = guard.tenants.entry(os.tenant_id.clone()).or_default();
        tenant.operating_systems.insert(os.os_id.clone(), os);
    }

    pub async fn seed_single_schedule(&self, schedule: SingleSchedule) {
        let mut guard = self.inner.write().await;
        let tenant = guard.tenants.entry(schedule.tenant_id.clone()).or_default();
        tenant.single_schedules.insert(schedule.schedule_id.clone(), schedule);
    }

    pub async fn seed_repeated_schedule(&self, schedule: RepeatedSchedule) {
        let mut guard = self.inner.write().await;
        let tenant = guard.tenants.entry(schedule.tenant_id.clone()).or_default();
        tenant.repeated_schedules.insert(schedule.schedule_id.clone(), schedule);
    }

    pub async fn seed_ip_address(&self, ip: IpAddress) {
        let mut guard = self.inner.write().await;
        let tenant = guard.tenants.entry(ip.tenant_id.clone()).or_default();
        tenant.ip_addresses.insert(ip.ip_id.clone(), ip);
    }

    pub async fn seed_telemetry_profile(&self, profile: TelemetryProfile) {
        let mut guard = self.inner.write().await;
        let tenant = guard.tenants.entry(profile.tenant_id.clone()).or_default();
        tenant.telemetry_profiles.insert(profile.profile_id.clone(), profile);
    }

    pub async fn seed_telemetry_group(&self, group: TelemetryGroup) {
        let mut guard = self.inner.write().await;
        let tenant = guard.tenants.entry(group.tenant_id.clone()).or_default();
        tenant.telemetry_groups.insert(group.group_id.clone(), group);
    }

    /// Associates a site with its parent region (or `None` for a root
    /// site), for a given tenant's hierarchy graph (§4.A `GetTreeHierarchy`).
    pub async fn seed_site_region(&self, tenant: &TenantId, site_id: SiteId, region_id: Option<RegionId>) {
        let mut guard = self.inner.write().await;
        let t = guard.tenants.entry(tenant.clone()).or_default();
        t.site_regions.insert(site_id, region_id);
    }

    /// Associates a region with its parent region, for nested regions.
    pub async fn seed_region_parent(
        &self,
        tenant: &TenantId,
        region_id: RegionId,
        parent_region_id: Option<RegionId>,
    ) {
        let mut guard = self.inner.write().await;
        let t = guard.tenants.entry(tenant.clone()).or_default();
        t.region_parents.insert(region_id, parent_region_id);
    }
}

fn not_found(kind: &str, id: &str) -> InventoryError {
    InventoryError::NotFound(format!("{kind} '{id}' not found"))
}

#[async_trait]
impl InventoryGateway for InMemoryInventory {
    async fn get_host(&self, tenant: &TenantId, host_id: &HostId) -> Result<Host, InventoryError> {
        let guard = self.inner.read().await;
        guard
            .tenants
            .get(tenant)
            .and_then(|t| t.hosts.get(host_id))
            .cloned()
            .ok_or_else(|| not_found("host", host_id.as_str()))
    }

    async fn get_host_by_uuid(
        &self,
        tenant: &TenantId,
        guid: &HostGuid,
    ) -> Result<Host, InventoryError> {
        let guard = self.inner.read().await;
        let Some(t) = guard.tenants.get(tenant) else {
            return Err(not_found("host", guid.as_str()));
        };
        let host_id = t
            .hosts_by_guid
            .get(guid)
            .ok_or_else(|| not_found("host", guid.as_str()))?;
        t.hosts
            .get(host_id)
            .cloned()
            .ok_or_else(|| not_found("host", guid.as_str()))
    }

    async fn get_instance(
        &self,
        tenant: &TenantId,
        instance_id: &InstanceId,
    ) -> Result<Instance, InventoryError> {
        let guard = self.inner.read().await;
        guard
            .tenants
            .get(tenant)
            .and_then(|t| t.instances.get(instance_id))
            .cloned()
            .ok_or_else(|| not_found("instance", instance_id.as_str()))
    }

    async fn get_tree_hierarchy(
        &self,
        tenant: &TenantId,
        host_id: &HostId,
    ) -> Result<Vec<NodeRef>, InventoryError> {
        let guard = self.inner.read().await;
        let t = guard
            .tenants
            .get(tenant)
            .ok_or_else(|| not_found("host", host_id.as_str()))?;
        let host = t
            .hosts
            .get(host_id)
            .ok_or_else(|| not_found("host", host_id.as_str()))?;

        let Some(site_id) = &host.site_id else {
            return Ok(vec![NodeRef::Host(host_id.clone())]);
        };

        let host_edges = vec![HostSiteEdge { host_id: host_id.clone(), site_id: site_id.clone() }];
        let site_edges: Vec<SiteRegionEdge> = t
            .site_regions
            .iter()
            .map(|(site, region)| SiteRegionEdge { site_id: site.clone(), region_id: region.clone() })
            .collect();
        let region_edges: Vec<RegionParentEdge> = t
            .region_parents
            .iter()
            .map(|(region, parent)| RegionParentEdge {
                region_id: region.clone(),
                parent_region_id: parent.clone(),
            })
            .collect();

        let graph = HierarchyGraph::build(&host_edges, &site_edges, &region_edges);
        graph
            .ancestor_chain(NodeRef::Host(host_id.clone()))
            .map_err(|e| InventoryError::Internal(e.to_string()))
    }

    async fn find_instance_by_host(
        &self,
        tenant: &TenantId,
        host_id: &HostId,
    ) -> Result<Option<Instance>, InventoryError> {
        let guard = self.inner.read().await;
        let Some(t) = guard.tenants.get(tenant) else {
            return Ok(None);
        };
        Ok(t.instances_by_host
            .get(host_id)
            .and_then(|id| t.instances.get(id))
            .cloned())
    }

    async fn update_instance(
        &self,
        tenant: &TenantId,
        instance: &Instance,
        _mask: FieldMask,
    ) -> Result<Instance, InventoryError> {
        let mut guard = self.inner.write().await;
        let t = guard
            .tenants
            .get_mut(tenant)
            .ok_or_else(|| not_found("instance", instance.instance_id.as_str()))?;
        if !t.instances.contains_key(&instance.instance_id) {
            return Err(not_found("instance", instance.instance_id.as_str()));
        }
        t.instances.insert(instance.instance_id.clone(), instance.clone());
        drop(guard);
        self.publish(InventoryEvent {
            tenant_id: tenant.clone(),
            kind: ResourceKind::Instance,
            change: ChangeKind::Updated,
            resource_id: instance.instance_id.to_string(),
        })
        .await;
        Ok(instance.clone())
    }

    async fn get_operating_system(
        &self,
        tenant: &TenantId,
        os_id: &OsId,
    ) -> Result<OperatingSystem, InventoryError> {
        let guard = self.inner.read().await;
        guard
            .tenants
            .get(tenant)
            .and_then(|t| t.operating_systems.get(os_id))
            .cloned()
            .ok_or_else(|| not_found("operating_system", os_id.as_str()))
    }

    async fn list_operating_systems_by_profile(
        &self,
        tenant: &TenantId,
        profile_name: &str,
    ) -> Result<Vec<OperatingSystem>, InventoryError> {
        let guard = self.inner.read().await;
        Ok(guard
            .tenants
            .get(tenant)
            .map(|t| {
                t.operating_systems
                    .values()
                    .filter(|os| os.profile_name == profile_name)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_latest_update_run(
        &self,
        tenant: &TenantId,
        instance_id: &InstanceId,
    ) -> Result<Option<OSUpdateRun>, InventoryError> {
        let guard = self.inner.read().await;
        Ok(guard.tenants.get(tenant).and_then(|t| {
            t.update_runs
                .values()
                .filter(|r| &r.instance_id == instance_id)
                .max_by_key(|r| r.start_time)
                .cloned()
        }))
    }

    async fn create_update_run(
        &self,
        tenant: &TenantId,
        run: &OSUpdateRun,
    ) -> Result<OSUpdateRun, InventoryError> {
        let mut guard = self.inner.write().await;
        let t = guard.tenants.entry(tenant.clone()).or_default();
        if t.update_runs.contains_key(&run.run_id) {
            return Err(InventoryError::AlreadyExists(format!(
                "update run '{}' already exists",
                run.run_id
            )));
        }
        t.update_runs.insert(run.run_id.clone(), run.clone());
        Ok(run.clone())
    }

    async fn update_update_run(
        &self,
        tenant: &TenantId,
        run: &OSUpdateRun,
        _mask: FieldMask,
    ) -> Result<OSUpdateRun, InventoryError> {
        let mut guard = self.inner.write().await;
        let t = guard
            .tenants
            .get_mut(tenant)
            .ok_or_else(|| not_found("update_run", run.run_id.as_str()))?;
        if !t.update_runs.contains_key(&run.run_id) {
            return Err(not_found("update_run", run.run_id.as_str()));
        }
        t.update_runs.insert(run.run_id.clone(), run.clone());
        Ok(run.clone())
    }

    async fn list_single_schedules(
        &self,
        tenant: &TenantId,
        host_id: Option<&HostId>,
        site_id: Option<&SiteId>,
        page: Page,
    ) -> Result<PagedResult<SingleSchedule>, InventoryError> {
        let guard = self.inner.read().await;
        let mut items: Vec<SingleSchedule> = guard
            .tenants
            .get(tenant)
            .map(|t| {
                t.single_schedules
                    .values()
                    .filter(|s| matches_target(&s.target, host_id, site_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        items.sort_by_key(|s| s.start_seconds);
        Ok(paginate(items, page))
    }

    async fn list_repeated_schedules(
        &self,
        tenant: &TenantId,
        host_id: Option<&HostId>,
        site_id: Option<&SiteId>,
        page: Page,
    ) -> Result<PagedResult<RepeatedSchedule>, InventoryError> {
        let guard = self.inner.read().await;
        let items: Vec<RepeatedSchedule> = guard
            .tenants
            .get(tenant)
            .map(|t| {
                t.repeated_schedules
                    .values()
                    .filter(|s| matches_target(&s.target, host_id, site_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(paginate(items, page))
    }

    async fn get_ip_address(
        &self,
        tenant: &TenantId,
        ip_id: &IpAddressId,
    ) -> Result<IpAddress, InventoryError> {
        let guard = self.inner.read().await;
        guard
            .tenants
            .get(tenant)
            .and_then(|t| t.ip_addresses.get(ip_id))
            .cloned()
            .ok_or_else(|| not_found("ip_address", ip_id.as_str()))
    }

    async fn list_ip_addresses_by_site(
        &self,
        tenant: &TenantId,
        site_id: &SiteId,
    ) -> Result<Vec<IpAddress>, InventoryError> {
        let guard = self.inner.read().await;
        Ok(guard
            .tenants
            .get(tenant)
            .map(|t| {
                t.ip_addresses
                    .values()
                    .filter(|ip| ip.nic.site_id.as_ref() == Some(site_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_ip_addresses_unsited(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<IpAddress>, InventoryError> {
        let guard = self.inner.read().await;
        Ok(guard
            .tenants
            .get(tenant)
            .map(|t| {
                t.ip_addresses
                    .values()
                    .filter(|ip| ip.nic.site_id.is_none())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_ip_addresses_all(&self, tenant: &TenantId) -> Result<Vec<IpAddress>, InventoryError> {
        let guard = self.inner.read().await;
        Ok(guard
            .tenants
            .get(tenant)
            .map(|t| t.ip_addresses.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn update_ip_address(
        &self,
        tenant: &TenantId,
        ip: &IpAddress,
        _mask: FieldMask,
    ) -> Result<IpAddress, InventoryError> {
        let mut guard = self.inner.write().await;
        let t = guard
            .tenants
            .get_mut(tenant)
            .ok_or_else(|| not_found("ip_address", ip.ip_id.as_str()))?;
        if !t.ip_addresses.contains_key(&ip.ip_id) {
            return Err(not_found("ip_address", ip.ip_id.as_str()));
        }
        t.ip_addresses.insert(ip.ip_id.clone(), ip.clone());
        drop(guard);
        self.publish(InventoryEvent {
            tenant_id: tenant.clone(),
            kind: ResourceKind::IpAddress,
            change: ChangeKind::Updated,
            resource_id: ip.ip_id.to_string(),
        })
        .await;
        Ok(ip.clone())
    }

    async fn list_telemetry_profiles(
        &self,
        tenant: &TenantId,
        page: Page,
    ) -> Result<PagedResult<TelemetryProfile>, InventoryError> {
        let guard = self.inner.read().await;
        let items: Vec<TelemetryProfile> = guard
            .tenants
            .get(tenant)
            .map(|t| t.telemetry_profiles.values().cloned().collect())
            .unwrap_or_default();
        Ok(paginate(items, page))
    }

    async fn list_telemetry_groups(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<TelemetryGroup>, InventoryError> {
        let guard = self.inner.read().await;
        Ok(guard
            .tenants
            .get(tenant)
            .map(|t| t.telemetry_groups.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_telemetry_group(
        &self,
        tenant: &TenantId,
        group_id: &GroupId,
    ) -> Result<TelemetryGroup, InventoryError> {
        let guard = self.inner.read().await;
        guard
            .tenants
            .get(tenant)
            .and_then(|t| t.telemetry_groups.get(group_id))
            .cloned()
            .ok_or_else(|| not_found("telemetry_group", group_id.as_str()))
    }

    async fn get_telemetry_profile(
        &self,
        tenant: &TenantId,
        profile_id: &ProfileId,
    ) -> Result<TelemetryProfile, InventoryError> {
        let guard = self.inner.read().await;
        guard
            .tenants
            .get(tenant)
            .and_then(|t| t.telemetry_profiles.get(profile_id))
            .cloned()
            .ok_or_else(|| not_found("telemetry_profile", profile_id.as_str()))
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<InventoryEvent>, InventoryError> {
        let (tx, rx) = mpsc::channel(256);
        let mut guard = self.inner.write().await;
        guard.subscribers.push(tx);
        Ok(rx)
    }
}

fn matches_target(
    target: &rm_domain::ScheduleTarget,
    host_id: Option<&HostId>,
    site_id: Option<&SiteId>,
) -> bool {
    use rm_domain::ScheduleTarget;
    match target {
        ScheduleTarget::Host(h) => host_id.map_or(true, |want| want == h),
        ScheduleTarget::Site(s) => site_id.map_or(true, |want| want == s),
        ScheduleTarget::None => true,
    }
}

fn paginate<T: Clone>(items: Vec<T>, page: Page) -> PagedResult<T> {
    let total = items.len() as u32;
    let limit = if page.limit == 0 { total.max(1) } else { page.limit };
    let start = (page.offset as usize).min(items.len());
    let end = (start + limit as usize).min(items.len());
    let has_next = end < items.len();
    PagedResult { items: items[start..end].to_vec(), total, has_next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rm_domain::{HostState, ProvisioningStatus, StatusIndicator, UpdateStatusType};

    fn host(tenant: &str, id: &str) -> Host {
        Host {
            host_id: HostId::new(id),
            uuid: HostGuid::new(format!("{id}-guid")),
            tenant_id: TenantId::new(tenant),
            site_id: None,
            current_state: HostState::Trusted,
            desired_state: HostState::Trusted,
        }
    }

    #[tokio::test]
    async fn cross_tenant_lookup_is_not_found_not_leaked() {
        let inv = InMemoryInventory::new();
        inv.seed_host(host("tenant-a", "h1")).await;

        let err = inv
            .get_host(&TenantId::new("tenant-b"), &HostId::new("h1"))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_instance_publishes_event() {
        let inv = InMemoryInventory::new();
        let tenant = TenantId::new("t1");
        let instance = Instance {
            instance_id: InstanceId::new("i1"),
            host_id: HostId::new("h1"),
            tenant_id: tenant.clone(),
            current_os: OsId::new("os1"),
            os_update_policy: None,
            provisioning_status: ProvisioningStatus::Done,
            provisioning_status_indicator: StatusIndicator::Idle,
            update_status: UpdateStatusType::Unspecified,
            update_status_indicator: StatusIndicator::Idle,
            update_status_timestamp: 0,
            update_status_detail: None,
            update_status_message: String::new(),
            os_update_available: None,
            existing_cves: None,
        };
        inv.seed_instance(instance.clone()).await;

        let mut rx = inv.subscribe().await.unwrap();
        let mut updated = instance.clone();
        updated.update_status = UpdateStatusType::Started;
        inv.update_instance(&tenant, &updated, FieldMask::new(&["update_status"]))
            .await
            .unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, ResourceKind::Instance);
        assert_eq!(event.change, ChangeKind::Updated);
    }

    #[tokio::test]
    async fn pagination_reports_has_next() {
        let inv = InMemoryInventory::new();
        let tenant = TenantId::new("t1");
        for i in 0..5 {
            inv.seed_single_schedule(SingleSchedule {
                schedule_id: rm_domain::ScheduleId::new(format!("s{i}")),
                tenant_id: tenant.clone(),
                start_seconds: i as i64,
                end_seconds: 0,
                schedule_status: rm_domain::ScheduleStatus::Scheduled,
                target: rm_domain::ScheduleTarget::None,
            })
            .await;
        }
        let page = inv
            .list_single_schedules(&tenant, None, None, Page { offset: 0, limit: 2 })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);
        assert!(page.has_next);
    }

    #[tokio::test]
    async fn tree_hierarchy_walks_host_site_region() {
        let inv = InMemoryInventory::new();
        let tenant = TenantId::new("t1");
        let mut h = host("t1", "h1");
        h.site_id = Some(SiteId::new("site-a"));
        inv.seed_host(h).await;
        inv.seed_site_region(&tenant, SiteId::new("site-a"), Some(RegionId::new("region-a"))).await;
        inv.seed_region_parent(&tenant, RegionId::new("region-a"), None).await;

        let chain = inv.get_tree_hierarchy(&tenant, &HostId::new("h1")).await.unwrap();
        assert_eq!(
            chain,
            vec![
                NodeRef::Host(HostId::new("h1")),
                NodeRef::Site(SiteId::new("site-a")),
                NodeRef::Region(RegionId::new("region-a")),
            ]
        );
    }

    #[tokio::test]
    async fn unsited_host_chain_is_just_itself() {
        let inv = InMemoryInventory::new();
        let tenant = TenantId::new("t1");
        inv.seed_host(host("t1", "h1")).await;

        let chain = inv.get_tree_hierarchy(&tenant, &HostId::new("h1")).await.unwrap();
        assert_eq!(chain, vec![NodeRef::Host(HostId::new("h1"))]);
    }
}
