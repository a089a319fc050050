use async_trait::async_trait;
use rm_domain::{
    HostGuid, HostId, InstanceId, IpAddressId, OperatingSystem, OsId, RunId, SiteId, TenantId,
};
use rm_domain::{Host, IpAddress, Instance, OSUpdateRun, RepeatedSchedule, SingleSchedule};
use rm_domain::{GroupId, ProfileId, TelemetryGroup, TelemetryProfile};
use rm_graph::NodeRef;

use crate::error::InventoryError;
use crate::event::InventoryEvent;

/// Which fields of an update actually changed, so the gateway only applies
/// (and only validates preconditions on) those fields — mirrors the PATCH
/// semantics inventory services use for partial updates (§4.E.3/§4.D.1).
#[derive(Debug, Clone, Default)]
pub struct FieldMask(pub Vec<&'static str>);

impl FieldMask {
    pub fn new(fields: &[&'static str]) -> Self {
        FieldMask(fields.to_vec())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| *f == field)
    }
}

/// Pagination cursor shared by every `List*` call (§4.B/§4.C).
#[derive(Debug, Clone, Copy, Default)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: u32,
    pub has_next: bool,
}

/// Tenant-scoped client to the central inventory service (§4.A). The wire
/// protocol is deliberately absent from this trait: every method maps
/// directly onto the service's semantic contract, and every error it can
/// return is one of [`InventoryError`]'s bounded set.
#[async_trait]
pub trait InventoryGateway: Send + Sync + 'static {
    async fn get_host(&self, tenant: &TenantId, host_id: &HostId) -> Result<Host, InventoryError>;

    async fn get_host_by_uuid(
        &self,
        tenant: &TenantId,
        guid: &HostGuid,
    ) -> Result<Host, InventoryError>;

    async fn get_instance(
        &self,
        tenant: &TenantId,
        instance_id: &InstanceId,
    ) -> Result<Instance, InventoryError>;

    /// Resolves the ancestor chain for `host_id` — itself, then its site
    /// (if any), then that site's region chain (§4.A's `GetTreeHierarchy`,
    /// consumed by §4.C's `ListTelemetryProfilesByHostAndInstance`).
    async fn get_tree_hierarchy(
        &self,
        tenant: &TenantId,
        host_id: &HostId,
    ) -> Result<Vec<NodeRef>, InventoryError>;

    async fn find_instance_by_host(
        &self,
        tenant: &TenantId,
        host_id: &HostId,
    ) -> Result<Option<Instance>, InventoryError>;

    async fn update_instance(
        &self,
        tenant: &TenantId,
        instance: &Instance,
        mask: FieldMask,
    ) -> Result<Instance, InventoryError>;

    async fn get_operating_system(
        &self,
        tenant: &TenantId,
        os_id: &OsId,
    ) -> Result<OperatingSystem, InventoryError>;

    async fn list_operating_systems_by_profile(
        &self,
        tenant: &TenantId,
        profile_name: &str,
    ) -> Result<Vec<OperatingSystem>, InventoryError>;

    async fn get_latest_update_run(
        &self,
        tenant: &TenantId,
        instance_id: &InstanceId,
    ) -> Result<Option<OSUpdateRun>, InventoryError>;

    async fn create_update_run(
        &self,
        tenant: &TenantId,
        run: &OSUpdateRun,
    ) -> Result<OSUpdateRun, InventoryError>;

    async fn update_update_run(
        &self,
        tenant: &TenantId,
        run: &OSUpdateRun,
        mask: FieldMask,
    ) -> Result<OSUpdateRun, InventoryError>;

    async fn list_single_schedules(
        &self,
        tenant: &TenantId,
        host_id: Option<&HostId>,
        site_id: Option<&SiteId>,
        page: Page,
    ) -> Result<PagedResult<SingleSchedule>, InventoryError>;

    async fn list_repeated_schedules(
        &self,
        tenant: &TenantId,
        host_id: Option<&HostId>,
        site_id: Option<&SiteId>,
        page: Page,
    ) -> Result<PagedResult<RepeatedSchedule>, InventoryError>;

    async fn get_ip_address(
        &self,
        tenant: &TenantId,
        ip_id: &IpAddressId,
    ) -> Result<IpAddress, InventoryError>;

    async fn list_ip_addresses_by_site(
        &self,
        tenant: &TenantId,
        site_id: &SiteId,
    ) -> Result<Vec<IpAddress>, InventoryError>;

    async fn list_ip_addresses_unsited(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<IpAddress>, InventoryError>;

    /// Every IP address resource for the tenant, sited or not. Used by the
    /// IP reconciler's full resweep (§4.D's periodic resweep).
    async fn list_ip_addresses_all(&self, tenant: &TenantId) -> Result<Vec<IpAddress>, InventoryError>;

    async fn update_ip_address(
        &self,
        tenant: &TenantId,
        ip: &IpAddress,
        mask: FieldMask,
    ) -> Result<IpAddress, InventoryError>;

    async fn list_telemetry_profiles(
        &self,
        tenant: &TenantId,
        page: Page,
    ) -> Result<PagedResult<TelemetryProfile>, InventoryError>;

    async fn list_telemetry_groups(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<TelemetryGroup>, InventoryError>;

    async fn get_telemetry_group(
        &self,
        tenant: &TenantId,
        group_id: &GroupId,
    ) -> Result<TelemetryGroup, InventoryError>;

    async fn get_telemetry_profile(
        &self,
        tenant: &TenantId,
        profile_id: &ProfileId,
    ) -> Result<TelemetryProfile, InventoryError>;

    /// Subscribes to the change stream. The sender side owns reconnect and
    /// backoff; callers just drain the channel (§4.A, §4.D's northbound
    /// driver).
    async fn subscribe(&self) -> Result<tokio::sync::mpsc::Receiver<InventoryEvent>, InventoryError>;
}
