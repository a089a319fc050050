use rm_domain::TenantId;
use serde::{Deserialize, Serialize};

/// Resource kinds the gateway can emit change events for and that the
/// reconciler fabric and caches key their subscriptions on (§4.B/§4.C/§4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Host,
    Instance,
    OperatingSystem,
    SingleSchedule,
    RepeatedSchedule,
    IpAddress,
    TelemetryProfile,
    TelemetryGroup,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceKind::Host => "host",
            ResourceKind::Instance => "instance",
            ResourceKind::OperatingSystem => "operating_system",
            ResourceKind::SingleSchedule => "single_schedule",
            ResourceKind::RepeatedSchedule => "repeated_schedule",
            ResourceKind::IpAddress => "ip_address",
            ResourceKind::TelemetryProfile => "telemetry_profile",
            ResourceKind::TelemetryGroup => "telemetry_group",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A single inventory change notification delivered over `Subscribe`
/// (§4.A). The reconciler fabric's northbound driver and the caches' event
/// handlers both consume this directly; by default a northbound driver
/// drops `Deleted` events for kinds it doesn't track deletion state for
/// (§4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEvent {
    pub tenant_id: TenantId,
    pub kind: ResourceKind,
    pub change: ChangeKind,
    pub resource_id: String,
}
