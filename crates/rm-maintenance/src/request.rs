use rm_domain::{HostGuid, RepeatedSchedule, RoleSet, SingleSchedule, TenantId, UpdateStatusType};
use serde::{Deserialize, Serialize};

/// The southbound `PlatformUpdateStatus` request contract (§4.E.1). The
/// tenant id travels with the request rather than being inferred, since a
/// missing one is itself a distinguishable failure (Unauthenticated).
#[derive(Debug, Clone)]
pub struct PlatformUpdateStatusRequest {
    pub tenant_id: Option<TenantId>,
    pub roles: RoleSet,
    pub host_guid: HostGuid,
    pub update_status: UpdateStatusPayload,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateStatusPayload {
    pub status_type: UpdateStatusType,
    pub profile_name: Option<String>,
    pub profile_version: Option<String>,
    pub os_image_id: Option<String>,
    pub os_update_available: Option<bool>,
    /// Raw payload, JSON-encoded `{"update_log": [...]}` when present
    /// (§4.E.3). Invalid JSON is dropped silently rather than rejected.
    pub status_detail: Option<String>,
}

/// One entry of the structured update log carried in `status_detail`
/// (§4.E.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLogEntry {
    pub update_type: String,
    pub package_name: String,
    pub update_time: String,
    pub action: String,
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_log: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLog {
    pub update_log: Vec<UpdateLogEntry>,
}

/// The full `PlatformUpdateStatus` response (§4.E.7).
#[derive(Debug, Clone, Default)]
pub struct UpdateStatusResponse {
    pub update_schedule: UpdateScheduleAssembly,
    pub os_type: Option<rm_domain::OsType>,
    pub update_source: Option<UpdateSource>,
    pub installed_packages: Option<String>,
    pub os_profile_update_source: Option<OsProfileUpdateSource>,
}

/// Legacy single-field plus full list, exactly as the inventory schema
/// exposes repeated schedules (§4.E.6).
#[derive(Debug, Clone, Default)]
pub struct UpdateScheduleAssembly {
    pub single: Option<SingleSchedule>,
    pub repeated: Option<RepeatedSchedule>,
    pub repeated_schedules: Vec<RepeatedSchedule>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSource {
    pub kernel_command: Option<String>,
    pub custom_repos: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OsProfileUpdateSource {
    pub profile_name: String,
    pub profile_version: Option<String>,
    pub image_url: String,
    pub image_id: String,
    pub sha256: String,
}
