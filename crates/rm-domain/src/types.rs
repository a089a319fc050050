use serde::{Deserialize, Serialize};

use crate::ids::{
    GroupId, HostGuid, HostId, InstanceId, IpAddressId, NicId, OsId, ProfileId, RegionId, RunId,
    ScheduleId, SiteId, TenantId,
};

// ── Host ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostState {
    Unspecified,
    Untrusted,
    Registered,
    Onboarded,
    Trusted,
    Error,
}

impl std::fmt::Display for HostState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HostState::Unspecified => "unspecified",
            HostState::Untrusted => "untrusted",
            HostState::Registered => "registered",
            HostState::Onboarded => "onboarded",
            HostState::Trusted => "trusted",
            HostState::Error => "error",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    pub host_id: HostId,
    pub uuid: HostGuid,
    pub tenant_id: TenantId,
    pub site_id: Option<SiteId>,
    pub current_state: HostState,
    pub desired_state: HostState,
}

impl Host {
    /// A host is untrusted iff either its current or desired state is UNTRUSTED (§3).
    pub fn is_untrusted(&self) -> bool {
        self.current_state == HostState::Untrusted || self.desired_state == HostState::Untrusted
    }
}

// ── Provisioning ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStatus {
    Unspecified,
    InProgress,
    Done,
    Failed,
}

/// Shared by `provisioning_status_indicator` and `update_status_indicator`
/// (§3, §4.E.3's status table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusIndicator {
    Unspecified,
    Idle,
    InProgress,
    Error,
}

impl std::fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusIndicator::Unspecified => "unspecified",
            StatusIndicator::Idle => "idle",
            StatusIndicator::InProgress => "in_progress",
            StatusIndicator::Error => "error",
        };
        write!(f, "{s}")
    }
}

// ── OperatingSystem ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsType {
    Immutable,
    Mutable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingSystem {
    pub os_id: OsId,
    pub tenant_id: TenantId,
    pub profile_name: String,
    pub image_id: String,
    pub profile_version: Option<String>,
    pub sha256: String,
    pub image_url: String,
    pub os_type: OsType,
    pub security_feature: Option<String>,
    pub existing_cves: Option<Vec<String>>,
}

// ── OSUpdatePolicy ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// A concrete target OS, by resource id.
    Target(OsId),
    /// Resolve the latest immutable OS by profile name at update time.
    Latest,
}

/// Mutable-OS fields are orthogonal to the target/latest strategy — they are
/// only consulted when the instance's current OS is mutable (§3, §4.E.7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OSUpdatePolicy {
    pub strategy: UpdateStrategy,
    pub update_kernel_command: Option<String>,
    pub update_sources: Vec<String>,
    pub update_packages: Option<String>,
}

// ── Instance ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatusType {
    #[default]
    Unspecified,
    Downloading,
    Downloaded,
    Started,
    Updated,
    Failed,
    UpToDate,
}

impl std::fmt::Display for UpdateStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UpdateStatusType::Unspecified => "UNSPECIFIED",
            UpdateStatusType::Downloading => "DOWNLOADING",
            UpdateStatusType::Downloaded => "DOWNLOADED",
            UpdateStatusType::Started => "STARTED",
            UpdateStatusType::Updated => "UPDATED",
            UpdateStatusType::Failed => "FAILED",
            UpdateStatusType::UpToDate => "UP_TO_DATE",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub instance_id: InstanceId,
    pub host_id: HostId,
    pub tenant_id: TenantId,
    pub current_os: OsId,
    pub os_update_policy: Option<OSUpdatePolicy>,
    pub provisioning_status: ProvisioningStatus,
    pub provisioning_status_indicator: StatusIndicator,
    pub update_status: UpdateStatusType,
    pub update_status_indicator: StatusIndicator,
    pub update_status_timestamp: i64,
    pub update_status_detail: Option<String>,
    /// The human-readable status message rendered for `update_status`
    /// (§4.E.3's status table), including the mutable-OS package-count
    /// suffix on `UPDATED` when an update log was attached. Persisted
    /// alongside the enum so the rendered text survives the request.
    pub update_status_message: String,
    pub os_update_available: Option<bool>,
    pub existing_cves: Option<Vec<String>>,
}

impl Instance {
    /// An instance is provisioned iff both its provisioning status and its
    /// indicator equal the "done" constants (§3).
    pub fn is_provisioned(&self) -> bool {
        self.provisioning_status == ProvisioningStatus::Done
            && self.provisioning_status_indicator == StatusIndicator::Idle
    }
}

// ── OSUpdateRun ───────────────────────────────────────────────────────────

/// Sentinel `end_time` meaning "not yet finished" (§6.5).
pub const END_TIME_SENTINEL: i64 = 9_999_999_999;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLogEntry {
    pub update_type: String,
    pub package_name: String,
    pub update_time: String,
    pub action: String,
    pub status: String,
    pub version: String,
    pub failure_reason: Option<String>,
    pub failure_log: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLog {
    pub update_log: Vec<UpdateLogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OSUpdateRun {
    pub run_id: RunId,
    pub tenant_id: TenantId,
    pub instance_id: InstanceId,
    pub applied_policy: Option<OSUpdatePolicy>,
    pub status: UpdateStatusType,
    pub status_indicator: StatusIndicator,
    pub status_details: Option<String>,
    pub status_timestamp: i64,
    pub start_time: i64,
    pub end_time: i64,
    pub name: String,
}

impl OSUpdateRun {
    /// Invariant (§3): the "latest uncompleted" run is the one with the
    /// maximum `start_time` whose `end_time` is still the sentinel.
    pub fn is_in_progress(&self) -> bool {
        self.end_time == END_TIME_SENTINEL
    }
}

// ── Schedules ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleTarget {
    Host(HostId),
    Site(SiteId),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Unspecified,
    Ongoing,
    Scheduled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleSchedule {
    pub schedule_id: ScheduleId,
    pub tenant_id: TenantId,
    pub start_seconds: i64,
    /// `0` means "no end" (§3 invariant).
    pub end_seconds: i64,
    pub schedule_status: ScheduleStatus,
    pub target: ScheduleTarget,
}

impl SingleSchedule {
    /// `end_seconds == 0 || end_seconds > start_seconds` (§3 invariant).
    pub fn is_well_formed(&self) -> bool {
        self.end_seconds == 0 || self.end_seconds > self.start_seconds
    }

    /// Candidate iff `end_seconds == 0 || now < end_seconds` (§4.E.6).
    pub fn is_candidate_at(&self, now: i64) -> bool {
        self.end_seconds == 0 || now < self.end_seconds
    }

    pub fn distance_from(&self, now: i64) -> i64 {
        (now - self.start_seconds).abs()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatedSchedule {
    pub schedule_id: ScheduleId,
    pub tenant_id: TenantId,
    pub duration_seconds: i64,
    pub cron_minutes: String,
    pub cron_hours: String,
    pub cron_day_month: String,
    pub cron_month: String,
    pub cron_day_week: String,
    pub target: ScheduleTarget,
}

// ── Networking ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpConfigMethod {
    Unspecified,
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpState {
    Unspecified,
    Configured,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpStatus {
    Unspecified,
    AssignmentError,
    Configured,
    ConfigurationError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicRef {
    pub nic_id: NicId,
    pub host_id: HostId,
    pub site_id: Option<SiteId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpAddress {
    pub ip_id: IpAddressId,
    pub tenant_id: TenantId,
    pub address: Option<String>,
    pub config_method: IpConfigMethod,
    pub nic: NicRef,
    pub current_state: IpState,
    pub desired_state: IpState,
    pub status: IpStatus,
    pub status_detail: Option<String>,
}

// ── Telemetry ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryRelation {
    Instance(InstanceId),
    Site(SiteId),
    Region(RegionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryProfile {
    pub profile_id: ProfileId,
    pub tenant_id: TenantId,
    pub group: GroupId,
    pub relation: TelemetryRelation,
    pub metrics_interval: Option<u32>,
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorKind {
    Host,
    Cluster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryGroupKind {
    Metrics,
    Logs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryGroup {
    pub group_id: GroupId,
    pub tenant_id: TenantId,
    pub collector_kind: CollectorKind,
    pub kind: TelemetryGroupKind,
    pub groups: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(current: HostState, desired: HostState) -> Host {
        Host {
            host_id: HostId::new("h1"),
            uuid: HostGuid::new("guid-1"),
            tenant_id: TenantId::new("t1"),
            site_id: None,
            current_state: current,
            desired_state: desired,
        }
    }

    #[test]
    fn untrusted_in_either_state_is_untrusted() {
        assert!(host(HostState::Untrusted, HostState::Trusted).is_untrusted());
        assert!(host(HostState::Trusted, HostState::Untrusted).is_untrusted());
        assert!(!host(HostState::Trusted, HostState::Trusted).is_untrusted());
    }

    #[test]
    fn single_schedule_well_formed() {
        let mut s = SingleSchedule {
            schedule_id: ScheduleId::new("s1"),
            tenant_id: TenantId::new("t1"),
            start_seconds: 100,
            end_seconds: 0,
            schedule_status: ScheduleStatus::Scheduled,
            target: ScheduleTarget::None,
        };
        assert!(s.is_well_formed());
        s.end_seconds = 50;
        assert!(!s.is_well_formed());
        s.end_seconds = 200;
        assert!(s.is_well_formed());
    }

    #[test]
    fn candidate_excludes_expired_windows() {
        let s = SingleSchedule {
            schedule_id: ScheduleId::new("s1"),
            tenant_id: TenantId::new("t1"),
            start_seconds: 999_400,
            end_seconds: 999_800,
            schedule_status: ScheduleStatus::Scheduled,
            target: ScheduleTarget::None,
        };
        assert!(!s.is_candidate_at(1_000_000));
        assert!(s.is_candidate_at(999_500));
    }

    #[test]
    fn run_in_progress_iff_sentinel_end_time() {
        let run = OSUpdateRun {
            run_id: RunId::new("r1"),
            tenant_id: TenantId::new("t1"),
            instance_id: InstanceId::new("i1"),
            applied_policy: None,
            status: UpdateStatusType::Started,
            status_indicator: StatusIndicator::InProgress,
            status_details: None,
            status_timestamp: 0,
            start_time: 0,
            end_time: END_TIME_SENTINEL,
            name: "run-1".into(),
        };
        assert!(run.is_in_progress());
    }
}
