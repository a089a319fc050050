use serde::{Deserialize, Serialize};

/// Defines a newtype string identifier with the `Display`/`as_str`/`new`
/// surface every resource id in this crate needs. Mirrors the
/// hand-written `EnclaveId`/`PartitionId` pattern the reference stack uses,
/// generated once to avoid repeating it a dozen times.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                $name(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name::new(s)
            }
        }
    };
}

string_id!(
    /// Tenant isolation boundary. UUID-formatted by convention (§6.3).
    TenantId
);
string_id!(
    /// Host GUID as carried in `PlatformUpdateStatusRequest.host_guid` (§6.1).
    /// Distinct from `HostId`: the GUID is the agent-facing identity, the
    /// `HostId` is the inventory resource id.
    HostGuid
);
string_id!(HostId);
string_id!(InstanceId);
string_id!(SiteId);
string_id!(RegionId);
string_id!(OsId);
string_id!(ScheduleId);
string_id!(IpAddressId);
string_id!(NicId);
string_id!(ProfileId);
string_id!(GroupId);
string_id!(RunId);

/// Reserved default tenant accepted by permissive deployments when an agent
/// supplies no tenant id at all (§6.3).
pub const RESERVED_DEFAULT_TENANT: &str = "10000000-0000-0000-0000-000000000000";

impl TenantId {
    pub fn reserved_default() -> Self {
        TenantId::new(RESERVED_DEFAULT_TENANT)
    }

    pub fn is_reserved_default(&self) -> bool {
        self.0 == RESERVED_DEFAULT_TENANT
    }
}
