pub mod clock;
pub mod cron;
pub mod error;
pub mod ids;
pub mod rbac;
pub mod types;
pub mod version;

pub use clock::{Clock, FixedClock, SystemClock};
pub use cron::validate_repeated_schedule;
pub use error::DomainError;
pub use ids::{
    GroupId, HostGuid, HostId, InstanceId, IpAddressId, NicId, OsId, ProfileId, RegionId, RunId,
    ScheduleId, SiteId, TenantId, RESERVED_DEFAULT_TENANT,
};
pub use rbac::RoleSet;
pub use types::*;
pub use version::{latest, ImageVersion};
