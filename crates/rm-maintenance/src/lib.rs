pub mod error;
pub mod handler;
pub mod request;
pub mod schedule;
pub mod status;
pub mod target_os;

pub use error::MaintenanceError;
pub use handler::MaintenanceHandler;
pub use request::{
    OsProfileUpdateSource, PlatformUpdateStatusRequest, UpdateLog, UpdateLogEntry,
    UpdateScheduleAssembly, UpdateSource, UpdateStatusPayload, UpdateStatusResponse,
};
