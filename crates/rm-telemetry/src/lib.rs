pub mod config;
pub mod error;
pub mod handler;

pub use config::{dedupe, flatten_profile, TelemetryConfigEntry};
pub use error::TelemetryError;
pub use handler::{GetTelemetryConfigRequest, GetTelemetryConfigResponse, TelemetryHandler};
