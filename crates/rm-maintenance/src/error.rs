use thiserror::Error;

use rm_inventory::InventoryError;

/// The same bounded error taxonomy the inventory gateway returns (§4.A),
/// reused at the RPC boundary since §4.E.1/§6.1/§7 draw from the identical
/// vocabulary for `PlatformUpdateStatus` and `GetTelemetryConfigByGUID`.
#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("internal: {0}")]
    Internal(String),
}

impl MaintenanceError {
    pub fn internal(msg: impl Into<String>) -> Self {
        MaintenanceError::Internal(msg.into())
    }
}

impl From<InventoryError> for MaintenanceError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::NotFound(m) => MaintenanceError::NotFound(m),
            InventoryError::AlreadyExists(m) => MaintenanceError::AlreadyExists(m),
            InventoryError::InvalidArgument(m) => MaintenanceError::InvalidArgument(m),
            InventoryError::Unauthenticated(m) => MaintenanceError::Unauthenticated(m),
            InventoryError::PermissionDenied(m) => MaintenanceError::PermissionDenied(m),
            InventoryError::FailedPrecondition(m) => MaintenanceError::FailedPrecondition(m),
            InventoryError::Unavailable(m) => MaintenanceError::Unavailable(m),
            InventoryError::DeadlineExceeded => MaintenanceError::DeadlineExceeded,
            InventoryError::Internal(m) => MaintenanceError::Internal(m),
        }
    }
}

impl From<rm_domain::DomainError> for MaintenanceError {
    fn from(e: rm_domain::DomainError) -> Self {
        match e {
            rm_domain::DomainError::InvalidCronField { .. } => {
                MaintenanceError::InvalidArgument(e.to_string())
            }
            other => MaintenanceError::Internal(other.to_string()),
        }
    }
}
