use thiserror::Error;

use rm_graph::GraphError;
use rm_inventory::InventoryError;

/// The same bounded error taxonomy the rest of the corpus returns (§4.A),
/// reused at the `GetTelemetryConfigByGUID` boundary (§6.1).
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<InventoryError> for TelemetryError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::NotFound(m) => TelemetryError::NotFound(m),
            InventoryError::InvalidArgument(m) => TelemetryError::InvalidArgument(m),
            InventoryError::Unauthenticated(m) => TelemetryError::Unauthenticated(m),
            InventoryError::PermissionDenied(m) => TelemetryError::NotFound(m),
            InventoryError::FailedPrecondition(m) => TelemetryError::FailedPrecondition(m),
            InventoryError::Unavailable(m) => TelemetryError::Unavailable(m),
            InventoryError::AlreadyExists(m) => TelemetryError::Internal(m),
            InventoryError::DeadlineExceeded => TelemetryError::Unavailable("deadline exceeded".to_string()),
            InventoryError::Internal(m) => TelemetryError::Internal(m),
        }
    }
}

impl From<GraphError> for TelemetryError {
    fn from(e: GraphError) -> Self {
        TelemetryError::Internal(e.to_string())
    }
}
