use thiserror::Error;

/// The bounded error taxonomy the inventory gateway is allowed to return
/// (§4.A). Every caller in this workspace matches on these variants instead
/// of inspecting transport-level detail — the wire protocol itself is out of
/// scope here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

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

impl InventoryError {
    /// Whether a caller should retry this call with backoff rather than
    /// treat it as a terminal failure (§4.D's `HandleInventoryError`).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InventoryError::Unavailable(_) | InventoryError::DeadlineExceeded | InventoryError::Internal(_)
        )
    }
}
