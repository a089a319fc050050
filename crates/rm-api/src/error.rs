use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use rm_maintenance::MaintenanceError;
use rm_telemetry::TelemetryError;

/// The southbound RPC error envelope (§7): a bounded `code` plus a
/// human-readable `message`. The optional sanitisation layer strips
/// `message` down to the code's canonical phrase when `rm-config`'s
/// `sanitize_errors` is set, without needing a second error type.
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError { status, code, message: message.into() }
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", msg)
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        ApiError::new(StatusCode::FORBIDDEN, "PERMISSION_DENIED", msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "code": self.code, "message": self.message }));
        (self.status, body).into_response()
    }
}

impl From<MaintenanceError> for ApiError {
    fn from(e: MaintenanceError) -> Self {
        let message = e.to_string();
        match e {
            MaintenanceError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
            MaintenanceError::AlreadyExists(_) => {
                ApiError::new(StatusCode::CONFLICT, "ALREADY_EXISTS", message)
            }
            MaintenanceError::InvalidArgument(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", message)
            }
            MaintenanceError::Unauthenticated(_) => {
                ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", message)
            }
            MaintenanceError::PermissionDenied(_) => {
                ApiError::new(StatusCode::FORBIDDEN, "PERMISSION_DENIED", message)
            }
            MaintenanceError::FailedPrecondition(_) => {
                ApiError::new(StatusCode::PRECONDITION_FAILED, "FAILED_PRECONDITION", message)
            }
            MaintenanceError::Unavailable(_) => {
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", message)
            }
            MaintenanceError::DeadlineExceeded => {
                ApiError::new(StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED", message)
            }
            MaintenanceError::Internal(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
            }
        }
    }
}

impl From<TelemetryError> for ApiError {
    fn from(e: TelemetryError) -> Self {
        let message = e.to_string();
        match e {
            TelemetryError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
            TelemetryError::InvalidArgument(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", message)
            }
            TelemetryError::Unauthenticated(_) => {
                ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", message)
            }
            TelemetryError::PermissionDenied(_) => {
                ApiError::new(StatusCode::FORBIDDEN, "PERMISSION_DENIED", message)
            }
            TelemetryError::FailedPrecondition(_) => {
                ApiError::new(StatusCode::PRECONDITION_FAILED, "FAILED_PRECONDITION", message)
            }
            TelemetryError::Unavailable(_) => {
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", message)
            }
            TelemetryError::Internal(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
            }
        }
    }
}

/// The canonical short description a sanitised response falls back to,
/// keyed by the same `code` the unsanitised body already carries.
pub fn canonical_message(code: &str) -> &'static str {
    match code {
        "NOT_FOUND" => "resource not found",
        "ALREADY_EXISTS" => "resource already exists",
        "INVALID_ARGUMENT" => "invalid argument",
        "UNAUTHENTICATED" => "authentication required",
        "PERMISSION_DENIED" => "permission denied",
        "FAILED_PRECONDITION" => "failed precondition",
        "UNAVAILABLE" => "service unavailable",
        "DEADLINE_EXCEEDED" => "deadline exceeded",
        _ => "internal error",
    }
}
