use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use rm_cache::{ProfileCache, ScheduleCache};
use rm_config::ServiceConfig;
use rm_inventory::InventoryGateway;
use rm_maintenance::MaintenanceHandler;
use rm_telemetry::TelemetryHandler;

use crate::error::canonical_message;
use crate::handlers;
use crate::state::AppState;

pub fn build_app<G: InventoryGateway + Send + Sync + 'static>(
    maintenance: Arc<MaintenanceHandler<G>>,
    telemetry: Arc<TelemetryHandler<G>>,
    schedules: Arc<ScheduleCache<G>>,
    profiles: Arc<ProfileCache<G>>,
    config: Arc<ServiceConfig>,
) -> Router {
    let state = AppState { maintenance, telemetry, schedules, profiles, config };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status::<G>))
        .route("/resweep/:kind", post(handlers::post_resweep::<G>))
        .route("/v1/hosts/:host_guid/update-status", post(handlers::platform_update_status::<G>))
        .route("/v1/hosts/:host_guid/telemetry-config", get(handlers::get_telemetry_config::<G>))
        .route("/v1/hosts/:host_guid/schedule", get(handlers::get_schedule_for_host::<G>))
        .route_layer(middleware::from_fn_with_state(state.clone(), sanitize_errors::<G>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The optional error-sanitisation stage (§7, SPEC_FULL supplemented
/// features): when `rm-config`'s `sanitize_errors` is set, error responses
/// are rewritten to carry only `code` and a canned short description,
/// dropping whatever detail the inner error accumulated.
async fn sanitize_errors<G: InventoryGateway + Send + Sync + 'static>(
    State(state): State<AppState<G>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !state.config.sanitize_errors || response.status().is_success() {
        return response;
    }

    let status = response.status();
    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, 64 * 1024).await {
        Ok(b) => b,
        Err(_) => return Response::from_parts(parts, Body::empty()),
    };

    let code = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(str::to_string))
        .unwrap_or_else(|| "INTERNAL".to_string());

    let sanitized = serde_json::json!({ "code": code, "message": canonical_message(&code) });
    let mut response = Response::from_parts(parts, Body::from(sanitized.to_string()));
    *response.status_mut() = status;
    response
}
