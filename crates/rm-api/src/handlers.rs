use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use rm_domain::HostGuid;
use rm_inventory::InventoryGateway;
use rm_maintenance::{PlatformUpdateStatusRequest, UpdateStatusPayload};
use rm_telemetry::GetTelemetryConfigRequest;

use crate::auth::{extract_roles, extract_tenant};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn status<G: InventoryGateway + Send + Sync + 'static>(
    State(state): State<AppState<G>>,
) -> Json<Value> {
    Json(serde_json::json!({
        "rbac_enabled": state.config.rbac_enabled,
        "sanitize_errors": state.config.sanitize_errors,
        "permissive_default_tenant": state.config.permissive_default_tenant,
        "default_tenant": state.config.default_tenant,
    }))
}

/// Triggers an out-of-band full resweep of one in-memory cache (§4.B/§4.C),
/// for operators who don't want to wait for the periodic resweep tick.
pub async fn post_resweep<G: InventoryGateway + Send + Sync + 'static>(
    State(state): State<AppState<G>>,
    Path(kind): Path<String>,
) -> Result<&'static str, ApiError> {
    match kind.as_str() {
        "schedule" => {
            state.schedules.full_resweep().await.map_err(|e| ApiError::internal(e.to_string()))?;
            Ok("resweep complete")
        }
        "profile" => {
            state.profiles.full_resweep().await.map_err(|e| ApiError::internal(e.to_string()))?;
            Ok("resweep complete")
        }
        other => Err(ApiError::not_found(format!("unknown resweep kind '{other}'"))),
    }
}

pub async fn get_schedule_for_host<G: InventoryGateway + Send + Sync + 'static>(
    State(state): State<AppState<G>>,
    Path(host_guid): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let tenant = extract_tenant(&headers, state.config.permissive_default_tenant)
        .ok_or_else(|| ApiError::unauthenticated("missing tenant id"))?;
    let assembly = state.maintenance.schedule_for_host(&tenant, &HostGuid::new(host_guid)).await?;
    Ok(Json(serde_json::json!({
        "single": assembly.single,
        "repeated": assembly.repeated,
        "repeated_schedules": assembly.repeated_schedules,
    })))
}

/// Body for the southbound `PlatformUpdateStatus` RPC (§4.E.1).
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status_type: rm_domain::UpdateStatusType,
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default)]
    pub profile_version: Option<String>,
    #[serde(default)]
    pub os_image_id: Option<String>,
    #[serde(default)]
    pub os_update_available: Option<bool>,
    #[serde(default)]
    pub status_detail: Option<String>,
}

pub async fn platform_update_status<G: InventoryGateway + Send + Sync + 'static>(
    State(state): State<AppState<G>>,
    Path(host_guid): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<Value>, ApiError> {
    let tenant_id = extract_tenant(&headers, state.config.permissive_default_tenant);
    let roles = extract_roles(&headers);

    let request = PlatformUpdateStatusRequest {
        tenant_id,
        roles,
        host_guid: HostGuid::new(host_guid),
        update_status: UpdateStatusPayload {
            status_type: body.status_type,
            profile_name: body.profile_name,
            profile_version: body.profile_version,
            os_image_id: body.os_image_id,
            os_update_available: body.os_update_available,
            status_detail: body.status_detail,
        },
    };

    let response = state.maintenance.handle(request).await?;
    Ok(Json(serde_json::to_value(ResponseView::from(response)).unwrap_or(Value::Null)))
}

/// JSON projection of `UpdateStatusResponse`, since the domain type is built
/// for in-process callers rather than wire serialization.
#[derive(Debug, Serialize)]
struct ResponseView {
    os_type: Option<rm_domain::OsType>,
    installed_packages: Option<String>,
    kernel_command: Option<String>,
    custom_repos: Vec<String>,
    os_profile_image_id: Option<String>,
    os_profile_image_url: Option<String>,
    single_schedule: Option<rm_domain::SingleSchedule>,
    repeated_schedules: Vec<rm_domain::RepeatedSchedule>,
}

impl From<rm_maintenance::UpdateStatusResponse> for ResponseView {
    fn from(r: rm_maintenance::UpdateStatusResponse) -> Self {
        let (kernel_command, custom_repos) = r
            .update_source
            .map(|s| (s.kernel_command, s.custom_repos))
            .unwrap_or((None, Vec::new()));
        let (os_profile_image_id, os_profile_image_url) = r
            .os_profile_update_source
            .map(|s| (Some(s.image_id), Some(s.image_url)))
            .unwrap_or((None, None));
        ResponseView {
            os_type: r.os_type,
            installed_packages: r.installed_packages,
            kernel_command,
            custom_repos,
            os_profile_image_id,
            os_profile_image_url,
            single_schedule: r.update_schedule.single,
            repeated_schedules: r.update_schedule.repeated_schedules,
        }
    }
}

pub async fn get_telemetry_config<G: InventoryGateway + Send + Sync + 'static>(
    State(state): State<AppState<G>>,
    Path(host_guid): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let tenant_id = extract_tenant(&headers, state.config.permissive_default_tenant);
    let roles = extract_roles(&headers);

    let request = GetTelemetryConfigRequest { tenant_id, roles, host_guid: HostGuid::new(host_guid) };

    let response = state.telemetry.handle(request).await?;
    Ok(Json(serde_json::json!({
        "config": response.config,
        "timestamp": response.timestamp,
    })))
}
