use std::sync::Arc;

use rm_cache::ScheduleCache;
use rm_domain::{
    Clock, Instance, OperatingSystem, OsType, StatusIndicator, UpdateStatusType, UpdateStrategy,
    END_TIME_SENTINEL,
};
use rm_inventory::{FieldMask, InventoryGateway};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::MaintenanceError;
use crate::request::{
    OsProfileUpdateSource, PlatformUpdateStatusRequest, UpdateLog, UpdateSource,
    UpdateStatusResponse,
};
use crate::schedule;
use crate::status::{is_terminal, message_and_indicator, transition_needed};
use crate::target_os::{latest_immutable_by_profile, validate_resolved_os_differs, validate_target_os_transition};

/// The role a caller must hold to invoke `PlatformUpdateStatus` when RBAC
/// is enabled (§4.E.1, supplemented per §9's open RBAC question).
pub const REQUIRED_ROLE: &str = "maintenance-writer";

/// The `PlatformUpdateStatus` request handler (§4.E): trust/provisioning
/// gates, the instance update-status transition, target-OS resolution,
/// OS-update-run lifecycle, schedule assembly, and response assembly.
pub struct MaintenanceHandler<G: InventoryGateway> {
    inventory: Arc<G>,
    schedules: Arc<ScheduleCache<G>>,
    clock: Arc<dyn Clock>,
    rbac_enabled: bool,
}

impl<G: InventoryGateway> MaintenanceHandler<G> {
    pub fn new(
        inventory: Arc<G>,
        schedules: Arc<ScheduleCache<G>>,
        clock: Arc<dyn Clock>,
        rbac_enabled: bool,
    ) -> Self {
        Self { inventory, schedules, clock, rbac_enabled }
    }

    pub async fn handle(
        &self,
        request: PlatformUpdateStatusRequest,
    ) -> Result<UpdateStatusResponse, MaintenanceError> {
        let tenant = request
            .tenant_id
            .ok_or_else(|| MaintenanceError::Unauthenticated("missing tenant id".to_string()))?;

        if self.rbac_enabled && !request.roles.contains(REQUIRED_ROLE) {
            return Err(MaintenanceError::PermissionDenied(format!(
                "caller lacks required role '{REQUIRED_ROLE}'"
            )));
        }

        // §4.E.2 preconditions.
        let host = self.inventory.get_host_by_uuid(&tenant, &request.host_guid).await?;
        let mut instance = self
            .inventory
            .find_instance_by_host(&tenant, &host.host_id)
            .await?
            .ok_or_else(|| {
                MaintenanceError::NotFound(format!("no instance bound to host '{}'", host.host_id))
            })?;

        if host.is_untrusted() {
            return Err(MaintenanceError::Unauthenticated("host is untrusted".to_string()));
        }
        if !instance.is_provisioned() {
            return Err(MaintenanceError::FailedPrecondition(
                "instance is not provisioned".to_string(),
            ));
        }

        let status_type = request.update_status.status_type;
        let (message, new_indicator) = message_and_indicator(status_type);
        let now = self.clock.now_unix();

        let needed = transition_needed(instance.update_status, instance.update_status_indicator, status_type);

        if needed {
            self.apply_instance_transition(&tenant, &mut instance, status_type, message, new_indicator, now, &request)
                .await?;
        }

        // §4.E.5 OS-update-run lifecycle: best-effort, never fails the request (§7).
        if let Err(err) = self
            .advance_update_run(&tenant, &instance, status_type, now, &request)
            .await
        {
            warn!(?err, instance = %instance.instance_id, "OS update run lifecycle step failed, continuing");
        }

        // §4.E.6 schedule assembly.
        let singles = self
            .schedules
            .single_schedules_for_host(&tenant, &instance.host_id, host.site_id.as_ref())
            .await;
        let repeated = self
            .schedules
            .repeated_schedules_for_host(&tenant, &instance.host_id, host.site_id.as_ref())
            .await;
        let update_schedule = schedule::assemble(&singles, repeated, now)?;

        // §4.E.7 response assembly.
        let mut response = UpdateStatusResponse { update_schedule, ..Default::default() };
        self.assemble_update_source(&tenant, &instance, &mut response).await?;
        validate_response(&response)?;

        Ok(response)
    }

    /// Assembles the update schedule for a host without touching its
    /// instance's update-status (§4.E.6), for read-only inspection by the
    /// operator CLI.
    pub async fn schedule_for_host(
        &self,
        tenant: &rm_domain::TenantId,
        host_guid: &rm_domain::HostGuid,
    ) -> Result<crate::request::UpdateScheduleAssembly, MaintenanceError> {
        let host = self.inventory.get_host_by_uuid(tenant, host_guid).await?;
        let now = self.clock.now_unix();
        let singles = self
            .schedules
            .single_schedules_for_host(tenant, &host.host_id, host.site_id.as_ref())
            .await;
        let repeated = self
            .schedules
            .repeated_schedules_for_host(tenant, &host.host_id, host.site_id.as_ref())
            .await;
        schedule::assemble(&singles, repeated, now)
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply_instance_transition(
        &self,
        tenant: &rm_domain::TenantId,
        instance: &mut Instance,
        status_type: UpdateStatusType,
        message: &'static str,
        new_indicator: StatusIndicator,
        now: i64,
        request: &PlatformUpdateStatusRequest,
    ) -> Result<(), MaintenanceError> {
        let mut fields = vec!["update_status", "update_status_indicator", "update_status_timestamp"];

        let mut current_os: Option<OperatingSystem> = None;
        if status_type == UpdateStatusType::Updated {
            current_os = Some(self.inventory.get_operating_system(tenant, &instance.current_os).await?);
        }

        // §4.E.4 target-OS resolution, only for UPDATED against an immutable current OS.
        if let Some(os) = &current_os {
            if os.os_type == OsType::Immutable {
                let (profile_name, image_id) = validate_target_os_transition(&request.update_status, os)?;
                let candidates = self.inventory.list_operating_systems_by_profile(tenant, profile_name).await?;
                let matches: Vec<_> = candidates.into_iter().filter(|c| c.image_id == image_id).collect();
                if matches.len() != 1 {
                    return Err(MaintenanceError::internal(format!(
                        "expected exactly one OS resource for profile '{profile_name}' image '{image_id}', found {}",
                        matches.len()
                    )));
                }
                let resolved = &matches[0];
                validate_resolved_os_differs(resolved, &instance.current_os)?;

                instance.current_os = resolved.os_id.clone();
                instance.existing_cves = resolved.existing_cves.clone();
                instance.os_update_available = request.update_status.os_update_available;
                fields.extend(["current_os", "existing_cves", "os_update_available"]);
            }
        }

        // First contact after provisioning: copy existing_cves from the (unchanged) current OS.
        let is_first_contact =
            instance.update_status_indicator == StatusIndicator::Unspecified && new_indicator == StatusIndicator::Idle;
        if is_first_contact && !fields.contains(&"existing_cves") {
            match self.inventory.get_operating_system(tenant, &instance.current_os).await {
                Ok(os) => {
                    instance.existing_cves = os.existing_cves.clone();
                    fields.push("existing_cves");
                }
                Err(err) => warn!(?err, instance = %instance.instance_id, "first-contact CVE copy failed, continuing"),
            }
        }

        // Status detail: only for UPDATED/FAILED, only if it parses as the update-log JSON shape.
        let mut log_message = message.to_string();
        if matches!(status_type, UpdateStatusType::Updated | UpdateStatusType::Failed) {
            if let Some(raw) = &request.update_status.status_detail {
                if let Ok(log) = serde_json::from_str::<UpdateLog>(raw) {
                    instance.update_status_detail = Some(raw.clone());
                    fields.push("update_status_detail");
                    let is_mutable = current_os.as_ref().map(|os| os.os_type == OsType::Mutable).unwrap_or(false);
                    if status_type == UpdateStatusType::Updated && is_mutable {
                        log_message = format!("{message} - {} package(s) updated/installed", log.update_log.len());
                    }
                }
                // invalid JSON: dropped silently, no error, no detail written.
            }
        }

        instance.update_status = status_type;
        instance.update_status_indicator = new_indicator;
        instance.update_status_timestamp = now;
        instance.update_status_message = log_message.clone();
        fields.push("update_status_message");

        info!(instance = %instance.instance_id, status = %log_message, "instance update-status transition");
        self.inventory.update_instance(tenant, instance, FieldMask::new(&fields)).await?;
        Ok(())
    }

    async fn advance_update_run(
        &self,
        tenant: &rm_domain::TenantId,
        instance: &Instance,
        status_type: UpdateStatusType,
        now: i64,
        request: &PlatformUpdateStatusRequest,
    ) -> Result<(), MaintenanceError> {
        match status_type {
            UpdateStatusType::Started => {
                let (_, indicator) = message_and_indicator(status_type);
                let run = rm_domain::OSUpdateRun {
                    run_id: rm_domain::RunId::new(Uuid::new_v4().to_string()),
                    tenant_id: tenant.clone(),
                    instance_id: instance.instance_id.clone(),
                    applied_policy: instance.os_update_policy.clone(),
                    status: status_type,
                    status_indicator: indicator,
                    status_details: None,
                    status_timestamp: now,
                    start_time: now,
                    end_time: END_TIME_SENTINEL,
                    name: format!("update-run-{}", Uuid::new_v4()),
                };
                self.inventory.create_update_run(tenant, &run).await?;
                info!(instance = %instance.instance_id, run = %run.run_id, "created OS update run");
            }
            UpdateStatusType::Updated | UpdateStatusType::Failed => {
                let Some(mut run) = self.inventory.get_latest_update_run(tenant, &instance.instance_id).await? else {
                    info!(instance = %instance.instance_id, "no in-progress update run to advance, continuing");
                    return Ok(());
                };
                if !run.is_in_progress() {
                    return Ok(());
                }
                if !transition_needed(run.status, run.status_indicator, status_type) {
                    return Ok(());
                }
                let (_, indicator) = message_and_indicator(status_type);
                run.status = status_type;
                run.status_indicator = indicator;
                run.status_timestamp = now;
                if let Some(raw) = &request.update_status.status_detail {
                    if serde_json::from_str::<UpdateLog>(raw).is_ok() {
                        run.status_details = Some(raw.clone());
                    }
                }
                if is_terminal(status_type) {
                    run.end_time = now;
                }
                self.inventory
                    .update_update_run(
                        tenant,
                        &run,
                        FieldMask::new(&["status", "status_indicator", "status_timestamp", "status_details", "end_time"]),
                    )
                    .await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn assemble_update_source(
        &self,
        tenant: &rm_domain::TenantId,
        instance: &Instance,
        response: &mut UpdateStatusResponse,
    ) -> Result<(), MaintenanceError> {
        let current_os = self.inventory.get_operating_system(tenant, &instance.current_os).await?;
        response.os_type = Some(current_os.os_type);

        let Some(policy) = &instance.os_update_policy else {
            return Ok(());
        };

        match current_os.os_type {
            OsType::Mutable => {
                response.update_source = Some(UpdateSource {
                    kernel_command: policy.update_kernel_command.clone(),
                    custom_repos: policy.update_sources.clone(),
                });
                response.installed_packages = policy.update_packages.clone();
            }
            OsType::Immutable => {
                let target = match &policy.strategy {
                    UpdateStrategy::Target(os_id) => self.inventory.get_operating_system(tenant, os_id).await?,
                    UpdateStrategy::Latest => {
                        let candidates = self
                            .inventory
                            .list_operating_systems_by_profile(tenant, &current_os.profile_name)
                            .await?;
                        latest_immutable_by_profile(&candidates)?.clone()
                    }
                };
                response.os_profile_update_source = Some(OsProfileUpdateSource {
                    profile_name: target.profile_name,
                    profile_version: target.profile_version,
                    image_url: target.image_url,
                    image_id: target.image_id,
                    sha256: target.sha256,
                });
            }
        }
        Ok(())
    }
}

fn validate_response(response: &UpdateStatusResponse) -> Result<(), MaintenanceError> {
    let has_mutable_source = response.update_source.is_some() || response.installed_packages.is_some();
    let has_immutable_source = response.os_profile_update_source.is_some();
    if has_mutable_source && has_immutable_source {
        return Err(MaintenanceError::internal(
            "response carries both mutable and immutable update sources",
        ));
    }
    Ok(())
}
