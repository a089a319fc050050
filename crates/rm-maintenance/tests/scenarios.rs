use std::sync::Arc;

use rm_cache::ScheduleCache;
use rm_domain::{
    Clock, FixedClock, Host, HostGuid, HostId, HostState, Instance, InstanceId, OSUpdatePolicy,
    OperatingSystem, OsId, OsType, ProvisioningStatus, StatusIndicator, TenantId, UpdateStrategy,
    UpdateStatusType,
};
use rm_inventory::InMemoryInventory;
use rm_maintenance::{MaintenanceError, MaintenanceHandler, PlatformUpdateStatusRequest, UpdateStatusPayload};

fn tenant() -> TenantId {
    TenantId::new("tenant-1")
}

fn immutable_os(image_id: &str) -> OperatingSystem {
    OperatingSystem {
        os_id: OsId::new(format!("os-{image_id}")),
        tenant_id: tenant(),
        profile_name: "edge-profile".to_string(),
        image_id: image_id.to_string(),
        profile_version: None,
        sha256: "deadbeef".to_string(),
        image_url: "https://example/os.img".to_string(),
        os_type: OsType::Immutable,
        security_feature: None,
        existing_cves: None,
    }
}

fn mutable_os(image_id: &str) -> OperatingSystem {
    OperatingSystem {
        os_id: OsId::new(format!("os-{image_id}")),
        tenant_id: tenant(),
        profile_name: "edge-profile".to_string(),
        image_id: image_id.to_string(),
        profile_version: None,
        sha256: "deadbeef".to_string(),
        image_url: "https://example/os.img".to_string(),
        os_type: OsType::Mutable,
        security_feature: None,
        existing_cves: None,
    }
}

fn host(trusted: bool) -> Host {
    let state = if trusted { HostState::Trusted } else { HostState::Untrusted };
    Host {
        host_id: HostId::new("host-1"),
        uuid: HostGuid::new("11111111-1111-1111-1111-111111111111"),
        tenant_id: tenant(),
        site_id: None,
        current_state: state,
        desired_state: state,
    }
}

fn instance(current_os: &str) -> Instance {
    Instance {
        instance_id: InstanceId::new("instance-1"),
        host_id: HostId::new("host-1"),
        tenant_id: tenant(),
        current_os: OsId::new(current_os),
        os_update_policy: Some(OSUpdatePolicy {
            strategy: UpdateStrategy::Latest,
            update_kernel_command: None,
            update_sources: vec![],
            update_packages: None,
        }),
        provisioning_status: ProvisioningStatus::Done,
        provisioning_status_indicator: StatusIndicator::Idle,
        update_status: UpdateStatusType::Unspecified,
        update_status_indicator: StatusIndicator::Unspecified,
        update_status_timestamp: 0,
        update_status_detail: None,
        update_status_message: String::new(),
        os_update_available: None,
        existing_cves: None,
    }
}

async fn handler_with(
    inv: Arc<InMemoryInventory>,
) -> MaintenanceHandler<InMemoryInventory> {
    let cache = Arc::new(ScheduleCache::new(inv.clone(), vec![tenant()]));
    cache.full_resweep().await.unwrap();
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(1_000_000));
    MaintenanceHandler::new(inv, cache, clock, false)
}

#[tokio::test]
async fn scenario_s6_untrusted_host_is_refused() {
    let inv = Arc::new(InMemoryInventory::new());
    inv.seed_host(host(false)).await;
    inv.seed_instance(instance("os-3.0.20250717.0000")).await;
    inv.seed_operating_system(immutable_os("3.0.20250717.0000")).await;

    let handler = handler_with(inv).await;
    let request = PlatformUpdateStatusRequest {
        tenant_id: Some(tenant()),
        roles: rm_domain::RoleSet::default(),
        host_guid: HostGuid::new("11111111-1111-1111-1111-111111111111"),
        update_status: UpdateStatusPayload { status_type: UpdateStatusType::UpToDate, ..Default::default() },
    };

    let err = handler.handle(request).await.unwrap_err();
    assert!(matches!(err, MaintenanceError::Unauthenticated(_)));
}

#[tokio::test]
async fn scenario_s3_identical_image_id_is_internal_error() {
    let inv = Arc::new(InMemoryInventory::new());
    inv.seed_host(host(true)).await;
    inv.seed_instance(instance("os-3.0.20250717.0000")).await;
    inv.seed_operating_system(immutable_os("3.0.20250717.0000")).await;

    let handler = handler_with(inv).await;
    let request = PlatformUpdateStatusRequest {
        tenant_id: Some(tenant()),
        roles: rm_domain::RoleSet::default(),
        host_guid: HostGuid::new("11111111-1111-1111-1111-111111111111"),
        update_status: UpdateStatusPayload {
            status_type: UpdateStatusType::Updated,
            profile_name: Some("edge-profile".to_string()),
            os_image_id: Some("3.0.20250717.0000".to_string()),
            ..Default::default()
        },
    };

    let err = handler.handle(request).await.unwrap_err();
    assert!(matches!(err, MaintenanceError::Internal(_)));
}

#[tokio::test]
async fn scenario_s7_latest_strategy_resolves_final_release() {
    let inv = Arc::new(InMemoryInventory::new());
    inv.seed_host(host(true)).await;
    inv.seed_instance(instance("os-3.0.20240719.1000")).await;
    for image in ["3.0.20240719.1000", "3.0.20250711.0415", "3.0.20250717.0732", "3.0.20250719.1000"] {
        inv.seed_operating_system(immutable_os(image)).await;
    }

    let handler = handler_with(inv).await;
    let request = PlatformUpdateStatusRequest {
        tenant_id: Some(tenant()),
        roles: rm_domain::RoleSet::default(),
        host_guid: HostGuid::new("11111111-1111-1111-1111-111111111111"),
        update_status: UpdateStatusPayload { status_type: UpdateStatusType::UpToDate, ..Default::default() },
    };

    let response = handler.handle(request).await.unwrap();
    let target = response.os_profile_update_source.unwrap();
    assert_eq!(target.image_id, "3.0.20250719.1000");
}

#[tokio::test]
async fn scenario_s4_update_run_lifecycle() {
    let inv = Arc::new(InMemoryInventory::new());
    inv.seed_host(host(true)).await;
    inv.seed_instance(instance("os-3.0.20250717.0000")).await;
    inv.seed_operating_system(mutable_os("3.0.20250717.0000")).await;

    let handler = handler_with(inv.clone()).await;
    let guid = HostGuid::new("11111111-1111-1111-1111-111111111111");

    let request = |status_type: UpdateStatusType| PlatformUpdateStatusRequest {
        tenant_id: Some(tenant()),
        roles: rm_domain::RoleSet::default(),
        host_guid: guid.clone(),
        update_status: UpdateStatusPayload { status_type, ..Default::default() },
    };

    handler.handle(request(UpdateStatusType::Started)).await.unwrap();
    handler.handle(request(UpdateStatusType::Downloaded)).await.unwrap();
    handler.handle(request(UpdateStatusType::Updated)).await.unwrap();

    use rm_inventory::InventoryGateway;
    let run = inv
        .get_latest_update_run(&tenant(), &InstanceId::new("instance-1"))
        .await
        .unwrap()
        .expect("a run was created on STARTED");
    assert!(!run.is_in_progress());
    assert_eq!(run.end_time, 1_000_000);
    assert_eq!(run.status, UpdateStatusType::Updated);
}

#[tokio::test]
async fn mutable_os_updated_persists_package_count_suffix() {
    let inv = Arc::new(InMemoryInventory::new());
    inv.seed_host(host(true)).await;
    inv.seed_instance(instance("os-3.0.20250717.0000")).await;
    inv.seed_operating_system(mutable_os("3.0.20250717.0000")).await;

    let handler = handler_with(inv.clone()).await;
    let status_detail = serde_json::json!({
        "update_log": [
            {"update_type": "os", "package_name": "curl", "update_time": "now", "action": "upgrade", "status": "done", "version": "1.0"},
            {"update_type": "os", "package_name": "git", "update_time": "now", "action": "upgrade", "status": "done", "version": "2.0"},
        ]
    })
    .to_string();
    let request = PlatformUpdateStatusRequest {
        tenant_id: Some(tenant()),
        roles: rm_domain::RoleSet::default(),
        host_guid: HostGuid::new("11111111-1111-1111-1111-111111111111"),
        update_status: UpdateStatusPayload {
            status_type: UpdateStatusType::Updated,
            status_detail: Some(status_detail),
            ..Default::default()
        },
    };

    handler.handle(request).await.unwrap();

    use rm_inventory::InventoryGateway;
    let updated = inv.get_instance(&tenant(), &InstanceId::new("instance-1")).await.unwrap();
    assert_eq!(updated.update_status_message, "Update completed - 2 package(s) updated/installed");
}

#[tokio::test]
async fn idempotent_redelivery_of_same_status_is_a_no_op() {
    let inv = Arc::new(InMemoryInventory::new());
    inv.seed_host(host(true)).await;
    inv.seed_instance(instance("os-3.0.20250717.0000")).await;
    inv.seed_operating_system(immutable_os("3.0.20250717.0000")).await;

    let handler = handler_with(inv.clone()).await;
    let request = || PlatformUpdateStatusRequest {
        tenant_id: Some(tenant()),
        roles: rm_domain::RoleSet::default(),
        host_guid: HostGuid::new("11111111-1111-1111-1111-111111111111"),
        update_status: UpdateStatusPayload { status_type: UpdateStatusType::Downloading, ..Default::default() },
    };

    handler.handle(request()).await.unwrap();
    use rm_inventory::InventoryGateway;
    let first = inv.get_instance(&tenant(), &InstanceId::new("instance-1")).await.unwrap();

    handler.handle(request()).await.unwrap();
    let second = inv.get_instance(&tenant(), &InstanceId::new("instance-1")).await.unwrap();

    assert_eq!(first.update_status, second.update_status);
    assert_eq!(first.update_status_indicator, second.update_status_indicator);
    assert_eq!(first.update_status_timestamp, second.update_status_timestamp);
}
