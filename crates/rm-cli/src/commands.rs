use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::oneshot;

use rm_cache::{ProfileCache, ScheduleCache};
use rm_config::ServiceConfig;
use rm_domain::{Clock, SystemClock, TenantId};
use rm_inventory::{InMemoryInventory, InventoryGateway};
use rm_maintenance::MaintenanceHandler;
use rm_reconciler::{Backoff, IpReconciler, ReconcilerDriver, WorkerPool};
use rm_telemetry::TelemetryHandler;

/// Built-in config used when `serve` is invoked without `--config`: RBAC and
/// error sanitisation off, the reserved default tenant accepted on every
/// request, so the in-memory fake is usable without any setup (§6.3).
fn default_service_config() -> ServiceConfig {
    ServiceConfig {
        http_addr: "0.0.0.0:8080".to_string(),
        inventory_endpoint: "inline".to_string(),
        inventory_timeout: Duration::from_secs(5),
        inventory_list_all_timeout: Duration::from_secs(60),
        rbac_enabled: false,
        sanitize_errors: false,
        permissive_default_tenant: true,
        default_tenant: TenantId::reserved_default(),
        backoff_min: Duration::from_secs(1),
        backoff_max: Duration::from_secs(30),
        resweep_intervals: HashMap::new(),
        worker_pool_sizes: HashMap::new(),
    }
}

// ── Serve ─────────────────────────────────────────────────────────────────────

pub async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    let config = match config_path {
        Some(path) => rm_config::load_config(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => default_service_config(),
    };

    let addr = config.http_addr.clone();
    let tracked = vec![config.default_tenant.clone()];

    let inventory = Arc::new(InMemoryInventory::new());
    let schedules = Arc::new(ScheduleCache::new(inventory.clone(), tracked.clone()));
    let profiles = Arc::new(ProfileCache::new(inventory.clone(), tracked.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let maintenance = Arc::new(MaintenanceHandler::new(
        inventory.clone(),
        schedules.clone(),
        clock.clone(),
        config.rbac_enabled,
    ));
    let telemetry = Arc::new(TelemetryHandler::new(
        inventory.clone(),
        profiles.clone(),
        clock,
        config.rbac_enabled,
    ));

    // Each background loop owns its own subscriber channel and term sender;
    // the senders are kept alive for the life of the process so the loops
    // keep running for as long as the server does.
    let mut keepalive_terms = Vec::new();

    let (schedule_term_tx, schedule_term_rx) = oneshot::channel();
    keepalive_terms.push(schedule_term_tx);
    let schedule_events = inventory.subscribe().await?;
    let schedule_interval = config.resweep_interval("schedule");
    {
        let schedules = schedules.clone();
        tokio::spawn(async move {
            schedules.run(schedule_events, schedule_interval, schedule_term_rx).await;
        });
    }

    let (profile_term_tx, profile_term_rx) = oneshot::channel();
    keepalive_terms.push(profile_term_tx);
    let profile_events = inventory.subscribe().await?;
    let profile_interval = config.resweep_interval("profile");
    {
        let profiles = profiles.clone();
        tokio::spawn(async move {
            profiles.run(profile_events, profile_interval, profile_term_rx).await;
        });
    }

    let (ip_term_tx, ip_term_rx) = oneshot::channel();
    keepalive_terms.push(ip_term_tx);
    let ip_events = inventory.subscribe().await?;
    let ip_interval = config.resweep_interval("ip");
    let ip_pool_size = config.worker_pool_size("ip");
    let ip_backoff = Backoff::new(config.backoff_min, config.backoff_max);
    {
        let ip_reconciler = Arc::new(IpReconciler::new(inventory.clone()));
        let pool = Arc::new(WorkerPool::spawn(ip_reconciler.clone(), ip_pool_size, ip_backoff));
        let driver = ReconcilerDriver {
            kind: rm_inventory::ResourceKind::IpAddress,
            pool,
            resweep: ip_reconciler,
            tracked_tenants: tracked,
        };
        tokio::spawn(async move {
            driver.run(ip_events, ip_interval, ip_term_rx).await;
        });
    }

    let app = rm_api::build_app(maintenance, telemetry, schedules, profiles, Arc::new(config));

    tracing::info!(%addr, "starting rm-api server");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server exited")?;

    drop(keepalive_terms);
    Ok(())
}

// ── Resweep ───────────────────────────────────────────────────────────────────

pub async fn resweep(server: String, kind: String) -> Result<()> {
    let url = format!("{}/resweep/{}", server.trim_end_matches('/'), kind);
    let resp = reqwest::Client::new()
        .post(&url)
        .send()
        .await
        .with_context(|| format!("failed to reach server at {server}"))?;

    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("resweep failed ({status}): {text}");
    }
    println!("{text}");
    Ok(())
}

// ── Status ────────────────────────────────────────────────────────────────────

pub async fn status(server: String) -> Result<()> {
    let url = format!("{}/status", server.trim_end_matches('/'));
    let body: serde_json::Value = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .with_context(|| format!("failed to reach server at {server}"))?
        .json()
        .await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

// ── ScheduleFor ───────────────────────────────────────────────────────────────

pub async fn schedule_for(server: String, host_uuid: String, tenant: String) -> Result<()> {
    let url = format!("{}/v1/hosts/{}/schedule", server.trim_end_matches('/'), host_uuid);
    let resp = reqwest::Client::new()
        .get(&url)
        .header("x-tenant-id", tenant)
        .send()
        .await
        .with_context(|| format!("failed to reach server at {server}"))?;

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.context("failed to parse response body")?;
    if !status.is_success() {
        anyhow::bail!("schedule-for failed ({status}): {body}");
    }
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
