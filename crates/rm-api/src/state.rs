use std::sync::Arc;

use rm_cache::{ProfileCache, ScheduleCache};
use rm_config::ServiceConfig;
use rm_inventory::InventoryGateway;
use rm_maintenance::MaintenanceHandler;
use rm_telemetry::TelemetryHandler;

#[derive(Clone)]
pub struct AppState<G: InventoryGateway> {
    pub maintenance: Arc<MaintenanceHandler<G>>,
    pub telemetry: Arc<TelemetryHandler<G>>,
    pub schedules: Arc<ScheduleCache<G>>,
    pub profiles: Arc<ProfileCache<G>>,
    pub config: Arc<ServiceConfig>,
}
