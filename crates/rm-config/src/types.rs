use std::collections::HashMap;
use std::time::Duration;

use rm_domain::TenantId;

/// Fully resolved, default-applied configuration for the resource manager
/// services (§6, §9). Built from [`crate::raw::RawConfig`] by
/// [`crate::loader::load_config`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub http_addr: String,
    pub inventory_endpoint: String,
    pub inventory_timeout: Duration,
    pub inventory_list_all_timeout: Duration,

    pub rbac_enabled: bool,
    pub sanitize_errors: bool,
    pub permissive_default_tenant: bool,
    pub default_tenant: TenantId,

    pub backoff_min: Duration,
    pub backoff_max: Duration,

    pub resweep_intervals: HashMap<String, Duration>,
    pub worker_pool_sizes: HashMap<String, usize>,
}

impl ServiceConfig {
    pub fn resweep_interval(&self, kind: &str) -> Duration {
        self.resweep_intervals
            .get(kind)
            .copied()
            .unwrap_or(Duration::from_secs(300))
    }

    pub fn worker_pool_size(&self, kind: &str) -> usize {
        self.worker_pool_sizes.get(kind).copied().unwrap_or(4)
    }
}
