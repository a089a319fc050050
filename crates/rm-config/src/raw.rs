use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Raw YAML representation of the service's config file.
#[derive(Debug, Deserialize, Serialize)]
pub struct RawConfig {
    pub http_addr: Option<String>,
    pub inventory_endpoint: String,
    pub inventory_timeout_ms: Option<u64>,
    pub inventory_list_all_timeout_ms: Option<u64>,

    #[serde(default)]
    pub rbac_enabled: bool,
    #[serde(default)]
    pub sanitize_errors: bool,
    #[serde(default)]
    pub permissive_default_tenant: bool,

    pub backoff_min_seconds: Option<u64>,
    pub backoff_max_seconds: Option<u64>,

    /// Full-resweep period per reconciler/cache kind, e.g. `ip: 300`.
    #[serde(default)]
    pub resweep_seconds: HashMap<String, u64>,

    /// Worker pool size per reconciler kind, e.g. `ip: 8`.
    #[serde(default)]
    pub worker_pool_sizes: HashMap<String, usize>,
}
