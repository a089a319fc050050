use std::path::Path;
use std::time::Duration;

use rm_domain::TenantId;
use tracing::debug;

use crate::error::ConfigError;
use crate::raw::RawConfig;
use crate::types::ServiceConfig;

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_INVENTORY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_INVENTORY_LIST_ALL_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_BACKOFF_MIN_SECONDS: u64 = 1;
const DEFAULT_BACKOFF_MAX_SECONDS: u64 = 30;

/// Load and validate the service config file at `path`.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let raw: RawConfig = serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
        path: path.display().to_string(),
        source: e,
    })?;

    debug!("loaded service config from {}", path.display());
    convert(raw, path)
}

fn convert(raw: RawConfig, path: &Path) -> Result<ServiceConfig, ConfigError> {
    if raw.inventory_endpoint.trim().is_empty() {
        return Err(ConfigError::Conversion {
            path: path.display().to_string(),
            message: "inventory_endpoint must not be empty".to_string(),
        });
    }

    let backoff_min = raw.backoff_min_seconds.unwrap_or(DEFAULT_BACKOFF_MIN_SECONDS);
    let backoff_max = raw.backoff_max_seconds.unwrap_or(DEFAULT_BACKOFF_MAX_SECONDS);
    if backoff_max < backoff_min {
        return Err(ConfigError::Conversion {
            path: path.display().to_string(),
            message: format!(
                "backoff_max_seconds ({backoff_max}) must be >= backoff_min_seconds ({backoff_min})"
            ),
        });
    }

    let default_tenant = TenantId::reserved_default();

    Ok(ServiceConfig {
        http_addr: raw.http_addr.unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string()),
        inventory_endpoint: raw.inventory_endpoint,
        inventory_timeout: Duration::from_millis(
            raw.inventory_timeout_ms.unwrap_or(DEFAULT_INVENTORY_TIMEOUT_MS),
        ),
        inventory_list_all_timeout: Duration::from_millis(
            raw.inventory_list_all_timeout_ms
                .unwrap_or(DEFAULT_INVENTORY_LIST_ALL_TIMEOUT_MS),
        ),
        rbac_enabled: raw.rbac_enabled,
        sanitize_errors: raw.sanitize_errors,
        permissive_default_tenant: raw.permissive_default_tenant,
        default_tenant,
        backoff_min: Duration::from_secs(backoff_min),
        backoff_max: Duration::from_secs(backoff_max),
        resweep_intervals: raw
            .resweep_seconds
            .into_iter()
            .map(|(k, v)| (k, Duration::from_secs(v)))
            .collect(),
        worker_pool_sizes: raw.worker_pool_sizes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn rejects_empty_inventory_endpoint() {
        let f = write_temp("inventory_endpoint: \"\"\n");
        let err = load_config(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Conversion { .. }));
    }

    #[test]
    fn applies_defaults_when_fields_absent() {
        let f = write_temp("inventory_endpoint: \"http://inventory.local:9000\"\n");
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.http_addr, DEFAULT_HTTP_ADDR);
        assert_eq!(cfg.backoff_min.as_secs(), DEFAULT_BACKOFF_MIN_SECONDS);
        assert_eq!(cfg.backoff_max.as_secs(), DEFAULT_BACKOFF_MAX_SECONDS);
        assert!(!cfg.rbac_enabled);
    }

    #[test]
    fn rejects_backoff_max_below_min() {
        let f = write_temp(
            "inventory_endpoint: \"http://inventory.local:9000\"\nbackoff_min_seconds: 30\nbackoff_max_seconds: 1\n",
        );
        let err = load_config(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Conversion { .. }));
    }
}
