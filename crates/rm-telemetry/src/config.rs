use std::collections::HashMap;

use rm_domain::{CollectorKind, LogLevel, TelemetryGroup, TelemetryGroupKind, TelemetryProfile};
use serde::Serialize;

/// One flattened row of the `GetTelemetryConfigByGUID` response (§6.1): a
/// single named metric or log group, resolved from a profile's group
/// membership, interval, and level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryConfigEntry {
    pub metric_group: String,
    pub metric_type: CollectorKind,
    pub metric_kind: TelemetryGroupKind,
    pub interval_seconds: Option<u32>,
    pub log_level: Option<LogLevel>,
}

/// Expands one profile against its resolved group into the flat rows it
/// contributes, one per name in `group.groups` (§6.1).
pub fn flatten_profile(profile: &TelemetryProfile, group: &TelemetryGroup) -> Vec<TelemetryConfigEntry> {
    group
        .groups
        .iter()
        .map(|name| TelemetryConfigEntry {
            metric_group: name.clone(),
            metric_type: group.collector_kind,
            metric_kind: group.kind,
            interval_seconds: if group.kind == TelemetryGroupKind::Metrics { profile.metrics_interval } else { None },
            log_level: if group.kind == TelemetryGroupKind::Logs { profile.log_level } else { None },
        })
        .collect()
}

/// Numeric severity rank where higher means more severe, independent of
/// `LogLevel`'s declaration order (used only for total ordering elsewhere).
fn severity_rank(level: LogLevel) -> u8 {
    match level {
        LogLevel::Error => 4,
        LogLevel::Warn => 3,
        LogLevel::Info => 2,
        LogLevel::Debug => 1,
        LogLevel::Trace => 0,
    }
}

/// Deduplicates by `(metric_group, metric_type, metric_kind)` (§6.1):
/// metrics keep the minimum interval across duplicates, logs keep the
/// maximum severity. Input order has no bearing on the result.
pub fn dedupe(entries: Vec<TelemetryConfigEntry>) -> Vec<TelemetryConfigEntry> {
    let mut by_key: HashMap<(String, CollectorKind, TelemetryGroupKind), TelemetryConfigEntry> = HashMap::new();

    for entry in entries {
        let key = (entry.metric_group.clone(), entry.metric_type, entry.metric_kind);
        by_key
            .entry(key)
            .and_modify(|existing| merge_into(existing, &entry))
            .or_insert(entry);
    }

    by_key.into_values().collect()
}

fn merge_into(existing: &mut TelemetryConfigEntry, incoming: &TelemetryConfigEntry) {
    match (existing.interval_seconds, incoming.interval_seconds) {
        (Some(a), Some(b)) if b < a => existing.interval_seconds = Some(b),
        (None, Some(b)) => existing.interval_seconds = Some(b),
        _ => {}
    }
    match (existing.log_level, incoming.log_level) {
        (Some(a), Some(b)) if severity_rank(b) > severity_rank(a) => existing.log_level = Some(b),
        (None, Some(b)) => existing.log_level = Some(b),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rm_domain::{GroupId, ProfileId, TelemetryRelation, TenantId};

    fn profile(interval: Option<u32>, level: Option<LogLevel>) -> TelemetryProfile {
        TelemetryProfile {
            profile_id: ProfileId::new("p"),
            tenant_id: TenantId::new("t1"),
            group: GroupId::new("g1"),
            relation: TelemetryRelation::Instance(rm_domain::InstanceId::new("i1")),
            metrics_interval: interval,
            log_level: level,
        }
    }

    fn metrics_group(names: &[&str]) -> TelemetryGroup {
        TelemetryGroup {
            group_id: GroupId::new("g1"),
            tenant_id: TenantId::new("t1"),
            collector_kind: CollectorKind::Host,
            kind: TelemetryGroupKind::Metrics,
            groups: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn logs_group(names: &[&str]) -> TelemetryGroup {
        TelemetryGroup {
            group_id: GroupId::new("g2"),
            tenant_id: TenantId::new("t1"),
            collector_kind: CollectorKind::Host,
            kind: TelemetryGroupKind::Logs,
            groups: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn metrics_dedupe_keeps_minimum_interval() {
        let group = metrics_group(&["cpu"]);
        let a = flatten_profile(&profile(Some(60), None), &group);
        let b = flatten_profile(&profile(Some(15), None), &group);
        let merged = dedupe([a, b].concat());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].interval_seconds, Some(15));
    }

    #[test]
    fn logs_dedupe_keeps_maximum_severity() {
        let group = logs_group(&["syslog"]);
        let a = flatten_profile(&profile(None, Some(LogLevel::Debug)), &group);
        let b = flatten_profile(&profile(None, Some(LogLevel::Error)), &group);
        let merged = dedupe([a, b].concat());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].log_level, Some(LogLevel::Error));
    }

    #[test]
    fn distinct_metric_groups_do_not_merge() {
        let group = metrics_group(&["cpu", "mem"]);
        let entries = flatten_profile(&profile(Some(30), None), &group);
        let merged = dedupe(entries);
        assert_eq!(merged.len(), 2);
    }
}
