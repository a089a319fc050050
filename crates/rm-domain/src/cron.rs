use crate::error::DomainError;
use crate::types::RepeatedSchedule;

/// One cron field's valid range, used by [`validate_field`] (§6.4).
struct FieldSpec {
    name: &'static str,
    min: i64,
    max: i64,
}

const MINUTES: FieldSpec = FieldSpec { name: "minutes", min: 0, max: 59 };
const HOURS: FieldSpec = FieldSpec { name: "hours", min: 0, max: 23 };
const DAY_MONTH: FieldSpec = FieldSpec { name: "day_of_month", min: 1, max: 31 };
const MONTH: FieldSpec = FieldSpec { name: "month", min: 1, max: 12 };
const DAY_WEEK: FieldSpec = FieldSpec { name: "day_of_week", min: 0, max: 6 };

/// Validates one POSIX-lite cron field (§6.4): `*`, a single in-range
/// integer, or a comma-separated list of in-range integers. Any other
/// syntax — ranges, steps, `?` — is rejected, not interpreted.
fn validate_field(spec: &FieldSpec, value: &str) -> Result<(), DomainError> {
    if value == "*" {
        return Ok(());
    }
    if value.is_empty() {
        return Err(DomainError::InvalidCronField { field: spec.name, value: value.to_string() });
    }
    for part in value.split(',') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::InvalidCronField {
                field: spec.name,
                value: value.to_string(),
            });
        }
        let n: i64 = part
            .parse()
            .map_err(|_| DomainError::InvalidCronField { field: spec.name, value: value.to_string() })?;
        if n < spec.min || n > spec.max {
            return Err(DomainError::InvalidCronField {
                field: spec.name,
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

/// Validates every cron field of a repeated schedule (§4.E.6, §6.4). A
/// single failing field fails the whole schedule — and per §4.E.6, the
/// whole request the schedule is part of.
pub fn validate_repeated_schedule(schedule: &RepeatedSchedule) -> Result<(), DomainError> {
    validate_field(&MINUTES, &schedule.cron_minutes)?;
    validate_field(&HOURS, &schedule.cron_hours)?;
    validate_field(&DAY_MONTH, &schedule.cron_day_month)?;
    validate_field(&MONTH, &schedule.cron_month)?;
    validate_field(&DAY_WEEK, &schedule.cron_day_week)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ScheduleId, TenantId};
    use crate::types::ScheduleTarget;

    fn schedule(minutes: &str) -> RepeatedSchedule {
        RepeatedSchedule {
            schedule_id: ScheduleId::new("s1"),
            tenant_id: TenantId::new("t1"),
            duration_seconds: 3600,
            cron_minutes: minutes.to_string(),
            cron_hours: "*".to_string(),
            cron_day_month: "*".to_string(),
            cron_month: "*".to_string(),
            cron_day_week: "*".to_string(),
            target: ScheduleTarget::None,
        }
    }

    #[test]
    fn star_and_lists_are_accepted() {
        assert!(validate_repeated_schedule(&schedule("*")).is_ok());
        assert!(validate_repeated_schedule(&schedule("0,15,30,45")).is_ok());
        assert!(validate_repeated_schedule(&schedule("59")).is_ok());
    }

    #[test]
    fn out_of_range_integer_is_rejected() {
        assert!(validate_repeated_schedule(&schedule("60")).is_err());
    }

    #[test]
    fn step_syntax_is_rejected_scenario_s2() {
        let err = validate_repeated_schedule(&schedule("/5")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCronField { field: "minutes", .. }));
    }

    #[test]
    fn range_syntax_is_rejected() {
        assert!(validate_repeated_schedule(&schedule("1-5")).is_err());
    }

    #[test]
    fn question_mark_is_rejected() {
        assert!(validate_repeated_schedule(&schedule("?")).is_err());
    }
}
