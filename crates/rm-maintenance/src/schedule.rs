use rm_domain::{validate_repeated_schedule, RepeatedSchedule, SingleSchedule};

use crate::error::MaintenanceError;
use crate::request::UpdateScheduleAssembly;

/// Picks the temporally closest applicable single schedule (§4.E.6, §8
/// property 4): candidates are those not yet expired (`end_seconds == 0`
/// or `now < end_seconds`); the winner minimizes `|now - start_seconds|`.
/// Ties are broken by the first minimal candidate encountered, which is
/// stable because callers pass schedules in a fixed order.
pub fn closest_single(schedules: &[SingleSchedule], now: i64) -> Option<SingleSchedule> {
    schedules
        .iter()
        .filter(|s| s.is_candidate_at(now))
        .min_by_key(|s| s.distance_from(now))
        .cloned()
}

/// Validates every repeated schedule's cron fields (§4.E.6, §6.4); the
/// first invalid field fails the whole request with `InvalidArgument`.
pub fn validate_repeated_schedules(schedules: &[RepeatedSchedule]) -> Result<(), MaintenanceError> {
    for schedule in schedules {
        validate_repeated_schedule(schedule)?;
    }
    Ok(())
}

/// Assembles the `update_schedule` response field (§4.E.6): the closest
/// single schedule plus every repeated schedule, with the first repeated
/// entry mirrored into the legacy single-field slot.
pub fn assemble(
    singles: &[SingleSchedule],
    repeated: Vec<RepeatedSchedule>,
    now: i64,
) -> Result<UpdateScheduleAssembly, MaintenanceError> {
    validate_repeated_schedules(&repeated)?;
    Ok(UpdateScheduleAssembly {
        single: closest_single(singles, now),
        repeated: repeated.first().cloned(),
        repeated_schedules: repeated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rm_domain::{ScheduleId, ScheduleStatus, ScheduleTarget, TenantId};

    fn single(id: &str, start: i64, end: i64) -> SingleSchedule {
        SingleSchedule {
            schedule_id: ScheduleId::new(id),
            tenant_id: TenantId::new("t1"),
            start_seconds: start,
            end_seconds: end,
            schedule_status: ScheduleStatus::Scheduled,
            target: ScheduleTarget::None,
        }
    }

    #[test]
    fn scenario_s1_picks_b_over_a_and_c() {
        let now = 1_000_000;
        let a = single("A", 999_400, 999_800);
        let b = single("B", 1_000_610, 0);
        let c = single("C", 1_000_660, 1_000_760);
        let picked = closest_single(&[a, b.clone(), c], now).unwrap();
        assert_eq!(picked.schedule_id, b.schedule_id);
    }

    #[test]
    fn no_candidates_returns_none() {
        let expired = single("A", 999_400, 999_800);
        assert!(closest_single(&[expired], 1_000_000).is_none());
    }

    #[test]
    fn no_end_time_is_always_a_candidate() {
        let open_ended = single("A", 10, 0);
        assert!(closest_single(&[open_ended], 1_000_000).is_some());
    }

    fn repeated(id: &str, minutes: &str) -> RepeatedSchedule {
        RepeatedSchedule {
            schedule_id: ScheduleId::new(id),
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
    fn scenario_s2_step_syntax_is_rejected() {
        let err = assemble(&[], vec![repeated("R", "/5")], 0).unwrap_err();
        assert!(matches!(err, MaintenanceError::InvalidArgument(_)));
    }

    #[test]
    fn legacy_single_field_mirrors_first_repeated_entry() {
        let r1 = repeated("R1", "0");
        let r2 = repeated("R2", "30");
        let assembled = assemble(&[], vec![r1.clone(), r2], 0).unwrap();
        assert_eq!(assembled.repeated.unwrap().schedule_id, r1.schedule_id);
        assert_eq!(assembled.repeated_schedules.len(), 2);
    }
}
