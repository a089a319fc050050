use rm_domain::{StatusIndicator, UpdateStatusType};

/// The `status_type → (message, indicator)` table from §4.E.3. Every
/// instance- and run-status write in this crate goes through this one
/// function so the table lives in exactly one place.
pub fn message_and_indicator(status_type: UpdateStatusType) -> (&'static str, StatusIndicator) {
    match status_type {
        UpdateStatusType::Unspecified => ("Unknown", StatusIndicator::Unspecified),
        UpdateStatusType::Downloading => ("Downloading artifacts", StatusIndicator::Idle),
        UpdateStatusType::Downloaded => ("Download complete", StatusIndicator::Idle),
        UpdateStatusType::Started => ("Updating", StatusIndicator::InProgress),
        UpdateStatusType::Updated => ("Update completed", StatusIndicator::Idle),
        UpdateStatusType::Failed => ("Update failed", StatusIndicator::Error),
        UpdateStatusType::UpToDate => ("No new updates available", StatusIndicator::Idle),
    }
}

/// Whether a run has reached a terminal outcome ("completed" or "failed"),
/// used by §4.E.5 to decide when to stamp `end_time` on the latest run.
pub fn is_terminal(status_type: UpdateStatusType) -> bool {
    matches!(status_type, UpdateStatusType::Updated | UpdateStatusType::Failed)
}

/// Whether applying `new_type` to an instance/run currently at
/// `(current_type, current_indicator)` is a no-op (§4.E.3's idempotency
/// rule, §8 property 2): unneeded iff both the status type and its
/// indicator already match what the new status would produce. Re-delivery
/// of the same `status_type` is therefore always a no-op, and that's the
/// granularity every idempotent-transition test in §8 checks at.
pub fn transition_needed(
    current_type: UpdateStatusType,
    current_indicator: StatusIndicator,
    new_type: UpdateStatusType,
) -> bool {
    let (_, new_indicator) = message_and_indicator(new_type);
    !(current_type == new_type && current_indicator == new_indicator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_spec_section_4_e_3() {
        assert_eq!(
            message_and_indicator(UpdateStatusType::Unspecified),
            ("Unknown", StatusIndicator::Unspecified)
        );
        assert_eq!(
            message_and_indicator(UpdateStatusType::Downloading),
            ("Downloading artifacts", StatusIndicator::Idle)
        );
        assert_eq!(
            message_and_indicator(UpdateStatusType::Started),
            ("Updating", StatusIndicator::InProgress)
        );
        assert_eq!(
            message_and_indicator(UpdateStatusType::Failed),
            ("Update failed", StatusIndicator::Error)
        );
    }

    #[test]
    fn repeat_delivery_is_not_needed() {
        assert!(!transition_needed(
            UpdateStatusType::Downloaded,
            StatusIndicator::Idle,
            UpdateStatusType::Downloaded
        ));
    }

    #[test]
    fn distinct_status_type_is_needed() {
        assert!(transition_needed(
            UpdateStatusType::Downloading,
            StatusIndicator::Idle,
            UpdateStatusType::Downloaded
        ));
    }
}
