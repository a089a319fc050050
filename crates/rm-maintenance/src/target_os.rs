use rm_domain::{ImageVersion, OperatingSystem, OsId, OsType};

use crate::error::MaintenanceError;
use crate::request::UpdateStatusPayload;

/// Checks the four MUST-hold conditions of §4.E.4 before an `UPDATED`
/// transition is allowed to repoint an instance's `current_os` edge.
/// Returns the image id to resolve against on success.
pub fn validate_target_os_transition<'a>(
    payload: &'a UpdateStatusPayload,
    current_os: &OperatingSystem,
) -> Result<(&'a str, &'a str), MaintenanceError> {
    let profile_name = payload
        .profile_name
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MaintenanceError::internal("UPDATED payload missing profile_name"))?;
    let os_image_id = payload
        .os_image_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MaintenanceError::internal("UPDATED payload missing os_image_id"))?;

    if profile_name != current_os.profile_name {
        return Err(MaintenanceError::internal(format!(
            "UPDATED payload profile_name '{profile_name}' does not match current OS profile '{}'",
            current_os.profile_name
        )));
    }
    if os_image_id == current_os.image_id {
        return Err(MaintenanceError::internal(format!(
            "UPDATED payload os_image_id '{os_image_id}' is identical to current OS image id"
        )));
    }

    Ok((profile_name, os_image_id))
}

/// Confirms the resolved OS resource id actually differs from the
/// instance's current one — the fourth MUST-hold condition of §4.E.4,
/// checked once the candidate resource has been fetched.
pub fn validate_resolved_os_differs(
    resolved: &OperatingSystem,
    current_os_id: &OsId,
) -> Result<(), MaintenanceError> {
    if &resolved.os_id == current_os_id {
        return Err(MaintenanceError::internal(
            "resolved target OS resource id is identical to the instance's current OS",
        ));
    }
    Ok(())
}

/// Picks the latest immutable OS image for `profile_name`, ordering by
/// [`ImageVersion`] (§4.E.4). Unparseable or missing `image_id`s are
/// skipped with a warning rather than failing the whole resolution; an
/// empty result after filtering is `NotFound`.
pub fn latest_immutable_by_profile(
    candidates: &[OperatingSystem],
) -> Result<&OperatingSystem, MaintenanceError> {
    let mut best: Option<(&OperatingSystem, ImageVersion)> = None;
    for os in candidates {
        if os.os_type != OsType::Immutable {
            continue;
        }
        match os.image_id.parse::<ImageVersion>() {
            Ok(version) => {
                let replace = match &best {
                    Some((_, current)) => version > *current,
                    None => true,
                };
                if replace {
                    best = Some((os, version));
                }
            }
            Err(_) => {
                tracing::warn!(
                    profile_name = %os.profile_name,
                    image_id = %os.image_id,
                    "skipping unparseable OS image version"
                );
            }
        }
    }
    best.map(|(os, _)| os)
        .ok_or_else(|| MaintenanceError::NotFound("no parseable immutable OS image found for profile".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rm_domain::TenantId;

    fn os(profile: &str, image_id: &str, os_type: OsType) -> OperatingSystem {
        OperatingSystem {
            os_id: OsId::new(format!("os-{image_id}")),
            tenant_id: TenantId::new("t1"),
            profile_name: profile.to_string(),
            image_id: image_id.to_string(),
            profile_version: None,
            sha256: "deadbeef".to_string(),
            image_url: "https://example/os.img".to_string(),
            os_type,
            security_feature: None,
            existing_cves: None,
        }
    }

    #[test]
    fn scenario_s3_same_image_id_is_rejected() {
        let current = os("P", "3.0.20250717.0000", OsType::Immutable);
        let payload = UpdateStatusPayload {
            profile_name: Some("P".to_string()),
            os_image_id: Some("3.0.20250717.0000".to_string()),
            ..Default::default()
        };
        assert!(validate_target_os_transition(&payload, &current).is_err());
    }

    #[test]
    fn mismatched_profile_name_is_rejected() {
        let current = os("P", "1.0.0", OsType::Immutable);
        let payload = UpdateStatusPayload {
            profile_name: Some("other-profile".to_string()),
            os_image_id: Some("2.0.0".to_string()),
            ..Default::default()
        };
        assert!(validate_target_os_transition(&payload, &current).is_err());
    }

    #[test]
    fn valid_transition_passes() {
        let current = os("P", "1.0.0", OsType::Immutable);
        let payload = UpdateStatusPayload {
            profile_name: Some("P".to_string()),
            os_image_id: Some("2.0.0".to_string()),
            ..Default::default()
        };
        let (profile, image_id) = validate_target_os_transition(&payload, &current).unwrap();
        assert_eq!(profile, "P");
        assert_eq!(image_id, "2.0.0");
    }

    #[test]
    fn scenario_s7_latest_picks_final_release() {
        let candidates = vec![
            os("P", "3.0.20240719.1000", OsType::Immutable),
            os("P", "3.0.20250711.0415", OsType::Immutable),
            os("P", "3.0.20250717.0732", OsType::Immutable),
            os("P", "3.0.20250719.1000", OsType::Immutable),
        ];
        let picked = latest_immutable_by_profile(&candidates).unwrap();
        assert_eq!(picked.image_id, "3.0.20250719.1000");
    }

    #[test]
    fn unparseable_versions_are_skipped() {
        let candidates = vec![os("P", "not-a-version", OsType::Immutable), os("P", "1.2.3", OsType::Immutable)];
        let picked = latest_immutable_by_profile(&candidates).unwrap();
        assert_eq!(picked.image_id, "1.2.3");
    }

    #[test]
    fn empty_candidates_is_not_found() {
        let err = latest_immutable_by_profile(&[]).unwrap_err();
        assert!(matches!(err, MaintenanceError::NotFound(_)));
    }

    #[test]
    fn mutable_candidates_are_excluded() {
        let candidates = vec![os("P", "5.0.0", OsType::Mutable)];
        let err = latest_immutable_by_profile(&candidates).unwrap_err();
        assert!(matches!(err, MaintenanceError::NotFound(_)));
    }
}
