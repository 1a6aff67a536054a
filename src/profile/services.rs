use time::OffsetDateTime;
use tracing::{debug, info};

use super::{dto::ProfilePatch, model::{BloodTestMeta, UserProfile}, repo::ProfileRepo};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Created,
    Updated,
}

/// Creates the profile when absent (required fields enforced), otherwise
/// merges the present keys into the stored document.
pub async fn upsert(
    repo: &dyn ProfileRepo,
    username: &str,
    patch: ProfilePatch,
    now: OffsetDateTime,
) -> ApiResult<(UserProfile, Upserted)> {
    let (mut profile, outcome) = match repo.get(username).await? {
        Some(existing) => (existing, Upserted::Updated),
        None => {
            let missing = patch.missing_required();
            if !missing.is_empty() {
                return Err(ApiError::BadRequest(format!(
                    "Missing required fields: {}",
                    missing.join(", ")
                )));
            }
            (UserProfile::new(username, now), Upserted::Created)
        }
    };

    patch.apply_to(&mut profile);
    profile.updated_at = now;
    repo.save(&profile).await?;
    info!(username, outcome = ?outcome, "profile saved");
    Ok((profile, outcome))
}

/// Merges into an existing profile; 404 when there is none.
pub async fn patch_existing(
    repo: &dyn ProfileRepo,
    username: &str,
    patch: ProfilePatch,
    now: OffsetDateTime,
) -> ApiResult<UserProfile> {
    let mut profile = repo
        .get(username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;
    patch.apply_to(&mut profile);
    profile.updated_at = now;
    repo.save(&profile).await?;
    debug!(username, "profile patched");
    Ok(profile)
}

/// Stores blood-test metadata on the profile. Returns false when the
/// profile does not exist.
pub async fn record_blood_test(
    repo: &dyn ProfileRepo,
    username: &str,
    meta: BloodTestMeta,
    now: OffsetDateTime,
) -> anyhow::Result<bool> {
    let Some(mut profile) = repo.get(username).await? else {
        return Ok(false);
    };
    profile.blood_test = Some(meta);
    profile.updated_at = now;
    repo.save(&profile).await?;
    Ok(true)
}
