use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::{
    dto::{ProfilePatch, ProfileView},
    model::UserProfile,
    services::{patch_existing, upsert, Upserted},
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResponse, ApiResult},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/userdata", post(save_profile))
        .route(
            "/userdata/:username",
            get(get_profile).patch(patch_profile).delete(delete_profile),
        )
}

fn view(profile: UserProfile) -> ProfileView {
    let metrics = profile.derived(OffsetDateTime::now_utc().date());
    ProfileView { profile, metrics }
}

/// POST /userdata — create on first save, field-level update afterwards.
#[instrument(skip(state, patch))]
pub async fn save_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(patch): Json<ProfilePatch>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ProfileView>>)> {
    let username = patch
        .username
        .clone()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("username is required".into()))?;
    user.ensure_owner(&username)?;

    let (profile, outcome) = upsert(
        state.profiles.as_ref(),
        &username,
        patch,
        OffsetDateTime::now_utc(),
    )
    .await?;

    let status = match outcome {
        Upserted::Created => StatusCode::CREATED,
        Upserted::Updated => StatusCode::OK,
    };
    Ok((status, ApiResponse::ok(view(profile))))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> ApiResult<Json<ApiResponse<ProfileView>>> {
    user.ensure_owner(&username)?;
    let profile = state
        .profiles
        .get(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;
    Ok(ApiResponse::ok(view(profile)))
}

#[instrument(skip(state, patch))]
pub async fn patch_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> ApiResult<Json<ApiResponse<ProfileView>>> {
    user.ensure_owner(&username)?;
    if patch.username.as_deref().is_some_and(|u| u != username) {
        return Err(ApiError::BadRequest("username cannot be changed".into()));
    }
    let profile = patch_existing(
        state.profiles.as_ref(),
        &username,
        patch,
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(ApiResponse::ok(view(profile)))
}

#[instrument(skip(state))]
pub async fn delete_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    user.ensure_owner(&username)?;
    let existing = state
        .profiles
        .get(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    if !state.profiles.delete(&username).await? {
        return Err(ApiError::NotFound("Profile not found".into()));
    }

    if let Some(meta) = &existing.blood_test {
        for key in meta.stored_keys() {
            if let Err(e) = state.storage.delete_object(key).await {
                warn!(error = %e, key = %key, "failed to delete stored blood test file");
            }
        }
    }

    info!(username = %username, "profile deleted");
    Ok(ApiResponse::ok(serde_json::json!({ "username": username })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{register_user, send_json, test_app};

    fn creation_body(username: &str) -> serde_json::Value {
        json!({
            "username": username,
            "personal": { "first_name": "Ana", "birth_date": "1990-05-20", "sex": "female" },
            "body": { "height_cm": 170, "weight_kg": 70, "waist_cm": 85 }
        })
    }

    #[tokio::test]
    async fn create_then_update_then_read() {
        let app = test_app();
        let token = register_user(&app, "ana").await;

        let (status, body) =
            send_json(&app, "POST", "/api/userdata", Some(&token), creation_body("ana")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["metrics"]["bmi"], 24.2);
        assert_eq!(body["data"]["metrics"]["whtr"], 0.5);

        let (status, _) = send_json(
            &app,
            "POST",
            "/api/userdata",
            Some(&token),
            json!({ "username": "ana", "allergies": ["gluten"] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send_json(&app, "GET", "/api/userdata/ana", Some(&token), json!(null)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["allergies"][0], "gluten");
        assert_eq!(body["data"]["personal"]["first_name"], "Ana");
        assert_eq!(body["data"]["body"]["height_cm"], 170.0);
    }

    #[tokio::test]
    async fn first_save_without_required_fields_is_400() {
        let app = test_app();
        let token = register_user(&app, "ana").await;
        let (status, body) = send_json(
            &app,
            "POST",
            "/api/userdata",
            Some(&token),
            json!({ "username": "ana", "allergies": ["gluten"] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn cannot_touch_another_users_profile() {
        let app = test_app();
        let token = register_user(&app, "ana").await;
        let (status, _) =
            send_json(&app, "POST", "/api/userdata", Some(&token), creation_body("bea")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) =
            send_json(&app, "GET", "/api/userdata/bea", Some(&token), json!(null)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn patch_missing_profile_is_404() {
        let app = test_app();
        let token = register_user(&app, "ana").await;
        let (status, _) = send_json(
            &app,
            "PATCH",
            "/api/userdata/ana",
            Some(&token),
            json!({ "allergies": [] }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_removes_profile_and_repeat_is_404() {
        let app = test_app();
        let token = register_user(&app, "ana").await;
        send_json(&app, "POST", "/api/userdata", Some(&token), creation_body("ana")).await;

        let (status, body) =
            send_json(&app, "DELETE", "/api/userdata/ana", Some(&token), json!(null)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "ana");

        let (status, _) =
            send_json(&app, "GET", "/api/userdata/ana", Some(&token), json!(null)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            send_json(&app, "DELETE", "/api/userdata/ana", Some(&token), json!(null)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
