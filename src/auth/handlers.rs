use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, GoogleLoginRequest, LoginRequest, PublicUser, RefreshRequest,
            RegisterRequest, ResetPasswordRequest,
        },
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password, MIN_PASSWORD_LEN},
        repo_types::NewCredential,
        services::{
            is_valid_email, is_valid_username, issue_tokens, unique_username,
            username_base_from_email,
        },
    },
    error::{ApiError, ApiResponse, ApiResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/google", post(google_login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_username(&payload.username) {
        warn!(username = %payload.username, "invalid username");
        return Err(ApiError::BadRequest(
            "Username must be 3-32 letters, digits, '.', '_' or '-'".into(),
        ));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::BadRequest("Password too short".into()));
    }

    if state
        .credentials
        .find_by_username(&payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already registered");
        return Err(ApiError::Conflict("Username already registered".into()));
    }
    if state.credentials.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let cred = state
        .credentials
        .create(NewCredential {
            username: payload.username,
            email: payload.email,
            password_hash: Some(hash),
            google_sub: None,
        })
        .await?;

    let keys = JwtKeys::from_ref(&state);
    let response = issue_tokens(&keys, &cred)?;
    info!(user_id = %cred.id, username = %cred.username, "user registered");
    Ok(ApiResponse::ok(response))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    let identifier = payload.identifier.trim();
    let found = if identifier.contains('@') {
        state
            .credentials
            .find_by_email(&identifier.to_lowercase())
            .await?
    } else {
        state.credentials.find_by_username(identifier).await?
    };

    let Some(cred) = found else {
        warn!(identifier, "login unknown identifier");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    let ok = match cred.password_hash.as_deref() {
        Some(hash) => verify_password(&payload.password, hash)?,
        None => false,
    };
    if !ok {
        warn!(user_id = %cred.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let response = issue_tokens(&keys, &cred)?;
    info!(user_id = %cred.id, username = %cred.username, "user logged in");
    Ok(ApiResponse::ok(response))
}

#[instrument(skip(state, payload))]
pub async fn google_login(
    State(state): State<AppState>,
    Json(payload): Json<GoogleLoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    let identity = state.google.verify(&payload.id_token).await?;

    let cred = if let Some(c) = state.credentials.find_by_google_sub(&identity.sub).await? {
        c
    } else if let Some(c) = state.credentials.find_by_email(&identity.email).await? {
        state.credentials.link_google(c.id, &identity.sub).await?;
        info!(user_id = %c.id, "google account linked");
        c
    } else {
        let base = username_base_from_email(&identity.email);
        let username = unique_username(state.credentials.as_ref(), &base).await?;
        let c = state
            .credentials
            .create(NewCredential {
                username,
                email: identity.email.clone(),
                password_hash: None,
                google_sub: Some(identity.sub.clone()),
            })
            .await?;
        info!(user_id = %c.id, username = %c.username, "user registered via google");
        c
    };

    let keys = JwtKeys::from_ref(&state);
    Ok(ApiResponse::ok(issue_tokens(&keys, &cred)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let cred = state
        .credentials
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    Ok(ApiResponse::ok(issue_tokens(&keys, &cred)?))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<Json<ApiResponse<PublicUser>>> {
    let cred = state
        .credentials
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest("Password too short".into()));
    }

    // Google-only accounts have no password to confirm.
    if let Some(hash) = cred.password_hash.as_deref() {
        let current = payload
            .current_password
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("current_password is required".into()))?;
        if !verify_password(current, hash)? {
            warn!(user_id = %cred.id, "password reset with wrong current password");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
    }

    let new_hash = hash_password(&payload.new_password)?;
    state.credentials.set_password(cred.id, &new_hash).await?;
    info!(user_id = %cred.id, "password reset");
    Ok(ApiResponse::ok(PublicUser::from(&cred)))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<PublicUser>>> {
    let cred = state
        .credentials
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    Ok(ApiResponse::ok(PublicUser::from(&cred)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{register_user, send_json, test_app};

    #[tokio::test]
    async fn register_returns_tokens() {
        let app = test_app();
        let (status, body) = send_json(
            &app,
            "POST",
            "/api/auth/register",
            None,
            json!({"username": "alice", "email": "Alice@Example.com", "password": "password123"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["user"]["email"], "alice@example.com");
        assert!(body["data"]["access_token"].as_str().unwrap().len() > 20);
    }

    #[tokio::test]
    async fn duplicate_username_or_email_is_rejected() {
        let app = test_app();
        register_user(&app, "alice").await;

        let (status, body) = send_json(
            &app,
            "POST",
            "/api/auth/register",
            None,
            json!({"username": "alice", "email": "other@example.com", "password": "password123"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);

        let (status, body) = send_json(
            &app,
            "POST",
            "/api/auth/register",
            None,
            json!({"username": "alice2", "email": "alice@example.com", "password": "password123"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn login_by_username_or_email() {
        let app = test_app();
        register_user(&app, "bob").await;

        for identifier in ["bob", "BOB@example.com"] {
            let (status, body) = send_json(
                &app,
                "POST",
                "/api/auth/login",
                None,
                json!({"identifier": identifier, "password": "password123"}),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "identifier {identifier}");
            assert_eq!(body["data"]["user"]["username"], "bob");
        }
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let app = test_app();
        register_user(&app, "bob").await;
        let (status, body) = send_json(
            &app,
            "POST",
            "/api/auth/login",
            None,
            json!({"identifier": "bob", "password": "nope-nope"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn google_login_creates_then_reuses_account() {
        let app = test_app();
        let (status, first) = send_json(
            &app,
            "POST",
            "/api/auth/google",
            None,
            json!({"id_token": "valid:sub-1:carol@gmail.com"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["data"]["user"]["username"], "carol");

        let (_, second) = send_json(
            &app,
            "POST",
            "/api/auth/google",
            None,
            json!({"id_token": "valid:sub-1:carol@gmail.com"}),
        )
        .await;
        assert_eq!(second["data"]["user"]["id"], first["data"]["user"]["id"]);
    }

    #[tokio::test]
    async fn google_login_rejects_bad_token() {
        let app = test_app();
        let (status, _) = send_json(
            &app,
            "POST",
            "/api/auth/google",
            None,
            json!({"id_token": "garbage"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn reset_password_then_login_with_new_one() {
        let app = test_app();
        let token = register_user(&app, "dave").await;
        let (status, _) = send_json(
            &app,
            "POST",
            "/api/auth/reset-password",
            Some(&token),
            json!({"current_password": "password123", "new_password": "new-password-456"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send_json(
            &app,
            "POST",
            "/api/auth/login",
            None,
            json!({"identifier": "dave", "password": "new-password-456"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn reset_password_rejects_wrong_current_password() {
        let app = test_app();
        let token = register_user(&app, "dave").await;
        let (status, body) = send_json(
            &app,
            "POST",
            "/api/auth/reset-password",
            Some(&token),
            json!({"current_password": "not-my-password", "new_password": "new-password-456"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = send_json(
            &app,
            "POST",
            "/api/auth/login",
            None,
            json!({"identifier": "dave", "password": "password123"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn reset_password_requires_current_password_for_password_accounts() {
        let app = test_app();
        let token = register_user(&app, "dave").await;
        let (status, body) = send_json(
            &app,
            "POST",
            "/api/auth/reset-password",
            Some(&token),
            json!({"new_password": "new-password-456"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "current_password is required");
    }

    #[tokio::test]
    async fn google_account_sets_first_password_without_current() {
        let app = test_app();
        let (_, body) = send_json(
            &app,
            "POST",
            "/api/auth/google",
            None,
            json!({"id_token": "valid:sub-9:gina@gmail.com"}),
        )
        .await;
        let token = body["data"]["access_token"].as_str().unwrap().to_string();

        let (status, _) = send_json(
            &app,
            "POST",
            "/api/auth/reset-password",
            Some(&token),
            json!({"new_password": "first-password-1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send_json(
            &app,
            "POST",
            "/api/auth/login",
            None,
            json!({"identifier": "gina", "password": "first-password-1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["username"], "gina");
    }

    #[tokio::test]
    async fn refresh_issues_new_pair() {
        let app = test_app();
        let (_, body) = send_json(
            &app,
            "POST",
            "/api/auth/register",
            None,
            json!({"username": "erin", "email": "erin@example.com", "password": "password123"}),
        )
        .await;
        let refresh_token = body["data"]["refresh_token"].as_str().unwrap().to_string();

        let (status, body) = send_json(
            &app,
            "POST",
            "/api/auth/refresh",
            None,
            json!({"refresh_token": refresh_token}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["username"], "erin");
    }

    #[tokio::test]
    async fn me_requires_token() {
        let app = test_app();
        let (status, _) = send_json(&app, "GET", "/api/auth/me", None, json!(null)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = register_user(&app, "frank").await;
        let (status, body) = send_json(&app, "GET", "/api/auth/me", Some(&token), json!(null)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "frank");
    }
}
