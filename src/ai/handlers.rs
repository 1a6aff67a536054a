use axum::{extract::State, routing::post, Json, Router};
use time::OffsetDateTime;
use tracing::instrument;

use super::{
    dto::{CartVerdict, ConsultCartRequest, ConsultOutcome, ConsultRequest, SingleVerdict},
    services::{consult, consult_cart},
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResponse, ApiResult},
    products::services::MAX_BATCH,
    profile::model::ProfileSummary,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ai/consult", post(consult_product))
        .route("/ai/consult-cart", post(consult_products))
}

/// Inline profile wins; otherwise the stored profile of `username`
/// (defaulting to the caller).
async fn resolve_profile(
    state: &AppState,
    user: &AuthUser,
    profile: Option<ProfileSummary>,
    username: Option<String>,
) -> ApiResult<ProfileSummary> {
    if let Some(profile) = profile {
        return Ok(profile);
    }
    let username = username.unwrap_or_else(|| user.username.clone());
    user.ensure_owner(&username)?;
    let stored = state
        .profiles
        .get(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;
    Ok(stored.summary(OffsetDateTime::now_utc().date()))
}

/// POST /ai/consult
#[instrument(skip(state, req), fields(user = %user.username))]
pub async fn consult_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ConsultRequest>,
) -> ApiResult<Json<ApiResponse<ConsultOutcome<SingleVerdict>>>> {
    let product = req.product.trim();
    if product.is_empty() {
        return Err(ApiError::BadRequest("product is required".into()));
    }
    let profile = resolve_profile(&state, &user, req.profile, req.username).await?;
    Ok(ApiResponse::ok(
        consult(state.ai.as_ref(), &profile, product).await,
    ))
}

/// POST /ai/consult-cart
#[instrument(skip(state, req), fields(user = %user.username))]
pub async fn consult_products(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ConsultCartRequest>,
) -> ApiResult<Json<ApiResponse<ConsultOutcome<CartVerdict>>>> {
    let products: Vec<String> = req
        .products
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if products.is_empty() {
        return Err(ApiError::BadRequest("products must not be empty".into()));
    }
    if products.len() > MAX_BATCH {
        return Err(ApiError::BadRequest(format!(
            "at most {MAX_BATCH} products per request"
        )));
    }
    let profile = resolve_profile(&state, &user, req.profile, req.username).await?;
    Ok(ApiResponse::ok(
        consult_cart(state.ai.as_ref(), &profile, &products).await,
    ))
}
