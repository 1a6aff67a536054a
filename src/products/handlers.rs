use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::BatchDetailsRequest,
    model::{Product, ProductLookup},
    services::{batch_lookup, MAX_BATCH},
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResponse, ApiResult},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products/batch-details", post(batch_details))
        .route("/products/:barcode", get(get_product))
}

#[instrument(skip(state, _user))]
pub async fn get_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(barcode): Path<String>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    let product = state
        .products
        .find_by_barcode(barcode.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    Ok(ApiResponse::ok(product))
}

#[instrument(skip(state, _user, body), fields(count = body.barcodes.len()))]
pub async fn batch_details(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(body): Json<BatchDetailsRequest>,
) -> ApiResult<Json<ApiResponse<Vec<ProductLookup>>>> {
    if body.barcodes.is_empty() {
        return Err(ApiError::BadRequest("barcodes must be non-empty".into()));
    }
    if body.barcodes.len() > MAX_BATCH {
        return Err(ApiError::BadRequest(format!(
            "at most {MAX_BATCH} barcodes per request"
        )));
    }
    let items = batch_lookup(state.products.as_ref(), &body.barcodes).await?;
    Ok(ApiResponse::ok(items))
}
