use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    preprocess::prepare_receipt,
    receipt::{extract_barcodes, ReceiptScan},
    DIGIT_WHITELIST,
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResponse, ApiResult},
    state::AppState,
    upload::MultipartForm,
};

pub const RECEIPT_FIELD: &str = "receiptImage";

pub fn routes() -> Router<AppState> {
    Router::new().route("/ocr/scan", post(scan_receipt))
}

/// POST /ocr/scan (multipart `receiptImage`)
#[instrument(skip(state, mp))]
pub async fn scan_receipt(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Multipart,
) -> ApiResult<Json<ApiResponse<ReceiptScan>>> {
    let mut form = MultipartForm::read(mp).await?;
    let file = form
        .take_files(RECEIPT_FIELD)
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::BadRequest(format!("{RECEIPT_FIELD} is required")))?;

    let ocr = state.ocr.clone();
    let text = tokio::task::spawn_blocking(move || {
        let png = prepare_receipt(&file.body)?;
        ocr.recognize(&png, Some(DIGIT_WHITELIST))
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))??;

    let barcodes = extract_barcodes(&text);
    info!(username = %user.username, count = barcodes.len(), "receipt scanned");
    Ok(ApiResponse::ok(ReceiptScan {
        barcodes,
        raw_text_length: text.len(),
    }))
}
