use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{NewReceipt, NewScan, Pagination},
    model::{ReceiptRecord, ScanRecord},
    services::{receipt_record, scan_record},
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResponse, ApiResult},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/history/scans", get(list_scans).post(add_scan))
        .route("/history/scans/:id", delete(delete_scan))
        .route("/history/receipts", get(list_receipts).post(add_receipt))
        .route("/history/receipts/:id", delete(delete_receipt))
}

#[instrument(skip(state))]
pub async fn list_scans(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<ApiResponse<Vec<ScanRecord>>>> {
    let rows = state
        .history
        .list_scans(&user.username, page.clamped())
        .await?;
    Ok(ApiResponse::ok(rows))
}

#[instrument(skip(state, body))]
pub async fn add_scan(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewScan>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ScanRecord>>)> {
    let record = scan_record(&user.username, body, OffsetDateTime::now_utc())?;
    state.history.insert_scan(&record).await?;
    info!(id = %record.id, barcode = %record.barcode, "scan recorded");
    Ok((StatusCode::CREATED, ApiResponse::ok(record)))
}

#[instrument(skip(state))]
pub async fn delete_scan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    if !state.history.delete_scan(id, &user.username).await? {
        return Err(ApiError::NotFound("Scan not found".into()));
    }
    Ok(ApiResponse::ok(serde_json::json!({ "id": id })))
}

#[instrument(skip(state))]
pub async fn list_receipts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<ApiResponse<Vec<ReceiptRecord>>>> {
    let rows = state
        .history
        .list_receipts(&user.username, page.clamped())
        .await?;
    Ok(ApiResponse::ok(rows))
}

#[instrument(skip(state, body))]
pub async fn add_receipt(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewReceipt>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ReceiptRecord>>)> {
    let record = receipt_record(&user.username, body, OffsetDateTime::now_utc())?;
    state.history.insert_receipt(&record).await?;
    info!(id = %record.id, items = record.barcodes.0.len(), "receipt recorded");
    Ok((StatusCode::CREATED, ApiResponse::ok(record)))
}

#[instrument(skip(state))]
pub async fn delete_receipt(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    if !state.history.delete_receipt(id, &user.username).await? {
        return Err(ApiError::NotFound("Receipt not found".into()));
    }
    Ok(ApiResponse::ok(serde_json::json!({ "id": id })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{register_user, send_json, test_app};

    #[tokio::test]
    async fn scans_are_listed_newest_first_and_paged() {
        let app = test_app();
        let token = register_user(&app, "ana").await;
        for code in ["111111111111", "222222222222", "333333333333"] {
            let (status, _) = send_json(
                &app,
                "POST",
                "/api/history/scans",
                Some(&token),
                json!({ "barcode": code, "verdict": { "allowed": "YES" } }),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) =
            send_json(&app, "GET", "/api/history/scans?limit=2", Some(&token), json!(null)).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["barcode"], "333333333333");

        let (_, body) = send_json(
            &app,
            "GET",
            "/api/history/scans?limit=2&offset=2",
            Some(&token),
            json!(null),
        )
        .await;
        assert_eq!(body["data"][0]["barcode"], "111111111111");
    }

    #[tokio::test]
    async fn foreign_or_missing_record_delete_is_404() {
        let app = test_app();
        let ana = register_user(&app, "ana").await;
        let bea = register_user(&app, "bea").await;
        let (_, body) = send_json(
            &app,
            "POST",
            "/api/history/receipts",
            Some(&ana),
            json!({ "barcodes": ["036000291452"], "health_match_score": 80 }),
        )
        .await;
        assert_eq!(body["data"]["total_price"], 0.0);
        let id = body["data"]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/history/receipts/{id}");

        let (status, _) = send_json(&app, "DELETE", &uri, Some(&bea), json!(null)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send_json(&app, "DELETE", &uri, Some(&ana), json!(null)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send_json(&app, "DELETE", &uri, Some(&ana), json!(null)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn history_requires_token() {
        let app = test_app();
        let (status, body) =
            send_json(&app, "GET", "/api/history/scans", None, json!(null)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }
}
