use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    dto::{NewReceipt, NewScan},
    model::{ReceiptRecord, ScanRecord},
};
use crate::error::{ApiError, ApiResult};

pub fn scan_record(username: &str, new: NewScan, now: OffsetDateTime) -> ApiResult<ScanRecord> {
    let barcode = new.barcode.trim();
    if barcode.is_empty() {
        return Err(ApiError::BadRequest("barcode is required".into()));
    }
    Ok(ScanRecord {
        id: Uuid::new_v4(),
        username: username.to_string(),
        barcode: barcode.to_string(),
        product_name: new
            .product_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        verdict: Json(new.verdict),
        created_at: now,
    })
}

pub fn receipt_record(
    username: &str,
    new: NewReceipt,
    now: OffsetDateTime,
) -> ApiResult<ReceiptRecord> {
    if !(0.0..=100.0).contains(&new.health_match_score) {
        return Err(ApiError::BadRequest(
            "health_match_score must be between 0 and 100".into(),
        ));
    }
    let barcodes: Vec<String> = new
        .barcodes
        .iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect();
    if barcodes.is_empty() {
        return Err(ApiError::BadRequest("barcodes must not be empty".into()));
    }
    Ok(ReceiptRecord {
        id: Uuid::new_v4(),
        username: username.to_string(),
        barcodes: Json(barcodes),
        total_price: 0.0,
        health_match_score: new.health_match_score,
        items: Json(new.items),
        created_at: now,
    })
}
