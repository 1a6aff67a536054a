use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// One scanned product and the verdict shown for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ScanRecord {
    pub id: Uuid,
    pub username: String,
    pub barcode: String,
    pub product_name: Option<String>,
    pub verdict: Json<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// One scanned receipt. `total_price` stays 0: prices are not extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ReceiptRecord {
    pub id: Uuid,
    pub username: String,
    pub barcodes: Json<Vec<String>>,
    pub total_price: f64,
    pub health_match_score: f64,
    pub items: Json<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
