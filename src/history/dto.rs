use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Limit forced into 1..=100, offset into 0.. .
    pub fn clamped(self) -> Self {
        Self {
            limit: self.limit.clamp(1, MAX_LIMIT),
            offset: self.offset.max(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewScan {
    pub barcode: String,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub verdict: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReceipt {
    pub barcodes: Vec<String>,
    pub health_match_score: f64,
    #[serde(default)]
    pub items: serde_json::Value,
}
