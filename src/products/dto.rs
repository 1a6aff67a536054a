use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchDetailsRequest {
    pub barcodes: Vec<String>,
}
