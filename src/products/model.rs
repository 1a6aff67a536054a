use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};

/// Nutrient facts per 100 g; any of them may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_kcal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturated_fat_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugars_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium_mg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub barcode: String,
    pub name: String,
    pub brand: Option<String>,
    pub nutrients: Json<Nutrients>,
}

/// One entry of a batch lookup: the product, or a not-found marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductLookup {
    Found(Product),
    #[serde(rename_all = "camelCase")]
    NotFound { barcode: String, not_found: bool },
}

impl ProductLookup {
    pub fn not_found(barcode: &str) -> Self {
        ProductLookup::NotFound {
            barcode: barcode.to_string(),
            not_found: true,
        }
    }
}
