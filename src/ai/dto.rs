use serde::{Deserialize, Serialize};

use crate::profile::model::ProfileSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Suitability {
    #[serde(alias = "yes", alias = "Yes")]
    Yes,
    #[serde(alias = "no", alias = "No")]
    No,
    #[serde(alias = "caution", alias = "Caution")]
    Caution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleVerdict {
    pub allowed: Suitability,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl SingleVerdict {
    pub fn fallback() -> Self {
        Self {
            allowed: Suitability::Caution,
            recommendation: "Check the label and consult a professional before consuming.".into(),
            reason: "No assessment was available for this product.".into(),
            alternatives: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemVerdict {
    pub name: String,
    pub allowed: Suitability,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartVerdict {
    pub score: u8,
    #[serde(default)]
    pub items: Vec<CartItemVerdict>,
}

impl CartVerdict {
    pub fn fallback() -> Self {
        Self {
            score: 0,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultStatus {
    Answered,
    Unavailable,
}

/// Either a model answer or the conservative fallback, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultOutcome<T> {
    pub status: ConsultStatus,
    pub result: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl<T> ConsultOutcome<T> {
    pub fn answered(result: T) -> Self {
        Self {
            status: ConsultStatus::Answered,
            result,
            detail: None,
        }
    }

    pub fn unavailable(result: T, detail: String) -> Self {
        Self {
            status: ConsultStatus::Unavailable,
            result,
            detail: Some(detail),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultRequest {
    #[serde(default)]
    pub profile: Option<ProfileSummary>,
    #[serde(default)]
    pub username: Option<String>,
    pub product: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultCartRequest {
    #[serde(default)]
    pub profile: Option<ProfileSummary>,
    #[serde(default)]
    pub username: Option<String>,
    pub products: Vec<String>,
}
