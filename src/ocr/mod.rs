//! Text recognition for receipts and blood-test uploads.

use crate::{error::ApiError, state::AppState};
use axum::Router;

pub mod engine;
pub mod handlers;
pub mod pdf;
pub mod preprocess;
pub mod receipt;

pub use engine::OcrEngine;
pub use pdf::PdfRasterizer;

/// Digits only, for barcodes printed on receipts.
pub const DIGIT_WHITELIST: &str = "0123456789";

/// Letters, digits and the punctuation found in lab reports.
pub const LAB_REPORT_WHITELIST: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789.,:;/%()<>=-+ ";

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("OCR failed: {0}")]
    Processing(String),
    #[error("PDF page {page} could not be rendered: {reason}")]
    PdfRendering { page: usize, reason: String },
}

impl From<OcrError> for ApiError {
    fn from(e: OcrError) -> Self {
        match e {
            OcrError::Unavailable(_) => ApiError::Unavailable(e.to_string()),
            OcrError::Decode(_) => ApiError::UnsupportedMedia(e.to_string()),
            OcrError::Processing(_) | OcrError::PdfRendering { .. } => {
                ApiError::Unprocessable(e.to_string())
            }
        }
    }
}

pub fn router() -> Router<AppState> {
    handlers::routes()
}
