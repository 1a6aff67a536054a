//! Blood-test screening: OCR the uploaded report, apply threshold rules.

use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod rules;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
