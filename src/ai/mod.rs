//! Product and cart suitability via a generative model.

use crate::state::AppState;
use axum::Router;

pub mod client;
pub mod dto;
pub mod handlers;
pub mod parse;
pub mod prompt;
pub mod services;

pub use client::{GeminiClient, LlmClient, LlmError};

pub fn router() -> Router<AppState> {
    handlers::routes()
}
