use tracing::{info, warn};

use super::{
    client::LlmClient,
    dto::{CartVerdict, ConsultOutcome, SingleVerdict},
    parse::{parse_cart, parse_single},
    prompt,
};
use crate::profile::model::ProfileSummary;

/// Asks about one product. Any upstream failure yields the marked fallback.
pub async fn consult(
    llm: &dyn LlmClient,
    profile: &ProfileSummary,
    product: &str,
) -> ConsultOutcome<SingleVerdict> {
    let answer = llm
        .generate(&prompt::single_product(profile, product))
        .await
        .and_then(|text| parse_single(&text));
    match answer {
        Ok(verdict) => {
            info!(allowed = ?verdict.allowed, "product consult answered");
            ConsultOutcome::answered(verdict)
        }
        Err(e) => {
            warn!(error = %e, "product consult unavailable, returning fallback");
            ConsultOutcome::unavailable(SingleVerdict::fallback(), e.to_string())
        }
    }
}

pub async fn consult_cart(
    llm: &dyn LlmClient,
    profile: &ProfileSummary,
    products: &[String],
) -> ConsultOutcome<CartVerdict> {
    let answer = llm
        .generate(&prompt::shopping_cart(profile, products))
        .await
        .and_then(|text| parse_cart(&text));
    match answer {
        Ok(verdict) => {
            info!(score = verdict.score, items = verdict.items.len(), "cart consult answered");
            ConsultOutcome::answered(verdict)
        }
        Err(e) => {
            warn!(error = %e, "cart consult unavailable, returning fallback");
            ConsultOutcome::unavailable(CartVerdict::fallback(), e.to_string())
        }
    }
}
