use serde::Deserialize;

use super::{
    client::LlmError,
    dto::{CartItemVerdict, CartVerdict, SingleVerdict},
};

/// Drops a surrounding ```json fence and any prose around the JSON object.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        text = rest.trim_end().trim_end_matches("```").trim();
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

pub fn parse_single(raw: &str) -> Result<SingleVerdict, LlmError> {
    serde_json::from_str(strip_fences(raw)).map_err(|e| LlmError::Malformed(e.to_string()))
}

#[derive(Deserialize)]
struct RawCart {
    score: f64,
    #[serde(default)]
    items: Vec<CartItemVerdict>,
}

pub fn parse_cart(raw: &str) -> Result<CartVerdict, LlmError> {
    let cart: RawCart =
        serde_json::from_str(strip_fences(raw)).map_err(|e| LlmError::Malformed(e.to_string()))?;
    if !cart.score.is_finite() {
        return Err(LlmError::Malformed("score is not a number".into()));
    }
    Ok(CartVerdict {
        score: cart.score.clamp(0.0, 100.0).round() as u8,
        items: cart.items,
    })
}
