//! Shared helpers for handler tests: an in-memory app and request shortcuts.

use std::io::Cursor;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use serde_json::{json, Value};
use sqlx::types::Json;
use tower::ServiceExt;

use crate::{
    ai::{LlmClient, LlmError},
    app::build_app,
    auth::google::{GoogleAuthError, GoogleIdentity, GoogleVerifier},
    ocr::{engine::FixedTextOcr, OcrEngine, OcrError, DIGIT_WHITELIST},
    products::model::{Nutrients, Product},
    state::AppState,
};

pub const SEEDED_BARCODE: &str = "4006381333931";

/// Product names containing this make the scripted model fail.
pub const UNAVAILABLE_PRODUCT: &str = "__unavailable__";

const RECEIPT_TEXT: &str = "4006381333931\n036000291452\n4006381333931";
const REPORT_TEXT: &str = "Total Cholesterol 250 mg/dL\nGlucose 98 mg/dL\nSodium 140 mmol/L";

pub fn seeded_products() -> Vec<Product> {
    vec![Product {
        barcode: SEEDED_BARCODE.into(),
        name: "Whole milk".into(),
        brand: Some("Alpine Farm".into()),
        nutrients: Json(Nutrients {
            energy_kcal: Some(64.0),
            fat_g: Some(3.5),
            saturated_fat_g: Some(2.3),
            sugars_g: Some(4.8),
            protein_g: Some(3.3),
            ..Default::default()
        }),
    }]
}

/// Receipt digits for the digit whitelist, a lab report otherwise.
pub struct ScriptedOcr;

impl OcrEngine for ScriptedOcr {
    fn recognize(&self, image_bytes: &[u8], whitelist: Option<&str>) -> Result<String, OcrError> {
        let text = if whitelist == Some(DIGIT_WHITELIST) {
            RECEIPT_TEXT
        } else {
            REPORT_TEXT
        };
        FixedTextOcr::new(text).recognize(image_bytes, whitelist)
    }
}

/// Accepts tokens shaped `valid:<sub>:<email>`.
pub struct MockGoogle;

#[async_trait]
impl GoogleVerifier for MockGoogle {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, GoogleAuthError> {
        match id_token.splitn(3, ':').collect::<Vec<_>>().as_slice() {
            ["valid", sub, email] => Ok(GoogleIdentity {
                sub: sub.to_string(),
                email: email.to_string(),
            }),
            _ => Err(GoogleAuthError::InvalidToken),
        }
    }
}

/// Fenced JSON answers, like the real model tends to send.
pub struct ScriptedLlm;

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if prompt.contains(UNAVAILABLE_PRODUCT) {
            return Err(LlmError::Timeout(1));
        }
        if prompt.contains("Shopping cart:") {
            return Ok(r#"```json
{"score": 140, "items": [
  {"name": "Whole milk", "allowed": "YES", "reason": "Good protein source"},
  {"name": "Rye bread", "allowed": "CAUTION", "reason": "Watch the salt"}
]}
```"#
                .into());
        }
        Ok(r#"```json
{"allowed": "CAUTION", "recommendation": "Small portions", "reason": "Contains lactose", "alternatives": ["Oat drink"]}
```"#
            .into())
    }
}

pub fn test_app() -> Router {
    build_app(AppState::fake())
}

/// Serves `test_app()` on a loopback port; returns the `/api` base URL.
pub async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, test_app()).await.unwrap();
    });
    format!("http://{addr}/api")
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

/// `Value::Null` sends no body.
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = if body.is_null() {
        req.body(Body::empty()).unwrap()
    } else {
        req.header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };
    call(app, req).await
}

/// Parts are `(field, filename, content type, bytes)`; no filename makes a text field.
pub async fn send_multipart(
    app: &Router,
    uri: &str,
    token: &str,
    parts: &[(&str, Option<&str>, &str, &[u8])],
) -> (StatusCode, Value) {
    const BOUNDARY: &str = "nutriguard-test-boundary";
    let mut body = Vec::new();
    for (field, filename, content_type, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
                     Content-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    call(app, req).await
}

/// Registers `username` with password `password123`; returns the access token.
pub async fn register_user(app: &Router, username: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/auth/register",
        None,
        json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "password123",
        }),
    )
    .await;
    assert!(status.is_success(), "register failed: {status} {body}");
    body["data"]["access_token"].as_str().unwrap().to_string()
}

/// Small gray gradient encoded as PNG.
pub fn png_fixture() -> Vec<u8> {
    let img = GrayImage::from_fn(16, 16, |x, y| Luma([((x + y) * 8) as u8]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
