use std::time::Duration;

use reqwest::{
    multipart::{Form, Part},
    Method, RequestBuilder,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    ai::dto::{CartVerdict, ConsultCartRequest, ConsultOutcome, ConsultRequest, SingleVerdict},
    auth::dto::{
        AuthResponse, GoogleLoginRequest, LoginRequest, PublicUser, RefreshRequest,
        RegisterRequest, ResetPasswordRequest,
    },
    bloodtest::handlers::{AnalyzeResponse, FILE_FIELD, USERNAME_FIELD},
    history::{
        dto::{NewReceipt, NewScan, Pagination},
        model::{ReceiptRecord, ScanRecord},
    },
    ocr::{handlers::RECEIPT_FIELD, receipt::ReceiptScan},
    products::{
        dto::BatchDetailsRequest,
        model::{Product, ProductLookup},
    },
    profile::dto::{ProfilePatch, ProfileView},
};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, e.g. `http://localhost:8080/api`.
    pub base_url: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

/// Unwraps `{ success, data | message }` into the payload or a `ClientError`.
pub fn decode_envelope<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, ClientError> {
    let envelope: Envelope<T> = serde_json::from_slice(body).map_err(|e| {
        if (200..300).contains(&status) {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Api {
                status,
                message: String::from_utf8_lossy(body).into_owned(),
            }
        }
    })?;
    match envelope {
        Envelope {
            success: true,
            data: Some(data),
            ..
        } => Ok(data),
        Envelope { success: true, .. } => Err(ClientError::Decode("missing data".into())),
        Envelope { message, .. } => Err(ClientError::Api {
            status,
            message: message.unwrap_or_else(|| "request failed".into()),
        }),
    }
}

/// One typed method per backend endpoint. No retries.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let response = req.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(status, bytes = body.len(), "api response");
        decode_envelope(status, &body)
    }

    async fn json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.request(method, path).json(body)).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.request(Method::GET, path)).await
    }

    fn keep_tokens(&mut self, auth: AuthResponse) -> AuthResponse {
        self.token = Some(auth.access_token.clone());
        auth
    }

    // auth

    pub async fn register(&mut self, req: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let auth = self.json(Method::POST, "/auth/register", req).await?;
        Ok(self.keep_tokens(auth))
    }

    pub async fn login(&mut self, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let auth = self.json(Method::POST, "/auth/login", req).await?;
        Ok(self.keep_tokens(auth))
    }

    pub async fn google_login(
        &mut self,
        req: &GoogleLoginRequest,
    ) -> Result<AuthResponse, ClientError> {
        let auth = self.json(Method::POST, "/auth/google", req).await?;
        Ok(self.keep_tokens(auth))
    }

    pub async fn refresh(&mut self, req: &RefreshRequest) -> Result<AuthResponse, ClientError> {
        let auth = self.json(Method::POST, "/auth/refresh", req).await?;
        Ok(self.keep_tokens(auth))
    }

    pub async fn reset_password(
        &self,
        req: &ResetPasswordRequest,
    ) -> Result<PublicUser, ClientError> {
        self.json(Method::POST, "/auth/reset-password", req).await
    }

    pub async fn me(&self) -> Result<PublicUser, ClientError> {
        self.get("/auth/me").await
    }

    // profile

    pub async fn save_profile(&self, patch: &ProfilePatch) -> Result<ProfileView, ClientError> {
        self.json(Method::POST, "/userdata", patch).await
    }

    pub async fn get_profile(&self, username: &str) -> Result<ProfileView, ClientError> {
        self.get(&format!("/userdata/{username}")).await
    }

    pub async fn patch_profile(
        &self,
        username: &str,
        patch: &ProfilePatch,
    ) -> Result<ProfileView, ClientError> {
        self.json(Method::PATCH, &format!("/userdata/{username}"), patch)
            .await
    }

    pub async fn delete_profile(&self, username: &str) -> Result<serde_json::Value, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/userdata/{username}")))
            .await
    }

    // products

    pub async fn product(&self, barcode: &str) -> Result<Product, ClientError> {
        self.get(&format!("/products/{barcode}")).await
    }

    pub async fn batch_details(&self, barcodes: &[String]) -> Result<Vec<ProductLookup>, ClientError> {
        let body = BatchDetailsRequest {
            barcodes: barcodes.to_vec(),
        };
        self.json(Method::POST, "/products/batch-details", &body)
            .await
    }

    // uploads

    fn file_part(bytes: Vec<u8>, filename: &str, content_type: &str) -> Result<Part, ClientError> {
        Ok(Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?)
    }

    pub async fn scan_receipt(
        &self,
        image: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<ReceiptScan, ClientError> {
        let form = Form::new().part(RECEIPT_FIELD, Self::file_part(image, filename, content_type)?);
        self.send(self.request(Method::POST, "/ocr/scan").multipart(form))
            .await
    }

    /// `files` are `(bytes, filename, content_type)`.
    pub async fn analyze_blood_test(
        &self,
        files: Vec<(Vec<u8>, String, String)>,
        username: Option<&str>,
    ) -> Result<AnalyzeResponse, ClientError> {
        let mut form = Form::new();
        for (bytes, filename, content_type) in files {
            form = form.part(FILE_FIELD, Self::file_part(bytes, &filename, &content_type)?);
        }
        if let Some(username) = username {
            form = form.text(USERNAME_FIELD, username.to_string());
        }
        self.send(self.request(Method::POST, "/blood-test/analyze").multipart(form))
            .await
    }

    // ai

    pub async fn consult(
        &self,
        req: &ConsultRequest,
    ) -> Result<ConsultOutcome<SingleVerdict>, ClientError> {
        self.json(Method::POST, "/ai/consult", req).await
    }

    pub async fn consult_cart(
        &self,
        req: &ConsultCartRequest,
    ) -> Result<ConsultOutcome<CartVerdict>, ClientError> {
        self.json(Method::POST, "/ai/consult-cart", req).await
    }

    // history

    pub async fn list_scans(&self, page: Pagination) -> Result<Vec<ScanRecord>, ClientError> {
        self.get(&format!(
            "/history/scans?limit={}&offset={}",
            page.limit, page.offset
        ))
        .await
    }

    pub async fn add_scan(&self, scan: &NewScan) -> Result<ScanRecord, ClientError> {
        self.json(Method::POST, "/history/scans", scan).await
    }

    pub async fn delete_scan(&self, id: Uuid) -> Result<serde_json::Value, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/history/scans/{id}")))
            .await
    }

    pub async fn list_receipts(&self, page: Pagination) -> Result<Vec<ReceiptRecord>, ClientError> {
        self.get(&format!(
            "/history/receipts?limit={}&offset={}",
            page.limit, page.offset
        ))
        .await
    }

    pub async fn add_receipt(&self, receipt: &NewReceipt) -> Result<ReceiptRecord, ClientError> {
        self.json(Method::POST, "/history/receipts", receipt).await
    }

    pub async fn delete_receipt(&self, id: Uuid) -> Result<serde_json::Value, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/history/receipts/{id}")))
            .await
    }
}
