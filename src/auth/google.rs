use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{config::GoogleConfig, error::ApiError};

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone)]
pub struct GoogleIdentity {
    pub sub: String,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GoogleAuthError {
    #[error("Google sign-in is not configured")]
    NotConfigured,
    #[error("invalid Google token")]
    InvalidToken,
    #[error("Google token issued for another client")]
    AudienceMismatch,
    #[error("Google account email is not verified")]
    UnverifiedEmail,
    #[error("Google token check failed: {0}")]
    Transport(String),
}

impl From<GoogleAuthError> for ApiError {
    fn from(e: GoogleAuthError) -> Self {
        match e {
            GoogleAuthError::NotConfigured | GoogleAuthError::Transport(_) => {
                ApiError::Unavailable(e.to_string())
            }
            _ => ApiError::Unauthorized(e.to_string()),
        }
    }
}

#[async_trait]
pub trait GoogleVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, GoogleAuthError>;
}

/// Verifies ID tokens through Google's `tokeninfo` endpoint.
pub struct TokenInfoVerifier {
    http: reqwest::Client,
    url: String,
    client_id: String,
}

impl TokenInfoVerifier {
    pub fn new(cfg: &GoogleConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            url: cfg.tokeninfo_url.clone(),
            client_id: cfg.client_id.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<serde_json::Value>,
}

impl TokenInfo {
    fn into_identity(self, client_id: &str) -> Result<GoogleIdentity, GoogleAuthError> {
        if self.aud != client_id {
            return Err(GoogleAuthError::AudienceMismatch);
        }
        let verified = match &self.email_verified {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        };
        let email = self.email.ok_or(GoogleAuthError::UnverifiedEmail)?;
        if !verified {
            return Err(GoogleAuthError::UnverifiedEmail);
        }
        Ok(GoogleIdentity {
            sub: self.sub,
            email: email.trim().to_lowercase(),
        })
    }
}

#[async_trait]
impl GoogleVerifier for TokenInfoVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, GoogleAuthError> {
        if self.client_id.is_empty() {
            return Err(GoogleAuthError::NotConfigured);
        }
        let response = self
            .http
            .get(&self.url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| GoogleAuthError::Transport(e.to_string()))?;

        if response.status().is_client_error() {
            warn!(status = %response.status(), "google tokeninfo rejected token");
            return Err(GoogleAuthError::InvalidToken);
        }
        if !response.status().is_success() {
            return Err(GoogleAuthError::Transport(format!(
                "tokeninfo returned {}",
                response.status()
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| GoogleAuthError::Transport(e.to_string()))?;
        debug!(sub = %info.sub, "google token verified");
        info.into_identity(&self.client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(aud: &str, verified: serde_json::Value) -> TokenInfo {
        TokenInfo {
            aud: aud.into(),
            sub: "1234567890".into(),
            email: Some("Jane.Doe@Gmail.com".into()),
            email_verified: Some(verified),
        }
    }

    #[test]
    fn accepts_matching_audience_with_string_flag() {
        let id = info("client-1", serde_json::json!("true"))
            .into_identity("client-1")
            .unwrap();
        assert_eq!(id.sub, "1234567890");
        assert_eq!(id.email, "jane.doe@gmail.com");
    }

    #[test]
    fn accepts_boolean_verified_flag() {
        assert!(info("c", serde_json::json!(true)).into_identity("c").is_ok());
    }

    #[test]
    fn rejects_foreign_audience() {
        let err = info("other", serde_json::json!("true"))
            .into_identity("client-1")
            .unwrap_err();
        assert!(matches!(err, GoogleAuthError::AudienceMismatch));
    }

    #[test]
    fn rejects_unverified_email() {
        let err = info("c", serde_json::json!("false"))
            .into_identity("c")
            .unwrap_err();
        assert!(matches!(err, GoogleAuthError::UnverifiedEmail));
    }
}
