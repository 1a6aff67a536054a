use lazy_static::lazy_static;
use regex::Regex;

use super::{
    dto::{AuthResponse, PublicUser},
    jwt::JwtKeys,
    repo::CredentialRepo,
    repo_types::Credential,
};

const USERNAME_MAX: usize = 32;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

/// Username candidate for a Google sign-up: the email local part with
/// unsupported characters dropped.
pub(crate) fn username_base_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut base: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .take(USERNAME_MAX - 4)
        .collect();
    while base.len() < 3 {
        base.push('_');
    }
    base
}

/// First free username among `base`, `base-2`, `base-3`, ...
pub(crate) async fn unique_username(
    repo: &dyn CredentialRepo,
    base: &str,
) -> anyhow::Result<String> {
    if repo.find_by_username(base).await?.is_none() {
        return Ok(base.to_string());
    }
    for n in 2u32.. {
        let candidate = format!("{base}-{n}");
        if repo.find_by_username(&candidate).await?.is_none() {
            return Ok(candidate);
        }
    }
    unreachable!("u32 range exhausted while picking a username")
}

pub(crate) fn issue_tokens(keys: &JwtKeys, cred: &Credential) -> anyhow::Result<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(cred.id, &cred.username)?,
        refresh_token: keys.sign_refresh(cred.id, &cred.username)?,
        user: PublicUser::from(cred),
    })
}

impl From<&Credential> for PublicUser {
    fn from(c: &Credential) -> Self {
        Self {
            id: c.id,
            username: c.username.clone(),
            email: c.email.clone(),
        }
    }
}
