use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Credential, NewCredential};
use crate::db::StoreError;

#[async_trait]
pub trait CredentialRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Credential>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Credential>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Credential>>;
    async fn find_by_google_sub(&self, sub: &str) -> anyhow::Result<Option<Credential>>;
    /// Fails with `StoreError::Duplicate` when username, email or Google subject is taken.
    async fn create(&self, new: NewCredential) -> Result<Credential, StoreError>;
    async fn set_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()>;
    async fn link_google(&self, id: Uuid, sub: &str) -> Result<(), StoreError>;
}

pub struct PgCredentialRepo {
    db: PgPool,
}

impl PgCredentialRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> anyhow::Result<Option<Credential>> {
        let sql = format!(
            "SELECT id, username, email, password_hash, google_sub, created_at \
             FROM credentials WHERE {column} = $1"
        );
        let row = sqlx::query_as::<_, Credential>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("find credential by {column}"))?;
        Ok(row)
    }
}

#[async_trait]
impl CredentialRepo for PgCredentialRepo {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Credential>> {
        let row = sqlx::query_as::<_, Credential>(
            r#"
            SELECT id, username, email, password_hash, google_sub, created_at
            FROM credentials
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find credential by id")?;
        Ok(row)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Credential>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Credential>> {
        self.find_one("email", email).await
    }

    async fn find_by_google_sub(&self, sub: &str) -> anyhow::Result<Option<Credential>> {
        self.find_one("google_sub", sub).await
    }

    async fn create(&self, new: NewCredential) -> Result<Credential, StoreError> {
        let row = sqlx::query_as::<_, Credential>(
            r#"
            INSERT INTO credentials (id, username, email, password_hash, google_sub)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, google_sub, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.google_sub)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE credentials SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await
            .context("update password hash")?;
        Ok(())
    }

    async fn link_google(&self, id: Uuid, sub: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE credentials SET google_sub = $2 WHERE id = $1")
            .bind(id)
            .bind(sub)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
