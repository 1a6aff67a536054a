use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use super::model::UserProfile;

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get(&self, username: &str) -> anyhow::Result<Option<UserProfile>>;
    /// Inserts or replaces the whole document for `profile.username`.
    async fn save(&self, profile: &UserProfile) -> anyhow::Result<()>;
    /// Returns false when no document existed.
    async fn delete(&self, username: &str) -> anyhow::Result<bool>;
}

pub struct PgProfileRepo {
    db: PgPool,
}

impl PgProfileRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileRepo for PgProfileRepo {
    async fn get(&self, username: &str) -> anyhow::Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, (Json<UserProfile>,)>(
            r#"
            SELECT document
            FROM user_profiles
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("load profile")?;
        Ok(row.map(|(Json(p),)| p))
    }

    async fn save(&self, profile: &UserProfile) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (username, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username)
            DO UPDATE SET document = EXCLUDED.document, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&profile.username)
        .bind(Json(profile))
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.db)
        .await
        .context("save profile")?;
        Ok(())
    }

    async fn delete(&self, username: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM user_profiles WHERE username = $1")
            .bind(username)
            .execute(&self.db)
            .await
            .context("delete profile")?;
        Ok(res.rows_affected() > 0)
    }
}
