use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    dto::Pagination,
    model::{ReceiptRecord, ScanRecord},
};

/// Append-only per-user history. Deletes match on id and owner together.
#[async_trait]
pub trait HistoryRepo: Send + Sync {
    async fn list_scans(&self, username: &str, page: Pagination) -> anyhow::Result<Vec<ScanRecord>>;
    async fn insert_scan(&self, record: &ScanRecord) -> anyhow::Result<()>;
    async fn delete_scan(&self, id: Uuid, username: &str) -> anyhow::Result<bool>;

    async fn list_receipts(
        &self,
        username: &str,
        page: Pagination,
    ) -> anyhow::Result<Vec<ReceiptRecord>>;
    async fn insert_receipt(&self, record: &ReceiptRecord) -> anyhow::Result<()>;
    async fn delete_receipt(&self, id: Uuid, username: &str) -> anyhow::Result<bool>;
}

pub struct PgHistoryRepo {
    db: PgPool,
}

impl PgHistoryRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HistoryRepo for PgHistoryRepo {
    async fn list_scans(&self, username: &str, page: Pagination) -> anyhow::Result<Vec<ScanRecord>> {
        let rows = sqlx::query_as::<_, ScanRecord>(
            r#"
            SELECT id, username, barcode, product_name, verdict, created_at
            FROM scan_history
            WHERE username = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(username)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.db)
        .await
        .context("list scan history")?;
        Ok(rows)
    }

    async fn insert_scan(&self, r: &ScanRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scan_history (id, username, barcode, product_name, verdict, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(r.id)
        .bind(&r.username)
        .bind(&r.barcode)
        .bind(&r.product_name)
        .bind(&r.verdict)
        .bind(r.created_at)
        .execute(&self.db)
        .await
        .context("insert scan history")?;
        Ok(())
    }

    async fn delete_scan(&self, id: Uuid, username: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM scan_history WHERE id = $1 AND username = $2")
            .bind(id)
            .bind(username)
            .execute(&self.db)
            .await
            .context("delete scan history")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_receipts(
        &self,
        username: &str,
        page: Pagination,
    ) -> anyhow::Result<Vec<ReceiptRecord>> {
        let rows = sqlx::query_as::<_, ReceiptRecord>(
            r#"
            SELECT id, username, barcodes, total_price, health_match_score, items, created_at
            FROM receipt_history
            WHERE username = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(username)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.db)
        .await
        .context("list receipt history")?;
        Ok(rows)
    }

    async fn insert_receipt(&self, r: &ReceiptRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO receipt_history
                (id, username, barcodes, total_price, health_match_score, items, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(r.id)
        .bind(&r.username)
        .bind(&r.barcodes)
        .bind(r.total_price)
        .bind(r.health_match_score)
        .bind(&r.items)
        .bind(r.created_at)
        .execute(&self.db)
        .await
        .context("insert receipt history")?;
        Ok(())
    }

    async fn delete_receipt(&self, id: Uuid, username: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM receipt_history WHERE id = $1 AND username = $2")
            .bind(id)
            .bind(username)
            .execute(&self.db)
            .await
            .context("delete receipt history")?;
        Ok(res.rows_affected() > 0)
    }
}
