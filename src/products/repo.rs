use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::model::Product;

#[async_trait]
pub trait ProductRepo: Send + Sync {
    async fn find_by_barcode(&self, barcode: &str) -> anyhow::Result<Option<Product>>;
}

pub struct PgProductRepo {
    db: PgPool,
}

impl PgProductRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepo for PgProductRepo {
    async fn find_by_barcode(&self, barcode: &str) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            SELECT barcode, name, brand, nutrients
            FROM products
            WHERE barcode = $1
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("find product {barcode}"))?;
        Ok(row)
    }
}
