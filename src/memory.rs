//! In-process stores used by `STORE_BACKEND=memory` and by the tests.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::CredentialRepo,
        repo_types::{Credential, NewCredential},
    },
    db::StoreError,
    history::{
        dto::Pagination,
        model::{ReceiptRecord, ScanRecord},
        repo::HistoryRepo,
    },
    products::{model::Product, repo::ProductRepo},
    profile::{model::UserProfile, repo::ProfileRepo},
};

#[derive(Default)]
pub struct MemoryCredentialRepo {
    rows: RwLock<Vec<Credential>>,
}

impl MemoryCredentialRepo {
    async fn find(&self, pred: impl Fn(&Credential) -> bool) -> Option<Credential> {
        self.rows.read().await.iter().find(|c| pred(c)).cloned()
    }
}

#[async_trait]
impl CredentialRepo for MemoryCredentialRepo {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Credential>> {
        Ok(self.find(|c| c.id == id).await)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Credential>> {
        Ok(self.find(|c| c.username == username).await)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Credential>> {
        Ok(self.find(|c| c.email == email).await)
    }

    async fn find_by_google_sub(&self, sub: &str) -> anyhow::Result<Option<Credential>> {
        Ok(self.find(|c| c.google_sub.as_deref() == Some(sub)).await)
    }

    async fn create(&self, new: NewCredential) -> Result<Credential, StoreError> {
        let mut rows = self.rows.write().await;
        for c in rows.iter() {
            if c.username == new.username {
                return Err(StoreError::Duplicate("username"));
            }
            if c.email == new.email {
                return Err(StoreError::Duplicate("email"));
            }
            if new.google_sub.is_some() && c.google_sub == new.google_sub {
                return Err(StoreError::Duplicate("google account"));
            }
        }
        let cred = Credential {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            google_sub: new.google_sub,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(cred.clone());
        Ok(cred)
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        let mut rows = self.rows.write().await;
        if let Some(c) = rows.iter_mut().find(|c| c.id == id) {
            c.password_hash = Some(password_hash.to_string());
        }
        Ok(())
    }

    async fn link_google(&self, id: Uuid, sub: &str) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        if rows
            .iter()
            .any(|c| c.id != id && c.google_sub.as_deref() == Some(sub))
        {
            return Err(StoreError::Duplicate("google account"));
        }
        if let Some(c) = rows.iter_mut().find(|c| c.id == id) {
            c.google_sub = Some(sub.to_string());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryProfileRepo {
    docs: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryProfileRepo {
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }
}

#[async_trait]
impl ProfileRepo for MemoryProfileRepo {
    async fn get(&self, username: &str) -> anyhow::Result<Option<UserProfile>> {
        Ok(self.docs.read().await.get(username).cloned())
    }

    async fn save(&self, profile: &UserProfile) -> anyhow::Result<()> {
        self.docs
            .write()
            .await
            .insert(profile.username.clone(), profile.clone());
        Ok(())
    }

    async fn delete(&self, username: &str) -> anyhow::Result<bool> {
        Ok(self.docs.write().await.remove(username).is_some())
    }
}

#[derive(Default)]
pub struct MemoryProductRepo {
    products: RwLock<HashMap<String, Product>>,
}

impl MemoryProductRepo {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(
                products
                    .into_iter()
                    .map(|p| (p.barcode.clone(), p))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl ProductRepo for MemoryProductRepo {
    async fn find_by_barcode(&self, barcode: &str) -> anyhow::Result<Option<Product>> {
        Ok(self.products.read().await.get(barcode).cloned())
    }
}

#[derive(Default)]
pub struct MemoryHistoryRepo {
    scans: RwLock<Vec<ScanRecord>>,
    receipts: RwLock<Vec<ReceiptRecord>>,
}

/// Newest first; equal timestamps keep the later insert first.
fn page_of<T: Clone>(
    rows: &[T],
    owned: impl Fn(&T) -> bool,
    created: impl Fn(&T) -> OffsetDateTime,
    page: Pagination,
) -> Vec<T> {
    let mut mine: Vec<T> = rows.iter().rev().filter(|r| owned(r)).cloned().collect();
    mine.sort_by(|a, b| created(b).cmp(&created(a)));
    mine.into_iter()
        .skip(page.offset.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl HistoryRepo for MemoryHistoryRepo {
    async fn list_scans(&self, username: &str, page: Pagination) -> anyhow::Result<Vec<ScanRecord>> {
        let rows = self.scans.read().await;
        Ok(page_of(rows.as_slice(), |r| r.username == username, |r| r.created_at, page))
    }

    async fn insert_scan(&self, record: &ScanRecord) -> anyhow::Result<()> {
        self.scans.write().await.push(record.clone());
        Ok(())
    }

    async fn delete_scan(&self, id: Uuid, username: &str) -> anyhow::Result<bool> {
        let mut rows = self.scans.write().await;
        let before = rows.len();
        rows.retain(|r| !(r.id == id && r.username == username));
        Ok(rows.len() < before)
    }

    async fn list_receipts(
        &self,
        username: &str,
        page: Pagination,
    ) -> anyhow::Result<Vec<ReceiptRecord>> {
        let rows = self.receipts.read().await;
        Ok(page_of(rows.as_slice(), |r| r.username == username, |r| r.created_at, page))
    }

    async fn insert_receipt(&self, record: &ReceiptRecord) -> anyhow::Result<()> {
        self.receipts.write().await.push(record.clone());
        Ok(())
    }

    async fn delete_receipt(&self, id: Uuid, username: &str) -> anyhow::Result<bool> {
        let mut rows = self.receipts.write().await;
        let before = rows.len();
        rows.retain(|r| !(r.id == id && r.username == username));
        Ok(rows.len() < before)
    }
}
