use crate::domain::model::{Contact, Pagination, PushOutcome, SourceBatch};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 來源資料庫（Notion database query）
#[async_trait]
pub trait ContactSource: Send + Sync {
    async fn read_database(&self, pagination: Pagination) -> Result<SourceBatch>;
}

/// 目的地名單服務
#[async_trait]
pub trait ContactDestination: Send + Sync {
    async fn push(&self, contact: &Contact) -> Result<PushOutcome>;
    async fn pull_all(&self) -> Result<Vec<Contact>>;
}

/// 已同步聯絡人的本地快取，只用來去重
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn exists(&self, email: &str) -> Result<bool>;
    async fn insert(&self, contact: &Contact) -> Result<i64>;
    async fn count(&self) -> Result<i64>;
}
