use crate::config::toml_config::PropertyNames;
use crate::core::normalizer::normalize_batch;
use crate::domain::model::{Contact, Pagination, PushOutcome, SyncMode, SyncReport};
use crate::domain::ports::{ContactDestination, ContactSource, ContactStore};
use crate::utils::error::Result;
use std::collections::HashSet;

/// 同步流程：讀取 → 驗證 → 去重 → 推送 → 寫入本地快取。
///
/// 聯絡人依來源順序逐一處理，單一聯絡人的失敗只會被記錄並略過，
/// 下次執行時會再試一次。
pub struct SyncEngine<S: ContactSource, D: ContactDestination, T: ContactStore> {
    source: S,
    destination: D,
    store: T,
    properties: PropertyNames,
    dry_run: bool,
}

impl<S: ContactSource, D: ContactDestination, T: ContactStore> SyncEngine<S, D, T> {
    pub fn new(source: S, destination: D, store: T) -> Self {
        Self {
            source,
            destination,
            store,
            properties: PropertyNames::default(),
            dry_run: false,
        }
    }

    pub fn with_properties(mut self, properties: PropertyNames) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    /// 取回 store，讓呼叫端在結束時關閉連線
    pub fn into_store(self) -> T {
        self.store
    }

    pub async fn run(&self, mode: SyncMode) -> Result<SyncReport> {
        match mode {
            SyncMode::Push(pagination) => self.push_sync(pagination).await,
            SyncMode::Pull => self.pull_sync().await,
        }
    }

    /// 來源 → 名單服務。只有 `LatestPageOnly` 的來源錯誤會往外傳。
    pub async fn push_sync(&self, pagination: Pagination) -> Result<SyncReport> {
        let mut report = SyncReport::start(self.dry_run);

        tracing::info!("📡 Reading source database ({:?})", pagination);
        let batch = self.source.read_database(pagination).await?;
        report.pagination_hint = batch.pages_fetched;

        let normalized = normalize_batch(&batch.records, &self.properties);
        report.counters = normalized.counters;

        tracing::info!(
            "🔄 Processing {} contacts ({} rejected)",
            normalized.contacts.len(),
            normalized.counters.failed
        );

        // dry run 不寫入快取，同批次重複的 email 只能在記憶體中去重
        let mut previewed = HashSet::new();
        for contact in &normalized.contacts {
            if !self.needs_import(contact, &mut report).await {
                continue;
            }

            if self.dry_run {
                if previewed.insert(contact.email.as_str()) {
                    tracing::info!("🔍 Would import {}", contact.email);
                    report.imported += 1;
                } else {
                    tracing::debug!("{} already counted in this dry run", contact.email);
                    report.already_synced += 1;
                }
                continue;
            }

            match self.destination.push(contact).await {
                Ok(PushOutcome::Accepted) => self.record(contact, &mut report).await,
                Ok(PushOutcome::Rejected { result }) => {
                    tracing::warn!("⚠️ {} not accepted by the mailing list: {}", contact.email, result);
                    report.not_confirmed += 1;
                }
                Err(e) => {
                    tracing::warn!("⚠️ Push of {} failed: {}", contact.email, e);
                    report.not_confirmed += 1;
                }
            }
        }

        Ok(report.finish())
    }

    /// 名單服務 → 本地快取，不會寫入名單服務
    pub async fn pull_sync(&self) -> Result<SyncReport> {
        let mut report = SyncReport::start(self.dry_run);

        let contacts = match self.destination.pull_all().await {
            Ok(contacts) => contacts,
            Err(e) => {
                tracing::error!("❌ Could not pull the mailing list: {}", e);
                Vec::new()
            }
        };
        report.counters.success = contacts.len();

        let mut previewed = HashSet::new();
        for contact in &contacts {
            if !self.needs_import(contact, &mut report).await {
                continue;
            }

            if self.dry_run {
                if previewed.insert(contact.email.as_str()) {
                    tracing::info!("🔍 Would record {}", contact.email);
                    report.imported += 1;
                } else {
                    tracing::debug!("{} already counted in this dry run", contact.email);
                    report.already_synced += 1;
                }
                continue;
            }

            self.record(contact, &mut report).await;
        }

        Ok(report.finish())
    }

    /// 查詢失敗時這次先略過，下次執行再試
    async fn needs_import(&self, contact: &Contact, report: &mut SyncReport) -> bool {
        match self.store.exists(&contact.email).await {
            Ok(true) => {
                tracing::debug!("{} already synced", contact.email);
                report.already_synced += 1;
                false
            }
            Ok(false) => true,
            Err(e) => {
                tracing::warn!("⚠️ Store lookup for {} failed: {}", contact.email, e);
                report.store_errors += 1;
                false
            }
        }
    }

    async fn record(&self, contact: &Contact, report: &mut SyncReport) {
        match self.store.insert(contact).await {
            Ok(id) => {
                tracing::debug!("✅ {} stored as #{}", contact.email, id);
                report.imported += 1;
            }
            Err(e) => {
                tracing::warn!("⚠️ Could not store {}: {}", contact.email, e);
                report.store_errors += 1;
            }
        }
    }
}
