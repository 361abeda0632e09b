use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 從 pull 端點取得的聯絡人沒有姓名資料，用這個值佔位
pub const PLACEHOLDER_NAME: &str = "-";

/// 一筆通過驗證的聯絡人，email 為去重鍵
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub last_name: String,
    pub first_name: String,
    pub email: String,
}

impl Contact {
    pub fn new(
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            last_name: last_name.into(),
            first_name: first_name.into(),
            email: email.into(),
        }
    }

    pub fn with_placeholder_names(email: impl Into<String>) -> Self {
        Self::new(PLACEHOLDER_NAME, PLACEHOLDER_NAME, email)
    }
}

/// 本地快取中的一列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContact {
    pub id: i64,
    pub contact: Contact,
}

/// 來源資料庫回傳的原始紀錄，結構由來源服務決定
pub type RawRecord = serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// 只讀第一頁（服務預設的頁大小）
    LatestPageOnly,
    /// 沿著 cursor 一路讀到最後一頁
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Push(Pagination),
    Pull,
}

/// Source Reader 的輸出。`pages_fetched` 只有 `Pagination::Full` 才會有值，
/// 由呼叫端決定要不要寫回 pagination hint。
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub records: Vec<RawRecord>,
    pub pages_fetched: Option<u32>,
}

/// 單次執行的驗證計數
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub success: usize,
    pub failed: usize,
}

/// 推送到名單服務的結果；只有 `Accepted` 會寫入本地快取
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Accepted,
    Rejected { result: String },
}

impl PushOutcome {
    pub fn from_result_field(result: Option<&str>) -> Self {
        match result {
            Some("success") => PushOutcome::Accepted,
            Some(other) => PushOutcome::Rejected {
                result: other.to_string(),
            },
            None => PushOutcome::Rejected {
                result: "<missing result field>".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub counters: RunCounters,
    /// 新寫入本地快取的聯絡人（dry run 時為「將會」寫入的數量）
    pub imported: usize,
    pub already_synced: usize,
    pub not_confirmed: usize,
    pub store_errors: usize,
    pub pagination_hint: Option<u32>,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    pub fn start(dry_run: bool) -> Self {
        Self {
            counters: RunCounters::default(),
            imported: 0,
            already_synced: 0,
            not_confirmed: 0,
            store_errors: 0,
            pagination_hint: None,
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }
}
