use crate::utils::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 完整分頁後寫回的頁數提示。
///
/// 獨立於主配置檔存放，避免把 `${VAR}` 替換後的 token 寫回磁碟。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationState {
    pub pages: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PaginationState {
    pub fn new(pages: u32) -> Self {
        Self {
            pages,
            updated_at: Some(Utc::now()),
        }
    }

    /// 檔案不存在時回傳 `None`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let state = toml::from_str(&content).map_err(|e| SyncError::ConfigValidationError {
            field: path.display().to_string(),
            message: format!("Invalid pagination state: {}", e),
        })?;
        Ok(Some(state))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string(self).map_err(|e| SyncError::ConfigError {
            message: format!("Cannot serialize pagination state: {}", e),
        })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // 先寫暫存檔再 rename，中途失敗不會留下截斷的檔案
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}
