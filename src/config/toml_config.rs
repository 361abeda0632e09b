use crate::config::pagination_state::PaginationState;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2021-05-13";
pub const DEFAULT_NEWSLETTER_BASE_URL: &str = "https://newsletter.infomaniak.com/api/v1/public";
pub const MAX_PULL_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub database_id: String,
    pub token: String,
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,
    #[serde(default = "default_notion_version")]
    pub api_version: String,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default)]
    pub properties: PropertyNames,
}

/// Notion database 中三個欄位的名稱
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyNames {
    #[serde(default = "default_last_name_property")]
    pub last_name: String,
    #[serde(default = "default_first_name_property")]
    pub first_name: String,
    #[serde(default = "default_email_property")]
    pub email: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            last_name: default_last_name_property(),
            first_name: default_first_name_property(),
            email: default_email_property(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub mailing_list_id: String,
    pub access_token: String,
    pub secret_token: String,
    #[serde(default = "default_newsletter_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_pagination_path")]
    pub pagination_path: String,
    /// 上次完整分頁讀到的頁數，僅用於進度顯示
    #[serde(default = "default_pages")]
    pub pages: u32,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            pagination_path: default_pagination_path(),
            pages: default_pages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_notion_base_url() -> String {
    DEFAULT_NOTION_BASE_URL.to_string()
}

fn default_notion_version() -> String {
    DEFAULT_NOTION_VERSION.to_string()
}

fn default_max_pages() -> u32 {
    10_000
}

fn default_last_name_property() -> String {
    "Nom".to_string()
}

fn default_first_name_property() -> String {
    "Prénom".to_string()
}

fn default_email_property() -> String {
    "mail".to_string()
}

fn default_newsletter_base_url() -> String {
    DEFAULT_NEWSLETTER_BASE_URL.to_string()
}

fn default_page_size() -> usize {
    500
}

fn default_database_path() -> String {
    "contacts.db".to_string()
}

fn default_pagination_path() -> String {
    "sync-state.toml".to_string()
}

fn default_pages() -> u32 {
    1
}

fn default_timeout_seconds() -> u64 {
    30
}

impl SyncConfig {
    /// 從 TOML 檔案載入配置，並套用 pagination state 檔（若存在）
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let mut config = Self::from_toml_str(&content)?;

        // 頁數提示只用於進度顯示，讀不到就沿用配置中的值
        match PaginationState::load(&config.state.pagination_path) {
            Ok(Some(state)) => {
                tracing::debug!(
                    "Pagination hint {} loaded from {}",
                    state.pages,
                    config.state.pagination_path
                );
                config.state.pages = state.pages;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    "⚠️ Ignoring pagination state {}: {}",
                    config.state.pagination_path,
                    e
                );
            }
        }

        Ok(config)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${NOTION_TOKEN})，未設定的保留原樣交給驗證處理
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SyncError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("source.database_id", &self.source.database_id)?;
        validate_non_empty_string("source.token", &self.source.token)?;
        validate_non_empty_string("source.api_version", &self.source.api_version)?;
        validate_url("source.base_url", &self.source.base_url)?;
        validate_range("source.max_pages", self.source.max_pages, 1, u32::MAX)?;
        validate_non_empty_string("source.properties.last_name", &self.source.properties.last_name)?;
        validate_non_empty_string(
            "source.properties.first_name",
            &self.source.properties.first_name,
        )?;
        validate_non_empty_string("source.properties.email", &self.source.properties.email)?;

        validate_non_empty_string("destination.mailing_list_id", &self.destination.mailing_list_id)?;
        validate_non_empty_string("destination.access_token", &self.destination.access_token)?;
        validate_non_empty_string("destination.secret_token", &self.destination.secret_token)?;
        validate_url("destination.base_url", &self.destination.base_url)?;
        validate_range(
            "destination.page_size",
            self.destination.page_size,
            1,
            MAX_PULL_PAGE_SIZE,
        )?;

        validate_path("state.database_path", &self.state.database_path)?;
        validate_path("state.pagination_path", &self.state.pagination_path)?;
        validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 3600)?;

        Ok(())
    }

    pub fn pagination_hint(&self) -> u32 {
        self.state.pages
    }

    /// sqlx 連線字串
    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.state.database_path)
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[source]
database_id = "db-123"
token = "secret_notion"

[destination]
mailing_list_id = "42"
access_token = "access"
secret_token = "secret"
"#;

    #[test]
    fn test_parse_minimal_config_applies_defaults() {
        let config = SyncConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.source.base_url, DEFAULT_NOTION_BASE_URL);
        assert_eq!(config.source.api_version, "2021-05-13");
        assert_eq!(config.source.properties, PropertyNames::default());
        assert_eq!(config.source.properties.first_name, "Prénom");
        assert_eq!(config.destination.page_size, 500);
        assert_eq!(config.state.database_path, "contacts.db");
        assert_eq!(config.pagination_hint(), 1);
        assert_eq!(config.http.timeout_seconds, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_property_names() {
        let content = format!(
            "{}\n[source.properties]\nlast_name = \"Last\"\nemail = \"Email\"\n",
            MINIMAL
        );
        let config = SyncConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.source.properties.last_name, "Last");
        assert_eq!(config.source.properties.first_name, "Prénom");
        assert_eq!(config.source.properties.email, "Email");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CONTACT_SYNC_TEST_TOKEN", "from-env");

        let content = MINIMAL.replace("secret_notion", "${CONTACT_SYNC_TEST_TOKEN}");
        let config = SyncConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.source.token, "from-env");

        std::env::remove_var("CONTACT_SYNC_TEST_TOKEN");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let content = MINIMAL.replace("secret_notion", "${CONTACT_SYNC_SURELY_UNSET_VAR}");
        let config = SyncConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_size_over_cap_fails_validation() {
        let content = format!("{}page_size = 5000\n", MINIMAL);
        let config = SyncConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let result = SyncConfig::from_toml_str("[source]\ndatabase_id = \"x\"\n");
        assert!(matches!(result, Err(SyncError::ConfigValidationError { .. })));
    }

    #[test]
    fn test_config_from_file_reads_pagination_state() {
        let state_file = NamedTempFile::new().unwrap();
        PaginationState::new(7).save(state_file.path()).unwrap();

        let mut config_file = NamedTempFile::new().unwrap();
        let content = format!(
            "{}\n[state]\npagination_path = \"{}\"\n",
            MINIMAL,
            state_file.path().to_str().unwrap().replace('\\', "/")
        );
        config_file.write_all(content.as_bytes()).unwrap();

        let config = SyncConfig::from_file(config_file.path()).unwrap();
        assert_eq!(config.pagination_hint(), 7);
    }

    #[test]
    fn test_corrupt_pagination_state_keeps_configured_hint() {
        let state_file = NamedTempFile::new().unwrap();
        std::fs::write(state_file.path(), "pages = ").unwrap();

        let mut config_file = NamedTempFile::new().unwrap();
        let content = format!(
            "{}\n[state]\npages = 4\npagination_path = \"{}\"\n",
            MINIMAL,
            state_file.path().to_str().unwrap().replace('\\', "/")
        );
        config_file.write_all(content.as_bytes()).unwrap();

        let config = SyncConfig::from_file(config_file.path()).unwrap();
        assert_eq!(config.pagination_hint(), 4);
    }
}
