use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} answered with status {status}")]
    HttpStatus { endpoint: String, status: u16 },

    #[error("Unexpected response shape: {message}")]
    Decode { message: String },

    #[error("Contact store error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

/// 錯誤嚴重程度，決定 CLI 的退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl SyncError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SyncError::Transport(_) | SyncError::HttpStatus { .. } => ErrorSeverity::High,
            SyncError::Decode { .. } => ErrorSeverity::Medium,
            SyncError::Persistence(_) | SyncError::IoError(_) => ErrorSeverity::Critical,
            SyncError::ConfigError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::ConfigValidationError { .. } => ErrorSeverity::High,
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::ConfigError { .. }
                | SyncError::MissingConfigError { .. }
                | SyncError::InvalidConfigValueError { .. }
                | SyncError::ConfigValidationError { .. }
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SyncError::Transport(_) => "Could not reach the remote service".to_string(),
            SyncError::HttpStatus { status, .. } => {
                format!("The remote service refused the request (HTTP {})", status)
            }
            SyncError::Persistence(_) => "The local contact database is unavailable".to_string(),
            other if other.is_config_error() => format!("Invalid configuration: {}", other),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SyncError::Transport(_) => "Check the network connection and the configured base URLs",
            SyncError::HttpStatus { status: 401, .. } | SyncError::HttpStatus { status: 403, .. } => {
                "Check the API tokens in the configuration file"
            }
            SyncError::HttpStatus { .. } => "Retry later or run with --verbose for details",
            SyncError::Persistence(_) | SyncError::IoError(_) => {
                "Check that state.database_path points to a writable location"
            }
            SyncError::Decode { .. } => {
                "The remote API may have changed; run with --verbose for details"
            }
            _ => "Fix the configuration file and run again",
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
