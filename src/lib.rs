pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{NewsletterClient, NotionSource, SqliteContactStore};
pub use config::{pagination_state::PaginationState, toml_config::SyncConfig};
pub use core::sync::SyncEngine;
pub use domain::model::{Contact, Pagination, RunCounters, SyncMode, SyncReport};
pub use utils::error::{Result, SyncError};
