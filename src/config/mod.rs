pub mod pagination_state;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::{Pagination, SyncMode};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "contact-sync")]
#[command(about = "Import Notion database contacts into an Infomaniak newsletter mailing list")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "contact-sync.toml")]
    pub config: String,

    /// Check every page of the database, not just the latest one
    #[arg(long)]
    pub all: bool,

    /// Import the mailing list into the local cache instead of pushing to it
    #[arg(long, conflicts_with = "all")]
    pub pull: bool,

    /// Read and compare only: no pushes, no local inserts
    #[arg(long)]
    pub dry_run: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn sync_mode(&self) -> SyncMode {
        if self.pull {
            SyncMode::Pull
        } else if self.all {
            SyncMode::Push(Pagination::Full)
        } else {
            SyncMode::Push(Pagination::LatestPageOnly)
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_latest_page_push() {
        let cli = CliConfig::parse_from(["contact-sync"]);
        assert_eq!(cli.sync_mode(), SyncMode::Push(Pagination::LatestPageOnly));
        assert_eq!(cli.config, "contact-sync.toml");
    }

    #[test]
    fn test_all_and_pull_flags() {
        let cli = CliConfig::parse_from(["contact-sync", "--all", "-c", "custom.toml"]);
        assert_eq!(cli.sync_mode(), SyncMode::Push(Pagination::Full));
        assert_eq!(cli.config, "custom.toml");

        let cli = CliConfig::parse_from(["contact-sync", "--pull", "--dry-run"]);
        assert_eq!(cli.sync_mode(), SyncMode::Pull);
        assert!(cli.dry_run);

        assert!(CliConfig::try_parse_from(["contact-sync", "--pull", "--all"]).is_err());
    }
}
