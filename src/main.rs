use anyhow::Context;
use clap::Parser;
use contact_sync::utils::logger::{self, LogFormat};
use contact_sync::utils::validation::Validate;
use contact_sync::{
    CliConfig, NewsletterClient, NotionSource, PaginationState, SqliteContactStore, SyncConfig,
    SyncEngine, SyncError, SyncReport,
};
use std::time::Duration;

fn exit_with(e: &SyncError) -> ! {
    tracing::error!("❌ {} (Severity: {:?})", e, e.severity());
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.severity().exit_code().max(1));
}

fn print_report(report: &SyncReport) {
    println!();
    println!("Mails found: {}", report.counters.success);
    println!("Badly filled contacts: {}", report.counters.failed);
    if report.dry_run {
        println!("Would import: {}", report.imported);
    } else {
        println!("Imported: {}", report.imported);
    }
    println!("Already synced: {}", report.already_synced);
    if report.not_confirmed > 0 {
        println!("Not confirmed by the mailing list: {}", report.not_confirmed);
    }
    if report.store_errors > 0 {
        println!("Local store errors: {}", report.store_errors);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let log_format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(log_format, cli.verbose);

    tracing::info!("🚀 Starting contact-sync");
    tracing::info!("📁 Loading configuration from: {}", cli.config);

    let config = match SyncConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_seconds))
        .build()
        .context("building HTTP client")?;

    let store = match SqliteContactStore::open(&config.database_url()).await {
        Ok(store) => store,
        Err(e) => exit_with(&e),
    };

    let source = NotionSource::new(client.clone(), &config.source, config.pagination_hint());
    let destination = NewsletterClient::new(client, &config.destination);
    let engine = SyncEngine::new(source, destination, store)
        .with_properties(config.source.properties.clone())
        .with_dry_run(cli.dry_run);

    let result = engine.run(cli.sync_mode()).await;
    engine.into_store().close().await;

    let report = match result {
        Ok(report) => report,
        Err(e) => exit_with(&e),
    };

    if let Some(pages) = report.pagination_hint.filter(|pages| *pages > 0) {
        if report.dry_run {
            tracing::debug!("Dry run, pagination hint {} not saved", pages);
        } else if let Err(e) = PaginationState::new(pages).save(&config.state.pagination_path) {
            tracing::warn!("⚠️ Could not save pagination hint: {}", e);
        }
    }

    tracing::info!("✅ Sync completed");
    print_report(&report);

    Ok(())
}
