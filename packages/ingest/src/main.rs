use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use common::store::postgres::{PgCatalogStore, ensure_schema};
use ingest::cli::Args;
use ingest::config::IngestAppConfig;
use ingest::discover::{discover_fieldids, generate_refs};
use ingest::orchestrator::{PgStoreFactory, ingest_local_file};
use ingest::{FitsDecoder, Orchestrator};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = IngestAppConfig::load().context("Failed to load config")?;
    args.apply(&mut config);
    config.source.validate().context("Invalid source configuration")?;

    if !args.from_files.is_empty() {
        return ingest_files(&args, &config).await;
    }

    let selection = args.selection();
    let fieldids = if selection.fieldids.is_empty() {
        let client = Client::new();
        discover_fieldids(
            &client,
            &config.source.base_url,
            Duration::from_secs(config.source.listing_timeout_secs),
        )
        .await
    } else {
        selection.fieldids.clone()
    };
    let files = generate_refs(&fieldids, &selection).context("Invalid selection")?;
    info!(count = files.len(), "Total files to process");

    if args.dry_run {
        for file in &files {
            println!("{}", file.url(&config.source.base_url));
        }
        return Ok(());
    }

    if config.ingest.init_schema {
        let store = PgCatalogStore::connect_with_pool_size(&config.database, 1)
            .await
            .context("Failed to connect to database")?;
        ensure_schema(store.connection())
            .await
            .context("Failed to apply schema")?;
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight files");
            on_signal.cancel();
        }
    });

    info!(
        workers = config.ingest.workers,
        database = %config.database.redacted_url(),
        "Starting ingest"
    );
    let orchestrator = Orchestrator::new(
        config.source.clone(),
        config.ingest.workers,
        Arc::new(PgStoreFactory::new(config.database.clone())),
        Arc::new(FitsDecoder),
    );
    let summary = orchestrator.run(files, cancel).await;

    info!(
        ingested = summary.ingested,
        rows = summary.rows,
        skipped = summary.skipped,
        failed = summary.failed,
        "Done"
    );
    Ok(())
}

async fn ingest_files(args: &Args, config: &IngestAppConfig) -> anyhow::Result<()> {
    let store = PgCatalogStore::connect_with_pool_size(&config.database, 1)
        .await
        .context("Failed to connect to database")?;
    if config.ingest.init_schema {
        ensure_schema(store.connection())
            .await
            .context("Failed to apply schema")?;
    }

    let mut ingested = 0usize;
    let mut rows = 0u64;
    for path in &args.from_files {
        info!(path = %path.display(), "Ingesting local file");
        match ingest_local_file(path, &store, &FitsDecoder).await {
            Ok(count) => {
                ingested += 1;
                rows += count;
            }
            Err(e) => error!(path = %path.display(), error = %e, "Local ingest failed"),
        }
    }

    info!(
        files = ingested,
        rows,
        failed = args.from_files.len() - ingested,
        "Done"
    );
    Ok(())
}
