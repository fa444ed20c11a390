//! Background feed sweeper.
//!
//! Re-fetches every stored feed on the configured interval, starting with
//! an immediate sweep, until Ctrl-C or SIGTERM.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use folo_lite::{Config, Database, FeedFetcher, FeedIngestor, RetryPolicy, SweepWorker};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::load_or_default("config.toml");

    if let Err(e) = folo_lite::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        folo_lite::logging::init_console_only(&config.logging.level);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> folo_lite::Result<()> {
    let db = Arc::new(Database::connect(&config.database).await?);
    let fetcher = FeedFetcher::new(&config.fetch)?;
    let ingestor = FeedIngestor::new(db.clone(), fetcher, RetryPolicy::from_config(&config.ingest));

    let worker = SweepWorker::new(ingestor, &config.sweep);
    info!(
        interval_secs = worker.interval().as_secs(),
        concurrency = config.sweep.concurrency,
        "Feed worker started"
    );

    let handle = worker.spawn();
    folo_lite::shutdown::signal().await;

    info!("Shutting down feed worker");
    handle.stop().await;
    db.close().await;

    Ok(())
}
