use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use folo_lite::web::WebServer;
use folo_lite::{Config, Database, FeedFetcher, FeedIngestor, RetryPolicy, SweepWorker};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = Config::load_or_default("config.toml");

    // Initialize logging
    if let Err(e) = folo_lite::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        folo_lite::logging::init_console_only(&config.logging.level);
    }

    info!("Folo-Lite - RSS/Atom reader");

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
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

    let sweep = if config.sweep.enabled {
        info!(
            interval_secs = config.sweep.interval_secs,
            "Starting in-process feed sweep"
        );
        Some(SweepWorker::new(ingestor.clone(), &config.sweep).spawn())
    } else {
        None
    };

    let server = WebServer::new(&config.server, &config.auth, ingestor)?;
    let result = server.run(folo_lite::shutdown::signal()).await;

    if let Some(handle) = sweep {
        handle.stop().await;
    }
    db.close().await;

    result
}
