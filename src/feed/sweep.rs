//! Background sweep worker.
//!
//! Re-ingests every known feed on a fixed interval. A failing feed is
//! logged and recorded on its row; it never aborts the rest of the sweep.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::ingest::FeedIngestor;
use super::repository::FeedRepository;
use crate::config::SweepConfig;

/// Lifecycle state of a sweep worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepState {
    /// Spawned, first tick not yet taken.
    Idle,
    /// A sweep is in progress.
    Running,
    /// Waiting for the next tick.
    Sleeping,
    /// Shut down; terminal.
    Stopped,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Feeds attempted.
    pub total: usize,
    /// Feeds ingested successfully.
    pub succeeded: usize,
    /// Feeds that failed.
    pub failed: usize,
    /// New articles across all feeds.
    pub new_articles: u64,
    /// The feed list could not be read, nothing was attempted.
    pub skipped: bool,
}

/// Periodic re-ingestion of all feeds.
#[derive(Debug, Clone)]
pub struct SweepWorker {
    ingestor: FeedIngestor,
    interval: Duration,
    concurrency: usize,
}

impl SweepWorker {
    /// Create a worker from the `[sweep]` configuration.
    pub fn new(ingestor: FeedIngestor, config: &SweepConfig) -> Self {
        Self {
            ingestor,
            interval: Duration::from_secs(config.interval_secs.max(1)),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Override the sweep interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sweep interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run a single sweep over every known feed.
    pub async fn run_once(&self) -> SweepReport {
        let pool = self.ingestor.db().pool();
        let urls = match FeedRepository::new(pool).list_urls().await {
            Ok(urls) => urls,
            Err(e) => {
                error!(error = %e, "Failed to list feeds, skipping sweep");
                return SweepReport {
                    skipped: true,
                    ..SweepReport::default()
                };
            }
        };

        let mut report = SweepReport {
            total: urls.len(),
            ..SweepReport::default()
        };
        if urls.is_empty() {
            info!("No feeds to sweep");
            return report;
        }

        info!(feeds = urls.len(), concurrency = self.concurrency, "Sweep started");

        let mut results = stream::iter(urls)
            .map(|url| async move {
                let result = self.ingestor.ingest(&url).await;
                (url, result)
            })
            .buffer_unordered(self.concurrency);

        while let Some((url, result)) = results.next().await {
            match result {
                Ok(ingested) => {
                    report.succeeded += 1;
                    report.new_articles += ingested.new_articles;
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(feed = %url, error = %e, "Failed to ingest feed");
                    if let Err(err) = FeedRepository::new(pool)
                        .record_failure(&url, &e.to_string())
                        .await
                    {
                        error!(feed = %url, error = %err, "Failed to record feed error");
                    }
                }
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            new_articles = report.new_articles,
            "Sweep finished"
        );
        report
    }

    /// Spawn the worker loop; the first sweep starts immediately.
    pub fn spawn(self) -> SweepHandle {
        let (cancel_tx, cancel_rx) = broadcast::channel(1);
        let (state_tx, state_rx) = watch::channel(SweepState::Idle);
        let join = tokio::spawn(self.run(cancel_rx, state_tx));

        SweepHandle {
            cancel_tx,
            state_rx,
            join,
        }
    }

    async fn run(self, mut cancel_rx: broadcast::Receiver<()>, state_tx: watch::Sender<SweepState>) {
        info!(interval_secs = self.interval.as_secs(), "Sweep worker started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel_rx.recv() => break,
                _ = ticker.tick() => {
                    state_tx.send_replace(SweepState::Running);
                    tokio::select! {
                        _ = self.run_once() => {}
                        _ = cancel_rx.recv() => {
                            warn!("Shutdown requested during sweep, abandoning it");
                            break;
                        }
                    }
                    // Next sweep is one full interval after this one ends.
                    ticker.reset();
                    state_tx.send_replace(SweepState::Sleeping);
                }
            }
        }

        state_tx.send_replace(SweepState::Stopped);
        info!("Sweep worker stopped");
    }
}

/// Handle to a spawned [`SweepWorker`].
pub struct SweepHandle {
    cancel_tx: broadcast::Sender<()>,
    state_rx: watch::Receiver<SweepState>,
    join: JoinHandle<()>,
}

impl SweepHandle {
    /// Current worker state.
    pub fn state(&self) -> SweepState {
        *self.state_rx.borrow()
    }

    /// Receiver for observing state changes.
    pub fn subscribe(&self) -> watch::Receiver<SweepState> {
        self.state_rx.clone()
    }

    /// Signal shutdown and wait for the worker to exit.
    pub async fn stop(self) {
        let _ = self.cancel_tx.send(());
        if let Err(e) = self.join.await {
            error!(error = %e, "Sweep worker task failed");
        }
    }
}
