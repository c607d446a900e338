use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};

use bundlewatch_common::{CancelFlag, ScoutError, WebhookSubscriber};

use crate::compose::compose;
use crate::differ;
use crate::dispatch::DispatchEngine;
use crate::router::route;
use crate::traits::{BundleSource, Ledger};

/// Stats from one watcher run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub pruned: u32,
    pub prune_failed: u32,
    pub novel: u32,
    pub skipped: u32,
    pub dispatch_attempted: u32,
    pub dispatch_failed: u32,
    pub committed: u32,
    pub commit_failed: u32,
    pub cancelled: bool,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Watch Run Complete ===")?;
        writeln!(f, "Expired pruned:     {}", self.pruned)?;
        writeln!(f, "Prune failures:     {}", self.prune_failed)?;
        writeln!(f, "Novel bundles:      {}", self.novel)?;
        writeln!(f, "Bundles skipped:    {}", self.skipped)?;
        writeln!(f, "Deliveries tried:   {}", self.dispatch_attempted)?;
        writeln!(f, "Deliveries failed:  {}", self.dispatch_failed)?;
        writeln!(f, "Ledger commits:     {}", self.committed)?;
        writeln!(f, "Commit failures:    {}", self.commit_failed)?;
        if self.cancelled {
            writeln!(f, "Run was cancelled before the queue drained")?;
        }
        Ok(())
    }
}

/// One run of the ingestion-dedup-dispatch pipeline.
///
/// `Idle → Listing → Pruning → per-item [Detail → Compose → Route →
/// Dispatch → Commit] → Idle`. Listing failure is fatal; everything after
/// it degrades per-item or per-subscriber.
pub struct Scout {
    source: Box<dyn BundleSource>,
    ledger: Box<dyn Ledger>,
    dispatcher: DispatchEngine,
    subscribers: Vec<WebhookSubscriber>,
    cancel: CancelFlag,
}

impl Scout {
    pub fn new(
        source: Box<dyn BundleSource>,
        ledger: Box<dyn Ledger>,
        dispatcher: DispatchEngine,
        subscribers: Vec<WebhookSubscriber>,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            source,
            ledger,
            dispatcher,
            subscribers,
            cancel,
        }
    }

    pub async fn run(&self) -> Result<RunStats> {
        let mut stats = RunStats::default();

        // Listing — fatal on failure, no partial catalog is trusted.
        info!("Listing catalog...");
        let snapshot = self
            .source
            .list_summaries()
            .await
            .map_err(|e| ScoutError::Extraction(e.to_string()))?;
        info!(bundles = snapshot.len(), "Catalog snapshot taken");

        let pushed = self
            .ledger
            .pushed()
            .await
            .context("Failed to load ledger")?;

        let diff = differ::diff(&snapshot, &pushed);
        info!(
            novel = diff.novel.len(),
            expired = diff.expired.len(),
            already_pushed = pushed.len(),
            "Catalog diffed"
        );

        // Pruning — each delete independent and idempotent.
        for bundle_id in &diff.expired {
            match self.ledger.prune(bundle_id).await {
                Ok(()) => {
                    info!(bundle_id = %bundle_id, "Pruned expired bundle from ledger");
                    stats.pruned += 1;
                }
                Err(e) => {
                    warn!(bundle_id = %bundle_id, error = %e, "Failed to prune expired bundle");
                    stats.prune_failed += 1;
                }
            }
        }

        // Queue — strictly sequential, the extraction session is stateful.
        stats.novel = diff.novel.len() as u32;
        for summary in &diff.novel {
            if self.cancel.is_cancelled() {
                info!("Cancellation requested, stopping before next bundle");
                stats.cancelled = true;
                break;
            }

            let detail = match self.source.fetch_detail(summary).await {
                Ok(d) => d,
                Err(e) => {
                    // Recoverable: no ledger entry, retried next run.
                    let err = ScoutError::DetailFetch {
                        bundle_id: summary.id.clone(),
                        message: e.to_string(),
                    };
                    warn!(error = %err, "Skipping bundle");
                    stats.skipped += 1;
                    continue;
                }
            };

            let payload = compose(&detail, Local::now());
            let batch = route(&payload, &summary.category, &self.subscribers);

            let dispatched = self.dispatcher.dispatch(&summary.id, &batch).await;
            stats.dispatch_attempted += dispatched.attempted;
            stats.dispatch_failed += dispatched.failed;

            // Ledger records "was processed", not "was delivered": commit
            // lands once every subscriber has been attempted, whatever the
            // individual outcomes.
            match self.ledger.commit(&summary.id, &summary.category).await {
                Ok(()) => {
                    info!(
                        bundle_id = %summary.id,
                        delivered = dispatched.attempted - dispatched.failed,
                        failed = dispatched.failed,
                        "Bundle processed"
                    );
                    stats.committed += 1;
                }
                Err(e) => {
                    // Unprocessed this run; the next run retries it.
                    let err = ScoutError::Persistence(e.to_string());
                    warn!(bundle_id = %summary.id, error = %err, "Ledger commit failed");
                    stats.commit_failed += 1;
                }
            }
        }

        info!("{stats}");
        Ok(stats)
    }
}
