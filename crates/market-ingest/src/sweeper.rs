use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use market_store::ItemQuery;
use market_types::{HashStatus, Item};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{IngestError, IngestResult};
use crate::pipeline::IngestPipeline;

/// Counts from one sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub repaired: usize,
    pub failed: usize,
}

/// Background task that finishes hashing for records left `Pending` or
/// `Failed` by an interrupted create.
///
/// Pending records younger than `grace` are skipped; they most likely belong
/// to a create that is still in flight.
#[derive(Debug, Clone)]
pub struct RepairSweeper {
    pipeline: Arc<IngestPipeline>,
    interval: Duration,
    grace: Duration,
}

/// Shortest accepted sweep period; `tokio::time::interval` rejects zero.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

impl RepairSweeper {
    /// `interval` is raised to [`MIN_SWEEP_INTERVAL`] if shorter.
    pub fn new(pipeline: Arc<IngestPipeline>, interval: Duration, grace: Duration) -> Self {
        Self {
            pipeline,
            interval: interval.max(MIN_SWEEP_INTERVAL),
            grace,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Repair every eligible record once.
    pub async fn sweep_once(&self) -> IngestResult<SweepReport> {
        let candidates = self.candidates().await?;
        let mut report = SweepReport {
            scanned: candidates.len(),
            ..SweepReport::default()
        };

        for item in candidates {
            match self.pipeline.repair(&item.id).await {
                Ok(_) => report.repaired += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::debug!(id = %item.id, error = %e, "repair attempt failed");
                }
            }
        }

        if report.scanned > 0 {
            tracing::info!(
                scanned = report.scanned,
                repaired = report.repaired,
                failed = report.failed,
                "repair sweep finished"
            );
        }
        Ok(report)
    }

    /// Run `sweep_once` every `interval` until `shutdown` turns `true` or its
    /// sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so startup is quiet.
            ticker.tick().await;

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.sweep_once().await {
                            tracing::warn!(error = %e, "repair sweep aborted");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("repair sweeper stopped");
        })
    }

    async fn candidates(&self) -> IngestResult<Vec<Item>> {
        let grace = chrono::Duration::from_std(self.grace).unwrap_or(chrono::Duration::zero());
        let cutoff = Utc::now() - grace;
        let items = self.pipeline.items();

        let mut found = items
            .find(&ItemQuery::hash_status(HashStatus::Pending).created_before(cutoff))
            .await
            .map_err(scan_failure)?;
        found.extend(
            items
                .find(&ItemQuery::hash_status(HashStatus::Failed))
                .await
                .map_err(scan_failure)?,
        );
        Ok(found)
    }
}

fn scan_failure(e: market_store::StoreError) -> IngestError {
    IngestError::PersistenceFailure {
        id: None,
        detail: format!("repair scan: {e}"),
    }
}
