//! Reconciliation sweep.
//!
//! Pending records bound the orphan window: a client that got a presigned
//! URL and walked away leaves a `Pending` record and possibly a partially
//! uploaded object. The sweep reclaims both once the record is older than
//! the staleness window. Records are processed independently; one failure
//! never aborts the pass.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;

use stowage_core::{AppError, Config};
use stowage_db::FileRepository;
use stowage_storage::ObjectGateway;

use crate::deletion::purge_objects;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records reclaimed (metadata removed, objects purged best-effort).
    pub swept: usize,
    /// Records that could not be reclaimed this pass.
    pub failed: usize,
}

/// Periodic reclamation of stale pending uploads.
#[derive(Clone)]
pub struct SweepService {
    repository: Arc<dyn FileRepository>,
    object_store: Arc<dyn ObjectGateway>,
    staleness: chrono::Duration,
    sweep_interval: Duration,
    page_size: i64,
}

impl SweepService {
    pub fn new(
        repository: Arc<dyn FileRepository>,
        object_store: Arc<dyn ObjectGateway>,
        staleness: chrono::Duration,
        sweep_interval: Duration,
        page_size: i64,
    ) -> Self {
        Self {
            repository,
            object_store,
            staleness,
            sweep_interval,
            page_size,
        }
    }

    pub fn from_config(
        repository: Arc<dyn FileRepository>,
        object_store: Arc<dyn ObjectGateway>,
        config: &Config,
    ) -> Self {
        Self::new(
            repository,
            object_store,
            chrono::Duration::seconds(config.stale_pending_secs),
            Duration::from_secs(config.sweep_interval_secs),
            config.sweep_page_size,
        )
    }

    /// Start the background sweep loop. Returns a JoinHandle for graceful
    /// shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.sweep_interval);

            loop {
                sweep_interval.tick().await;

                match self.sweep_once().await {
                    Ok(report) => {
                        tracing::info!(
                            swept = report.swept,
                            failed = report.failed,
                            "Reconciliation sweep completed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reconciliation sweep failed");
                    }
                }
            }
        })
    }

    /// One full pass over stale pending records.
    pub async fn sweep_once(&self) -> Result<SweepReport, AppError> {
        let cutoff = Utc::now() - self.staleness;
        let mut report = SweepReport::default();

        loop {
            let page = self
                .repository
                .list_stale_pending(cutoff, self.page_size)
                .await?;
            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            let mut reclaimed_in_page = 0usize;

            for record in page {
                match self.repository.delete(record.kind, record.id).await {
                    Ok(deleted) => {
                        purge_objects(self.object_store.as_ref(), &deleted).await;
                        tracing::info!(
                            record_id = %record.id,
                            kind = record.kind.as_str(),
                            code = %record.code,
                            created_at = %record.created_at,
                            "Stale pending upload reclaimed"
                        );
                        report.swept += 1;
                        reclaimed_in_page += 1;
                    }
                    // Someone else (a concurrent sweep or an explicit
                    // delete) got there first; nothing left to reclaim.
                    Err(AppError::NotFound(_)) => {
                        reclaimed_in_page += 1;
                    }
                    Err(e) => {
                        tracing::error!(
                            record_id = %record.id,
                            error = %e,
                            "Failed to reclaim stale pending record"
                        );
                        report.failed += 1;
                    }
                }
            }

            if page_len < self.page_size as usize {
                break;
            }
            // Every record in the page failed; a full retry next pass beats
            // spinning on the same page now.
            if reclaimed_in_page == 0 {
                break;
            }
        }

        Ok(report)
    }
}
