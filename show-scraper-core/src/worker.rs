//! The ingestion loop.
//!
//! ```text
//!  Resuming ──► Running(page = cursor + 1) ──► Running(page + 1) ─┐
//!     ▲                │  ▲                                        │
//!     │                │  └────────────── records processed ◄──────┘
//!     │           exhausted
//!     │                ▼
//!     └──────────── Sleeping ───── cancelled ──► Stopped
//! ```
//!
//! [`Worker::run_cycle`] walks pages from the cursor until the catalog is
//! exhausted (`Resuming` and `Running`). [`Worker::run`] repeats cycles
//! forever with a pause in between (`Sleeping`) until `Stopped`.
//! Cancellation is observed before every page and during the pause; in-flight
//! requests are abandoned and the page they belong to stays uncommitted.
//! Any other fault ends the loop with an error.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::contract::{CatalogSource, PageCursorStore, ShowRepository};
use crate::error::IngestError;
use crate::synchronise::{ingest_page, PageOutcome};

/// Position within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleState {
    Resuming,
    Running { page: u32 },
}

/// Position of the loop around cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Ingesting,
    Sleeping,
    Stopped,
}

/// How a cycle came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEnd {
    /// The source had no page with this number.
    Exhausted { page: u32 },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub pages_committed: Vec<u32>,
    pub shows_inserted: usize,
    pub end: CycleEnd,
}

pub struct Worker<S, R, C> {
    source: S,
    shows: R,
    cursor: C,
    poll_interval: Duration,
}

impl<S, R, C> Worker<S, R, C>
where
    S: CatalogSource,
    R: ShowRepository,
    C: PageCursorStore,
{
    pub fn new(source: S, shows: R, cursor: C, poll_interval: Duration) -> Self {
        Worker {
            source,
            shows,
            cursor,
            poll_interval,
        }
    }

    /// Ingest pages starting after the cursor until the source is exhausted
    /// or `cancel` fires.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport, IngestError> {
        let mut report = CycleReport {
            pages_committed: Vec::new(),
            shows_inserted: 0,
            end: CycleEnd::Cancelled,
        };

        let mut state = CycleState::Resuming;
        loop {
            state = match state {
                CycleState::Resuming => {
                    let page = self.cursor.last_completed_page().await? + 1;
                    info!(page, "[WORKER] Resuming after last committed page");
                    CycleState::Running { page }
                }
                CycleState::Running { page } => {
                    if cancel.is_cancelled() {
                        break;
                    }
                    match ingest_page(page, &self.source, &self.shows, &self.cursor, cancel).await {
                        Ok(PageOutcome::RecordsProcessed(page_report)) => {
                            report.pages_committed.push(page_report.page);
                            report.shows_inserted += page_report.inserted;
                            CycleState::Running { page: page + 1 }
                        }
                        Ok(PageOutcome::Exhausted) => {
                            report.end = CycleEnd::Exhausted { page };
                            return Ok(report);
                        }
                        Err(e) if e.is_cancelled() => break,
                        Err(e) => {
                            error!(page, error = %e, "[WORKER][ERROR] Page ingestion failed, stopping");
                            return Err(e);
                        }
                    }
                }
            };
        }

        info!(
            pages = report.pages_committed.len(),
            "[WORKER] Cancelled, stopping cycle"
        );
        Ok(report)
    }

    /// Run cycles until `cancel` fires, pausing `poll_interval` after each
    /// cycle that reached the end of the catalog.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<(), IngestError> {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "[WORKER] Starting ingestion loop"
        );
        let mut state = WorkerState::Ingesting;
        loop {
            state = match state {
                WorkerState::Ingesting => {
                    let report = self.run_cycle(cancel).await?;
                    match report.end {
                        CycleEnd::Exhausted { page } => {
                            info!(
                                exhausted_at = page,
                                pages = report.pages_committed.len(),
                                inserted = report.shows_inserted,
                                "[WORKER] Catalog exhausted, stopping search"
                            );
                            WorkerState::Sleeping
                        }
                        CycleEnd::Cancelled => WorkerState::Stopped,
                    }
                }
                WorkerState::Sleeping => {
                    info!(
                        interval_secs = self.poll_interval.as_secs(),
                        "[WORKER] Sleeping before next cycle"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => WorkerState::Stopped,
                        _ = tokio::time::sleep(self.poll_interval) => WorkerState::Ingesting,
                    }
                }
                WorkerState::Stopped => {
                    info!("[WORKER] Ingestion loop stopped");
                    return Ok(());
                }
            };
        }
    }
}
