//! Per-page pipeline: fetch a catalog page → enrich unseen shows → commit the page.
//!
//! This module ingests exactly one catalog page. For each show on the page,
//! in source order, it:
//!   - Skips the show if the repository already holds its identity (no cast
//!     fetch, no write)
//!   - Otherwise fetches its cast, maps it with [`Show::from_catalog`] and inserts it
//!
//! Only when every show on the page has been handled is the page marked
//! completed in the [`PageCursorStore`].
//!
//! # Outcomes
//! [`ingest_page`] has three outcomes:
//! - `Ok(PageOutcome::RecordsProcessed(_))`: the page existed and is committed
//!   (an empty page counts, and is committed too)
//! - `Ok(PageOutcome::Exhausted)`: the source has no such page; nothing is committed
//! - `Err(IngestError)`: a fault survived the retry policy, or the store failed
//!
//! # Error Handling
//! Fail-fast: the first fault aborts the page. Shows already inserted from
//! that page stay; they are skipped when the page is ingested again, and the
//! page itself is never committed by a failed attempt.
//!
//! # Concurrency
//! The existence check and the insert are two separate calls. One pipeline
//! per store at a time.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::contract::{CatalogSource, PageCursorStore, ShowRepository};
use crate::error::IngestError;
use crate::model::Show;

/// Result of ingesting one page that did not fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    RecordsProcessed(PageReport),
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub page: u32,
    pub fetched: usize,
    pub inserted: usize,
    pub skipped: usize,
}

pub async fn ingest_page<S, R, C>(
    page: u32,
    source: &S,
    shows: &R,
    cursor: &C,
    cancel: &CancellationToken,
) -> Result<PageOutcome, IngestError>
where
    S: CatalogSource + ?Sized,
    R: ShowRepository + ?Sized,
    C: PageCursorStore + ?Sized,
{
    let started = Instant::now();
    info!(page, "[INGEST] Loading catalog page");

    let catalog = match source.fetch_page(page, cancel).await {
        Ok(Some(catalog)) => catalog,
        Ok(None) => {
            info!(page, "[INGEST] Catalog page not found, pagination exhausted");
            return Ok(PageOutcome::Exhausted);
        }
        Err(e) => {
            if !e.is_cancelled() {
                error!(page, error = %e, "[INGEST][ERROR] Fetching catalog page failed");
            }
            return Err(e.into());
        }
    };

    let mut report = PageReport {
        page,
        fetched: catalog.len(),
        inserted: 0,
        skipped: 0,
    };

    for entry in &catalog {
        if shows.find_by_id(entry.id).await?.is_some() {
            debug!(page, show_id = entry.id, "[INGEST] Show already stored, skipping");
            report.skipped += 1;
            continue;
        }

        let cast = match source.fetch_cast(entry.id, cancel).await {
            Ok(cast) => cast,
            Err(e) => {
                if !e.is_cancelled() {
                    error!(page, show_id = entry.id, error = %e, "[INGEST][ERROR] Fetching cast failed");
                }
                return Err(e.into());
            }
        };

        let show = Show::from_catalog(entry, &cast);
        debug!(
            page,
            show_id = show.id,
            name = %show.name,
            cast = show.cast.len(),
            "[INGEST] Storing new show"
        );
        shows.insert(show).await?;
        report.inserted += 1;
    }

    cursor.mark_page_completed(page).await?;
    info!(
        page,
        fetched = report.fetched,
        inserted = report.inserted,
        skipped = report.skipped,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "[INGEST] Page committed"
    );

    Ok(PageOutcome::RecordsProcessed(report))
}
