//! # contract: the seams between the ingestion engine and the outside world
//!
//! The engine talks to three collaborators, each behind a trait:
//! - [`CatalogSource`]: the remote catalog (pages of shows, cast per show).
//! - [`ShowRepository`]: durable keyed storage of ingested shows.
//! - [`PageCursorStore`]: the highest page fully ingested.
//!
//! All methods are async and the traits are `Send + Sync`, so a single
//! [`crate::worker::Worker`] can own them and drive them from a tokio task.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`; the generated `Mock*` types are
//!   exported under the default `test-export-mocks` feature so integration
//!   tests and downstream crates can script them.
//!
//! ## Adding a new backend
//! - Implement [`ShowRepository`] and [`PageCursorStore`] for it. One type may
//!   implement both, as [`crate::storage::SqliteStore`] does.
//! - `mark_page_completed` must tolerate being called twice with the same page.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::{SourceError, StoreError};
use crate::model::{CastCredit, CatalogShow, Show};

/// The remote catalog. Implementations own their retry behaviour.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one page of the catalog.
    ///
    /// `Ok(None)` means the source has no such page: pagination is exhausted.
    /// A present but empty page is `Ok(Some(vec![]))`.
    async fn fetch_page(
        &self,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<CatalogShow>>, SourceError>;

    /// Fetch the cast of one show. A show without cast yields an empty list.
    async fn fetch_cast(
        &self,
        show_id: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<CastCredit>, SourceError>;
}

/// Keyed storage of persisted shows.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ShowRepository: Send + Sync {
    async fn insert(&self, show: Show) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<Show>, StoreError>;

    /// Shows ordered by identity, skipping `offset` and returning at most `limit`.
    /// Cast is returned in stored order.
    async fn list_shows(&self, offset: u64, limit: u32) -> Result<Vec<Show>, StoreError>;
}

/// Durable record of which catalog pages are fully ingested.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageCursorStore: Send + Sync {
    /// Highest committed page, or 0 if none has been committed yet.
    async fn last_completed_page(&self) -> Result<u32, StoreError>;

    /// Record that `page` is fully ingested. Idempotent.
    async fn mark_page_completed(&self, page: u32) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: ShowRepository + ?Sized> ShowRepository for Arc<T> {
    async fn insert(&self, show: Show) -> Result<(), StoreError> {
        (**self).insert(show).await
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Show>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn list_shows(&self, offset: u64, limit: u32) -> Result<Vec<Show>, StoreError> {
        (**self).list_shows(offset, limit).await
    }
}

#[async_trait]
impl<T: PageCursorStore + ?Sized> PageCursorStore for Arc<T> {
    async fn last_completed_page(&self) -> Result<u32, StoreError> {
        (**self).last_completed_page().await
    }

    async fn mark_page_completed(&self, page: u32) -> Result<(), StoreError> {
        (**self).mark_page_completed(page).await
    }
}
