//! Error types for the ingestion engine.
//!
//! Not-found on a catalog page is not an error: [`crate::contract::CatalogSource::fetch_page`]
//! answers `Ok(None)` for it. Everything here is either retried by
//! [`crate::retry::RetryPolicy`] or propagated to the caller.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the remote catalog.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport-level failure (connect, timeout, reset, body read).
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    /// The body arrived but was not the JSON shape we expect.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request cancelled")]
    Cancelled,
}

impl SourceError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SourceError::Status { status, .. } => Some(*status),
            SourceError::Http { source, .. } | SourceError::Decode { source, .. } => {
                source.status()
            }
            SourceError::Cancelled => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(StatusCode::TOO_MANY_REQUESTS)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SourceError::Cancelled)
    }
}

/// Failures of the record or cursor store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A second insert for an identity already stored. The pipeline checks
    /// before inserting, so this only surfaces when two workers share a store.
    #[error("show {0} is already stored")]
    DuplicateShow(u64),

    #[error("show id {0} does not fit the database key")]
    IdOutOfRange(u64),

    #[error("stored page cursor {0} is not a valid page number")]
    CorruptCursor(i64),
}

/// A page that could not be ingested. The page is left uncommitted.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("remote source fault: {0}")]
    Source(#[from] SourceError),

    #[error("store fault: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    /// True when the page stopped because the worker was asked to shut down.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, IngestError::Source(SourceError::Cancelled))
    }
}

/// Errors of the read side.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("pageNumber and pageSize must be positive integers (got pageNumber={page_number}, pageSize={page_size})")]
    InvalidPagination { page_number: u32, page_size: u32 },

    #[error("no shows found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}
