//! The TVmaze-backed [`CatalogSource`].
//!
//! Two endpoints are used:
//! - `GET {base}/shows?page={n}`: a page of shows, 404 once past the last page.
//! - `GET {base}/shows/{id}/cast`: the cast of one show, `[]` when it has none.
//!
//! Every request goes through the client's [`RetryPolicy`]. A 404 on a page
//! is the end of the catalog and is returned as `Ok(None)` without retrying;
//! a 404 on a cast request is a fault, since the show was listed moments ago.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::contract::CatalogSource;
use crate::error::SourceError;
use crate::model::{CastCredit, CatalogShow};
use crate::retry::RetryPolicy;

const USER_AGENT: &str = concat!("show-scraper/", env!("CARGO_PKG_VERSION"));

pub struct TvMazeClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl TvMazeClient {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(base_url = %base_url, retry = ?retry, "Initialized catalog client");
        Ok(TvMazeClient {
            http,
            base_url,
            retry,
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.base_url.clone(),
            config.request_timeout(),
            config.retry.policy(),
        )
    }

    fn page_url(&self, page: u32) -> String {
        format!("{}/shows?page={page}", self.base_url)
    }

    fn cast_url(&self, show_id: u64) -> String {
        format!("{}/shows/{show_id}/cast", self.base_url)
    }

    /// GET `url` and decode the body. 404 resolves to `Ok(None)` on the first
    /// attempt; every other failure is classified by the retry policy.
    async fn get_json<T>(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, SourceError>
    where
        T: DeserializeOwned,
    {
        let http = &self.http;
        self.retry
            .run(cancel, move || async move {
                let response = http
                    .get(url)
                    .send()
                    .await
                    .map_err(|source| SourceError::Http {
                        url: url.to_string(),
                        source,
                    })?;

                let status = response.status();
                if status == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if !status.is_success() {
                    return Err(SourceError::Status {
                        url: url.to_string(),
                        status,
                    });
                }

                let body = response.json::<T>().await.map_err(|source| {
                    if source.is_decode() {
                        SourceError::Decode {
                            url: url.to_string(),
                            source,
                        }
                    } else {
                        SourceError::Http {
                            url: url.to_string(),
                            source,
                        }
                    }
                })?;
                Ok(Some(body))
            })
            .await
    }
}

#[async_trait]
impl CatalogSource for TvMazeClient {
    async fn fetch_page(
        &self,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<CatalogShow>>, SourceError> {
        let url = self.page_url(page);
        debug!(page, url = %url, "Fetching catalog page");
        let shows = self.get_json::<Vec<CatalogShow>>(&url, cancel).await?;
        if shows.is_none() {
            info!(page, "Catalog page not found");
        }
        Ok(shows)
    }

    async fn fetch_cast(
        &self,
        show_id: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<CastCredit>, SourceError> {
        let url = self.cast_url(show_id);
        debug!(show_id, url = %url, "Fetching cast");
        match self.get_json::<Vec<CastCredit>>(&url, cancel).await? {
            Some(cast) => Ok(cast),
            None => Err(SourceError::Status {
                url,
                status: StatusCode::NOT_FOUND,
            }),
        }
    }
}
