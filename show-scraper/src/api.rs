//! HTTP read API over the show store.
//!
//! # Route Structure
//!
//! - `GET /shows?pageNumber=N&pageSize=M` - One page of shows ordered by id
//! - `GET /shows/:id` - A single show
//! - `POST /shows` - Store a show directly, bypassing ingestion
//!
//! Cast in every response is ordered by birthday, youngest first, with
//! unknown birthdays last. Missing, malformed or non-positive paging values
//! are a `400`; an empty page or unknown id is a `404`.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use show_scraper_core::config::ServerConfig;
use show_scraper_core::contract::ShowRepository;
use show_scraper_core::error::{QueryError, StoreError};
use show_scraper_core::model::Show;
use show_scraper_core::query;

type ShowStore = Arc<dyn ShowRepository>;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
}

/// Binds `config.listen_addr` and serves until `cancel` fires.
pub async fn serve(
    config: &ServerConfig,
    shows: ShowStore,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "Read API listening");

    axum::serve(listener, router(shows))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    tracing::info!("Read API stopped");
    Ok(())
}

pub fn router(shows: ShowStore) -> Router {
    Router::new()
        .route("/shows", get(list_shows).post(create_show))
        .route("/shows/:id", get(get_show))
        .layer(TraceLayer::new_for_http())
        .with_state(shows)
}

#[tracing::instrument(skip_all)]
async fn list_shows(
    State(shows): State<ShowStore>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Show>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let page = query::list_shows(&shows, params.page_number, params.page_size).await?;
    Ok(Json(page))
}

#[tracing::instrument(skip_all)]
async fn get_show(
    State(shows): State<ShowStore>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Show>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(Json(query::get_show(&shows, id).await?))
}

#[tracing::instrument(skip_all)]
async fn create_show(
    State(shows): State<ShowStore>,
    Json(show): Json<Show>,
) -> Result<Response, ApiError> {
    shows.insert(show.clone()).await?;
    tracing::info!(show_id = show.id, "Show created via API");

    let location = format!("/shows/{}", show.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(show)).into_response())
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidPagination { .. } => ApiError::BadRequest(err.to_string()),
            QueryError::NotFound => ApiError::NotFound(err.to_string()),
            QueryError::Store(store) => store.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateShow(_) => ApiError::Conflict(err.to_string()),
            other => {
                tracing::error!(error = %other, "Store failure while serving request");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
