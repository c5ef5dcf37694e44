#![doc = "show-scraper-core: incremental ingestion engine for show-scraper."]

//! This crate contains the ingestion engine and the read side for show-scraper:
//! the remote catalog client with its retry policy, the per-page pipeline,
//! the worker loop, and the stores it persists into.
//!
//! # Usage
//! Build a [`worker::Worker`] from a [`contract::CatalogSource`] (usually a
//! [`source::TvMazeClient`]) and a store implementing both
//! [`contract::ShowRepository`] and [`contract::PageCursorStore`], then call
//! [`worker::Worker::run`] with a cancellation token.

pub mod config;
pub mod contract;
pub mod error;
pub mod memory;
pub mod model;
pub mod query;
pub mod retry;
pub mod source;
pub mod storage;
pub mod synchronise;
pub mod worker;
