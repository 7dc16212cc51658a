//! Archivist - a local searchable mirror of a remote issue tracker and wiki.
//!
//! This library fetches tracked issues and wiki pages over HTTP, mirrors
//! them into a local SQLite store with a full-text index, and keeps the
//! mirror fresh with incremental, failure-tolerant sync runs.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use archivist::remote::{ApiClient, IssueSource, StaticRemoteConfig};
//! use archivist::sync::{SyncMode, SyncOptions, sync_scope};
//! use archivist::transport::reqwest_transport::ReqwestTransport;
//!
//! let db = archivist::connect_and_migrate("sqlite://archivist.db?mode=rwc").await?;
//! let client = Arc::new(ApiClient::new(
//!     Arc::new(ReqwestTransport::default()),
//!     Arc::new(StaticRemoteConfig::new("https://tracker.example.com", token)),
//! ));
//! let source = Arc::new(IssueSource::new(client));
//!
//! let result = sync_scope(source, &db, "OPS", SyncMode::Incremental,
//!     &SyncOptions::default(), None).await?;
//! println!("{} upserted, {} unchanged", result.upserted, result.unchanged);
//! ```

pub mod batch;
pub mod db;
pub mod entity;
pub mod error;
pub mod migration;
pub mod mirror;
pub mod page_stream;
pub mod remote;
pub mod retry;
pub mod sync;
pub mod transport;

pub use batch::{BatchOutcome, run_all};
pub use db::{connect, connect_and_migrate};
pub use entity::prelude::*;
pub use error::{ErrorKind, MirrorError};
pub use mirror::StoreError;
pub use page_stream::{Page, fetch_items};
pub use retry::{RetryConfig, RetryPolicy};
