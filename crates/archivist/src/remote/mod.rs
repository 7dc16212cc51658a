//! Typed access to the remote issue-tracker and wiki service.
//!
//! One generic paged resource ([`resource::PagedResource`]) carries the
//! transport wiring for every entity type; the per-entity modules only
//! describe their endpoint and wire shape. The sync engine consumes
//! everything through the [`ItemSource`] trait.

pub mod client;
pub mod issues;
pub mod pages;
pub mod resource;
mod types;

use async_trait::async_trait;

use crate::entity::source_kind::SourceKind;
use crate::error::Result;
use crate::page_stream::Page;

pub use client::{ApiClient, RemoteConfig, StaticRemoteConfig};
pub use issues::IssueSource;
pub use pages::PageSource;
pub use resource::PagedResource;
pub use types::{PageEnvelope, RemoteItem};

/// A remote listing that can be drained one page at a time.
///
/// `fetch_page` takes the item offset of the next page and answers with the
/// items plus whether the listing is exhausted, matching what the paginated
/// stream fetcher expects. Failures arrive already shaped as taxonomy
/// values.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Which mirrored family this source feeds.
    fn source_kind(&self) -> SourceKind;

    /// Fetch one page of the listing for `scope_key`.
    async fn fetch_page(
        &self,
        scope_key: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Page<RemoteItem>>;
}
