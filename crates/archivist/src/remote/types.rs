//! Shared wire and boundary types for the remote layer.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The paging envelope every listing endpoint answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Whether this is the final page of the listing.
    #[serde(rename = "isLast", default)]
    pub is_last: bool,
}

/// A remote item normalized to the shape the sync engine consumes,
/// independent of which entity family it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    /// Identifier assigned by the remote service.
    pub remote_id: String,
    /// Title (issue summary, page title).
    pub title: String,
    /// Opaque body text.
    pub body: String,
    /// Remote revision number, when the source provides one.
    pub revision: Option<i64>,
    /// When the item was created remotely.
    pub created_at: Option<DateTime<Utc>>,
    /// When the item was last updated remotely.
    pub updated_at: Option<DateTime<Utc>>,
}
