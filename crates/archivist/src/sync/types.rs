//! Shared sync types and constants.

use chrono::{DateTime, Utc};

use crate::page_stream::{DEFAULT_PAGE_SIZE, DEFAULT_PREFETCH_DEPTH};

/// Default number of scopes synced concurrently.
pub const DEFAULT_SCOPE_CONCURRENCY: usize = 2;

/// How a sync run treats items that disappeared remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Mirror what the listing yields; leave absent items alone.
    Incremental,
    /// Additionally delete previously-mirrored items absent from the
    /// re-enumerated listing.
    Full,
}

/// Options for syncing a scope.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Items requested per page.
    pub page_size: u64,
    /// Pages buffered ahead of the consumer.
    pub prefetch_depth: usize,
    /// Maximum scopes synced concurrently.
    pub scope_concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            prefetch_depth: DEFAULT_PREFETCH_DEPTH,
            scope_concurrency: DEFAULT_SCOPE_CONCURRENCY,
        }
    }
}

/// One item-level failure captured during a run.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    /// Remote id of the failing item.
    pub remote_id: String,
    /// Taxonomy tag of the failure.
    pub category: String,
    /// Human-readable message.
    pub message: String,
}

/// Result of syncing a single scope.
#[derive(Debug)]
pub struct ScopeSyncResult {
    /// The scope that was synced.
    pub scope_key: String,
    /// Start time of the run; becomes the cursor on success.
    pub started_at: DateTime<Utc>,
    /// Number of remote items listed.
    pub processed: usize,
    /// Items written because their content hash changed (or was new).
    pub upserted: usize,
    /// Items skipped because their content hash matched.
    pub unchanged: usize,
    /// Items whose write failed; the run continued past them.
    pub failed: usize,
    /// Previously-mirrored items deleted by a full sync.
    pub removed: usize,
    /// The captured item-level failures.
    pub errors: Vec<ItemFailure>,
}

impl ScopeSyncResult {
    pub(crate) fn new(scope_key: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            scope_key: scope_key.to_string(),
            started_at,
            processed: 0,
            upserted: 0,
            unchanged: 0,
            failed: 0,
            removed: 0,
            errors: Vec::new(),
        }
    }

    /// Whether any item-level failure was captured.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Result of syncing one scope out of a multi-scope run.
#[derive(Debug)]
pub struct ScopeOutcome {
    /// The scope key.
    pub scope_key: String,
    /// The sync result, when the run completed.
    pub result: Option<ScopeSyncResult>,
    /// The terminal error, when the run aborted.
    pub error: Option<String>,
}
