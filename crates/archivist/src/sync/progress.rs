//! Progress reporting for sync runs.

use crate::entity::source_kind::SourceKind;

/// Progress events emitted during sync operations.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Starting to drain the remote listing for a scope.
    Listing {
        kind: SourceKind,
        scope_key: String,
    },

    /// One item was written because its content changed.
    ItemUpserted { remote_id: String },

    /// One item was skipped because its content hash matched.
    ItemUnchanged { remote_id: String },

    /// One item's write failed; the run continues.
    ItemFailed { remote_id: String, error: String },

    /// Full-sync cleanup finished for a scope.
    CleanupComplete { scope_key: String, removed: usize },

    /// One scope finished.
    ScopeComplete {
        scope_key: String,
        upserted: usize,
        unchanged: usize,
        failed: usize,
    },

    /// One scope aborted with a terminal error.
    ScopeFailed { scope_key: String, error: String },

    /// Starting a multi-scope run.
    SyncingScopes { count: usize },

    /// A multi-scope run finished.
    ScopesComplete { successful: usize, failed: usize },
}

/// Callback type for receiving progress events.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit an event if a callback is present.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
