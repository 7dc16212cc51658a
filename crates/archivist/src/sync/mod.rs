//! Sync orchestration for the content mirror.
//!
//! - [`types`] - Core types: `ScopeSyncResult`, `SyncOptions`, `SyncMode`
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`engine`] - The orchestrator: `sync_scope()`, `sync_scopes()`

pub mod engine;
mod progress;
mod types;

pub use engine::{sync_scope, sync_scopes};
pub use progress::{ProgressCallback, SyncProgress, emit};
pub use types::{
    DEFAULT_SCOPE_CONCURRENCY, ItemFailure, ScopeOutcome, ScopeSyncResult, SyncMode, SyncOptions,
};
