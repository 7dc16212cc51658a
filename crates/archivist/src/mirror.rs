//! Content mirror store: persistent, full-text-indexed storage of mirrored
//! items plus per-scope sync bookkeeping.
//!
//! The store exclusively owns item and cursor persistence. The sync
//! orchestrator is its only writer; the command layer reads through the
//! query functions and never mutates rows directly.

pub mod errors;
mod hash;
pub mod query;
pub mod store;

pub use errors::StoreError;
pub use hash::content_hash;
pub use query::{PaginatedResult, Pagination, SearchHit, count_by_kind, list_by_scope, search};
pub use store::{
    ItemDraft, ItemVersion, MAX_BODY_BYTES, cursor_get, cursor_put, delete, delete_by_scope, get,
    has_changed, upsert, versions_by_scope,
};
