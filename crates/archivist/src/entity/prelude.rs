//! Re-exports of entity types under their conventional names.

pub use super::mirrored_item::Entity as MirroredItem;
pub use super::source_kind::SourceKind;
pub use super::sync_cursor::Entity as SyncCursor;
