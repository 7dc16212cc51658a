//! Database entities for the local mirror.

pub mod mirrored_item;
pub mod prelude;
pub mod source_kind;
pub mod sync_cursor;

pub use source_kind::SourceKind;
