//! MirroredItem entity - the unit of local storage.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::source_kind::SourceKind;

/// A remote item mirrored into the local store.
///
/// The natural key is (`source_kind`, `remote_id`) and is unique across the
/// store; the UUID is an internal surrogate. A shadow full-text index over
/// title and body is kept in lockstep by the mirror store's transactional
/// write path.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mirrored_items")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Identity ────────────────────────────────────────────────────────────
    /// Which remote source family this item belongs to.
    pub source_kind: SourceKind,
    /// Identifier assigned by the remote service (issue key, page id).
    pub remote_id: String,
    /// The grouping unit that bounds a sync run: project key for issues,
    /// space key for wiki pages.
    pub scope_key: String,

    // ─── Content ─────────────────────────────────────────────────────────────
    /// Item title (issue summary, page title).
    pub title: String,
    /// Opaque body text.
    #[sea_orm(column_type = "Text")]
    pub body: String,

    // ─── Change detection ────────────────────────────────────────────────────
    /// SHA-256 hex digest over normalized title/body/scope/revision.
    pub content_hash: String,
    /// Remote revision number, when the source provides one.
    pub remote_revision: Option<i64>,

    // ─── Timestamps ──────────────────────────────────────────────────────────
    /// When the item was created remotely.
    pub created_at: Option<DateTimeWithTimeZone>,
    /// When the item was last updated remotely.
    pub updated_at: Option<DateTimeWithTimeZone>,
    /// When this record was last written by a sync run.
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Compute the qualified identifier (kind/remote id).
    pub fn qualified_id(&self) -> String {
        format!("{}/{}", self.source_kind, self.remote_id)
    }
}
