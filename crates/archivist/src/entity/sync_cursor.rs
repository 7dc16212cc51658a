//! SyncCursor entity - per (source kind, scope) sync bookkeeping.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::source_kind::SourceKind;

/// The last successful sync start time for one (source kind, scope key)
/// pair.
///
/// The natural key (`source_kind`, `scope_key`) is unique; the UUID is an
/// internal surrogate. Written only after a run's item processing has fully
/// committed, so an aborted run never advances the incremental window.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_cursors")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub source_kind: SourceKind,
    pub scope_key: String,
    /// Start time of the last fully-committed sync run.
    pub last_synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
