//! Write path and sync bookkeeping for the content mirror.
//!
//! All writes are transactional: the row table and its full-text index are
//! updated inside one transaction, so a partially-written item (row present,
//! index stale or vice versa) is never observable. The sync orchestrator is
//! the only writer; command-layer readers go through [`super::query`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, Set, Statement, TransactionTrait, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::entity::mirrored_item::{ActiveModel, Column, Entity as MirroredItem, Model};
use crate::entity::source_kind::SourceKind;
use crate::entity::sync_cursor::{
    ActiveModel as CursorActiveModel, Column as CursorColumn, Entity as SyncCursor,
};

use super::errors::{Result, StoreError};

/// Maximum accepted body size in bytes. Larger bodies are rejected with a
/// distinct error rather than silently truncated.
pub const MAX_BODY_BYTES: usize = 1_048_576;

/// The validated input to [`upsert`]: one remote item ready for mirroring.
#[derive(Debug, Clone)]
pub struct ItemDraft {
    pub source_kind: SourceKind,
    pub remote_id: String,
    pub scope_key: String,
    pub title: String,
    pub body: String,
    pub content_hash: String,
    pub remote_revision: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Version bookkeeping for one mirrored item, used by cleanup sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemVersion {
    pub revision: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
    pub synced_at: DateTime<Utc>,
}

fn validate(draft: &ItemDraft) -> Result<()> {
    if draft.remote_id.trim().is_empty() {
        return Err(StoreError::InvalidInput {
            message: "remote_id must not be empty".to_string(),
        });
    }
    if draft.scope_key.trim().is_empty() {
        return Err(StoreError::InvalidInput {
            message: "scope_key must not be empty".to_string(),
        });
    }
    if draft.body.len() > MAX_BODY_BYTES {
        return Err(StoreError::BodyTooLarge {
            size: draft.body.len(),
            max: MAX_BODY_BYTES,
        });
    }
    Ok(())
}

/// Replace the full-text index entry for `item` inside `txn`.
async fn reindex(txn: &DatabaseTransaction, item: &Model) -> Result<()> {
    let backend = txn.get_database_backend();
    txn.execute(Statement::from_sql_and_values(
        backend,
        "DELETE FROM mirrored_items_fts WHERE source_kind = ? AND remote_id = ?",
        [item.source_kind.as_str().into(), item.remote_id.clone().into()],
    ))
    .await?;
    txn.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO mirrored_items_fts (source_kind, remote_id, scope_key, title, body) \
         VALUES (?, ?, ?, ?, ?)",
        [
            item.source_kind.as_str().into(),
            item.remote_id.clone().into(),
            item.scope_key.clone().into(),
            item.title.clone().into(),
            item.body.clone().into(),
        ],
    ))
    .await?;
    Ok(())
}

/// Insert or update a mirrored item by its natural key.
///
/// Validation happens before any I/O. The row write and the index write
/// share one transaction; failure of either rolls both back. `synced_at` is
/// refreshed on every successful write, including writes of unchanged
/// content.
pub async fn upsert(db: &DatabaseConnection, draft: ItemDraft) -> Result<Model> {
    validate(&draft)?;

    let txn = db.begin().await?;

    let existing = MirroredItem::find()
        .filter(Column::SourceKind.eq(draft.source_kind))
        .filter(Column::RemoteId.eq(draft.remote_id.as_str()))
        .one(&txn)
        .await?;

    let model = ActiveModel {
        id: Set(existing.as_ref().map_or_else(Uuid::new_v4, |m| m.id)),
        source_kind: Set(draft.source_kind),
        remote_id: Set(draft.remote_id),
        scope_key: Set(draft.scope_key),
        title: Set(draft.title),
        body: Set(draft.body),
        content_hash: Set(draft.content_hash),
        remote_revision: Set(draft.remote_revision),
        created_at: Set(draft.created_at.map(|t| t.fixed_offset())),
        updated_at: Set(draft.updated_at.map(|t| t.fixed_offset())),
        synced_at: Set(Utc::now().fixed_offset()),
    };

    let saved = if existing.is_some() {
        model.update(&txn).await?
    } else {
        model.insert(&txn).await?
    };

    reindex(&txn, &saved).await?;
    txn.commit().await?;

    Ok(saved)
}

/// Find a mirrored item by its natural key.
pub async fn get(
    db: &DatabaseConnection,
    kind: SourceKind,
    remote_id: &str,
) -> Result<Option<Model>> {
    MirroredItem::find()
        .filter(Column::SourceKind.eq(kind))
        .filter(Column::RemoteId.eq(remote_id))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Whether the stored content hash differs from `new_hash`.
///
/// A missing row counts as changed, so a first sync always writes.
pub async fn has_changed(
    db: &DatabaseConnection,
    kind: SourceKind,
    remote_id: &str,
    new_hash: &str,
) -> Result<bool> {
    let existing = get(db, kind, remote_id).await?;
    Ok(existing.map_or(true, |m| m.content_hash != new_hash))
}

/// Delete one mirrored item and its index entry. Returns whether a row was
/// removed.
pub async fn delete(db: &DatabaseConnection, kind: SourceKind, remote_id: &str) -> Result<bool> {
    let txn = db.begin().await?;

    txn.execute(Statement::from_sql_and_values(
        txn.get_database_backend(),
        "DELETE FROM mirrored_items_fts WHERE source_kind = ? AND remote_id = ?",
        [kind.as_str().into(), remote_id.into()],
    ))
    .await?;

    let result = MirroredItem::delete_many()
        .filter(Column::SourceKind.eq(kind))
        .filter(Column::RemoteId.eq(remote_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(result.rows_affected > 0)
}

/// Delete every mirrored item in a scope together with its index entries.
///
/// Used when a full re-enumeration of the scope shows that previously
/// mirrored items no longer exist remotely. Returns the number of rows
/// removed.
pub async fn delete_by_scope(
    db: &DatabaseConnection,
    kind: SourceKind,
    scope_key: &str,
) -> Result<u64> {
    let txn = db.begin().await?;

    txn.execute(Statement::from_sql_and_values(
        txn.get_database_backend(),
        "DELETE FROM mirrored_items_fts WHERE source_kind = ? AND scope_key = ?",
        [kind.as_str().into(), scope_key.into()],
    ))
    .await?;

    let result = MirroredItem::delete_many()
        .filter(Column::SourceKind.eq(kind))
        .filter(Column::ScopeKey.eq(scope_key))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(result.rows_affected)
}

/// Version bookkeeping for every mirrored item in a scope, keyed by remote
/// id.
pub async fn versions_by_scope(
    db: &DatabaseConnection,
    kind: SourceKind,
    scope_key: &str,
) -> Result<HashMap<String, ItemVersion>> {
    let rows = MirroredItem::find()
        .filter(Column::SourceKind.eq(kind))
        .filter(Column::ScopeKey.eq(scope_key))
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|m| {
            (
                m.remote_id,
                ItemVersion {
                    revision: m.remote_revision,
                    updated_at: m.updated_at.map(|t| t.to_utc()),
                    synced_at: m.synced_at.to_utc(),
                },
            )
        })
        .collect())
}

/// Read the sync cursor for a (source kind, scope) pair.
pub async fn cursor_get(
    db: &DatabaseConnection,
    kind: SourceKind,
    scope_key: &str,
) -> Result<Option<DateTime<Utc>>> {
    let cursor = SyncCursor::find()
        .filter(CursorColumn::SourceKind.eq(kind))
        .filter(CursorColumn::ScopeKey.eq(scope_key))
        .one(db)
        .await?;
    Ok(cursor.map(|c| c.last_synced_at.to_utc()))
}

/// Write the sync cursor for a (source kind, scope) pair.
///
/// Called by the orchestrator only after a run's item processing has fully
/// committed; `at` is the run's start time.
pub async fn cursor_put(
    db: &DatabaseConnection,
    kind: SourceKind,
    scope_key: &str,
    at: DateTime<Utc>,
) -> Result<()> {
    let active = CursorActiveModel {
        id: Set(Uuid::new_v4()),
        source_kind: Set(kind),
        scope_key: Set(scope_key.to_string()),
        last_synced_at: Set(at.fixed_offset()),
    };

    SyncCursor::insert(active)
        .on_conflict(
            OnConflict::columns([CursorColumn::SourceKind, CursorColumn::ScopeKey])
                .update_column(CursorColumn::LastSyncedAt)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}
