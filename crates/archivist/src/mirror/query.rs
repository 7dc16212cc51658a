//! Read path for the content mirror: listings and full-text search.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Statement,
};
use uuid::Uuid;

use crate::entity::mirrored_item::{Column, Entity as MirroredItem, Model};
use crate::entity::source_kind::SourceKind;

use super::errors::{Result, StoreError};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    /// Page number (0-indexed).
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
}

const MIN_PER_PAGE: u64 = 1;

impl Pagination {
    /// Create a new pagination with the given page and per_page values.
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page,
            per_page: per_page.max(MIN_PER_PAGE),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: 50,
        }
    }
}

/// Result of a paginated query.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    /// The items for the current page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Current page number (0-indexed).
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

/// One full-text search hit, ranked best-first.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: Uuid,
    pub source_kind: SourceKind,
    pub remote_id: String,
    pub scope_key: String,
    pub title: String,
    /// bm25 rank; lower is a better match.
    pub rank: f64,
}

/// List mirrored items in a scope, ordered by remote id.
pub async fn list_by_scope(
    db: &DatabaseConnection,
    kind: SourceKind,
    scope_key: &str,
    pagination: Pagination,
) -> Result<PaginatedResult<Model>> {
    let paginator = MirroredItem::find()
        .filter(Column::SourceKind.eq(kind))
        .filter(Column::ScopeKey.eq(scope_key))
        .order_by_asc(Column::RemoteId)
        .paginate(db, pagination.per_page);

    let total = paginator.num_items().await?;
    let total_pages = paginator.num_pages().await?;
    let items = paginator.fetch_page(pagination.page).await?;

    Ok(PaginatedResult {
        items,
        total,
        page: pagination.page,
        per_page: pagination.per_page,
        total_pages,
    })
}

/// Count mirrored items per source kind.
pub async fn count_by_kind(db: &DatabaseConnection, kind: SourceKind) -> Result<u64> {
    MirroredItem::find()
        .filter(Column::SourceKind.eq(kind))
        .count(db)
        .await
        .map_err(StoreError::from)
}

/// Full-text search over mirrored titles and bodies.
///
/// `query` uses FTS5 match syntax; results are ranked by bm25, best match
/// first. The search index is kept in lockstep with the row table by the
/// write path, so a hit always resolves to a live row.
pub async fn search(
    db: &DatabaseConnection,
    query: &str,
    limit: u64,
) -> Result<Vec<SearchHit>> {
    if query.trim().is_empty() {
        return Err(StoreError::InvalidInput {
            message: "search query must not be empty".to_string(),
        });
    }

    let rows = db
        .query_all(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT m.id AS id, m.source_kind AS source_kind, m.remote_id AS remote_id, \
             m.scope_key AS scope_key, m.title AS title, \
             bm25(mirrored_items_fts) AS rank \
             FROM mirrored_items_fts \
             JOIN mirrored_items m \
             ON m.source_kind = mirrored_items_fts.source_kind \
             AND m.remote_id = mirrored_items_fts.remote_id \
             WHERE mirrored_items_fts MATCH ? \
             ORDER BY rank \
             LIMIT ?",
            [query.into(), (limit as i64).into()],
        ))
        .await?;

    rows.into_iter()
        .map(|row| {
            let kind: String = row.try_get("", "source_kind")?;
            let source_kind = kind
                .parse::<SourceKind>()
                .map_err(|e| StoreError::InvalidInput { message: e })?;
            Ok(SearchHit {
                id: row.try_get("", "id")?,
                source_kind,
                remote_id: row.try_get("", "remote_id")?,
                scope_key: row.try_get("", "scope_key")?,
                title: row.try_get("", "title")?,
                rank: row.try_get("", "rank")?,
            })
        })
        .collect()
}
