//! Initial migration to create the archivist database schema.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, Statement};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_mirrored_items(manager).await?;
        self.create_search_index(manager).await?;
        self.create_sync_cursors(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncCursors::Table).to_owned())
            .await?;

        let db = manager.get_connection();
        db.execute(Statement::from_string(
            manager.get_database_backend(),
            "DROP TABLE IF EXISTS mirrored_items_fts".to_string(),
        ))
        .await?;

        manager
            .drop_table(Table::drop().table(MirroredItems::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_mirrored_items(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MirroredItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MirroredItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // Identity
                    .col(
                        ColumnDef::new(MirroredItems::SourceKind)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MirroredItems::RemoteId).string().not_null())
                    .col(ColumnDef::new(MirroredItems::ScopeKey).string().not_null())
                    // Content
                    .col(ColumnDef::new(MirroredItems::Title).string().not_null())
                    .col(ColumnDef::new(MirroredItems::Body).text().not_null())
                    // Change detection
                    .col(
                        ColumnDef::new(MirroredItems::ContentHash)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MirroredItems::RemoteRevision)
                            .big_integer()
                            .null(),
                    )
                    // Timestamps
                    .col(
                        ColumnDef::new(MirroredItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MirroredItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MirroredItems::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // The composite identifier (source kind + remote id) is globally
        // unique in the store.
        manager
            .create_index(
                Index::create()
                    .name("idx_mirrored_items_natural_key")
                    .table(MirroredItems::Table)
                    .col(MirroredItems::SourceKind)
                    .col(MirroredItems::RemoteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_mirrored_items_scope")
                    .table(MirroredItems::Table)
                    .col(MirroredItems::SourceKind)
                    .col(MirroredItems::ScopeKey)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    /// The full-text index is an FTS5 virtual table, which sea-orm cannot
    /// express through the schema builder; it is created with raw SQL. The
    /// key columns are UNINDEXED so only title and body participate in
    /// matching.
    async fn create_search_index(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute(Statement::from_string(
            manager.get_database_backend(),
            "CREATE VIRTUAL TABLE IF NOT EXISTS mirrored_items_fts USING fts5(\
             source_kind UNINDEXED, remote_id UNINDEXED, scope_key UNINDEXED, \
             title, body)"
                .to_string(),
        ))
        .await?;
        Ok(())
    }

    async fn create_sync_cursors(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncCursors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncCursors::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SyncCursors::SourceKind).string().not_null())
                    .col(ColumnDef::new(SyncCursors::ScopeKey).string().not_null())
                    .col(
                        ColumnDef::new(SyncCursors::LastSyncedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sync_cursors_natural_key")
                    .table(SyncCursors::Table)
                    .col(SyncCursors::SourceKind)
                    .col(SyncCursors::ScopeKey)
                    .unique()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum MirroredItems {
    Table,
    Id,
    SourceKind,
    RemoteId,
    ScopeKey,
    Title,
    Body,
    ContentHash,
    RemoteRevision,
    CreatedAt,
    UpdatedAt,
    SyncedAt,
}

#[derive(DeriveIden)]
enum SyncCursors {
    Table,
    Id,
    SourceKind,
    ScopeKey,
    LastSyncedAt,
}
