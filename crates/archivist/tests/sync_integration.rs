//! Integration tests for sync runs against a real (in-memory) store.
//!
//! These exercise the orchestrator end to end: pagination, change
//! detection, partial failure, cleanup, and cursor discipline. Timeouts
//! guard against hangs from deadlocks or spin loops.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use archivist::SourceKind;
use archivist::connect_and_migrate;
use archivist::error::Result;
use archivist::mirror;
use archivist::page_stream::Page;
use archivist::remote::{ItemSource, RemoteItem};
use archivist::sync::{SyncMode, SyncOptions, SyncProgress, sync_scope};

/// Maximum time any sync operation should take in tests.
const SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// An in-memory source serving a fixed item set through offset/limit pages.
struct FixtureSource {
    kind: SourceKind,
    items: Mutex<Vec<RemoteItem>>,
    pages_served: AtomicUsize,
}

impl FixtureSource {
    fn new(kind: SourceKind, items: Vec<RemoteItem>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            items: Mutex::new(items),
            pages_served: AtomicUsize::new(0),
        })
    }

    fn replace_items(&self, items: Vec<RemoteItem>) {
        *self.items.lock().expect("items lock") = items;
        self.pages_served.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemSource for FixtureSource {
    fn source_kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch_page(
        &self,
        _scope_key: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Page<RemoteItem>> {
        self.pages_served.fetch_add(1, Ordering::SeqCst);
        let items = self.items.lock().expect("items lock");
        let start = (offset as usize).min(items.len());
        let end = (start + limit as usize).min(items.len());
        let is_last = end == items.len();
        Ok(Page::new(items[start..end].to_vec(), is_last))
    }
}

fn issue(n: u32, body: &str) -> RemoteItem {
    RemoteItem {
        remote_id: format!("OPS-{n}"),
        title: format!("Issue number {n}"),
        body: body.to_string(),
        revision: None,
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}

async fn run(
    source: Arc<FixtureSource>,
    db: &sea_orm::DatabaseConnection,
    scope: &str,
    mode: SyncMode,
    options: &SyncOptions,
) -> archivist::sync::ScopeSyncResult {
    tokio::time::timeout(
        SYNC_TIMEOUT,
        sync_scope(source as Arc<dyn ItemSource>, db, scope, mode, options, None),
    )
    .await
    .expect("sync must not hang")
    .expect("sync must succeed")
}

// ─── Incremental Sync ──────────────────────────────────────────────────────────

#[tokio::test]
async fn incremental_sync_writes_once_then_skips_unchanged() {
    let db = connect_and_migrate("sqlite::memory:").await.expect("db");

    // 150 items across two pages of 100.
    let items: Vec<RemoteItem> = (1..=150).map(|n| issue(n, "original")).collect();
    let source = FixtureSource::new(SourceKind::TrackedIssue, items.clone());

    let options = SyncOptions {
        page_size: 100,
        prefetch_depth: 5,
        ..SyncOptions::default()
    };

    let first = run(
        Arc::clone(&source),
        &db,
        "OPS",
        SyncMode::Incremental,
        &options,
    )
    .await;
    assert_eq!(first.processed, 150);
    assert_eq!(first.upserted, 150);
    assert_eq!(first.unchanged, 0);
    assert_eq!(first.failed, 0);
    assert_eq!(source.pages_served.load(Ordering::SeqCst), 2);

    let t0 = mirror::cursor_get(&db, SourceKind::TrackedIssue, "OPS")
        .await
        .expect("cursor read")
        .expect("cursor must be set after a clean run");
    assert_eq!(
        t0.timestamp_millis(),
        first.started_at.timestamp_millis(),
        "cursor must be the run's start time"
    );

    // One remote edit; everything else untouched.
    let mut edited = items;
    edited[41] = issue(42, "edited body");
    source.replace_items(edited);

    let second = run(
        Arc::clone(&source),
        &db,
        "OPS",
        SyncMode::Incremental,
        &options,
    )
    .await;
    assert_eq!(second.processed, 150);
    assert_eq!(second.upserted, 1);
    assert_eq!(second.unchanged, 149);

    let t1 = mirror::cursor_get(&db, SourceKind::TrackedIssue, "OPS")
        .await
        .expect("cursor read")
        .expect("cursor");
    assert!(t1 > t0, "cursor must advance across runs");

    let item = mirror::get(&db, SourceKind::TrackedIssue, "OPS-42")
        .await
        .expect("get")
        .expect("row");
    assert_eq!(item.body, "edited body");
}

#[tokio::test]
async fn sync_counts_survive_item_level_failures() {
    let db = connect_and_migrate("sqlite::memory:").await.expect("db");

    let mut items: Vec<RemoteItem> = (1..=9).map(|n| issue(n, "ok")).collect();
    // Tenth item has an empty id and will be rejected by store validation.
    items.push(RemoteItem {
        remote_id: String::new(),
        title: "broken".to_string(),
        body: "broken".to_string(),
        revision: None,
        created_at: None,
        updated_at: None,
    });
    let source = FixtureSource::new(SourceKind::TrackedIssue, items);

    let result = run(
        source,
        &db,
        "OPS",
        SyncMode::Incremental,
        &SyncOptions::default(),
    )
    .await;

    assert_eq!(result.processed, 10);
    assert_eq!(result.upserted, 9);
    assert_eq!(result.failed, 1);
    assert!(result.has_failures());
    assert_eq!(result.errors[0].category, "validation");

    // Even a run with item failures commits the cursor; only enumeration
    // failures leave it untouched.
    assert!(
        mirror::cursor_get(&db, SourceKind::TrackedIssue, "OPS")
            .await
            .expect("cursor read")
            .is_some()
    );
}

// ─── Cleanup Sync ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn cleanup_sync_removes_items_gone_from_remote() {
    let db = connect_and_migrate("sqlite::memory:").await.expect("db");

    let a = issue(1, "alpha");
    let b = issue(2, "beta");
    let c = issue(3, "gamma");
    let source = FixtureSource::new(
        SourceKind::TrackedIssue,
        vec![a.clone(), b.clone(), c.clone()],
    );

    run(
        Arc::clone(&source),
        &db,
        "OPS",
        SyncMode::Full,
        &SyncOptions::default(),
    )
    .await;

    // Remote now lists only A and C.
    source.replace_items(vec![a, c]);
    let result = run(
        Arc::clone(&source),
        &db,
        "OPS",
        SyncMode::Full,
        &SyncOptions::default(),
    )
    .await;

    assert_eq!(result.removed, 1);
    assert_eq!(result.unchanged, 2, "A and C are untouched");

    assert!(mirror::get(&db, SourceKind::TrackedIssue, "OPS-2")
        .await
        .expect("get")
        .is_none());
    assert!(mirror::get(&db, SourceKind::TrackedIssue, "OPS-1")
        .await
        .expect("get")
        .is_some());
    assert!(mirror::get(&db, SourceKind::TrackedIssue, "OPS-3")
        .await
        .expect("get")
        .is_some());

    // The deleted item also left the search index.
    let hits = mirror::search(&db, "beta", 10).await.expect("search");
    assert!(hits.is_empty());
}

// ─── Progress & Scope Independence ─────────────────────────────────────────────

#[tokio::test]
async fn progress_events_cover_every_item() {
    let db = connect_and_migrate("sqlite::memory:").await.expect("db");
    let source = FixtureSource::new(
        SourceKind::WikiPage,
        (1..=5)
            .map(|n| RemoteItem {
                remote_id: n.to_string(),
                title: format!("Page {n}"),
                body: "words".to_string(),
                revision: Some(1),
                created_at: None,
                updated_at: None,
            })
            .collect(),
    );

    let events = Arc::new(Mutex::new(Vec::new()));
    let events_capture = Arc::clone(&events);
    let callback: archivist::sync::ProgressCallback = Box::new(move |event| {
        events_capture.lock().expect("events lock").push(event);
    });

    let result = tokio::time::timeout(
        SYNC_TIMEOUT,
        sync_scope(
            source as Arc<dyn ItemSource>,
            &db,
            "DOCS",
            SyncMode::Incremental,
            &SyncOptions::default(),
            Some(&callback),
        ),
    )
    .await
    .expect("no hang")
    .expect("sync");
    assert_eq!(result.upserted, 5);

    let events = events.lock().expect("events lock");
    let upserts = events
        .iter()
        .filter(|e| matches!(e, SyncProgress::ItemUpserted { .. }))
        .count();
    assert_eq!(upserts, 5);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SyncProgress::ScopeComplete { .. }))
    );
}

#[tokio::test]
async fn scopes_of_different_kinds_do_not_interfere() {
    let db = connect_and_migrate("sqlite::memory:").await.expect("db");

    let issues = FixtureSource::new(SourceKind::TrackedIssue, vec![issue(1, "issue body")]);
    let pages = FixtureSource::new(
        SourceKind::WikiPage,
        vec![RemoteItem {
            remote_id: "1".to_string(),
            title: "Page".to_string(),
            body: "page body".to_string(),
            revision: None,
            created_at: None,
            updated_at: None,
        }],
    );

    run(issues, &db, "OPS", SyncMode::Full, &SyncOptions::default()).await;
    run(pages, &db, "DOCS", SyncMode::Full, &SyncOptions::default()).await;

    // Same remote_id namespace ("1") under different kinds coexists; the
    // wiki cleanup never touched the issue rows.
    assert!(mirror::get(&db, SourceKind::TrackedIssue, "OPS-1")
        .await
        .expect("get")
        .is_some());
    assert!(mirror::get(&db, SourceKind::WikiPage, "1")
        .await
        .expect("get")
        .is_some());

    let issue_cursor = mirror::cursor_get(&db, SourceKind::TrackedIssue, "OPS")
        .await
        .expect("cursor");
    let page_cursor = mirror::cursor_get(&db, SourceKind::WikiPage, "DOCS")
        .await
        .expect("cursor");
    assert!(issue_cursor.is_some());
    assert!(page_cursor.is_some());
}
