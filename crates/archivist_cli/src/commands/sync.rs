use std::sync::Arc;

use archivist::remote::{IssueSource, ItemSource, PageSource};
use archivist::sync::{ScopeSyncResult, SyncMode, SyncOptions, sync_scope, sync_scopes};

use crate::commands::shared;
use crate::config::Config;
use crate::{CommonSyncOptions, progress, shutdown};

pub async fn run_issues(
    config: &Config,
    projects: Vec<String>,
    flags: CommonSyncOptions,
) -> anyhow::Result<()> {
    let client = shared::api_client(config)?;
    let source: Arc<dyn ItemSource> = Arc::new(IssueSource::new(client));
    run_sync(config, source, projects, flags).await
}

pub async fn run_pages(
    config: &Config,
    spaces: Vec<String>,
    flags: CommonSyncOptions,
) -> anyhow::Result<()> {
    let client = shared::api_client(config)?;
    let source: Arc<dyn ItemSource> = Arc::new(PageSource::new(client));
    run_sync(config, source, spaces, flags).await
}

async fn run_sync(
    config: &Config,
    source: Arc<dyn ItemSource>,
    scopes: Vec<String>,
    flags: CommonSyncOptions,
) -> anyhow::Result<()> {
    let db = shared::open_database(config).await?;
    let options = SyncOptions {
        page_size: flags.page_size.unwrap_or(config.sync.page_size),
        prefetch_depth: flags.prefetch.unwrap_or(config.sync.prefetch),
        scope_concurrency: flags.concurrency.unwrap_or(config.sync.concurrency),
    };
    let mode = if flags.full {
        SyncMode::Full
    } else {
        SyncMode::Incremental
    };

    let mut failed_scopes = 0usize;

    if options.scope_concurrency > 1 && scopes.len() > 1 {
        // Concurrent scopes report through their outcomes; per-item
        // progress is only wired up for the sequential path.
        let outcomes = sync_scopes(source, Arc::new(db), &scopes, mode, &options, None).await;
        for outcome in outcomes {
            match (outcome.result, outcome.error) {
                (Some(result), _) => report_scope(&result),
                (None, Some(error)) => {
                    failed_scopes += 1;
                    eprintln!("{}: sync failed: {error}", outcome.scope_key);
                }
                (None, None) => {}
            }
        }
    } else {
        for scope in &scopes {
            if shutdown::is_shutdown_requested() {
                eprintln!("Shutdown requested; remaining scopes skipped.");
                break;
            }
            let callback = progress::sync_callback(scope);
            match sync_scope(
                Arc::clone(&source),
                &db,
                scope,
                mode,
                &options,
                Some(&callback),
            )
            .await
            {
                Ok(result) => report_scope(&result),
                Err(e) => {
                    failed_scopes += 1;
                    eprintln!("{scope}: sync failed: {e}");
                }
            }
        }
    }

    if failed_scopes > 0 {
        anyhow::bail!("{failed_scopes} scope(s) failed to sync");
    }
    Ok(())
}

fn report_scope(result: &ScopeSyncResult) {
    let mut line = format!(
        "{}: {} upserted, {} unchanged, {} failed",
        result.scope_key, result.upserted, result.unchanged, result.failed
    );
    if result.removed > 0 {
        line.push_str(&format!(", {} removed", result.removed));
    }
    println!("{line}");

    if result.has_failures() {
        shared::print_failures(
            result
                .errors
                .iter()
                .map(|e| (e.remote_id.as_str(), e.message.as_str())),
            5,
        );
    }
}
