//! Terminal progress reporting for sync runs.
//!
//! On a TTY, a live spinner shows running counts; otherwise events are
//! logged through tracing so non-interactive runs (cron, CI) still leave a
//! trail.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

use archivist::sync::{ProgressCallback, SyncProgress};

/// Build the progress callback for one scope's sync run.
pub fn sync_callback(scope: &str) -> ProgressCallback {
    if Term::stdout().is_term() {
        interactive_callback(scope)
    } else {
        logging_callback()
    }
}

fn interactive_callback(scope: &str) -> ProgressCallback {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar.set_message(format!("{scope}: listing remote items..."));

    let scope = scope.to_string();
    let upserted = AtomicUsize::new(0);
    let unchanged = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    Box::new(move |event| {
        match event {
            SyncProgress::ItemUpserted { .. } => {
                upserted.fetch_add(1, Ordering::Relaxed);
            }
            SyncProgress::ItemUnchanged { .. } => {
                unchanged.fetch_add(1, Ordering::Relaxed);
            }
            SyncProgress::ItemFailed { .. } => {
                failed.fetch_add(1, Ordering::Relaxed);
            }
            SyncProgress::CleanupComplete { removed, .. } => {
                if removed > 0 {
                    bar.println(format!("{scope}: removed {removed} stale items"));
                }
                return;
            }
            SyncProgress::ScopeComplete { .. } => {
                bar.finish_and_clear();
                return;
            }
            _ => return,
        }
        bar.set_message(format!(
            "{scope}: {} upserted, {} unchanged, {} failed",
            upserted.load(Ordering::Relaxed),
            unchanged.load(Ordering::Relaxed),
            failed.load(Ordering::Relaxed),
        ));
    })
}

fn logging_callback() -> ProgressCallback {
    Box::new(move |event| match event {
        SyncProgress::Listing { kind, scope_key } => {
            tracing::info!(kind = %kind, scope = %scope_key, "listing remote items");
        }
        SyncProgress::ItemUpserted { remote_id } => {
            tracing::debug!(remote_id = %remote_id, "upserted");
        }
        SyncProgress::ItemUnchanged { remote_id } => {
            tracing::debug!(remote_id = %remote_id, "unchanged");
        }
        SyncProgress::ItemFailed { remote_id, error } => {
            tracing::warn!(remote_id = %remote_id, error = %error, "item failed");
        }
        SyncProgress::CleanupComplete { scope_key, removed } => {
            tracing::info!(scope = %scope_key, removed, "cleanup complete");
        }
        SyncProgress::ScopeComplete {
            scope_key,
            upserted,
            unchanged,
            failed,
        } => {
            tracing::info!(scope = %scope_key, upserted, unchanged, failed, "scope complete");
        }
        _ => {}
    })
}
