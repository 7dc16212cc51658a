//! Bounded-concurrency batch execution with per-item results.
//!
//! A batch never aborts on first failure: each item's categorized failure is
//! captured into that item's slot while siblings keep running. Results come
//! back in input order so callers can zip them against their inputs.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::MirrorError;

/// Default concurrency cap for batch operations. Deliberately modest so a
/// fan-out of mutations does not trip the remote's rate limits.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

/// Outcome of one batch item: the original input plus success or a
/// categorized failure.
#[derive(Debug)]
pub struct BatchOutcome<I, T> {
    /// The input item this outcome belongs to.
    pub input: I,
    /// Success value or the failure that was captured for this item.
    pub result: Result<T, MirrorError>,
}

impl<I, T> BatchOutcome<I, T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary counts over a slice of outcomes.
#[must_use]
pub fn tally<I, T>(outcomes: &[BatchOutcome<I, T>]) -> (usize, usize) {
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    (succeeded, outcomes.len() - succeeded)
}

/// Run `op` over every item with at most `concurrency` operations in
/// flight.
///
/// The output always has exactly one entry per input, in input order,
/// regardless of how many items failed. A panicking operation is captured
/// into its own slot rather than tearing down the batch.
pub async fn run_all<I, T, F, Fut>(
    items: Vec<I>,
    concurrency: usize,
    op: F,
) -> Vec<BatchOutcome<I, T>>
where
    I: Clone + Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = Result<T, MirrorError>> + Send + 'static,
{
    if items.is_empty() {
        return Vec::new();
    }

    let concurrency = concurrency.clamp(1, items.len());
    let semaphore = Arc::new(Semaphore::new(concurrency));

    let mut handles = Vec::with_capacity(items.len());
    for item in items {
        let semaphore = Arc::clone(&semaphore);
        let op = op.clone();
        let task_item = item.clone();

        let handle = tokio::spawn(async move {
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    return Err(MirrorError::network("batch", "semaphore closed unexpectedly"));
                }
            };

            op(task_item).await
        });

        handles.push((item, handle));
    }

    // Awaiting handles in spawn order keeps outcomes in input order even
    // though completion order is arbitrary.
    let mut outcomes = Vec::with_capacity(handles.len());
    for (input, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "batch task panicked");
                Err(MirrorError::network("batch", format!("task panic: {e}")))
            }
        };
        outcomes.push(BatchOutcome { input, result });
    }
    outcomes
}
