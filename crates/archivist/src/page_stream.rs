//! Lazy item streams over paginated remote listings.
//!
//! [`fetch_items`] turns a page-fetch function into a stream of items that
//! fetches ahead of the consumer by a bounded number of pages. Fetching page
//! N+1 overlaps with the consumer processing page N, without ever buffering
//! the whole remote collection.
//!
//! A page failure terminates the stream: the consumer observes every item
//! yielded so far followed by the error, never a silently truncated stream
//! that looks complete. Restarting means calling [`fetch_items`] again;
//! there is no mid-stream resume.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::error::{MirrorError, Result};

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Default number of pages buffered ahead of consumer demand.
pub const DEFAULT_PREFETCH_DEPTH: usize = 5;

/// One page of a remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page, in remote listing order.
    pub items: Vec<T>,
    /// Whether the remote reports this as the final page.
    pub is_last: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, is_last: bool) -> Self {
        Self { items, is_last }
    }

    /// A final page.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            is_last: true,
        }
    }
}

enum PageEvent<T> {
    Items(Vec<T>),
    Failed(MirrorError),
}

/// A lazy, finite stream of items produced by [`fetch_items`].
///
/// Dropping the stream aborts the background page fetcher.
pub struct ItemStream<T> {
    rx: mpsc::Receiver<PageEvent<T>>,
    buffered: VecDeque<T>,
    finished: bool,
    producer: tokio::task::JoinHandle<()>,
}

impl<T: Unpin> Stream for ItemStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(item) = this.buffered.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }
            if this.finished {
                return Poll::Ready(None);
            }
            match this.rx.poll_recv(cx) {
                Poll::Ready(Some(PageEvent::Items(items))) => {
                    // An empty page yields nothing; loop to poll the next
                    // event instead of returning a phantom item.
                    this.buffered.extend(items);
                }
                Poll::Ready(Some(PageEvent::Failed(err))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl<T> Drop for ItemStream<T> {
    fn drop(&mut self) {
        self.producer.abort();
    }
}

/// Drive `fetch` from offset 0, yielding items lazily.
///
/// `fetch` receives the item offset of the next page. The produced sequence
/// ends when a page reports `is_last` or comes back with fewer than
/// `page_size` items. At most `prefetch_depth` fetched pages are buffered
/// ahead of the consumer.
pub fn fetch_items<T, F, Fut>(page_size: u64, prefetch_depth: usize, fetch: F) -> ItemStream<T>
where
    T: Send + 'static,
    F: Fn(u64) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Page<T>>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(prefetch_depth.max(1));

    let producer = tokio::spawn(async move {
        let mut offset = 0u64;
        loop {
            match fetch(offset).await {
                Ok(page) => {
                    let fetched = page.items.len() as u64;
                    let is_last = page.is_last || fetched < page_size;
                    tracing::debug!(offset, count = fetched, is_last, "fetched page");

                    // A closed receiver means the consumer went away.
                    if tx.send(PageEvent::Items(page.items)).await.is_err() {
                        break;
                    }
                    if is_last {
                        break;
                    }
                    offset += fetched;
                }
                Err(err) => {
                    tracing::debug!(offset, error = %err, "page fetch failed");
                    let _ = tx.send(PageEvent::Failed(err)).await;
                    break;
                }
            }
        }
    });

    ItemStream {
        rx,
        buffered: VecDeque::new(),
        finished: false,
        producer,
    }
}
