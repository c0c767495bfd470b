//! Offset pagination over registry listings
//!
//! [`PageCursor`] holds the pagination state and applies the termination
//! rules; [`page_stream`] turns a cursor plus a single-page fetch function
//! into a lazy [`PageStream`]. Nothing is fetched until the stream is polled,
//! and dropping the stream stops all further requests.

use futures_util::stream;
use std::future::Future;
use tracing::{debug, info};

use super::{FetcherResult, PageStream};
use crate::Page;

/// What the cursor decided after receiving a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    /// Yield the batch; more pages may follow
    Continue,
    /// Yield the batch; it is the last one
    Last,
    /// Yield nothing; pagination is over
    Stop,
}

/// Pagination state for one listing pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    category: String,
    page: usize,
    page_size: usize,
    max_pages: Option<usize>,
    done: bool,
}

impl PageCursor {
    /// Start at page 0
    pub fn new(category: impl Into<String>, page_size: usize, max_pages: Option<usize>) -> Self {
        Self {
            category: category.into(),
            page: 0,
            page_size,
            max_pages,
            done: false,
        }
    }

    /// Category being listed
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Current 0-based page index
    pub fn page(&self) -> usize {
        self.page
    }

    /// Items requested per page
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Whether the cursor has reached a terminal state
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Page to fetch next, or `None` once pagination is over
    pub fn next_page(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        if let Some(max_pages) = self.max_pages {
            if self.page >= max_pages {
                info!(
                    "Reached max_pages limit ({}) for category '{}'",
                    max_pages, self.category
                );
                self.done = true;
                return None;
            }
        }
        Some(self.page)
    }

    /// Apply the termination rules to a received page
    ///
    /// An empty batch ends pagination without yielding. Otherwise the batch
    /// is yielded and pagination ends once `(page + 1) * page_size >= total`.
    pub fn record(&mut self, page: &Page) -> PageStep {
        if page.items.is_empty() {
            info!("No more results for category '{}'", self.category);
            self.done = true;
            return PageStep::Stop;
        }

        let fetched = (self.page as u64 + 1).saturating_mul(self.page_size as u64);
        if fetched >= page.total {
            info!(
                "Fetched all {} products for category '{}'",
                page.total, self.category
            );
            self.done = true;
            return PageStep::Last;
        }

        self.page += 1;
        PageStep::Continue
    }

    /// Mark the cursor terminal (after a failed page fetch)
    pub fn finish(&mut self) {
        self.done = true;
    }
}

/// Build a lazy stream of page batches
///
/// `fetch` is called with a 0-based page index and must perform one listing
/// call (retries happen inside it). A failed fetch is yielded once as `Err`
/// and ends the stream; batches already yielded stand.
pub fn page_stream<'a, F, Fut>(cursor: PageCursor, fetch: F) -> PageStream<'a>
where
    F: Fn(usize) -> Fut + Send + 'a,
    Fut: Future<Output = FetcherResult<Page>> + Send + 'a,
{
    let stream = stream::unfold((cursor, fetch), |(mut cursor, fetch)| async move {
        let Some(page_index) = cursor.next_page() else {
            return None;
        };
        debug!(
            "Fetching page {} for category '{}'",
            page_index,
            cursor.category()
        );

        match fetch(page_index).await {
            Ok(page) => match cursor.record(&page) {
                PageStep::Stop => None,
                PageStep::Continue | PageStep::Last => {
                    crate::metrics::record_page(cursor.category());
                    Some((Ok(page.items), (cursor, fetch)))
                }
            },
            Err(e) => {
                cursor.finish();
                Some((Err(e), (cursor, fetch)))
            }
        }
    });

    Box::pin(stream)
}
