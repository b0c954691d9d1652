//! Paginated, non-live feed reads.
//!
//! "Load more" style consumption goes through a single bounded query with a
//! document cursor, independent of the live multiplexer, but sorted with the
//! same canonical ordering rule.

use crate::error::AttendanceResult;
use crate::store::{Document, QueryOptions};

use super::multiplexer::{FeedRegistry, sort_canonical};

/// A bounded page request.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Maximum number of documents to return.
    pub limit: usize,
    /// Resume after this document id, from the previous page's
    /// `next_cursor_id`.
    pub cursor_id: Option<String>,
}

/// One page of feed documents.
#[derive(Debug, Clone)]
pub struct Page {
    /// The page contents, canonically sorted.
    pub items: Vec<Document>,
    /// Cursor for the next page; `None` when the feed is exhausted.
    pub next_cursor_id: Option<String>,
}

impl FeedRegistry {
    /// Reads one page of a feed without touching the live multiplexer.
    pub async fn fetch_page(&self, feed: &str, request: PageRequest) -> AttendanceResult<Page> {
        let documents = self
            .store()
            .query(
                feed,
                QueryOptions {
                    order_by: "timeIn".to_string(),
                    descending: true,
                    limit: request.limit,
                    start_after_id: request.cursor_id,
                },
            )
            .await?;

        // The cursor tracks store order; capture it before the local re-sort.
        let next_cursor_id = (documents.len() == request.limit)
            .then(|| documents.last().map(|doc| doc.id.clone()))
            .flatten();

        let mut items = documents;
        sort_canonical(&mut items);

        Ok(Page {
            items,
            next_cursor_id,
        })
    }
}
