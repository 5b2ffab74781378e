//! Draining search results through scroll cursors.
//!
//! A scroll returns at most `page_size` hits per response. The loop keeps
//! asking for the next page until one comes back empty; that empty page is
//! the terminator and contributes nothing.

use serde_json::Value;
use sieve_core::search::{SearchHit, SearchIndex};
use sieve_core::{Result, SieveError};
use tracing::{debug, info};

/// Historical page size for scroll requests.
pub const DEFAULT_PAGE_SIZE: usize = 10_000;

/// Historical cursor lifetime.
pub const DEFAULT_KEEP_ALIVE: &str = "2m";

/// Scroll request settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollOptions {
    /// Hits per page.
    pub page_size: usize,
    /// Cursor lifetime between requests, in the index's duration syntax.
    pub keep_alive: String,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            keep_alive: DEFAULT_KEEP_ALIVE.to_string(),
        }
    }
}

/// Every hit matching `query` in `index`, in fetch order.
///
/// # Errors
///
/// Index errors propagate. A non-empty page without a cursor, or a cursor
/// the index no longer accepts, is [`SieveError::InvalidCursor`]; the
/// scroll is not restarted.
pub async fn collect_hits<I: SearchIndex>(
    index: &I,
    index_name: &str,
    query: &Value,
    options: &ScrollOptions,
) -> Result<Vec<SearchHit>> {
    if options.page_size == 0 {
        return Err(SieveError::InvalidArgument(
            "scroll page size must be > 0".to_string(),
        ));
    }

    let mut hits: Vec<SearchHit> = Vec::new();
    let mut pages = 0usize;

    let mut page = index
        .search(index_name, query, options.page_size, &options.keep_alive)
        .await?;

    while !page.hits.is_empty() {
        pages += 1;
        let cursor = page.scroll_id.take().ok_or_else(|| {
            SieveError::InvalidCursor(format!(
                "page {} of {} has no scroll id",
                pages, index_name
            ))
        })?;

        for hit in page.hits {
            debug!(count = hits.len() + 1, doi = %hit.doi, hash = %hit.hash, "Hit");
            hits.push(hit);
        }

        page = index.scroll(&cursor, &options.keep_alive).await?;
    }

    info!(index = %index_name, pages, hits = hits.len(), "Scroll drained");
    Ok(hits)
}

/// `HASH` of every matching hit, sorted ascending, with the default
/// [`ScrollOptions`].
pub async fn collect<I: SearchIndex>(
    index: &I,
    index_name: &str,
    query: &Value,
) -> Result<Vec<String>> {
    collect_with(index, index_name, query, &ScrollOptions::default()).await
}

/// [`collect`] with explicit options.
pub async fn collect_with<I: SearchIndex>(
    index: &I,
    index_name: &str,
    query: &Value,
    options: &ScrollOptions,
) -> Result<Vec<String>> {
    let mut hashes: Vec<String> = collect_hits(index, index_name, query, options)
        .await?
        .into_iter()
        .map(|hit| hit.hash)
        .collect();
    hashes.sort_unstable();
    Ok(hashes)
}
