//! Search index abstraction.
//!
//! Scroll-style pagination: an initial query returns the first page plus a
//! cursor, each continuation returns the next page plus a (possibly renewed)
//! cursor. Backends fetch exactly one page per call.

#[cfg(feature = "elasticsearch")]
mod elastic;
mod memory;

#[cfg(feature = "elasticsearch")]
pub use elastic::{ElasticsearchConfig, ElasticsearchIndex};
pub use memory::MemoryIndex;

use crate::error::{Result, SieveError};
use serde_json::Value;

/// Source field holding the document identifier.
pub const DOI_FIELD: &str = "DOI";

/// Source field holding the precomputed content hash.
pub const HASH_FIELD: &str = "HASH";

/// A single search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// The `DOI` source field.
    pub doi: String,
    /// The `HASH` source field.
    pub hash: String,
    /// The full source document.
    pub source: Value,
}

impl SearchHit {
    /// Build a hit from its source document.
    ///
    /// Fails when `DOI` or `HASH` is missing or not a string.
    pub fn from_source(source: Value) -> Result<Self> {
        let field = |name: &str| -> Result<String> {
            source
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| SieveError::Protocol(format!("hit has no string {} field", name)))
        };
        let doi = field(DOI_FIELD)?;
        let hash = field(HASH_FIELD)?;
        Ok(Self { doi, hash, source })
    }
}

/// One page of scroll results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollPage {
    /// Cursor for the next page, if the index returned one.
    pub scroll_id: Option<String>,
    /// Hits in this page.
    pub hits: Vec<SearchHit>,
}

/// Trait for scrollable search indexes.
#[allow(async_fn_in_trait)]
pub trait SearchIndex: Send + Sync {
    /// Open a scroll over `index` and return its first page.
    ///
    /// `keep_alive` is the cursor lifetime in the index's duration syntax
    /// (e.g. "2m").
    async fn search(
        &self,
        index: &str,
        query: &Value,
        page_size: usize,
        keep_alive: &str,
    ) -> Result<ScrollPage>;

    /// Fetch the page following `scroll_id`.
    ///
    /// An expired or unknown cursor is reported as
    /// [`SieveError::InvalidCursor`].
    async fn scroll(&self, scroll_id: &str, keep_alive: &str) -> Result<ScrollPage>;
}
