//! In-memory scrollable index for tests and dry runs.

use super::{ScrollPage, SearchHit, SearchIndex};
use crate::error::{Result, SieveError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Cursor {
    index: String,
    offset: usize,
    page_size: usize,
}

/// In-memory search index.
///
/// Every query matches every document of the index (the query body is
/// ignored). Cursors behave like Elasticsearch scroll ids: each continuation
/// returns the next page, and an exhausted scroll keeps answering with
/// empty pages until the cursor is expired.
pub struct MemoryIndex {
    indexes: HashMap<String, Vec<Value>>,
    cursors: Mutex<HashMap<String, Cursor>>,
    next_cursor: AtomicUsize,
    search_calls: AtomicUsize,
    scroll_calls: AtomicUsize,
}

impl MemoryIndex {
    /// Create an index set with no documents.
    #[must_use]
    pub fn new() -> Self {
        Self {
            indexes: HashMap::new(),
            cursors: Mutex::new(HashMap::new()),
            next_cursor: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            scroll_calls: AtomicUsize::new(0),
        }
    }

    /// Create `index` with no documents if it does not exist.
    pub fn create_index(&mut self, index: &str) {
        self.indexes.entry(index.to_string()).or_default();
    }

    /// Append a source document to `index`.
    pub fn insert(&mut self, index: &str, source: Value) {
        self.indexes
            .entry(index.to_string())
            .or_default()
            .push(source);
    }

    /// Number of initial searches served.
    #[must_use]
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::Relaxed)
    }

    /// Number of scroll continuations served.
    #[must_use]
    pub fn scroll_calls(&self) -> usize {
        self.scroll_calls.load(Ordering::Relaxed)
    }

    /// Forget every open cursor, as if their keep-alive lapsed.
    pub fn expire_cursors(&self) {
        self.lock_cursors().clear();
    }

    fn lock_cursors(&self) -> std::sync::MutexGuard<'_, HashMap<String, Cursor>> {
        // A poisoned map is still a valid map
        self.cursors.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn page(&self, cursor: &Cursor) -> Result<Vec<SearchHit>> {
        let docs = self.indexes.get(&cursor.index).map_or(&[][..], Vec::as_slice);
        docs.iter()
            .skip(cursor.offset)
            .take(cursor.page_size)
            .cloned()
            .map(SearchHit::from_source)
            .collect()
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchIndex for MemoryIndex {
    async fn search(
        &self,
        index: &str,
        _query: &Value,
        page_size: usize,
        _keep_alive: &str,
    ) -> Result<ScrollPage> {
        self.search_calls.fetch_add(1, Ordering::Relaxed);

        if !self.indexes.contains_key(index) {
            return Err(SieveError::Search(format!("no such index: {}", index)));
        }

        let mut cursor = Cursor {
            index: index.to_string(),
            offset: 0,
            page_size,
        };
        let hits = self.page(&cursor)?;
        cursor.offset += hits.len();

        let id = format!("scroll-{}", self.next_cursor.fetch_add(1, Ordering::Relaxed));
        self.lock_cursors().insert(id.clone(), cursor);

        Ok(ScrollPage {
            scroll_id: Some(id),
            hits,
        })
    }

    async fn scroll(&self, scroll_id: &str, _keep_alive: &str) -> Result<ScrollPage> {
        self.scroll_calls.fetch_add(1, Ordering::Relaxed);

        let mut cursors = self.lock_cursors();
        let cursor = cursors
            .get_mut(scroll_id)
            .ok_or_else(|| SieveError::InvalidCursor(format!("unknown scroll id {}", scroll_id)))?;

        let hits = self.page(cursor)?;
        cursor.offset += hits.len();

        Ok(ScrollPage {
            scroll_id: Some(scroll_id.to_string()),
            hits,
        })
    }
}
