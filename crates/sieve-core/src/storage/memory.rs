//! In-memory object store for tests and dry runs.

use super::{ListPage, ObjectStore, DEFAULT_PAGE_SIZE};
use crate::error::{Result, SieveError};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory object store.
///
/// Pages like S3 and counts listing requests, so callers can assert how
/// many round trips an enumeration took.
pub struct MemoryStore {
    buckets: BTreeMap<String, BTreeMap<String, Bytes>>,
    page_size: usize,
    report_truncation: bool,
    list_calls: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store with the default page size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            report_truncation: true,
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Set the maximum number of keys per page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Leave the truncation indicator out of every page.
    #[must_use]
    pub fn without_truncation_flag(mut self) -> Self {
        self.report_truncation = false;
        self
    }

    /// Create `bucket` if it does not exist.
    pub fn create_bucket(&mut self, bucket: &str) {
        self.buckets.entry(bucket.to_string()).or_default();
    }

    /// Store `data` under `bucket`/`key`, creating the bucket as needed.
    pub fn insert(&mut self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.into());
    }

    /// Remove `bucket`/`key`. Returns whether it existed.
    pub fn remove(&mut self, bucket: &str, key: &str) -> bool {
        self.buckets
            .get_mut(bucket)
            .is_some_and(|objects| objects.remove(key).is_some())
    }

    /// Number of `list_page` calls served so far.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    fn objects(&self, bucket: &str) -> Result<&BTreeMap<String, Bytes>> {
        self.buckets
            .get(bucket)
            .ok_or_else(|| SieveError::NotFound(format!("bucket {}", bucket)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);

        let mut matching = self
            .objects(bucket)?
            .keys()
            .filter(|key| key.starts_with(prefix))
            .filter(|key| marker.map_or(true, |m| key.as_str() > m));

        let keys: Vec<String> = matching.by_ref().take(self.page_size).cloned().collect();
        let more = matching.next().is_some();

        Ok(ListPage {
            keys,
            is_truncated: self.report_truncation.then_some(more),
        })
    }

    async fn download(&self, bucket: &str, key: &str, destination: &Path) -> Result<()> {
        let data = self
            .objects(bucket)?
            .get(key)
            .ok_or_else(|| SieveError::NotFound(format!("{}/{}", bucket, key)))?;
        tokio::fs::write(destination, data).await?;
        Ok(())
    }
}
