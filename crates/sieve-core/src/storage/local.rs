//! Local filesystem object store.
//!
//! Buckets are directories under a root, keys are `/`-separated paths
//! relative to the bucket directory. Listing is paginated exactly like S3
//! so the same enumeration loop runs against both.

use super::{ListPage, ObjectStore, DEFAULT_PAGE_SIZE};
use crate::error::{Result, SieveError};
use std::path::{Path, PathBuf};

/// Local filesystem object store.
pub struct LocalStore {
    root: PathBuf,
    page_size: usize,
}

impl LocalStore {
    /// Create a new local store rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Use a different maximum number of keys per listing page.
    pub fn with_page_size(mut self, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(SieveError::InvalidArgument(
                "page size must be > 0".to_string(),
            ));
        }
        self.page_size = page_size;
        Ok(self)
    }

    /// Root directory of this store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maximum number of keys returned per page.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    /// Sorted keys starting with `prefix`.
    ///
    /// The walk starts at the directory named by `prefix` up to its last
    /// `/` and skips subdirectories that cannot hold a matching key.
    async fn keys_under(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let bucket_dir = self.bucket_path(bucket);
        if !bucket_dir.is_dir() {
            return Err(SieveError::NotFound(format!("bucket {}", bucket)));
        }

        let Some(start) = walk_start(&bucket_dir, prefix) else {
            return Ok(Vec::new());
        };
        if !start.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut pending = vec![start];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let Some(key) = key_of(&bucket_dir, &path) else {
                    continue;
                };
                if entry.file_type().await?.is_dir() {
                    let dir_key = format!("{}/", key);
                    if dir_key.starts_with(prefix) || prefix.starts_with(&dir_key) {
                        pending.push(path);
                    }
                } else if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// Directory holding every key that can match `prefix`, or `None` when
/// the prefix names a path outside the bucket.
fn walk_start(bucket_dir: &Path, prefix: &str) -> Option<PathBuf> {
    let dir_part = prefix.rfind('/').map_or("", |i| &prefix[..i]);
    let mut start = bucket_dir.to_path_buf();
    for part in dir_part.split('/').filter(|p| !p.is_empty()) {
        if part == "." || part == ".." {
            return None;
        }
        start.push(part);
    }
    Some(start)
}

fn key_of(bucket_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(bucket_dir).ok()?;
    Some(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

impl ObjectStore for LocalStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> Result<ListPage> {
        let mut matching = self
            .keys_under(bucket, prefix)
            .await?
            .into_iter()
            .filter(|key| marker.map_or(true, |m| key.as_str() > m));

        let keys: Vec<String> = matching.by_ref().take(self.page_size).collect();
        let is_truncated = matching.next().is_some();

        Ok(ListPage {
            keys,
            is_truncated: Some(is_truncated),
        })
    }

    async fn download(&self, bucket: &str, key: &str, destination: &Path) -> Result<()> {
        let source = self.bucket_path(bucket).join(key);
        tokio::fs::copy(&source, destination).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SieveError::NotFound(format!("{}/{}", bucket, key))
            } else {
                SieveError::Io(e)
            }
        })?;
        Ok(())
    }
}
