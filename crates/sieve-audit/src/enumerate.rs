//! Exhaustive object store enumeration.
//!
//! Object stores cap listings per response (1000 keys on S3), so listing a
//! large prefix means following the continuation marker page by page until
//! the store says nothing is left.
//!
//! # Example
//!
//! ```rust,no_run
//! use sieve_audit::enumerate::enumerate;
//! use sieve_audit::timing::measure;
//! use sieve_core::LocalStore;
//!
//! # async fn example() -> sieve_core::Result<()> {
//! let store = LocalStore::new("/srv/mirror")?;
//! let keys = measure("enumerate", enumerate(&store, "papers", "2024/")).await?;
//! println!("{} objects", keys.len());
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use sieve_core::storage::ObjectStore;
use sieve_core::{Result, SieveError};
use tracing::{debug, info, warn};

use crate::fsutil::create_empty_dir;
use crate::timing::ElapsedReport;

/// List every key in `bucket` under `prefix`, in fetch order.
///
/// Follows the continuation marker (the last key accumulated so far) while
/// the store reports more pages. An empty page ends the listing. Keys seen
/// on an earlier page are not repeated.
///
/// # Errors
///
/// Store errors propagate unchanged. A page flagged as truncated that adds
/// no new key is a [`SieveError::Protocol`] error, since following it would
/// request the same marker forever.
pub async fn enumerate<S: ObjectStore>(
    store: &S,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<String>> {
    let mut keys: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pages = 1usize;

    let mut page = store.list_page(bucket, prefix, None).await?;
    loop {
        if page.keys.is_empty() {
            break;
        }

        let before = keys.len();
        let more = page.has_more();
        for key in page.keys {
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
        debug!(
            bucket = %bucket,
            prefix = %prefix,
            page = pages,
            added = keys.len() - before,
            total = keys.len(),
            "Fetched listing page"
        );

        if !more {
            break;
        }
        if keys.len() == before {
            return Err(SieveError::Protocol(format!(
                "listing of {}/{} did not advance past {:?}",
                bucket,
                prefix,
                keys.last()
            )));
        }

        pages += 1;
        page = store
            .list_page(bucket, prefix, keys.last().map(String::as_str))
            .await?;
    }

    info!(bucket = %bucket, prefix = %prefix, pages, keys = keys.len(), "Listing complete");
    Ok(keys)
}

/// Whether a listing restricted to `key` returns at least one entry.
///
/// This is a prefix match: `exists(s, b, "a/b")` is also true when only
/// `a/bc` is stored.
pub async fn exists<S: ObjectStore>(store: &S, bucket: &str, key: &str) -> Result<bool> {
    let page = store.list_page(bucket, key, None).await?;
    Ok(!page.keys.is_empty())
}

/// Result of a checked download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The object was written to the destination.
    Downloaded,
    /// Nothing matched the key; nothing was written.
    Missing,
}

/// Download `key` into `destination` if it [`exists`].
///
/// Reports the outcome and elapsed time at info level. The object can
/// still vanish between the check and the transfer, in which case the
/// store's error propagates.
pub async fn download<S: ObjectStore>(
    store: &S,
    bucket: &str,
    key: &str,
    destination: &Path,
) -> Result<DownloadOutcome> {
    let start = Instant::now();

    let outcome = if exists(store, bucket, key).await? {
        store.download(bucket, key, destination).await?;
        DownloadOutcome::Downloaded
    } else {
        DownloadOutcome::Missing
    };

    let report = ElapsedReport::new(start.elapsed());
    match outcome {
        DownloadOutcome::Downloaded => info!(
            key = %key,
            "file \"{}\" was downloaded. ({})",
            destination.display(),
            report.styled()
        ),
        DownloadOutcome::Missing => info!(
            key = %key,
            "file \"{}\" does not exist. ({})",
            destination.display(),
            report.styled()
        ),
    }

    Ok(outcome)
}

/// Counters from [`fetch_prefix`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Objects written.
    pub downloaded: usize,
    /// Keys listed but gone by the time of download.
    pub missing: usize,
    /// Folder markers and keys that would escape the target directory.
    pub skipped: usize,
}

/// Mirror every object under `prefix` into a new, empty `target` directory.
///
/// `target` must not exist yet ([`SieveError::AlreadyExists`] otherwise).
/// Each key becomes a path relative to `target`. Folder markers (keys
/// ending in `/`) and keys with `..` or absolute components are skipped.
pub async fn fetch_prefix<S: ObjectStore>(
    store: &S,
    bucket: &str,
    prefix: &str,
    target: &Path,
) -> Result<FetchStats> {
    create_empty_dir(target)?;

    let keys = enumerate(store, bucket, prefix).await?;
    let mut stats = FetchStats::default();

    for key in &keys {
        if key.ends_with('/') {
            debug!(key = %key, "Folder marker, skipping");
            stats.skipped += 1;
            continue;
        }
        let Some(relative) = safe_relative_path(key) else {
            warn!(key = %key, "Key escapes target directory, skipping");
            stats.skipped += 1;
            continue;
        };

        let destination = target.join(relative);
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        match download(store, bucket, key, &destination).await? {
            DownloadOutcome::Downloaded => stats.downloaded += 1,
            DownloadOutcome::Missing => stats.missing += 1,
        }
    }

    info!(
        downloaded = stats.downloaded,
        missing = stats.missing,
        skipped = stats.skipped,
        "Fetch complete"
    );
    Ok(stats)
}

fn safe_relative_path(key: &str) -> Option<PathBuf> {
    let path = Path::new(key);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_core::storage::ListPage;
    use sieve_core::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn store_with(n: usize, page_size: usize) -> MemoryStore {
        let mut store = MemoryStore::new().with_page_size(page_size);
        for i in 0..n {
            store.insert("bkt", &format!("data/{:05}.json", i), "{}");
        }
        store
    }

    #[tokio::test]
    async fn test_enumerate_across_pages() {
        let store = store_with(2500, 1000);

        let keys = enumerate(&store, "bkt", "data/").await.unwrap();

        assert_eq!(keys.len(), 2500);
        assert_eq!(store.list_calls(), 3);
        let distinct: HashSet<&String> = keys.iter().collect();
        assert_eq!(distinct.len(), 2500);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_enumerate_exact_multiple_of_page_size() {
        let store = store_with(2000, 1000);
        let keys = enumerate(&store, "bkt", "").await.unwrap();
        assert_eq!(keys.len(), 2000);
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_enumerate_empty_prefix_result() {
        let store = store_with(10, 1000);
        let keys = enumerate(&store, "bkt", "nothing/").await.unwrap();
        assert!(keys.is_empty());
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_absent_truncation_flag_stops_after_first_page() {
        let store = store_with(30, 10).without_truncation_flag();
        let keys = enumerate(&store, "bkt", "").await.unwrap();
        assert_eq!(keys.len(), 10);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_bucket_propagates() {
        let store = MemoryStore::new();
        let result = enumerate(&store, "nope", "").await;
        assert!(matches!(result, Err(SieveError::NotFound(_))));
    }

    /// Always claims more pages and always returns the same key.
    struct StuckStore {
        calls: AtomicUsize,
    }

    impl ObjectStore for StuckStore {
        async fn list_page(&self, _: &str, _: &str, _: Option<&str>) -> Result<ListPage> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(ListPage {
                keys: vec!["same".to_string()],
                is_truncated: Some(true),
            })
        }

        async fn download(&self, _: &str, _: &str, _: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stuck_cursor_is_protocol_error() {
        let store = StuckStore {
            calls: AtomicUsize::new(0),
        };
        let result = enumerate(&store, "bkt", "").await;
        assert!(matches!(result, Err(SieveError::Protocol(_))));
        assert_eq!(store.calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_exists() {
        let store = store_with(3, 1000);
        assert!(exists(&store, "bkt", "data/00001.json").await.unwrap());
        assert!(!exists(&store, "bkt", "data/99999.json").await.unwrap());
    }

    #[tokio::test]
    async fn test_download_present_and_missing() {
        let mut store = MemoryStore::new();
        store.insert("bkt", "a.txt", "hello");
        let tmp = TempDir::new().unwrap();

        let dest = tmp.path().join("a.txt");
        let outcome = download(&store, "bkt", "a.txt", &dest).await.unwrap();
        assert_eq!(outcome, DownloadOutcome::Downloaded);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "hello");

        let dest = tmp.path().join("b.txt");
        let outcome = download(&store, "bkt", "b.txt", &dest).await.unwrap();
        assert_eq!(outcome, DownloadOutcome::Missing);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_prefix_mirrors_tree() {
        let mut store = MemoryStore::new().with_page_size(2);
        store.insert("bkt", "run/a.json", "a");
        store.insert("bkt", "run/sub/b.json", "b");
        store.insert("bkt", "run/c.json", "c");
        store.insert("bkt", "other/d.json", "d");
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("mirror");

        let stats = fetch_prefix(&store, "bkt", "run/", &target).await.unwrap();

        assert_eq!(stats.downloaded, 3);
        assert_eq!(stats.missing, 0);
        assert_eq!(
            std::fs::read_to_string(target.join("run/sub/b.json")).unwrap(),
            "b"
        );
        assert!(!target.join("other").exists());
    }

    #[tokio::test]
    async fn test_fetch_prefix_skips_folder_markers() {
        let mut store = MemoryStore::new();
        store.insert("bkt", "run/", "");
        store.insert("bkt", "run/a.json", "a");
        store.insert("bkt", "run/sub/", "");
        store.insert("bkt", "run/sub/b.json", "b");
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("mirror");

        let stats = fetch_prefix(&store, "bkt", "run/", &target).await.unwrap();

        assert_eq!(stats.downloaded, 2);
        assert_eq!(stats.skipped, 2);
        assert!(target.join("run").is_dir());
        assert_eq!(std::fs::read_to_string(target.join("run/a.json")).unwrap(), "a");
        assert_eq!(
            std::fs::read_to_string(target.join("run/sub/b.json")).unwrap(),
            "b"
        );
    }

    #[tokio::test]
    async fn test_fetch_prefix_refuses_existing_dir() {
        let store = store_with(1, 10);
        let tmp = TempDir::new().unwrap();

        let result = fetch_prefix(&store, "bkt", "", tmp.path()).await;
        assert!(matches!(result, Err(SieveError::AlreadyExists(_))));
        assert_eq!(store.list_calls(), 0);
    }

    #[test]
    fn test_safe_relative_path() {
        assert_eq!(safe_relative_path("a/b.txt"), Some(PathBuf::from("a/b.txt")));
        assert_eq!(safe_relative_path("./a"), Some(PathBuf::from("a")));
        assert_eq!(safe_relative_path("../etc/passwd"), None);
        assert_eq!(safe_relative_path("/abs"), None);
        assert_eq!(safe_relative_path(""), None);
    }
}
