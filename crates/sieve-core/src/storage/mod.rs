//! Object store abstraction.
//!
//! Provides a page-at-a-time interface over bucket/key addressed storage:
//! - Local filesystem (always available)
//! - In-memory (tests and dry runs)
//! - S3-compatible storage such as MinIO (with `s3` feature)
//!
//! Backends expose one listing page per call. Draining every page is the
//! caller's loop, so tests can count requests against a fake store.

mod local;
mod memory;

#[cfg(feature = "s3")]
mod s3;

pub use local::LocalStore;
pub use memory::MemoryStore;

#[cfg(feature = "s3")]
pub use self::s3::{S3Store, S3StoreConfig};

use crate::error::Result;
use std::path::Path;

/// Historical S3 listing limit per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// One page of a prefix-restricted listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Keys in this page, ascending.
    pub keys: Vec<String>,
    /// "More pages remain" indicator. `None` when the response omitted it.
    pub is_truncated: Option<bool>,
}

impl ListPage {
    /// Whether another page should be requested.
    ///
    /// Only an explicit `true` counts; an absent indicator or `false` ends
    /// the listing.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.is_truncated == Some(true)
    }
}

/// Trait for object store backends.
///
/// All methods are async to support both local and remote storage.
#[allow(async_fn_in_trait)]
pub trait ObjectStore: Send + Sync {
    /// List one page of keys in `bucket` starting with `prefix`.
    ///
    /// `marker` is the last key already seen; the page holds keys strictly
    /// after it.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> Result<ListPage>;

    /// Download `key` from `bucket` into the file at `destination`.
    async fn download(&self, bucket: &str, key: &str, destination: &Path) -> Result<()>;
}
