//! S3-compatible object store.
//!
//! Works with AWS S3, MinIO, and other S3-compatible services.
//!
//! # Example
//!
//! ```rust,no_run
//! use sieve_core::storage::{S3Store, S3StoreConfig};
//!
//! # fn example() -> sieve_core::Result<()> {
//! let store = S3Store::new(S3StoreConfig {
//!     endpoint: Some("http://localhost:9000".to_string()),
//!     region: "us-east-1".to_string(),
//!     access_key: "minio".to_string(),
//!     secret_key: "minio123".to_string(),
//! })?;
//! # Ok(())
//! # }
//! ```

use super::{ListPage, ObjectStore, DEFAULT_PAGE_SIZE};
use crate::error::{Result, SieveError};
use s3::creds::Credentials;
use s3::{Bucket, Region};
use std::path::Path;

/// Connection settings for an S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct S3StoreConfig {
    /// Custom endpoint URL (MinIO, LocalStack, ...). `None` means AWS.
    pub endpoint: Option<String>,
    /// Region name, e.g. "us-east-1".
    pub region: String,
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
}

/// S3-compatible object store.
///
/// Holds the region and credentials; a bucket handle is built per request
/// since every operation names its bucket.
pub struct S3Store {
    region: Region,
    credentials: Credentials,
    path_style: bool,
    page_size: usize,
}

impl S3Store {
    /// Create a new S3 store from explicit settings.
    pub fn new(config: S3StoreConfig) -> Result<Self> {
        let region = if let Some(endpoint) = &config.endpoint {
            Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            }
        } else {
            config
                .region
                .parse()
                .map_err(|e| SieveError::Config(format!("Invalid region: {}", e)))?
        };

        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| SieveError::Config(format!("Invalid credentials: {}", e)))?;

        Ok(Self {
            region,
            credentials,
            // Custom endpoints don't do virtual-hosted style
            path_style: config.endpoint.is_some(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())
            .map_err(|e| SieveError::Config(format!("Failed to create bucket: {}", e)))?;

        Ok(if self.path_style {
            bucket.with_path_style()
        } else {
            bucket
        })
    }
}

impl ObjectStore for S3Store {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> Result<ListPage> {
        let bucket = self.bucket(bucket)?;
        let (result, _status) = bucket
            .list_page(
                prefix.to_string(),
                None,
                None,
                marker.map(str::to_string),
                Some(self.page_size),
            )
            .await
            .map_err(|e| SieveError::Storage(format!("S3 list failed: {}", e)))?;

        Ok(ListPage {
            keys: result.contents.into_iter().map(|obj| obj.key).collect(),
            is_truncated: Some(result.is_truncated),
        })
    }

    async fn download(&self, bucket: &str, key: &str, destination: &Path) -> Result<()> {
        let handle = self.bucket(bucket)?;
        let response = handle.get_object(key).await.map_err(|e| {
            if e.to_string().contains("404") || e.to_string().contains("NoSuchKey") {
                SieveError::NotFound(format!("{}/{}", bucket, key))
            } else {
                SieveError::Storage(format!("S3 get failed: {}", e))
            }
        })?;

        match response.status_code() {
            200..=299 => {}
            404 => return Err(SieveError::NotFound(format!("{}/{}", bucket, key))),
            code => {
                return Err(SieveError::Storage(format!(
                    "S3 get of {}/{} returned {}",
                    bucket, key, code
                )))
            }
        }

        tokio::fs::write(destination, response.bytes()).await?;
        Ok(())
    }
}
