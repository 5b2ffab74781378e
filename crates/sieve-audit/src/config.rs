//! Environment-derived configuration.
//!
//! Read once at startup and passed to the backends; library code never
//! looks at the process environment itself.
//!
//! | Variable                  | Used for                         |
//! |---------------------------|----------------------------------|
//! | `SIEVE_LOCAL_ROOT`        | local object store root (opt.)   |
//! | `MINIO_ENDPOINT_URL`      | S3/MinIO endpoint                |
//! | `MINIO_ACCESS_KEY_ID`     | S3/MinIO access key              |
//! | `MINIO_SECRET_ACCESS_KEY` | S3/MinIO secret key              |
//! | `MINIO_REGION`            | region, default `us-east-1`      |
//! | `ELASTIC_SERVER_URL`      | Elasticsearch base URL           |
//! | `ELASTIC_USER`            | basic auth user                  |
//! | `ELASTIC_PASSWORD`        | basic auth password              |
//! | `ELASTIC_CA_CERT`         | extra root certificate (opt.)    |
//! | `ELASTIC_TIMEOUT_SECS`    | per-request timeout (opt.)       |

use std::path::{Path, PathBuf};
use std::time::Duration;

use sieve_core::storage::{ListPage, LocalStore, ObjectStore, S3Store, S3StoreConfig};
use sieve_core::{ElasticsearchConfig, ElasticsearchIndex, Result, SieveError};

pub const LOCAL_ROOT: &str = "SIEVE_LOCAL_ROOT";
pub const MINIO_ENDPOINT_URL: &str = "MINIO_ENDPOINT_URL";
pub const MINIO_ACCESS_KEY_ID: &str = "MINIO_ACCESS_KEY_ID";
pub const MINIO_SECRET_ACCESS_KEY: &str = "MINIO_SECRET_ACCESS_KEY";
pub const MINIO_REGION: &str = "MINIO_REGION";
pub const ELASTIC_SERVER_URL: &str = "ELASTIC_SERVER_URL";
pub const ELASTIC_USER: &str = "ELASTIC_USER";
pub const ELASTIC_PASSWORD: &str = "ELASTIC_PASSWORD";
pub const ELASTIC_CA_CERT: &str = "ELASTIC_CA_CERT";
pub const ELASTIC_TIMEOUT_SECS: &str = "ELASTIC_TIMEOUT_SECS";

const DEFAULT_REGION: &str = "us-east-1";

/// Process environment lookup. Empty values count as missing.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn require(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    lookup(name).ok_or_else(|| SieveError::Config(format!("No Environment val \"{}\"", name)))
}

/// Which object store backend to build.
#[derive(Debug, Clone)]
pub enum StoreSettings {
    /// Directory tree, `<root>/<bucket>/<key>`.
    Local(PathBuf),
    /// S3-compatible endpoint.
    S3(S3StoreConfig),
}

impl StoreSettings {
    /// `SIEVE_LOCAL_ROOT` wins when set; otherwise all MinIO variables are
    /// required.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(root) = lookup(LOCAL_ROOT) {
            return Ok(Self::Local(PathBuf::from(root)));
        }
        Ok(Self::S3(S3StoreConfig {
            endpoint: Some(require(&lookup, MINIO_ENDPOINT_URL)?),
            access_key: require(&lookup, MINIO_ACCESS_KEY_ID)?,
            secret_key: require(&lookup, MINIO_SECRET_ACCESS_KEY)?,
            region: lookup(MINIO_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }))
    }

    /// Read from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(process_env)
    }
}

/// A configured object store of either kind.
pub enum AnyStore {
    Local(LocalStore),
    S3(S3Store),
}

impl AnyStore {
    /// Build the backend described by `settings`.
    pub fn connect(settings: StoreSettings) -> Result<Self> {
        match settings {
            StoreSettings::Local(root) => Ok(Self::Local(LocalStore::new(root)?)),
            StoreSettings::S3(config) => Ok(Self::S3(S3Store::new(config)?)),
        }
    }
}

impl ObjectStore for AnyStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> Result<ListPage> {
        match self {
            Self::Local(store) => store.list_page(bucket, prefix, marker).await,
            Self::S3(store) => store.list_page(bucket, prefix, marker).await,
        }
    }

    async fn download(&self, bucket: &str, key: &str, destination: &Path) -> Result<()> {
        match self {
            Self::Local(store) => store.download(bucket, key, destination).await,
            Self::S3(store) => store.download(bucket, key, destination).await,
        }
    }
}

/// Elasticsearch settings from a lookup.
pub fn search_config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ElasticsearchConfig> {
    let timeout = match lookup(ELASTIC_TIMEOUT_SECS) {
        Some(raw) => Some(Duration::from_secs(raw.parse().map_err(|_| {
            SieveError::Config(format!(
                "{} must be whole seconds, got {:?}",
                ELASTIC_TIMEOUT_SECS, raw
            ))
        })?)),
        None => None,
    };

    Ok(ElasticsearchConfig {
        url: require(&lookup, ELASTIC_SERVER_URL)?,
        username: require(&lookup, ELASTIC_USER)?,
        password: require(&lookup, ELASTIC_PASSWORD)?,
        ca_cert: lookup(ELASTIC_CA_CERT).map(PathBuf::from),
        timeout,
    })
}

/// Build an Elasticsearch client from the process environment.
pub fn search_index_from_env() -> Result<ElasticsearchIndex> {
    ElasticsearchIndex::new(search_config_from_lookup(process_env)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_local_root_takes_precedence() {
        let settings = StoreSettings::from_lookup(env(&[(LOCAL_ROOT, "/srv/mirror")])).unwrap();
        assert!(matches!(settings, StoreSettings::Local(p) if p == PathBuf::from("/srv/mirror")));
    }

    #[test]
    fn test_s3_settings() {
        let settings = StoreSettings::from_lookup(env(&[
            (MINIO_ENDPOINT_URL, "http://minio:9000"),
            (MINIO_ACCESS_KEY_ID, "key"),
            (MINIO_SECRET_ACCESS_KEY, "secret"),
        ]))
        .unwrap();
        match settings {
            StoreSettings::S3(config) => {
                assert_eq!(config.endpoint.as_deref(), Some("http://minio:9000"));
                assert_eq!(config.region, DEFAULT_REGION);
                assert_eq!(config.access_key, "key");
            }
            other => panic!("expected S3 settings, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_variable_is_named() {
        let err = StoreSettings::from_lookup(env(&[(MINIO_ENDPOINT_URL, "http://minio:9000")]))
            .unwrap_err();
        match err {
            SieveError::Config(msg) => assert!(msg.contains(MINIO_ACCESS_KEY_ID)),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_search_config() {
        let config = search_config_from_lookup(env(&[
            (ELASTIC_SERVER_URL, "https://es:9200"),
            (ELASTIC_USER, "elastic"),
            (ELASTIC_PASSWORD, "pw"),
            (ELASTIC_TIMEOUT_SECS, "30"),
        ]))
        .unwrap();
        assert_eq!(config.url, "https://es:9200");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(config.ca_cert.is_none());
    }

    #[test]
    fn test_search_config_bad_timeout() {
        let result = search_config_from_lookup(env(&[
            (ELASTIC_SERVER_URL, "https://es:9200"),
            (ELASTIC_USER, "elastic"),
            (ELASTIC_PASSWORD, "pw"),
            (ELASTIC_TIMEOUT_SECS, "soon"),
        ]));
        assert!(matches!(result, Err(SieveError::Config(_))));
    }

    #[test]
    fn test_search_config_missing_password() {
        let result = search_config_from_lookup(env(&[
            (ELASTIC_SERVER_URL, "https://es:9200"),
            (ELASTIC_USER, "elastic"),
        ]));
        assert!(matches!(result, Err(SieveError::Config(m)) if m.contains(ELASTIC_PASSWORD)));
    }

    #[tokio::test]
    async fn test_any_store_local() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("bkt")).unwrap();
        std::fs::write(tmp.path().join("bkt/a"), "x").unwrap();

        let store = AnyStore::connect(StoreSettings::Local(tmp.path().to_path_buf())).unwrap();
        let page = store.list_page("bkt", "", None).await.unwrap();
        assert_eq!(page.keys, vec!["a"]);
    }
}
