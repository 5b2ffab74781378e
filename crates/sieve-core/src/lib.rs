//! # sieve-core
//!
//! Core infrastructure for the sieve audit tools.
//!
//! Provides shared abstractions for:
//! - Object store backends (local, in-memory, S3/MinIO)
//! - Search index backends (in-memory, Elasticsearch scroll)
//! - Content hashing (normalized SHA-256)
//! - The shared error type

pub mod error;
pub mod hashing;
pub mod search;
pub mod storage;

pub use error::{Result, SieveError};
pub use hashing::{content_hash, content_hash_bytes, normalize};
#[cfg(feature = "elasticsearch")]
pub use search::{ElasticsearchConfig, ElasticsearchIndex};
pub use search::{MemoryIndex, ScrollPage, SearchHit, SearchIndex};
#[cfg(feature = "s3")]
pub use storage::{S3Store, S3StoreConfig};
pub use storage::{ListPage, LocalStore, MemoryStore, ObjectStore};
