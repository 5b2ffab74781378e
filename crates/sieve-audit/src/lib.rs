//! # sieve-audit
//!
//! Audit helpers over an object store and a search index.
//!
//! - [`enumerate`]: exhaustive paginated listing, existence checks, downloads
//! - [`scroll`]: draining a scroll cursor into a sorted hash collection
//! - [`metadata`]: field extraction with defaults for bibliographic records
//! - [`partition`]: splitting `total` items into worker-sized rounds
//! - [`timing`]: elapsed-time reporting around any operation
//! - [`config`]: environment-derived backend settings
//!
//! ## Example
//!
//! ```rust
//! use sieve_audit::partition::plan;
//!
//! let plan = plan(10, 3).unwrap();
//! assert_eq!(plan.assignments().collect::<Vec<_>>(), vec![3, 3, 3, 1]);
//! ```

pub mod config;
pub mod enumerate;
pub mod fsutil;
pub mod metadata;
pub mod partition;
pub mod scroll;
pub mod timing;

pub use enumerate::{download, enumerate, exists, fetch_prefix, DownloadOutcome, FetchStats};
pub use metadata::{extract, extract_lines, LineOutcome, MetadataRecord};
pub use partition::{assigned_count, plan, plan_for, WorkloadPlan};
pub use scroll::{collect, collect_hits, collect_with, ScrollOptions};
pub use timing::{format_elapsed, measure, measure_blocking, ElapsedReport};
