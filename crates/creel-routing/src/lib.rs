//! Bucket routing core for Creel.
//!
//! A *bucket* is a named container pinning data to a fixed set of replica
//! groups: once an object is written into a bucket it can only be read from,
//! and updated in, that bucket. Objects with the same key in different
//! buckets are unrelated.
//!
//! This crate maintains the catalog of known buckets and picks a write
//! target per request:
//!
//! - [`BucketRecord`] — one bucket's metadata, capacity snapshot, and weight
//!   function.
//! - [`StatRefresher`] — per-group capacity measurements.
//! - [`catalog`] — resolving bucket names (static list or catalog key) and
//!   building records.
//! - [`select_bucket`] — the pure weighted selector.
//! - [`BucketProcessor`] — the public facade with its background refresh
//!   task.

pub mod bucket;
pub mod catalog;
pub mod error;
pub mod processor;
pub mod selector;
pub mod stats;

pub use bucket::{BucketRecord, BucketRef};
pub use error::RoutingError;
pub use processor::{BucketProcessor, REFRESH_INTERVAL};
pub use selector::{Candidate, select_bucket};
pub use stats::StatRefresher;
