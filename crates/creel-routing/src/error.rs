//! Error types for the routing core.

use creel_store::StoreError;

/// Classic error codes for callers that speak the store's error-info idiom.
pub mod codes {
    /// No buckets exist, or none are suitable.
    pub const ENODEV: i32 = 19;
    /// Unknown bucket.
    pub const ENOENT: i32 = 2;
    /// Invalid bucket or malformed result.
    pub const EINVAL: i32 = 22;
}

/// Errors surfaced by the bucket processor.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// The catalog is empty: the processor knows no buckets at all.
    #[error("there are no buckets at all")]
    NoBucketsConfigured,

    /// Buckets exist, but none can take a write of this size.
    #[error("there are buckets, but they are not suitable for size {size}")]
    NoBucketSuitable {
        /// The requested payload size.
        size: u64,
    },

    /// The named bucket is not in the catalog.
    #[error("could not find bucket '{0}' in bucket list")]
    BucketNotFound(String),

    /// The named bucket exists but has no loaded metadata or statistics.
    #[error("bucket '{0}' is not valid")]
    BucketNotValid(String),

    /// A store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The selection-distribution self-test found a skew.
    #[error("self-test failed: {0}")]
    SelfTest(String),
}

impl RoutingError {
    /// Negative errno-style code for this error.
    pub fn errno(&self) -> i32 {
        match self {
            RoutingError::NoBucketsConfigured | RoutingError::NoBucketSuitable { .. } => {
                -codes::ENODEV
            }
            RoutingError::BucketNotFound(_) => -codes::ENOENT,
            RoutingError::BucketNotValid(_)
            | RoutingError::Store(_)
            | RoutingError::SelfTest(_) => -codes::EINVAL,
        }
    }
}
