//! Shared types and wire records for Creel.
//!
//! This crate defines the value types used across the Creel workspace:
//! capacity measurements ([`SizeStat`], [`BackendStat`], [`BucketStat`]),
//! selection thresholds ([`Limits`]), and the versioned records stored in the
//! reserved `bucket` namespace ([`BucketAcl`], [`BucketMeta`]).

pub mod acl;
pub mod error;
pub mod meta;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use acl::{ACL_VERSION, BucketAcl};
pub use error::CodecError;
pub use meta::{BucketMeta, META_VERSION};

/// Identifier of a replica group.
///
/// A group is one replica location; an object written into a bucket exists on
/// every group in that bucket's group set.
pub type GroupId = i32;

/// Reserved namespace holding bucket metadata and catalog blobs.
pub const BUCKET_NAMESPACE: &str = "bucket";

// ---------------------------------------------------------------------------
// Capacity measurements
// ---------------------------------------------------------------------------

/// Space accounting for a single backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStat {
    /// Total capacity in bytes.
    pub limit: u64,
    /// Bytes currently used.
    pub used: u64,
}

impl SizeStat {
    /// Bytes still available for new data.
    pub fn free_bytes(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    /// Free space as a fraction of total capacity, in [0, 1].
    ///
    /// A backend with zero capacity reports zero free space.
    pub fn free_fraction(&self) -> f64 {
        if self.limit == 0 {
            return 0.0;
        }
        self.free_bytes() as f64 / self.limit as f64
    }
}

/// Capacity measurement for one replica group's backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStat {
    /// The group this measurement belongs to.
    pub group: GroupId,
    /// Space accounting.
    pub size: SizeStat,
}

impl fmt::Display for BackendStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "group: {}, used: {}/{}, free: {:.3}",
            self.group,
            self.size.used,
            self.size.limit,
            self.size.free_fraction()
        )
    }
}

/// Per-bucket statistics: one backend measurement per replica group.
///
/// A bucket is usable only when this map is non-empty; an empty map means the
/// last statistics query did not cover any of the bucket's groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketStat {
    /// Measurements keyed by group.
    pub backends: BTreeMap<GroupId, BackendStat>,
}

impl BucketStat {
    /// Whether any backend measurement is present.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl fmt::Display for BucketStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, stat) in self.backends.values().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{stat}")?;
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Selection limits
// ---------------------------------------------------------------------------

/// Free-fraction thresholds applied per backend when weighting a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeLimits {
    /// Below this free fraction a backend makes its bucket ineligible.
    pub hard: f64,
    /// Below this free fraction a backend's contribution is divided by 10.
    pub soft: f64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            hard: 0.1,
            soft: 0.3,
        }
    }
}

/// Thresholds steering bucket selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Free-space thresholds.
    pub size: SizeLimits,
}
