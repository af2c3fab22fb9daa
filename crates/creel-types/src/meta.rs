//! Bucket metadata records.
//!
//! Metadata travels as a version-prefixed 10-tuple `[version, name, acl,
//! groups, flags, max_size, max_key_num, r0, r1, r2]`, stored under the
//! bucket's own name in the reserved `bucket` namespace on the metadata
//! groups. Version 1 is the only known layout; anything else is rejected so
//! a future format can never be silently misread.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::GroupId;
use crate::acl::{AclWire, BucketAcl};
use crate::error::CodecError;

/// Current bucket metadata serialization version.
pub const META_VERSION: u16 = 1;

/// Metadata describing one bucket.
///
/// The `groups` sequence is the bucket's replication set and the routing key
/// for all of its I/O.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketMeta {
    /// Bucket name; unique within a processor.
    pub name: String,
    /// Per-user authorization, keyed by user name.
    pub acl: BTreeMap<String, BucketAcl>,
    /// Replica groups holding this bucket's data.
    pub groups: Vec<GroupId>,
    /// Bucket-level flags.
    pub flags: u64,
    /// Maximum total size in bytes, 0 for unlimited.
    pub max_size: u64,
    /// Maximum number of keys, 0 for unlimited.
    pub max_key_num: u64,
    /// Reserved for future use, always zero.
    pub reserved: [u64; 3],
}

/// Wire form: `[version, name, acl, groups, flags, max_size, max_key_num,
/// r0, r1, r2]`.
#[derive(Serialize, Deserialize)]
struct MetaWire(
    u16,
    String,
    BTreeMap<String, AclWire>,
    Vec<GroupId>,
    u64,
    u64,
    u64,
    u64,
    u64,
    u64,
);

impl BucketMeta {
    /// An empty metadata record carrying only the bucket name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Encode as a version-1 wire record.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let acl = self
            .acl
            .iter()
            .map(|(user, acl)| (user.clone(), acl.to_wire()))
            .collect();
        let wire = MetaWire(
            META_VERSION,
            self.name.clone(),
            acl,
            self.groups.clone(),
            self.flags,
            self.max_size,
            self.max_key_num,
            self.reserved[0],
            self.reserved[1],
            self.reserved[2],
        );
        Ok(postcard::to_allocvec(&wire)?)
    }

    /// Decode a wire record, rejecting unknown versions.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let MetaWire(version, name, acl, groups, flags, max_size, max_key_num, r0, r1, r2) =
            postcard::from_bytes(bytes)?;
        if version != META_VERSION {
            return Err(CodecError::UnsupportedVersion {
                found: version,
                supported: META_VERSION,
            });
        }
        let acl = acl
            .into_iter()
            .map(|(user, wire)| Ok((user, BucketAcl::from_wire(wire)?)))
            .collect::<Result<_, CodecError>>()?;
        Ok(Self {
            name,
            acl,
            groups,
            flags,
            max_size,
            max_key_num,
            reserved: [r0, r1, r2],
        })
    }

    /// Decode a record read under `expected_name`, verifying the embedded
    /// name matches.
    ///
    /// Metadata is keyed by bucket name; a blob carrying a different name is
    /// corrupt or misplaced and must not replace the record's state.
    pub fn decode_named(expected_name: &str, bytes: &[u8]) -> Result<Self, CodecError> {
        let meta = Self::decode(bytes)?;
        if meta.name != expected_name {
            return Err(CodecError::NameMismatch {
                expected: expected_name.to_string(),
                found: meta.name,
            });
        }
        Ok(meta)
    }
}
