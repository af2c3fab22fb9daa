//! Per-user bucket authorization records.
//!
//! An ACL travels as a version-prefixed 4-tuple `[version, user, token,
//! flags]`. Version 2 is current and is always written; version 1 records are
//! still accepted on read and their flag layout is migrated transparently.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Current ACL serialization version.
pub const ACL_VERSION: u16 = 2;

/// Per-user authorization flags (version 2 layout).
pub mod auth {
    /// Requests from this user are accepted without a token.
    pub const NO_TOKEN: u64 = 0x01;
    /// This user may write to the bucket.
    pub const WRITE: u64 = 0x02;
    /// This user may administer the bucket.
    pub const ADMIN: u64 = 0x04;
    /// Full write and admin access.
    pub const ALL: u64 = WRITE | ADMIN;
}

/// Version 1 flag layout, kept only for migration on read.
mod auth_v1 {
    /// Reads were allowed without authorization.
    pub const NOAUTH_READ: u64 = 1 << 0;
    /// All operations were allowed without authorization.
    pub const NOAUTH_ALL: u64 = 1 << 1;
}

/// Authorization entry for one user of a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketAcl {
    /// User this entry applies to.
    pub user: String,
    /// Authorization token the user must present.
    pub token: String,
    /// Bitmask over the [`auth`] flags.
    pub flags: u64,
}

/// Wire form: `[version, user, token, flags]`.
#[derive(Serialize, Deserialize)]
pub(crate) struct AclWire(pub u16, pub String, pub String, pub u64);

impl BucketAcl {
    /// Whether this user may skip the token check.
    pub fn has_no_token(&self) -> bool {
        self.flags & auth::NO_TOKEN != 0
    }

    /// Every authorized user may read.
    pub fn can_read(&self) -> bool {
        true
    }

    /// Whether this user may write to the bucket.
    pub fn can_write(&self) -> bool {
        self.flags & auth::WRITE != 0
    }

    /// Whether this user may administer the bucket.
    pub fn can_admin(&self) -> bool {
        self.flags & auth::ADMIN != 0
    }

    /// Encode as a version-2 wire record.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(postcard::to_allocvec(&self.to_wire())?)
    }

    /// Decode a wire record, accepting versions 1 and 2.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let wire: AclWire = postcard::from_bytes(bytes)?;
        Self::from_wire(wire)
    }

    pub(crate) fn to_wire(&self) -> AclWire {
        AclWire(
            ACL_VERSION,
            self.user.clone(),
            self.token.clone(),
            self.flags,
        )
    }

    pub(crate) fn from_wire(wire: AclWire) -> Result<Self, CodecError> {
        let AclWire(version, user, token, flags) = wire;
        let flags = match version {
            1 => migrate_v1_flags(flags),
            2 => flags,
            _ => {
                return Err(CodecError::UnsupportedVersion {
                    found: version,
                    supported: ACL_VERSION,
                });
            }
        };
        Ok(Self { user, token, flags })
    }
}

/// Translate version-1 flag bits into the current layout.
///
/// Any `noauth` bit means the token check is skipped. Unless the record was
/// marked read-only (`noauth_read`), the user keeps full write and admin
/// rights.
fn migrate_v1_flags(old: u64) -> u64 {
    let noauth_read = old & auth_v1::NOAUTH_READ != 0;
    let noauth_all = old & auth_v1::NOAUTH_ALL != 0;

    let mut flags = 0;
    if noauth_read || noauth_all {
        flags |= auth::NO_TOKEN;
    }
    if !noauth_read {
        flags |= auth::ALL;
    }
    flags
}

impl fmt::Display for BucketAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.user.is_empty() {
            return Ok(());
        }
        write!(f, "{}:{}:{:#x}", self.user, self.token, self.flags)
    }
}
