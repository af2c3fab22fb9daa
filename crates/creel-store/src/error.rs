//! Error types for store access.

use std::time::Duration;

use creel_types::GroupId;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No value stored under the key in the addressed namespace.
    #[error("key not found: {namespace}/{key}")]
    NotFound {
        /// Namespace the read addressed.
        namespace: String,
        /// Key the read addressed.
        key: String,
    },

    /// The session has no destination groups; I/O cannot be routed.
    #[error("session has no destination groups")]
    NoGroups,

    /// None of the addressed groups are currently reachable.
    #[error("no reachable group among {groups:?}")]
    Unreachable {
        /// Groups the operation addressed.
        groups: Vec<GroupId>,
    },

    /// The operation did not complete within the session timeout.
    #[error("operation timed out after {timeout:?}")]
    Timeout {
        /// The deadline that expired.
        timeout: Duration,
    },
}
