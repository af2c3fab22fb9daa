//! Sessions: namespace- and group-bound I/O handles.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use creel_types::GroupId;

use crate::error::StoreError;
use crate::traits::StoreClient;

/// Default deadline applied to session I/O.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(60);

/// An I/O handle bound to one namespace and a fixed group set.
///
/// Sessions are cheap to clone and independent of each other; a session
/// handed to a caller stays usable regardless of what happens to the bucket
/// catalog afterwards.
///
/// A session with an empty group set fails every operation with
/// [`StoreError::NoGroups`] — deterministic failure instead of I/O to a
/// wrong destination.
#[derive(Clone)]
pub struct Session {
    client: Arc<dyn StoreClient>,
    namespace: String,
    groups: Vec<GroupId>,
    timeout: Duration,
}

impl Session {
    /// Create a session bound to `namespace` with no destination groups and
    /// the default timeout.
    pub fn new(client: Arc<dyn StoreClient>, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            groups: Vec::new(),
            timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }

    /// Set the destination groups.
    pub fn with_groups(mut self, groups: Vec<GroupId>) -> Self {
        self.groups = groups;
        self
    }

    /// Set the I/O deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The namespace this session addresses.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The destination groups, empty for an error session.
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    /// The I/O deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Read the value of `key` from the session's groups.
    pub async fn read(&self, key: &str) -> Result<Bytes, StoreError> {
        if self.groups.is_empty() {
            return Err(StoreError::NoGroups);
        }
        match tokio::time::timeout(
            self.timeout,
            self.client.read(&self.namespace, &self.groups, key),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                timeout: self.timeout,
            }),
        }
    }

    /// Write `data` under `key` to every one of the session's groups.
    pub async fn write(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        if self.groups.is_empty() {
            return Err(StoreError::NoGroups);
        }
        match tokio::time::timeout(
            self.timeout,
            self.client.write(&self.namespace, &self.groups, key, data),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                timeout: self.timeout,
            }),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("namespace", &self.namespace)
            .field("groups", &self.groups)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
