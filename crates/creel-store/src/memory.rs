//! In-memory cluster backend.
//!
//! [`MemoryCluster`] implements [`StoreClient`] against a set of simulated
//! replica groups held in process memory. Each group tracks its own blobs and
//! capacity accounting and can be taken down and brought back, which drives
//! the route table and the statistics report. Used by tests and the demo
//! shell; capacity here is a measurement, not an enforced quota.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use bytes::Bytes;
use creel_types::{BackendStat, GroupId, SizeStat};
use tracing::debug;

use crate::error::StoreError;
use crate::route::RouteTable;
use crate::traits::StoreClient;

/// Blobs are keyed by `(namespace, key)` within each group.
type BlobKey = (String, String);

struct GroupState {
    limit: u64,
    used: u64,
    up: bool,
    blobs: HashMap<BlobKey, Bytes>,
}

/// An in-memory simulated cluster.
pub struct MemoryCluster {
    groups: RwLock<BTreeMap<GroupId, GroupState>>,
}

impl MemoryCluster {
    /// Create a cluster with no groups.
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(BTreeMap::new()),
        }
    }

    /// Add a group with the given capacity. Re-adding resets the group.
    pub fn add_group(&self, group: GroupId, limit: u64) {
        let mut groups = self.groups.write().expect("cluster lock poisoned");
        groups.insert(
            group,
            GroupState {
                limit,
                used: 0,
                up: true,
                blobs: HashMap::new(),
            },
        );
    }

    /// Override a group's capacity accounting.
    ///
    /// Lets tests shape free-space fractions without storing real data.
    pub fn set_group_capacity(&self, group: GroupId, limit: u64, used: u64) {
        let mut groups = self.groups.write().expect("cluster lock poisoned");
        if let Some(state) = groups.get_mut(&group) {
            state.limit = limit;
            state.used = used;
        }
    }

    /// Mark a group reachable or unreachable.
    pub fn set_group_up(&self, group: GroupId, up: bool) {
        let mut groups = self.groups.write().expect("cluster lock poisoned");
        if let Some(state) = groups.get_mut(&group) {
            state.up = up;
        }
    }
}

impl Default for MemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StoreClient for MemoryCluster {
    async fn read(
        &self,
        namespace: &str,
        groups: &[GroupId],
        key: &str,
    ) -> Result<Bytes, StoreError> {
        let map = self.groups.read().expect("cluster lock poisoned");
        let blob_key = (namespace.to_string(), key.to_string());

        let mut any_reachable = false;
        for group in groups {
            let Some(state) = map.get(group) else {
                continue;
            };
            if !state.up {
                continue;
            }
            any_reachable = true;
            if let Some(data) = state.blobs.get(&blob_key) {
                return Ok(data.clone());
            }
        }

        if !any_reachable {
            return Err(StoreError::Unreachable {
                groups: groups.to_vec(),
            });
        }
        Err(StoreError::NotFound {
            namespace: namespace.to_string(),
            key: key.to_string(),
        })
    }

    async fn write(
        &self,
        namespace: &str,
        groups: &[GroupId],
        key: &str,
        data: Bytes,
    ) -> Result<(), StoreError> {
        let mut map = self.groups.write().expect("cluster lock poisoned");
        let blob_key = (namespace.to_string(), key.to_string());

        let mut any_reachable = false;
        for group in groups {
            let Some(state) = map.get_mut(group) else {
                continue;
            };
            if !state.up {
                continue;
            }
            any_reachable = true;
            let prior = state
                .blobs
                .insert(blob_key.clone(), data.clone())
                .map_or(0, |old| old.len() as u64);
            state.used = state.used.saturating_sub(prior) + data.len() as u64;
        }

        if !any_reachable {
            return Err(StoreError::Unreachable {
                groups: groups.to_vec(),
            });
        }
        debug!(namespace, key, size = data.len(), "stored blob");
        Ok(())
    }

    async fn group_stats(&self) -> Result<Vec<BackendStat>, StoreError> {
        let map = self.groups.read().expect("cluster lock poisoned");
        Ok(map
            .iter()
            .filter(|(_, state)| state.up)
            .map(|(group, state)| BackendStat {
                group: *group,
                size: SizeStat {
                    limit: state.limit,
                    used: state.used,
                },
            })
            .collect())
    }

    fn route_table(&self) -> RouteTable {
        let map = self.groups.read().expect("cluster lock poisoned");
        RouteTable::new(
            map.iter()
                .filter(|(_, state)| state.up)
                .map(|(group, _)| *group),
        )
    }
}
