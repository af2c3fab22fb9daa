//! Per-group capacity measurements.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use creel_store::{StoreClient, StoreError};
use creel_types::{BackendStat, GroupId};
use tracing::debug;

/// Holds the latest per-group capacity measurements.
///
/// The processor's refresh loop calls [`refresh`](Self::refresh) on every
/// tick; catalog construction awaits one refresh directly before seeding
/// records. On a failed query the previous measurements stay published.
pub struct StatRefresher {
    client: Arc<dyn StoreClient>,
    stats: Mutex<HashMap<GroupId, BackendStat>>,
}

impl StatRefresher {
    /// Create a refresher with no measurements yet.
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self {
            client,
            stats: Mutex::new(HashMap::new()),
        }
    }

    /// Query the store for fresh measurements and publish them.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let fresh = self.client.group_stats().await?;
        debug!(groups = fresh.len(), "refreshed backend statistics");

        let mut stats = self.stats.lock().expect("stats lock poisoned");
        stats.clear();
        for stat in fresh {
            stats.insert(stat.group, stat);
        }
        Ok(())
    }

    /// The latest measurement for `group`, if the store reported one.
    pub fn stat(&self, group: GroupId) -> Option<BackendStat> {
        self.stats
            .lock()
            .expect("stats lock poisoned")
            .get(&group)
            .copied()
    }
}
