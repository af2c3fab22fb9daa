//! A bucket record: metadata, capacity snapshot, and the weight function.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use creel_store::{Session, StoreClient, StoreError};
use creel_types::{BUCKET_NAMESPACE, BackendStat, BucketMeta, BucketStat, GroupId, Limits};
use tokio::sync::watch;
use tracing::{error, info};

/// Shared handle to a bucket record.
///
/// The processor's catalog holds strong references and swaps them wholesale
/// on refresh; callers keep their own strong references, which keep a
/// replaced record alive for as long as they need it.
pub type BucketRef = Arc<BucketRecord>;

/// One bucket known to the processor.
///
/// A record is created around a name and immediately schedules an
/// asynchronous reload of its metadata from the reserved `bucket` namespace.
/// Its metadata and statistics are replaced in place under a lock; the
/// record itself lives as long as anyone holds a [`BucketRef`].
pub struct BucketRecord {
    client: Arc<dyn StoreClient>,
    meta_groups: Vec<GroupId>,
    name: String,
    state: Mutex<BucketState>,
    /// `true` once at least one reload attempt has finished, success or not.
    reloaded: watch::Sender<bool>,
}

#[derive(Default)]
struct BucketState {
    meta: BucketMeta,
    stat: BucketStat,
    /// Metadata has decoded successfully at least once.
    meta_loaded: bool,
}

impl BucketRecord {
    /// Create a record and schedule its first metadata reload.
    pub fn new(
        client: Arc<dyn StoreClient>,
        meta_groups: Vec<GroupId>,
        name: impl Into<String>,
    ) -> BucketRef {
        let name = name.into();
        let (reloaded, _) = watch::channel(false);
        let record = Arc::new(Self {
            client,
            meta_groups,
            state: Mutex::new(BucketState {
                meta: BucketMeta::new(&name),
                ..BucketState::default()
            }),
            name,
            reloaded,
        });
        record.reload();
        record
    }

    /// Schedule an asynchronous metadata reload.
    ///
    /// The spawned read holds only a weak handle to the record; if the
    /// record is dropped before the read completes, the result is discarded.
    pub fn reload(self: &Arc<Self>) {
        self.reloaded.send_replace(false);

        let weak = Arc::downgrade(self);
        let client = self.client.clone();
        let groups = self.meta_groups.clone();
        let name = self.name.clone();

        info!(bucket = %name, "scheduling metadata reload");
        tokio::spawn(async move {
            let result = client.read(BUCKET_NAMESPACE, &groups, &name).await;
            let Some(record) = weak.upgrade() else {
                return;
            };
            record.reload_completed(result);
        });
    }

    fn reload_completed(&self, result: Result<Bytes, StoreError>) {
        match result {
            Err(e) => {
                error!(bucket = %self.name, error = %e, "could not reload bucket metadata");
            }
            Ok(blob) => self.apply_meta_blob(&blob),
        }
        self.reloaded.send_replace(true);
    }

    /// Decode and publish a metadata blob. On any failure the previously
    /// loaded metadata stays in place.
    fn apply_meta_blob(&self, blob: &[u8]) {
        match BucketMeta::decode_named(&self.name, blob) {
            Err(e) => {
                error!(bucket = %self.name, error = %e, "could not decode bucket metadata");
            }
            Ok(meta) => {
                info!(
                    bucket = %self.name,
                    acls = meta.acl.len(),
                    flags = meta.flags,
                    groups = ?meta.groups,
                    "bucket metadata loaded"
                );
                let mut state = self.state.lock().expect("bucket lock poisoned");
                state.meta = meta;
                state.meta_loaded = true;
            }
        }
    }

    /// Wait until at least one reload attempt has completed, then report
    /// whether the record is valid.
    pub async fn wait_for_reload(&self) -> bool {
        let mut rx = self.reloaded.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
        self.valid()
    }

    /// A bucket is usable once its metadata has decoded at least once and it
    /// has at least one backend measurement.
    pub fn valid(&self) -> bool {
        let state = self.state.lock().expect("bucket lock poisoned");
        state.meta_loaded && !state.stat.is_empty()
    }

    /// The bucket's name, its identity within a processor.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the current metadata.
    pub fn meta(&self) -> BucketMeta {
        self.state.lock().expect("bucket lock poisoned").meta.clone()
    }

    /// Render the current backend statistics for diagnostics.
    pub fn stat_str(&self) -> String {
        self.state.lock().expect("bucket lock poisoned").stat.to_string()
    }

    /// Publish a fresh measurement for one of the bucket's groups.
    pub fn set_backend_stat(&self, group: GroupId, stat: BackendStat) {
        let mut state = self.state.lock().expect("bucket lock poisoned");
        state.stat.backends.insert(group, stat);
    }

    /// A session bound to this bucket's namespace and replica groups, with
    /// the default 60-second timeout.
    ///
    /// An invalid bucket yields a session with no destination groups, so any
    /// I/O on it fails deterministically instead of reaching a wrong
    /// destination.
    pub fn session(&self) -> Session {
        let state = self.state.lock().expect("bucket lock poisoned");
        let session = Session::new(self.client.clone(), &self.name);
        if !state.meta_loaded || state.stat.is_empty() {
            return session;
        }
        session.with_groups(state.meta.groups.clone())
    }

    /// Weight of this bucket for a write of `size` bytes, in [0, 1].
    ///
    /// The write must land on every replica, so the backend with the least
    /// usable space sets the ceiling: any other aggregate could pick a
    /// bucket that immediately fills one of its replicas. Per backend:
    /// less free space than `size`, or a free fraction under the hard
    /// limit, makes the bucket ineligible; a free fraction under the soft
    /// limit is divided by 10. The smallest surviving fraction is the
    /// bucket's weight. Pure function of the latest snapshot, no I/O.
    pub fn weight(&self, size: u64, limits: &Limits) -> f64 {
        let state = self.state.lock().expect("bucket lock poisoned");

        let mut size_weight = 0.0;
        for stat in state.stat.backends.values() {
            if stat.size.free_bytes() < size {
                return 0.0;
            }

            let mut frac = stat.size.free_fraction();
            if frac < limits.size.hard {
                return 0.0;
            }
            if frac < limits.size.soft {
                frac /= 10.0;
            }

            if size_weight == 0.0 || frac < size_weight {
                size_weight = frac;
            }
        }

        size_weight
    }
}

impl std::fmt::Debug for BucketRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketRecord")
            .field("name", &self.name)
            .field("meta_groups", &self.meta_groups)
            .field("valid", &self.valid())
            .finish_non_exhaustive()
    }
}
