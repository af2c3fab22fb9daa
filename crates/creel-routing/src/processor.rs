//! The bucket processor: catalog lifecycle, background refresh, selection.
//!
//! This is the public facade of the routing core. There are multiple
//! [`BucketRecord`]s in a processor; each corresponds to a logical container
//! that handles replication for the data written into it. After data has
//! been written into a bucket it can only be read from and updated in that
//! bucket — the processor's job is to pick the bucket for the *first* write,
//! via [`get_bucket`](BucketProcessor::get_bucket), biased toward buckets
//! with more usable free space and reachable replicas.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use creel_store::{Session, StoreClient};
use creel_types::{GroupId, Limits};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::bucket::BucketRef;
use crate::catalog;
use crate::error::RoutingError;
use crate::selector::{Candidate, select_bucket};
use crate::stats::StatRefresher;

/// How often the background task rebuilds the catalog snapshot.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Number of draws the distribution self-test performs.
const SELF_TEST_DRAWS: usize = 10_000;

/// Client-side bucket routing facade.
///
/// Owns the bucket catalog, a statistics refresher, and one background task
/// that re-reads the catalog key (when configured) and rebuilds the catalog
/// snapshot every [`REFRESH_INTERVAL`]. The processor never fails on
/// transient store errors once initialized: availability degrades (fewer
/// valid records, lower weights) rather than flipping off.
pub struct BucketProcessor {
    client: Arc<dyn StoreClient>,
    refresher: StatRefresher,
    limits: Limits,
    state: Mutex<ProcessorState>,
    shutdown: watch::Sender<bool>,
}

#[derive(Default)]
struct ProcessorState {
    meta_groups: Vec<GroupId>,
    catalog_key: Option<String>,
    names: Vec<String>,
    buckets: HashMap<String, BucketRef>,
}

impl BucketProcessor {
    /// Create a processor with default [`Limits`] and start its background
    /// refresh task.
    pub fn new(client: Arc<dyn StoreClient>) -> Arc<Self> {
        Self::with_limits(client, Limits::default())
    }

    /// Create a processor with explicit selection limits.
    pub fn with_limits(client: Arc<dyn StoreClient>, limits: Limits) -> Arc<Self> {
        let (shutdown, _) = watch::channel(false);
        let processor = Arc::new(Self {
            refresher: StatRefresher::new(client.clone()),
            client,
            limits,
            state: Mutex::new(ProcessorState::default()),
            shutdown,
        });

        // The refresh task holds only a weak handle: dropping the last
        // caller reference stops the loop just like an explicit shutdown.
        let weak = Arc::downgrade(&processor);
        let mut shutdown_rx = processor.shutdown.subscribe();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(REFRESH_INTERVAL);
            // The first tick completes immediately; the catalog was just
            // built by init, so skip it.
            tick.tick().await;
            loop {
                tokio::select! {
                    _ = tick.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }
                let Some(processor) = weak.upgrade() else {
                    break;
                };
                processor.refresh().await;
            }
            debug!("bucket refresh task stopped");
        });

        processor
    }

    /// Initialize from an explicit list of bucket names.
    ///
    /// Builds the initial catalog snapshot synchronously. Returns `true` iff
    /// at least one bucket record was constructed; empty input or missing
    /// metadata groups report `false`.
    pub async fn init(&self, meta_groups: Vec<GroupId>, names: Vec<String>) -> bool {
        if meta_groups.is_empty() || names.is_empty() {
            return false;
        }

        let buckets = catalog::read_buckets(
            &self.client,
            &self.refresher,
            &meta_groups,
            &names,
            &self.limits,
        )
        .await;

        let mut state = self.state.lock().expect("processor lock poisoned");
        state.meta_groups = meta_groups;
        state.names = names;
        let constructed = !buckets.is_empty();
        state.buckets = buckets;
        constructed
    }

    /// Initialize from a catalog key.
    ///
    /// Reads the key synchronously from the reserved namespace; its value is
    /// a newline-separated list of bucket names. Returns `false` on an empty
    /// key, a failed read, or an empty catalog.
    pub async fn init_with_key(
        &self,
        meta_groups: Vec<GroupId>,
        catalog_key: impl Into<String>,
    ) -> bool {
        let key = catalog_key.into();
        if key.is_empty() || meta_groups.is_empty() {
            return false;
        }

        {
            let mut state = self.state.lock().expect("processor lock poisoned");
            state.catalog_key = Some(key.clone());
        }

        let names = match catalog::read_bucket_list(&self.client, &meta_groups, &key).await {
            Ok(names) => names,
            Err(e) => {
                error!(key = %key, error = %e, "could not read bucket catalog");
                return false;
            }
        };

        self.init(meta_groups, names).await
    }

    /// Run one catalog refresh immediately.
    ///
    /// Re-reads the catalog key when one is configured (keeping the previous
    /// name set if the read fails), rebuilds the catalog snapshot, and swaps
    /// it in atomically. The background task invokes this every
    /// [`REFRESH_INTERVAL`].
    pub async fn refresh(&self) {
        let (meta_groups, key, mut names) = {
            let state = self.state.lock().expect("processor lock poisoned");
            (
                state.meta_groups.clone(),
                state.catalog_key.clone(),
                state.names.clone(),
            )
        };
        if meta_groups.is_empty() {
            // Not initialized yet; nothing to refresh.
            return;
        }

        if let Some(key) = key {
            match catalog::read_bucket_list(&self.client, &meta_groups, &key).await {
                Ok(list) => names = list,
                Err(e) => {
                    error!(key = %key, error = %e, "could not refresh bucket catalog, keeping previous names");
                }
            }
        }

        let buckets = catalog::read_buckets(
            &self.client,
            &self.refresher,
            &meta_groups,
            &names,
            &self.limits,
        )
        .await;

        let mut state = self.state.lock().expect("processor lock poisoned");
        state.names = names;
        state.buckets = buckets;
    }

    /// Select a bucket able to take a write of `size` bytes.
    ///
    /// Collects the currently valid records with non-zero weight, asks the
    /// store for its route table, and samples one bucket proportionally to
    /// weight (unreachable replica sets are heavily penalized). Errors:
    /// [`RoutingError::NoBucketsConfigured`] when the catalog is empty,
    /// [`RoutingError::NoBucketSuitable`] when every bucket was filtered.
    pub fn get_bucket(&self, size: u64) -> Result<BucketRef, RoutingError> {
        let candidates = {
            let state = self.state.lock().expect("processor lock poisoned");
            if state.buckets.is_empty() {
                return Err(RoutingError::NoBucketsConfigured);
            }

            state
                .buckets
                .values()
                .filter(|record| record.valid())
                .filter_map(|record| {
                    // Weight computation is the heavy part; cache it.
                    let weight = record.weight(size, &self.limits);
                    (weight > 0.0).then(|| Candidate {
                        bucket: record.clone(),
                        weight,
                    })
                })
                .collect::<Vec<_>>()
        };

        if candidates.is_empty() {
            return Err(RoutingError::NoBucketSuitable { size });
        }

        // The catalog lock is released before touching the route table.
        let routes = self.client.route_table();
        select_bucket(candidates, &routes, &mut rand::rng())
            .ok_or(RoutingError::NoBucketSuitable { size })
    }

    /// Like [`get_bucket`](Self::get_bucket), returning just the name.
    pub fn get_bucket_name(&self, size: u64) -> Result<String, RoutingError> {
        Ok(self.get_bucket(size)?.name().to_string())
    }

    /// Look up a bucket by name.
    ///
    /// Errors: [`RoutingError::BucketNotFound`] for an unknown name,
    /// [`RoutingError::BucketNotValid`] when the record has not loaded.
    pub fn find_bucket(&self, name: &str) -> Result<BucketRef, RoutingError> {
        let state = self.state.lock().expect("processor lock poisoned");
        let record = state
            .buckets
            .get(name)
            .ok_or_else(|| RoutingError::BucketNotFound(name.to_string()))?;
        if !record.valid() {
            return Err(RoutingError::BucketNotValid(name.to_string()));
        }
        Ok(record.clone())
    }

    /// A pre-built session with no destination groups.
    ///
    /// Every operation on it fails deterministically; callers use it to
    /// produce uniform error results when no bucket is available.
    pub fn error_session(&self) -> Session {
        Session::new(self.client.clone(), "")
    }

    /// Stop the background refresh task.
    ///
    /// Shutdown is cooperative: an in-flight refresh completes before the
    /// task exits. Dropping the last reference has the same effect.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send_replace(true);
    }

    /// Distribution self-test.
    ///
    /// Draws [`get_bucket`](Self::get_bucket) 10,000 times at size 1 and
    /// checks that each reference bucket's selection frequency tracks its
    /// weight share. When any bucket weighs more than 0.5, the reference
    /// set is restricted to those buckets — low-weight buckets see too few
    /// draws at the selector's one-decimal resolution to compare reliably.
    /// Expected shares are computed against the full-catalog weight sum,
    /// because that is what the selection draws against.
    pub fn test(&self) -> Result<(), RoutingError> {
        struct Tracked {
            bucket: BucketRef,
            weight: f64,
            counter: usize,
        }

        let (mut tracked, full_sum) = {
            let state = self.state.lock().expect("processor lock poisoned");
            if state.buckets.is_empty() {
                return Err(RoutingError::NoBucketsConfigured);
            }

            let mut tracked = Vec::new();
            let mut sum = 0.0;
            for record in state.buckets.values() {
                if !record.valid() {
                    continue;
                }
                let weight = record.weight(1, &self.limits);
                debug!(bucket = %record.name(), weight, "self-test: bucket weight");
                // Zero weight usually means no free space for the request,
                // or broken (timed out) statistics.
                if weight <= 0.0 {
                    continue;
                }
                sum += weight;
                tracked.push(Tracked {
                    bucket: record.clone(),
                    weight,
                    counter: 0,
                });
            }
            (tracked, sum)
        };

        if tracked.is_empty() {
            return Err(RoutingError::NoBucketSuitable { size: 1 });
        }

        if tracked.iter().any(|t| t.weight > 0.5) {
            tracked.retain(|t| t.weight > 0.5);
        }

        for _ in 0..SELF_TEST_DRAWS {
            let name = self
                .get_bucket_name(1)
                .map_err(|e| RoutingError::SelfTest(format!("get_bucket failed: {e}")))?;
            if let Some(t) = tracked.iter_mut().find(|t| t.bucket.name() == name) {
                t.counter += 1;
            }
        }

        const EQ_MIN: f64 = 0.9;
        const EQ_MAX: f64 = 1.1;
        for t in &tracked {
            let ratio = t.counter as f64 / SELF_TEST_DRAWS as f64;
            let wratio = t.weight / full_sum;
            let eq = ratio / wratio;

            info!(
                bucket = %t.bucket.name(),
                weight = t.weight,
                counter = t.counter,
                draws = SELF_TEST_DRAWS,
                wratio,
                ratio,
                eq,
                "self-test: selection distribution"
            );

            if !(EQ_MIN..=EQ_MAX).contains(&eq) {
                return Err(RoutingError::SelfTest(format!(
                    "bucket {}: weight ratio {wratio:.3} and selection ratio {ratio:.3} \
                     diverge (x{eq:.2}, allowed [{EQ_MIN}, {EQ_MAX}])",
                    t.bucket.name()
                )));
            }
        }

        Ok(())
    }
}

impl Drop for BucketProcessor {
    fn drop(&mut self) {
        let _ = self.shutdown.send_replace(true);
    }
}

impl std::fmt::Debug for BucketProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().expect("processor lock poisoned");
        f.debug_struct("BucketProcessor")
            .field("buckets", &state.buckets.len())
            .field("catalog_key", &state.catalog_key)
            .field("meta_groups", &state.meta_groups)
            .finish_non_exhaustive()
    }
}
