//! Shared test harness for Creel integration tests.
//!
//! Provides [`TestCluster`] — an in-memory simulated cluster plus helpers to
//! seed bucket metadata and catalog keys the way an external catalog manager
//! would, so tests can exercise the full bootstrap path: catalog key →
//! metadata reload → statistics seeding → weighted selection.

use std::sync::Arc;

use bytes::Bytes;
use creel_routing::BucketProcessor;
use creel_store::{MemoryCluster, StoreClient};
use creel_types::{BUCKET_NAMESPACE, BucketMeta, GroupId};

/// An in-memory cluster with a fixed set of metadata groups.
pub struct TestCluster {
    /// The simulated cluster.
    pub cluster: Arc<MemoryCluster>,
    /// Groups holding bucket metadata and catalog blobs.
    pub meta_groups: Vec<GroupId>,
}

impl TestCluster {
    /// Create a cluster where every group in `groups` has `limit` bytes of
    /// capacity. The full group list doubles as the metadata group set.
    pub fn new(groups: &[GroupId], limit: u64) -> Self {
        let cluster = Arc::new(MemoryCluster::new());
        for group in groups {
            cluster.add_group(*group, limit);
        }
        Self {
            cluster,
            meta_groups: groups.to_vec(),
        }
    }

    /// The cluster as a trait-object store client.
    pub fn client(&self) -> Arc<dyn StoreClient> {
        self.cluster.clone()
    }

    /// Write metadata for a bucket pinned to `data_groups`.
    pub async fn put_bucket(&self, name: &str, data_groups: &[GroupId]) {
        let mut meta = BucketMeta::new(name);
        meta.groups = data_groups.to_vec();
        self.put_bucket_meta(&meta).await;
    }

    /// Write a fully specified metadata record.
    pub async fn put_bucket_meta(&self, meta: &BucketMeta) {
        let blob = Bytes::from(meta.encode().expect("encode bucket meta"));
        self.cluster
            .write(BUCKET_NAMESPACE, &self.meta_groups, &meta.name, blob)
            .await
            .expect("write bucket meta");
    }

    /// Write a raw catalog blob under `key`.
    pub async fn put_catalog(&self, key: &str, blob: &str) {
        self.cluster
            .write(
                BUCKET_NAMESPACE,
                &self.meta_groups,
                key,
                Bytes::from(blob.as_bytes().to_vec()),
            )
            .await
            .expect("write catalog blob");
    }

    /// Build a processor and initialize it from `key`, asserting success.
    pub async fn processor_with_key(&self, key: &str) -> Arc<BucketProcessor> {
        let processor = BucketProcessor::new(self.client());
        assert!(
            processor.init_with_key(self.meta_groups.clone(), key).await,
            "processor init from catalog key '{key}' failed"
        );
        processor
    }
}
