//! Catalog loading: resolving bucket names and building records.
//!
//! The catalog is either a static list of names supplied by the caller or a
//! single *catalog key* whose value, stored in the reserved `bucket`
//! namespace on the metadata groups, is a newline-separated list of names.

use std::collections::HashMap;
use std::sync::Arc;

use creel_store::{StoreClient, StoreError};
use creel_types::{BUCKET_NAMESPACE, GroupId, Limits};
use tracing::{info, warn};

use crate::bucket::{BucketRecord, BucketRef};
use crate::stats::StatRefresher;

/// Parse a catalog blob into bucket names.
///
/// Names are separated by `\n`; a trailing newline is optional and blank
/// lines are skipped.
pub fn parse_bucket_list(blob: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(blob)
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse the catalog key from the reserved namespace.
pub async fn read_bucket_list(
    client: &Arc<dyn StoreClient>,
    meta_groups: &[GroupId],
    key: &str,
) -> Result<Vec<String>, StoreError> {
    let blob = client.read(BUCKET_NAMESPACE, meta_groups, key).await?;
    Ok(parse_bucket_list(&blob))
}

/// Build a catalog snapshot for the given names.
///
/// Constructs a record per name (each schedules its metadata reload), runs
/// one statistics refresh, waits for every record's reload attempt, and
/// seeds per-group measurements from the refresher. Records whose metadata
/// or statistics are missing stay in the snapshot as invalid entries until
/// a later refresh revives them.
pub async fn read_buckets(
    client: &Arc<dyn StoreClient>,
    refresher: &StatRefresher,
    meta_groups: &[GroupId],
    names: &[String],
    limits: &Limits,
) -> HashMap<String, BucketRef> {
    let mut buckets = HashMap::with_capacity(names.len());
    for name in names {
        buckets.insert(
            name.clone(),
            BucketRecord::new(client.clone(), meta_groups.to_vec(), name.clone()),
        );
    }

    if let Err(e) = refresher.refresh().await {
        warn!(error = %e, "statistics refresh failed, keeping previous measurements");
    }

    for (name, record) in &buckets {
        record.wait_for_reload().await;

        let meta = record.meta();
        for group in &meta.groups {
            if let Some(stat) = refresher.stat(*group) {
                record.set_backend_stat(*group, stat);
            }
        }

        info!(
            bucket = %name,
            valid = record.valid(),
            stats = %record.stat_str(),
            weight = record.weight(1, limits),
            "bucket reloaded"
        );
    }

    buckets
}
