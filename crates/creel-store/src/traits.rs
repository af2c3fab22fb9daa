//! Core trait for the underlying replicated store.

use bytes::Bytes;
use creel_types::{BackendStat, GroupId};

use crate::error::StoreError;
use crate::route::RouteTable;

/// Client of the underlying replicated key-value store.
///
/// All implementations must be `Send + Sync`; the routing core shares one
/// client across its records and background tasks. Payloads travel as
/// [`Bytes`] so blobs can be handed around without copying.
#[async_trait::async_trait]
pub trait StoreClient: Send + Sync {
    /// Read the value of `key` in `namespace` from the addressed groups.
    ///
    /// Replicas are interchangeable: the value may come from any reachable
    /// group in the set.
    async fn read(
        &self,
        namespace: &str,
        groups: &[GroupId],
        key: &str,
    ) -> Result<Bytes, StoreError>;

    /// Write `data` under `key` in `namespace` to every addressed group.
    async fn write(
        &self,
        namespace: &str,
        groups: &[GroupId],
        key: &str,
        data: Bytes,
    ) -> Result<(), StoreError>;

    /// Current capacity measurement for every group the client can see.
    ///
    /// Groups that are down or whose statistics timed out are omitted.
    async fn group_stats(&self) -> Result<Vec<BackendStat>, StoreError>;

    /// Snapshot of the groups currently reachable.
    ///
    /// This is called on every bucket selection and must be cheap: O(groups),
    /// non-blocking. Implementations may serve a cached view up to ~1 s
    /// stale.
    fn route_table(&self) -> RouteTable;
}
