//! Integration test: catalog refresh and degraded operation.
//!
//! The background task runs the same `refresh` the tests drive directly
//! here: re-read the catalog key, rebuild the records, swap the snapshot.

use creel_integration_tests::TestCluster;
use creel_routing::RoutingError;

#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_picks_up_new_and_removed_buckets() {
    let tc = TestCluster::new(&[1, 2], 1_000_000_000);
    tc.put_bucket("old", &[1]).await;
    tc.put_catalog("dir", "old").await;

    let processor = tc.processor_with_key("dir").await;
    assert!(processor.find_bucket("old").is_ok());

    // The catalog manager swaps the bucket set.
    tc.put_bucket("new", &[2]).await;
    tc.put_catalog("dir", "new").await;
    processor.refresh().await;

    assert!(processor.find_bucket("new").is_ok());
    assert!(matches!(
        processor.find_bucket("old").unwrap_err(),
        RoutingError::BucketNotFound(_)
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_picks_up_metadata_changes() {
    let tc = TestCluster::new(&[1, 2], 1_000_000_000);
    tc.put_bucket("moving", &[1]).await;
    tc.put_catalog("dir", "moving").await;

    let processor = tc.processor_with_key("dir").await;
    assert_eq!(
        processor.find_bucket("moving").unwrap().meta().groups,
        vec![1]
    );

    // The bucket is repinned to another group set.
    tc.put_bucket("moving", &[1, 2]).await;
    processor.refresh().await;

    assert_eq!(
        processor.find_bucket("moving").unwrap().meta().groups,
        vec![1, 2]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_outage_degrades_then_recovers() {
    let tc = TestCluster::new(&[1], 1_000_000_000);
    tc.put_bucket("resilient", &[1]).await;
    tc.put_catalog("dir", "resilient").await;

    let processor = tc.processor_with_key("dir").await;
    assert!(processor.get_bucket(100).is_ok());

    // Total outage: the catalog re-read fails (names are kept), the rebuilt
    // records cannot load metadata or statistics, selection degrades to
    // NoBucketSuitable — but the processor itself stays up.
    tc.cluster.set_group_up(1, false);
    processor.refresh().await;
    assert!(matches!(
        processor.get_bucket(100).unwrap_err(),
        RoutingError::NoBucketSuitable { .. }
    ));

    // The store comes back; the next tick restores service.
    tc.cluster.set_group_up(1, true);
    processor.refresh().await;
    assert_eq!(processor.get_bucket_name(100).unwrap(), "resilient");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_capacity_shift_retargets_writes() {
    let tc = TestCluster::new(&[10, 20], 1_000_000_000);
    tc.put_bucket("a", &[10]).await;
    tc.put_bucket("b", &[20]).await;
    tc.put_catalog("dir", "a\nb").await;

    let processor = tc.processor_with_key("dir").await;

    // Group 10 fills up past the hard limit; after a refresh, every write
    // goes to "b".
    tc.cluster
        .set_group_capacity(10, 1_000_000_000, 960_000_000);
    processor.refresh().await;

    for _ in 0..100 {
        assert_eq!(processor.get_bucket_name(100).unwrap(), "b");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_held_session_survives_refresh_churn() {
    let tc = TestCluster::new(&[1], 1_000_000_000);
    tc.put_bucket("stable", &[1]).await;
    tc.put_catalog("dir", "stable").await;

    let processor = tc.processor_with_key("dir").await;
    let session = processor.find_bucket("stable").unwrap().session();

    for _ in 0..3 {
        processor.refresh().await;
    }

    // The session predates three catalog swaps and still routes correctly.
    session
        .write("key", bytes::Bytes::from_static(b"durable"))
        .await
        .unwrap();
    let fresh = processor.find_bucket("stable").unwrap().session();
    assert_eq!(
        fresh.read("key").await.unwrap(),
        bytes::Bytes::from_static(b"durable")
    );
}
