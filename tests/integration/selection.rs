//! Integration test: selection behavior.
//!
//! Verifies that `get_bucket` tracks free space and route reachability the
//! way the weight function promises: hard gating on free bytes, the
//! below-soft penalty, and the route-table penalty for cut-off buckets.

use creel_integration_tests::TestCluster;
use creel_routing::RoutingError;

/// B1 sits on a pristine group (weight 1.0), B2 on a group at 20% free
/// (below the soft limit, weight 0.02). Small writes should land on B1
/// almost always; a 300 MB write cannot fit B2 at all.
#[tokio::test(flavor = "multi_thread")]
async fn test_selection_prefers_free_space() {
    let tc = TestCluster::new(&[10, 20], 1_000_000_000);
    tc.put_bucket("b1", &[10]).await;
    tc.put_bucket("b2", &[20]).await;
    tc.put_catalog("dir", "b1\nb2").await;

    // Pin the fill levels after seeding so the weights are exact: the few
    // bytes of metadata written above must not skew the fractions.
    tc.cluster.set_group_capacity(10, 1_000_000_000, 0);
    tc.cluster
        .set_group_capacity(20, 1_000_000_000, 800_000_000);

    let processor = tc.processor_with_key("dir").await;

    let mut b2_wins = 0;
    for _ in 0..1000 {
        if processor.get_bucket_name(100).unwrap() == "b2" {
            b2_wins += 1;
        }
    }
    // B2's share of the total weight is 0.02 / 1.02; with the selector's
    // one-decimal draw it should essentially never win.
    assert!(b2_wins < 100, "penalized bucket won {b2_wins}/1000 draws");

    // At 300 MB, B2's 200 MB of free space disqualifies it outright.
    for _ in 0..100 {
        assert_eq!(processor.get_bucket_name(300_000_000).unwrap(), "b1");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_bucket_fits_oversized_write() {
    let tc = TestCluster::new(&[1], 1_000_000);
    tc.put_bucket("small", &[1]).await;
    tc.put_catalog("dir", "small").await;

    let processor = tc.processor_with_key("dir").await;
    let err = processor.get_bucket(10_000_000).unwrap_err();
    assert!(matches!(err, RoutingError::NoBucketSuitable { .. }));
    assert_eq!(err.errno(), -19);
}

/// A bucket whose replica set is only partially routable is penalized a
/// hundredfold, so a fully routable competitor dominates.
#[tokio::test(flavor = "multi_thread")]
async fn test_partially_routable_bucket_loses() {
    let tc = TestCluster::new(&[1, 10, 20], 1_000_000_000);
    tc.put_bucket("routed", &[10]).await;
    tc.put_bucket("cut-off", &[10, 20]).await;
    tc.put_catalog("dir", "routed\ncut-off").await;

    // Exact weights: reset the fill levels the metadata writes added.
    tc.cluster.set_group_capacity(10, 1_000_000_000, 0);
    tc.cluster.set_group_capacity(20, 1_000_000_000, 0);

    let processor = tc.processor_with_key("dir").await;

    // Both buckets seeded while everything was up; now group 20 vanishes
    // from the route table.
    tc.cluster.set_group_up(20, false);

    let mut cut_off_wins = 0;
    for _ in 0..1000 {
        if processor.get_bucket_name(100).unwrap() == "cut-off" {
            cut_off_wins += 1;
        }
    }
    assert!(
        cut_off_wins < 100,
        "cut-off bucket won {cut_off_wins}/1000 draws"
    );
}

/// With no alternative, the penalized bucket is still returned — degraded,
/// not unavailable.
#[tokio::test(flavor = "multi_thread")]
async fn test_partially_routable_bucket_wins_when_alone() {
    let tc = TestCluster::new(&[1, 10, 20], 1_000_000_000);
    tc.put_bucket("only", &[10, 20]).await;
    tc.put_catalog("dir", "only").await;

    let processor = tc.processor_with_key("dir").await;
    tc.cluster.set_group_up(20, false);

    assert_eq!(processor.get_bucket_name(100).unwrap(), "only");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_distribution_self_test_passes() {
    let tc = TestCluster::new(&[1, 2], 1_000_000_000);
    tc.put_bucket("b0", &[1, 2]).await;
    tc.put_bucket("b1", &[1, 2]).await;
    tc.put_catalog("dir", "b0\nb1").await;

    let processor = tc.processor_with_key("dir").await;
    processor.test().unwrap();
}
