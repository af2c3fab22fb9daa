//! Integration test: bootstrap.
//!
//! Full startup path against a simulated cluster: catalog key, metadata
//! reload, statistics seeding, lookups, and bucket-bound sessions.

use bytes::Bytes;
use creel_integration_tests::TestCluster;
use creel_routing::{BucketProcessor, RoutingError};
use creel_types::{BucketAcl, BucketMeta, acl::auth};

#[tokio::test(flavor = "multi_thread")]
async fn test_bootstrap_from_catalog_key() {
    let tc = TestCluster::new(&[1, 2, 3], 1_000_000_000);
    tc.put_bucket("alpha", &[1, 2]).await;
    tc.put_bucket("beta", &[2, 3]).await;
    tc.put_bucket("gamma", &[1, 3]).await;
    tc.put_catalog("directory", "alpha\nbeta\ngamma\n").await;

    let processor = tc.processor_with_key("directory").await;

    for name in ["alpha", "beta", "gamma"] {
        let record = processor.find_bucket(name).unwrap();
        assert!(record.valid());
        assert_eq!(record.meta().name, name);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_catalog_blob_with_and_without_trailing_newline() {
    for blob in ["a\nb\nc", "a\nb\nc\n"] {
        let tc = TestCluster::new(&[1], 1_000_000);
        for name in ["a", "b", "c"] {
            tc.put_bucket(name, &[1]).await;
        }
        tc.put_catalog("dir", blob).await;

        let processor = tc.processor_with_key("dir").await;
        for name in ["a", "b", "c"] {
            assert!(
                processor.find_bucket(name).is_ok(),
                "bucket {name} missing for blob {blob:?}"
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_static_list_bootstrap() {
    let tc = TestCluster::new(&[1, 2], 1_000_000);
    tc.put_bucket("static-0", &[1]).await;
    tc.put_bucket("static-1", &[2]).await;

    let processor = BucketProcessor::new(tc.client());
    assert!(
        processor
            .init(
                tc.meta_groups.clone(),
                vec!["static-0".to_string(), "static-1".to_string()],
            )
            .await
    );

    assert!(processor.find_bucket("static-0").is_ok());
    assert!(processor.find_bucket("static-1").is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bucket_session_round_trip() {
    let tc = TestCluster::new(&[1, 2], 1_000_000);
    tc.put_bucket("media", &[1, 2]).await;
    tc.put_catalog("dir", "media").await;

    let processor = tc.processor_with_key("dir").await;
    let bucket = processor.get_bucket(1024).unwrap();
    assert_eq!(bucket.name(), "media");

    // The session is bound to the bucket's own namespace and groups; data
    // written through it comes back through a second session.
    let session = bucket.session();
    assert_eq!(session.namespace(), "media");
    assert_eq!(session.groups(), &[1, 2]);
    session
        .write("photos/cat.jpg", Bytes::from_static(b"jpeg bytes"))
        .await
        .unwrap();

    let again = processor.find_bucket("media").unwrap().session();
    assert_eq!(
        again.read("photos/cat.jpg").await.unwrap(),
        Bytes::from_static(b"jpeg bytes")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_acl_travels_through_bootstrap() {
    let tc = TestCluster::new(&[1], 1_000_000);

    let mut meta = BucketMeta::new("secured");
    meta.groups = vec![1];
    meta.max_size = 1 << 20;
    meta.acl.insert(
        "writer".to_string(),
        BucketAcl {
            user: "writer".to_string(),
            token: "secure token".to_string(),
            flags: auth::WRITE | auth::NO_TOKEN,
        },
    );
    tc.put_bucket_meta(&meta).await;
    tc.put_catalog("dir", "secured").await;

    let processor = tc.processor_with_key("dir").await;
    let loaded = processor.find_bucket("secured").unwrap().meta();

    assert_eq!(loaded.max_size, 1 << 20);
    let acl = &loaded.acl["writer"];
    assert!(acl.can_write());
    assert!(!acl.can_admin());
    assert!(acl.has_no_token());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_paths_surface_expected_codes() {
    let tc = TestCluster::new(&[1], 1_000_000);
    tc.put_bucket("present", &[1]).await;
    tc.put_catalog("dir", "present\nabsent").await;

    let processor = tc.processor_with_key("dir").await;

    let not_found = processor.find_bucket("nope").unwrap_err();
    assert!(matches!(not_found, RoutingError::BucketNotFound(_)));
    assert_eq!(not_found.errno(), -2);

    // "absent" is listed in the catalog but has no metadata blob.
    let not_valid = processor.find_bucket("absent").unwrap_err();
    assert!(matches!(not_valid, RoutingError::BucketNotValid(_)));
    assert_eq!(not_valid.errno(), -22);
}
