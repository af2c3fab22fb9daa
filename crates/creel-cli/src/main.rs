//! Creel demo shell.
//!
//! Seeds an in-memory cluster with generated buckets and a catalog key,
//! initializes a [`BucketProcessor`] from that key, runs the
//! selection-distribution self-test, and reports a sample placement. This is
//! the full bootstrap path — catalog key, metadata reload, statistics
//! seeding, weighted selection — without an external cluster.

use std::sync::Arc;

use anyhow::{Context, Result, bail, ensure};
use bytes::Bytes;
use clap::Parser;
use creel_routing::BucketProcessor;
use creel_store::{MemoryCluster, StoreClient};
use creel_types::{BUCKET_NAMESPACE, BucketAcl, BucketMeta, GroupId, acl::auth};
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "creel", version, about = "Creel bucket routing self-test")]
struct Cli {
    /// Replica groups holding bucket metadata, colon-separated (e.g. "1:2:3").
    #[arg(long, default_value = "1:2:3")]
    groups: String,

    /// Number of buckets to generate.
    #[arg(long, default_value_t = 3)]
    buckets: usize,

    /// Per-group capacity in bytes for the simulated cluster.
    #[arg(long, default_value_t = 1_000_000_000)]
    capacity: u64,

    /// Payload size to place after the self-test.
    #[arg(long, default_value_t = 4096)]
    size: u64,

    /// Log level filter (e.g. "info", "debug").
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_groups(spec: &str) -> Result<Vec<GroupId>> {
    let groups = spec
        .split(':')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<GroupId>().context("invalid group id"))
        .collect::<Result<Vec<_>>>()?;
    if groups.is_empty() {
        bail!("no groups given");
    }
    Ok(groups)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let groups = parse_groups(&cli.groups)?;
    ensure!(cli.buckets > 0, "need at least one bucket");
    ensure!(cli.capacity >= 1024, "per-group capacity too small");

    // Simulated cluster: one pristine backend per group. The self-test needs
    // comparable weights; fill levels are shifted afterwards to show the
    // capacity bias on the sample placement.
    let cluster = Arc::new(MemoryCluster::new());
    let mut rng = rand::rng();
    for group in &groups {
        cluster.add_group(*group, cli.capacity);
    }

    // Generate bucket metadata and upload it under the reserved namespace,
    // then write the catalog key enumerating the bucket names.
    let client: Arc<dyn StoreClient> = cluster.clone();
    let mut names = Vec::with_capacity(cli.buckets);
    for i in 0..cli.buckets {
        let name = format!("bucket-test-{i}.{}", rng.random_range(0..u32::MAX));

        let acl = BucketAcl {
            user: "writer".to_string(),
            token: "secure token".to_string(),
            flags: auth::WRITE,
        };
        let mut meta = BucketMeta::new(&name);
        meta.groups = groups.clone();
        meta.acl.insert(acl.user.clone(), acl);

        let blob = meta.encode().context("could not encode bucket metadata")?;
        client
            .write(BUCKET_NAMESPACE, &groups, &name, Bytes::from(blob))
            .await
            .with_context(|| format!("could not write metadata for {name}"))?;

        info!(bucket = %name, "uploaded bucket metadata");
        names.push(name);
    }

    let catalog_key = "bucket-directory";
    client
        .write(
            BUCKET_NAMESPACE,
            &groups,
            catalog_key,
            Bytes::from(names.join("\n")),
        )
        .await
        .context("could not write catalog key")?;
    info!(key = catalog_key, buckets = names.len(), "uploaded catalog");

    let processor = BucketProcessor::new(client);
    ensure!(
        processor.init_with_key(groups.clone(), catalog_key).await,
        "could not initialize bucket processor"
    );

    processor
        .test()
        .context("selection distribution self-test failed")?;
    info!("self-test passed");

    // Skew the fill levels and refresh so the sample placement reflects
    // real capacity differences.
    for group in &groups {
        let used = rng.random_range(0..cli.capacity / 2);
        cluster.set_group_capacity(*group, cli.capacity, used);
    }
    processor.refresh().await;

    let bucket = processor
        .get_bucket(cli.size)
        .context("no bucket suitable for the requested size")?;
    info!(
        bucket = %bucket.name(),
        size = cli.size,
        stats = %bucket.stat_str(),
        "placed sample write"
    );

    processor.shutdown();
    Ok(())
}
