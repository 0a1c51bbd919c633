// tests/integration/health_test.rs

use crate::integration::test_helpers::TestContext;
use clusterd::config::{ClusterConfig, UpQuorumCheck};
use clusterd::core::health::HealthAggregator;
use std::time::Duration;

#[tokio::test]
async fn aggregator_reports_up_once_every_member_is_started_and_up() {
    let config = ClusterConfig {
        initial_size: 2,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    let aggregator = HealthAggregator::new(
        ctx.controller.state(),
        UpQuorumCheck::AtLeastOneUnlessEmpty,
        Duration::from_secs(60),
    );

    assert!(aggregator.compute_once().await);
}

#[tokio::test]
async fn aggregator_reports_down_for_empty_cluster_under_all_up() {
    let config = ClusterConfig::default();
    let ctx = TestContext::new(config, 0);

    let aggregator = HealthAggregator::new(ctx.controller.state(), UpQuorumCheck::AllUp, Duration::from_secs(60));

    assert!(!aggregator.compute_once().await);
}

#[tokio::test]
async fn service_up_is_true_for_empty_cluster_regardless_of_start_state() {
    let config = ClusterConfig::default();
    let ctx = TestContext::new(config, 0);

    let aggregator = HealthAggregator::new(
        ctx.controller.state(),
        UpQuorumCheck::AtLeastOneUnlessEmpty,
        Duration::from_secs(60),
    );

    assert!(aggregator.service_up().await);
    assert!(!aggregator.compute_once().await);
}
