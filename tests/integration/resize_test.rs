// tests/integration/resize_test.rs

use crate::integration::test_helpers::TestContext;
use clusterd::config::ClusterConfig;

#[tokio::test]
async fn start_brings_up_initial_size_members() {
    let config = ClusterConfig {
        initial_size: 3,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);

    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    assert_eq!(ctx.controller.state().member_count().await, 3);
}

#[tokio::test]
async fn grow_increases_member_count() {
    let config = ClusterConfig {
        initial_size: 1,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    ctx.controller.grow(2).await.unwrap();

    assert_eq!(ctx.controller.state().member_count().await, 3);
}

#[tokio::test]
async fn shrink_decreases_member_count() {
    let config = ClusterConfig {
        initial_size: 3,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    ctx.controller.shrink(2).await.unwrap();

    assert_eq!(ctx.controller.state().member_count().await, 1);
}

#[tokio::test]
async fn resize_converges_to_target_size() {
    let config = ClusterConfig {
        initial_size: 2,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    ctx.controller.resize(5).await.unwrap();
    assert_eq!(ctx.controller.state().member_count().await, 5);

    ctx.controller.resize(1).await.unwrap();
    assert_eq!(ctx.controller.state().member_count().await, 1);
}

#[tokio::test]
async fn resize_by_delta_matches_resize() {
    let config = ClusterConfig {
        initial_size: 2,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    ctx.controller.resize_by_delta(3).await.unwrap();
    assert_eq!(ctx.controller.state().member_count().await, 5);

    ctx.controller.resize_by_delta(-4).await.unwrap();
    assert_eq!(ctx.controller.state().member_count().await, 1);
}

#[tokio::test]
async fn stop_removes_every_member() {
    let config = ClusterConfig {
        initial_size: 4,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    ctx.controller.stop().await.unwrap();

    assert_eq!(ctx.controller.state().member_count().await, 0);
}

#[tokio::test]
async fn start_fails_when_quorum_not_reached() {
    let config = ClusterConfig {
        initial_size: 4,
        initial_quorum_size: 4,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    ctx.management.set_fail_new_children(true);

    let root = ctx.root();
    let result = ctx.controller.start(Some(root)).await;

    assert!(matches!(
        result,
        Err(clusterd::ClusterError::QuorumNotReached { current: 0, quorum: 4, .. })
    ));
}

#[tokio::test]
async fn failed_starts_are_quarantined_not_discarded() {
    let config = ClusterConfig {
        initial_size: 2,
        initial_quorum_size: 0,
        quarantine_failed_entities: true,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    ctx.management.set_fail_new_children(true);

    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    assert_eq!(ctx.controller.state().member_count().await, 0);
    assert_eq!(ctx.controller.quarantined().len(), 2);
}
