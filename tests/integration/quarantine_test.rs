// tests/integration/quarantine_test.rs

use crate::integration::test_helpers::TestContext;
use clusterd::config::ClusterConfig;

#[tokio::test]
async fn quarantine_disabled_discards_failed_members_instead() {
    let config = ClusterConfig {
        initial_size: 2,
        initial_quorum_size: 0,
        quarantine_failed_entities: false,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    ctx.management.set_fail_new_children(true);

    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    assert_eq!(ctx.controller.state().member_count().await, 0);
    assert_eq!(ctx.controller.quarantined().len(), 0);
}

#[tokio::test]
async fn release_returns_member_to_caller() {
    let config = ClusterConfig {
        initial_size: 1,
        initial_quorum_size: 0,
        quarantine_failed_entities: true,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    ctx.management.set_fail_new_children(true);

    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    let quarantined_id = ctx
        .controller
        .quarantined()
        .snapshot()
        .into_iter()
        .next()
        .unwrap()
        .member
        .id();

    let released = ctx.controller.quarantined().release(&quarantined_id);
    assert!(released.is_some());
    assert_eq!(ctx.controller.quarantined().len(), 0);
}
