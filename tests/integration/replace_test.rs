// tests/integration/replace_test.rs

use crate::integration::test_helpers::TestContext;
use clusterd::config::ClusterConfig;

#[tokio::test]
async fn replace_member_keeps_cluster_size_unchanged() {
    let config = ClusterConfig {
        initial_size: 3,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    let old_id = ctx
        .controller
        .state()
        .member_ids()
        .await
        .into_iter()
        .next()
        .unwrap();

    let new_id = ctx.controller.replace_member(&old_id).await.unwrap();

    assert_ne!(old_id, new_id);
    assert_eq!(ctx.controller.state().member_count().await, 3);
    assert!(!ctx.controller.state().members.read().await.contains_key(&old_id));
    assert!(ctx.controller.state().members.read().await.contains_key(&new_id));
}

#[tokio::test]
async fn replace_member_rejects_unknown_id() {
    let config = ClusterConfig {
        initial_size: 1,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    let bogus = clusterd::MemberId::from("does-not-exist");
    let result = ctx.controller.replace_member(&bogus).await;

    assert!(matches!(result, Err(clusterd::ClusterError::NoSuchMember(_))));
}
