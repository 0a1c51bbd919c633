// tests/integration/zone_test.rs

use crate::integration::test_helpers::TestContext;
use clusterd::config::ClusterConfig;
use std::collections::HashMap;

#[tokio::test]
async fn members_are_distributed_across_zones() {
    let config = ClusterConfig {
        initial_size: 6,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 3);
    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    let members = ctx.controller.state().members.read().await;
    let mut per_zone: HashMap<String, usize> = HashMap::new();
    for member in members.values() {
        if let Some(zone) = member.zone() {
            *per_zone.entry(zone.id.clone()).or_insert(0) += 1;
        }
    }

    assert_eq!(per_zone.len(), 3);
    for count in per_zone.values() {
        assert_eq!(*count, 2);
    }
}

#[tokio::test]
async fn zone_without_availability_zones_has_no_zone_placement() {
    let config = ClusterConfig {
        initial_size: 3,
        ..Default::default()
    };
    let ctx = TestContext::new(config, 0);
    let root = ctx.root();
    ctx.controller.start(Some(root)).await.unwrap();

    let members = ctx.controller.state().members.read().await;
    assert!(members.values().all(|m| m.zone().is_none()));
}
