// tests/property/invariants_test.rs

use crate::test_helpers::TestContext;
use clusterd::config::ClusterConfig;
use proptest::prelude::*;

proptest! {
    /// After any sequence of grows/shrinks starting from a started cluster, the member
    /// count always equals the running total of net additions, and never goes negative.
    #[test]
    fn member_count_tracks_net_deltas(deltas in prop::collection::vec(-3i64..=3i64, 0..8)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let config = ClusterConfig {
                initial_size: 3,
                ..Default::default()
            };
            let ctx = TestContext::new(config, 0);
            let root = ctx.root();
            ctx.controller.start(Some(root)).await.unwrap();

            let mut expected = 3i64;
            for delta in deltas {
                let current = ctx.controller.state().member_count().await as i64;
                let clamped = if delta < 0 { delta.max(-current) } else { delta };
                ctx.controller.resize_by_delta(clamped).await.unwrap();
                expected += clamped;
                prop_assert_eq!(ctx.controller.state().member_count().await as i64, expected);
            }
            Ok(())
        })?;
    }

    /// Resizing to any non-negative target converges to exactly that many members.
    #[test]
    fn resize_always_converges_to_target(target in 0usize..10) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let config = ClusterConfig {
                initial_size: 2,
                ..Default::default()
            };
            let ctx = TestContext::new(config, 0);
            let root = ctx.root();
            ctx.controller.start(Some(root)).await.unwrap();

            ctx.controller.resize(target).await.unwrap();
            prop_assert_eq!(ctx.controller.state().member_count().await, target);
            Ok(())
        })?;
    }
}
