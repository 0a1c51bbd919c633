// src/core/health.rs

//! `HealthAggregator` (C6): periodically recomputes `cluster_one_and_all_members_up`, plus the
//! separate `service_up` enricher's `up_quorum_check` predicate, independent of any resize in
//! progress.
//!
//! Grounded directly on the teacher's `replica_quorum_validator.rs`: a background task woken
//! on an interval, reading shared state through its own lock acquisition rather than sharing
//! a lock guard with the operation that's mutating it (§5's "no resize lock held" rule).

use crate::config::UpQuorumCheck;
use crate::core::metrics;
use crate::core::state::ClusterState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Recomputes and caches the cluster's aggregate up/down status on a fixed interval.
pub struct HealthAggregator {
    state: Arc<ClusterState>,
    check: UpQuorumCheck,
    period: Duration,
}

impl HealthAggregator {
    pub fn new(state: Arc<ClusterState>, check: UpQuorumCheck, period: Duration) -> Self {
        Self {
            state,
            check,
            period,
        }
    }

    /// Computes `cluster_one_and_all_members_up` once, without touching the cached value.
    /// Per §4.7: `false` if the cluster has never completed `start()`, `false` if `members`
    /// is empty, `true` only if every member reports `service_up == true`. Unlike
    /// [`Self::service_up`], this never treats an empty cluster as up.
    pub async fn compute_once(&self) -> bool {
        if !self.state.is_started() {
            return false;
        }

        let members = self.state.members.read().await;
        if members.is_empty() {
            return false;
        }

        members.values().all(|m| m.entity.service_up() == Some(true))
    }

    /// Computes the separate `service_up` enricher once: the configured `up_quorum_check`
    /// predicate aggregated over current members, excluding quarantine (§4.7). Unlike
    /// [`Self::compute_once`], the default `AtLeastOneUnlessEmpty` predicate treats an empty
    /// cluster as up.
    pub async fn service_up(&self) -> bool {
        let members = self.state.members.read().await;

        if members.is_empty() {
            return matches!(self.check, UpQuorumCheck::AtLeastOneUnlessEmpty);
        }

        let up_count = members.values().filter(|m| m.entity.service_up() == Some(true)).count();

        match self.check {
            UpQuorumCheck::AtLeastOneUnlessEmpty => up_count > 0,
            UpQuorumCheck::AllUp => up_count == members.len(),
            UpQuorumCheck::AtLeast(n) => up_count >= n,
        }
    }

    /// Recomputes both aggregate statuses and caches them on [`ClusterState`], updating the
    /// `clusterd_one_and_all_members_up`/`clusterd_service_up` gauges to match.
    pub async fn tick(&self) {
        let up = self.compute_once().await;
        *self.state.one_and_all_members_up.write().await = up;
        metrics::ONE_AND_ALL_MEMBERS_UP.set(if up { 1.0 } else { 0.0 });

        let service_up = self.service_up().await;
        *self.state.service_up.write().await = service_up;
        metrics::SERVICE_UP.set(if service_up { 1.0 } else { 0.0 });

        debug!(up, service_up, "recomputed cluster health sensors");
    }

    /// Spawns the periodic task and returns its handle. Dropping the handle does not stop
    /// the task; callers that need to stop it should `abort()` explicitly.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.period);
            loop {
                interval.tick().await;
                self.tick().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::memory::MemoryEntity;
    use crate::core::entity::Entity;
    use crate::core::member::Member;
    use std::sync::Arc as StdArc;

    #[tokio::test]
    async fn empty_cluster_one_and_all_members_up_is_always_false() {
        let state = StdArc::new(ClusterState::new());
        state.mark_started();
        let aggregator = HealthAggregator::new(
            state,
            UpQuorumCheck::AtLeastOneUnlessEmpty,
            Duration::from_secs(1),
        );
        assert!(!aggregator.compute_once().await);
    }

    #[tokio::test]
    async fn service_up_is_true_for_empty_cluster_under_at_least_one_unless_empty() {
        let state = StdArc::new(ClusterState::new());
        let aggregator = HealthAggregator::new(
            state,
            UpQuorumCheck::AtLeastOneUnlessEmpty,
            Duration::from_secs(1),
        );
        assert!(aggregator.service_up().await);
    }

    #[tokio::test]
    async fn one_and_all_members_up_is_false_before_start_completes() {
        let state = StdArc::new(ClusterState::new());
        let entity = StdArc::new(MemoryEntity::new("m1"));
        entity.start().await.unwrap();
        let member = Member::new(entity, 0, Vec::new());
        state.members.write().await.insert(member.id(), member);

        let aggregator = HealthAggregator::new(state, UpQuorumCheck::AllUp, Duration::from_secs(1));
        assert!(!aggregator.compute_once().await);
    }

    #[tokio::test]
    async fn all_up_requires_every_member() {
        let state = StdArc::new(ClusterState::new());
        state.mark_started();
        {
            let entity = StdArc::new(MemoryEntity::new("m1"));
            entity.start().await.unwrap();
            let member = Member::new(entity, 0, Vec::new());
            state.members.write().await.insert(member.id(), member);

            let down_entity = StdArc::new(MemoryEntity::new("m2"));
            let member2 = Member::new(down_entity, 1, Vec::new());
            state.members.write().await.insert(member2.id(), member2);
        }

        let aggregator = HealthAggregator::new(state, UpQuorumCheck::AllUp, Duration::from_secs(1));
        assert!(!aggregator.compute_once().await);
    }

    #[tokio::test]
    async fn all_up_is_true_once_started_and_every_member_is_up() {
        let state = StdArc::new(ClusterState::new());
        state.mark_started();
        let entity = StdArc::new(MemoryEntity::new("m1"));
        entity.start().await.unwrap();
        let member = Member::new(entity, 0, Vec::new());
        state.members.write().await.insert(member.id(), member);

        let aggregator = HealthAggregator::new(state, UpQuorumCheck::AllUp, Duration::from_secs(1));
        assert!(aggregator.compute_once().await);
    }
}
