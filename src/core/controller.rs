// src/core/controller.rs

//! `Controller` (C7): the cluster's single entry point for `start`, `stop`, `resize`, and
//! `replace_member`, and the component most of the other modules exist to serve.
//!
//! Grounded on the teacher's `ServerState` as the central `Arc`-wrapped struct every
//! operation is a method on, and on `cluster/failover.rs`'s check-then-act flow for
//! `replace_member`'s "is the old member actually goneq" gate.
//!
//! # Locking
//!
//! `resize_lock` serializes `start`/`grow`/`shrink`/`resize` against each other: whichever
//! holds it keeps it for the operation's *entire* duration, including the parallel start
//! fan-out and await, not just the bookkeeping around it. This is deliberate — a resize that
//! releases the lock mid-flight could interleave its own member additions with another
//! resize's removals and leave the active set in a state neither caller intended.
//!
//! `stop()` is the one exception: it calls `shrink()` and then `resize(0)` as two separate,
//! independently-locked operations rather than nesting them inside one lock acquisition. That
//! lets a second, concurrent `stop()` call preempt an in-flight `start()` between those two
//! steps instead of queuing up behind the whole thing.

use crate::config::ClusterConfig;
use crate::core::entity::{Entity, Location, ManagementContext};
use crate::core::errors::ClusterError;
use crate::core::events::{ClusterEvent, EventBus};
use crate::core::health::HealthAggregator;
use crate::core::id_allocator::MemberIdAllocator;
use crate::core::member::{Member, MemberId};
use crate::core::metrics;
use crate::core::node_factory::NodeFactory;
use crate::core::parallel_starter::ParallelStarter;
use crate::core::quarantine::QuarantineGroup;
use crate::core::removal::RemovalStrategyRegistry;
use crate::core::state::ClusterState;
use crate::core::zone::{ZoneFailureDetectorRegistry, ZonePlacementRegistry};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Wires every collaborator together and exposes the cluster's public lifecycle operations.
pub struct Controller {
    config: ClusterConfig,
    management: Arc<dyn ManagementContext>,
    state: Arc<ClusterState>,
    node_factory: NodeFactory,
    starter: ParallelStarter,
    removal_strategies: RemovalStrategyRegistry,
    zone_placement: ZonePlacementRegistry,
    zone_failures: ZoneFailureDetectorRegistry,
    events: Arc<EventBus>,
    resize_lock: Mutex<()>,
    health_handle: tokio::task::JoinHandle<()>,
}

impl Controller {
    pub fn new(
        config: ClusterConfig,
        management: Arc<dyn ManagementContext>,
        executor: Arc<dyn crate::core::tasks::TaskExecutor>,
    ) -> Self {
        let id_allocator = Arc::new(MemberIdAllocator::new());
        let node_factory = NodeFactory::new(
            management.clone(),
            id_allocator.clone(),
            config.custom_child_flags.clone(),
        );
        let starter = ParallelStarter::new(executor, config.quarantine_failed_entities);
        let zone_failures = ZoneFailureDetectorRegistry::with_defaults(config.zone_failure_threshold);
        let state = Arc::new(ClusterState::new());

        let health_aggregator = Arc::new(HealthAggregator::new(
            state.clone(),
            config.resolved_up_quorum_check(),
            config.health_aggregator_period,
        ));
        let health_handle = health_aggregator.spawn();

        Self {
            state,
            node_factory,
            starter,
            removal_strategies: RemovalStrategyRegistry::with_defaults(),
            zone_placement: ZonePlacementRegistry::with_defaults(),
            zone_failures,
            events: Arc::new(EventBus::new()),
            resize_lock: Mutex::new(()),
            health_handle,
            management,
            config,
        }
    }

    pub fn state(&self) -> Arc<ClusterState> {
        self.state.clone()
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    /// Starts the cluster for the first time: resolves its location, constructs
    /// `initial_size` members, starts them in parallel, and requires at least
    /// `effective_quorum_size()` of them to succeed (§4.1, §4.7).
    #[instrument(skip(self))]
    pub async fn start(&self, location: Option<Location>) -> Result<(), ClusterError> {
        let _guard = self.resize_lock.lock().await;

        if self.state.is_started() {
            return Err(ClusterError::NotSupported("start() called on an already-started cluster"));
        }

        let resolved = {
            let existing = self.state.location.read().await;
            self.management.resolve_location(existing.as_ref(), location)?
        };
        *self.state.location.write().await = Some(resolved.clone());

        if self.config.member_spec.is_none() && self.config.first_member_spec.is_none() {
            return Err(ClusterError::NoMemberSpec);
        }

        let initial_size = self.config.initial_size as usize;
        let locations = self.locations_for_additions(&resolved, initial_size).await?;

        let mut new_members = Vec::with_capacity(initial_size);
        for (i, member_location) in locations.into_iter().enumerate() {
            let spec = if i == 0 {
                self.config
                    .first_member_spec
                    .as_deref()
                    .or(self.config.member_spec.as_deref())
                    .unwrap()
            } else {
                self.config.member_spec.as_deref().unwrap()
            };
            let member = self
                .node_factory
                .add_node(spec, member_location, &resolved.id)
                .await?;
            new_members.push(member);
        }

        let quorum = self.config.effective_quorum_size() as usize;
        let (started, first_error) = self.start_and_settle(new_members).await;

        if started < quorum {
            return Err(ClusterError::QuorumNotReached {
                current: started,
                quorum,
                cause: first_error.map(Arc::new),
            });
        }

        if started < initial_size {
            warn!(
                started,
                initial_size, quorum, "start() reached quorum but not every requested member came up"
            );
        }

        self.state.mark_started();
        self.events.publish(ClusterEvent::ResizeCompleted {
            new_size: self.state.member_count().await,
        });
        info!(started, quorum, "cluster start completed");
        Ok(())
    }

    /// Stops every member, marks the cluster as having zero members, and tears down the
    /// `HealthAggregator` background task — after `stop()` returns, it is not running (§4.7,
    /// §8).
    ///
    /// Deliberately does not hold `resize_lock` across both steps: see the locking note on
    /// this type.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<(), ClusterError> {
        let current = self.state.member_count().await;
        if current > 0 {
            self.shrink(current).await?;
        }
        let result = self.resize(0).await;
        self.health_handle.abort();
        result
    }

    /// Resizes the cluster to exactly `new_size`, growing or shrinking as needed.
    #[instrument(skip(self))]
    pub async fn resize(&self, new_size: usize) -> Result<(), ClusterError> {
        let _guard = self.resize_lock.lock().await;
        let current = self.state.member_count().await;

        metrics::DESIRED_SIZE.set(new_size as f64);

        if new_size > current {
            self.grow_locked(new_size - current).await
        } else if new_size < current {
            self.shrink_locked(current - new_size).await
        } else {
            Ok(())
        }
    }

    /// Resizes the cluster by `delta`, positive to grow or negative to shrink.
    pub async fn resize_by_delta(&self, delta: i64) -> Result<(), ClusterError> {
        if delta == 0 {
            return Ok(());
        }
        if delta > 0 {
            self.grow(delta as usize).await
        } else {
            self.shrink((-delta) as usize).await
        }
    }

    /// Adds `count` new members, distributed across non-failed sub-locations if zones are
    /// enabled, all started in parallel (§4.4).
    #[instrument(skip(self))]
    pub async fn grow(&self, count: usize) -> Result<(), ClusterError> {
        let _guard = self.resize_lock.lock().await;
        self.grow_locked(count).await
    }

    async fn grow_locked(&self, count: usize) -> Result<(), ClusterError> {
        if !self.state.is_started() {
            return Err(ClusterError::NotSupported("grow() called before start()"));
        }
        let root = self
            .state
            .location
            .read()
            .await
            .clone()
            .ok_or(ClusterError::NoLocation)?;

        let locations = self.locations_for_additions(&root, count).await?;
        let spec = self.config.member_spec.as_deref().ok_or(ClusterError::NoMemberSpec)?;

        let mut new_members = Vec::with_capacity(count);
        for member_location in locations {
            let member = self.node_factory.add_node(spec, member_location, &root.id).await?;
            new_members.push(member);
        }

        let (started, first_error) = self.start_and_settle(new_members).await;
        if started == 0 && count > 0 {
            let cause = first_error.unwrap_or(ClusterError::NotSupported(
                "every member in this grow batch failed to start",
            ));
            return Err(ClusterError::GrowFailed(Arc::new(cause)));
        }

        metrics::RESIZES_TOTAL.inc();
        self.events.publish(ClusterEvent::ResizeCompleted {
            new_size: self.state.member_count().await,
        });
        Ok(())
    }

    /// Removes `count` members chosen by the configured [`crate::core::removal::RemovalStrategy`],
    /// stopping and unmanaging each one (§4.3).
    #[instrument(skip(self))]
    pub async fn shrink(&self, count: usize) -> Result<(), ClusterError> {
        let _guard = self.resize_lock.lock().await;
        self.shrink_locked(count).await
    }

    async fn shrink_locked(&self, count: usize) -> Result<(), ClusterError> {
        let to_remove = self.entities_to_remove(count).await;

        for member in &to_remove {
            if let Err(err) = member.entity.stop().await {
                warn!(member_id = %member.id(), error = %err, "member failed to stop cleanly during shrink");
            }
            let _ = self.management.unmanage(&member.entity).await;
        }

        {
            let mut members = self.state.members.write().await;
            for member in &to_remove {
                members.shift_remove(&member.id());
            }
        }

        metrics::RESIZES_TOTAL.inc();
        metrics::CURRENT_SIZE.set(self.state.member_count().await as f64);
        self.events.publish(ClusterEvent::ResizeCompleted {
            new_size: self.state.member_count().await,
        });
        Ok(())
    }

    /// Replaces `old_member_id` with a freshly constructed member in the same location (or,
    /// failing that, the first available sub-location), stopping the old member only after
    /// the new one has started (§4.1.1).
    #[instrument(skip(self))]
    pub async fn replace_member(&self, old_member_id: &MemberId) -> Result<MemberId, ClusterError> {
        let _guard = self.resize_lock.lock().await;

        let old_member = {
            let members = self.state.members.read().await;
            members
                .get(old_member_id)
                .cloned()
                .ok_or_else(|| ClusterError::NoSuchMember(old_member_id.to_string()))?
        };

        let root = self
            .state
            .location
            .read()
            .await
            .clone()
            .ok_or(ClusterError::NoLocation)?;

        let replacement_location = self.replacement_location_for(&old_member, &root).await?;
        let spec = self.config.member_spec.as_deref().ok_or(ClusterError::NoMemberSpec)?;

        let new_member = self
            .node_factory
            .add_node(spec, replacement_location, &root.id)
            .await?;
        let new_id = new_member.id();

        let result = self.starter.start_batch(vec![new_member]).await;

        if let Some((failed_member, err)) = result.failed.into_iter().next() {
            return Err(ClusterError::GrowFailed(Arc::new(self.finalize_failed_start(failed_member, err).await)));
        }
        if let Some((quarantined_member, err)) = result.quarantined.into_iter().next() {
            self.on_startup_failure(quarantined_member, err.to_string()).await;
            return Err(ClusterError::GrowFailed(Arc::new(err)));
        }

        let started_member = result.started.into_iter().next().expect("exactly one job submitted");
        self.on_startup_success(started_member).await;

        if let Err(stop_err) = old_member.entity.stop().await {
            return Err(ClusterError::StopFailed {
                new_member: new_id.to_string(),
                old_member: old_member_id.to_string(),
                cause: Arc::new(stop_err),
            });
        }
        let _ = self.management.unmanage(&old_member.entity).await;
        self.state.members.write().await.shift_remove(old_member_id);

        Ok(new_id)
    }

    async fn finalize_failed_start(&self, member: Member, err: ClusterError) -> ClusterError {
        let _ = self.management.unmanage(&member.entity).await;
        err
    }

    /// Finds the location to place a replacement member in: the old member's own location if
    /// it still matches a current sub-location, otherwise the nearest ancestor that does,
    /// falling back to the first available sub-location (§4.1.1, §9's resolved open
    /// question).
    async fn replacement_location_for(&self, old_member: &Member, root: &Location) -> Result<Location, ClusterError> {
        if !self.config.enable_availability_zones {
            return Ok(root.clone());
        }

        let current_sub_locations = self.get_non_failed_sub_locations(root).await;

        if let Some(old_zone) = old_member.zone() {
            for ancestor in self.management.ancestors(old_zone) {
                if let Some(matching) = current_sub_locations.iter().find(|l| l.id == ancestor.id) {
                    return Ok(matching.clone());
                }
            }
        }

        current_sub_locations
            .into_iter()
            .next()
            .ok_or(ClusterError::NoLocation)
    }

    /// Picks `count` locations for new members: if zones are disabled, `count` copies of
    /// `root`; otherwise one sub-location per member via the configured
    /// [`crate::core::zone::ZonePlacementStrategy`] (§4.4's `add_in_each_location`).
    async fn locations_for_additions(&self, root: &Location, count: usize) -> Result<Vec<Location>, ClusterError> {
        if !self.config.enable_availability_zones {
            return Ok(std::iter::repeat(root.clone()).take(count).collect());
        }

        let available = self.get_non_failed_sub_locations(root).await;
        if available.is_empty() {
            return Err(ClusterError::ZoneCapacityExhausted {
                requested: count,
                available: 0,
            });
        }

        let current_counts = self.zone_member_counts().await;
        let strategy = self
            .zone_placement
            .get(&self.config.zone_placement_strategy)
            .ok_or(ClusterError::NotSupported("unknown zone placement strategy"))?;

        let picks = strategy.pick_many(&available, count, &current_counts);
        if picks.len() != count {
            return Err(ClusterError::PlacementInvariant {
                strategy: "zone_placement",
                expected: count,
                got: picks.len(),
            });
        }

        Ok(picks.into_iter().cloned().collect())
    }

    /// Adds one member to `location`, ignoring the configured placement strategy (§4.4's
    /// `add_in_single_location`), used when a caller already knows exactly where a member
    /// should land (e.g. `replace_member`).
    pub async fn add_in_single_location(&self, location: Location) -> Result<MemberId, ClusterError> {
        let _guard = self.resize_lock.lock().await;
        let spec = self.config.member_spec.as_deref().ok_or(ClusterError::NoMemberSpec)?;
        let member = self
            .node_factory
            .add_node(spec, location.clone(), &location.id)
            .await?;
        let member_id = member.id();
        let _ = self.start_and_settle(vec![member]).await;
        Ok(member_id)
    }

    /// Enumerates the current sub-locations under `root` that the configured
    /// [`crate::core::zone::ZoneFailureDetector`] has not classified as failed.
    async fn get_non_failed_sub_locations(&self, root: &Location) -> Vec<Location> {
        let all = self.find_sub_locations(root);
        let Some(detector) = self.zone_failures.get(&self.config.zone_failure_detector) else {
            return all;
        };
        all.into_iter().filter(|l| !detector.is_failed(&l.id)).collect()
    }

    /// Enumerates every sub-location under `root`, without regard to failure state.
    fn find_sub_locations(&self, root: &Location) -> Vec<Location> {
        self.management.sub_locations(root)
    }

    async fn zone_member_counts(&self) -> HashMap<String, usize> {
        let members = self.state.members.read().await;
        let mut counts = HashMap::new();
        for member in members.values() {
            if let Some(zone) = member.zone() {
                *counts.entry(zone.id.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Selects which current members to remove for a shrink of `count`. Candidates are first
    /// ranked by the configured [`crate::core::removal::RemovalStrategy`] (§4.3's
    /// `pick_and_remove_members`); in zone mode, that ranked list is then drawn from
    /// zone-by-zone via the configured [`crate::core::zone::ZonePlacementStrategy`]'s
    /// `entities_to_remove` (§4.4), so a shrink both prefers the "right" members and
    /// rebalances zones rather than draining one first.
    async fn entities_to_remove(&self, count: usize) -> Vec<Member> {
        let members = self.state.members.read().await;
        let mut candidates: Vec<Member> = members.values().cloned().collect();
        drop(members);

        if let Some(removal) = self.removal_strategies.get(&self.config.removal_strategy) {
            candidates = removal
                .select_for_removal(&candidates, candidates.len())
                .into_iter()
                .cloned()
                .collect();
        } else {
            warn!(strategy = %self.config.removal_strategy, "unknown removal strategy, falling back to arbitrary order");
        }

        if self.config.enable_availability_zones {
            if let Some(zone_strategy) = self.zone_placement.get(&self.config.zone_placement_strategy) {
                return zone_strategy
                    .entities_to_remove(&candidates, count.min(candidates.len()))
                    .into_iter()
                    .cloned()
                    .collect();
            }
            warn!(
                strategy = %self.config.zone_placement_strategy,
                "unknown zone placement strategy, falling back to removal-strategy-only order"
            );
        }

        candidates.into_iter().take(count).collect()
    }

    /// Starts `members` in parallel, settles each into the active set or quarantine, and
    /// returns the number that started successfully along with the first subtask error
    /// encountered (if any), for callers that need to attach a cause to their own error
    /// (§4.1/§7's "carrying the first subtask error").
    async fn start_and_settle(&self, members: Vec<Member>) -> (usize, Option<ClusterError>) {
        let result = self.starter.start_batch(members).await;
        let started_count = result.started.len();
        let mut first_error: Option<ClusterError> = None;

        for member in result.started {
            self.on_startup_success(member).await;
        }
        for (member, err) in result.quarantined {
            if first_error.is_none() {
                first_error = Some(err.clone());
            }
            self.on_startup_failure(member, err.to_string()).await;
        }
        for (member, err) in result.failed {
            if first_error.is_none() {
                first_error = Some(err.clone());
            }
            warn!(error = %err, "member failed to start and quarantine is disabled; discarding it");
            let _ = self.management.unmanage(&member.entity).await;
        }

        metrics::CURRENT_SIZE.set(self.state.member_count().await as f64);
        (started_count, first_error)
    }

    /// Adds a successfully-started member to the active set and clears its zone's failure
    /// count, if it has one (§4.9).
    async fn on_startup_success(&self, member: Member) {
        if let Some(zone) = member.zone() {
            if let Some(detector) = self.zone_failures.get(&self.config.zone_failure_detector) {
                if detector.record_success(&zone.id) {
                    self.events.publish(ClusterEvent::ZoneRecovered { zone: zone.id.clone() });
                    metrics::FAILED_ZONES.set(detector.failed_zones().len() as f64);
                }
            }
        }
        self.state.members.write().await.insert(member.id(), member);
    }

    /// Quarantines a member that failed to start and records the failure against its zone's
    /// failure detector (§4.9, §4.5).
    async fn on_startup_failure(&self, member: Member, reason: String) {
        if let Some(zone) = member.zone() {
            if let Some(detector) = self.zone_failures.get(&self.config.zone_failure_detector) {
                if detector.record_failure(&zone.id) {
                    self.events.publish(ClusterEvent::ZoneFailed { zone: zone.id.clone() });
                    metrics::FAILED_ZONES.set(detector.failed_zones().len() as f64);
                }
            }
        }
        let member_id = member.id();
        self.events.publish(ClusterEvent::EntityQuarantined {
            member: member_id,
            reason: reason.clone(),
        });
        self.state.quarantined.quarantine(member, reason);
        metrics::QUARANTINED_SIZE.set(self.state.quarantined.len() as f64);
    }

    /// Whether a zone is currently classified as failed by the configured detector.
    pub fn has_failed(&self, zone_id: &str) -> bool {
        self.zone_failures
            .get(&self.config.zone_failure_detector)
            .map(|d| d.is_failed(zone_id))
            .unwrap_or(false)
    }

    pub fn quarantined(&self) -> &QuarantineGroup {
        &self.state.quarantined
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.health_handle.abort();
    }
}
