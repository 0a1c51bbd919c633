// src/core/state.rs

//! `ClusterState`: the data model described in SPEC_FULL.md §3 — the cluster's location,
//! active members, and quarantined members, plus the derived `cluster_one_and_all_members_up`
//! sensor.
//!
//! Grounded on the teacher's `ServerState`: a single struct of shared, independently-locked
//! fields behind `Arc`, assembled once at startup and handed to every collaborator that needs
//! a view of it.

use crate::core::entity::Location;
use crate::core::member::{Member, MemberId};
use crate::core::quarantine::QuarantineGroup;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Shared, lockable cluster state. Cheap to clone (it's always handed around behind an
/// `Arc`), and every field locks independently so a health check never contends with a
/// resize's bookkeeping beyond the critical section it actually needs.
#[derive(Debug)]
pub struct ClusterState {
    /// The cluster's single top-level location, set on the first successful `start()` and
    /// immutable thereafter (§4.1).
    pub location: RwLock<Option<Location>>,

    /// Active, non-quarantined members, keyed by id. Insertion-ordered so removal tie-breaks
    /// and enumeration order are deterministic rather than hash-bucket dependent (§3).
    pub members: RwLock<IndexMap<MemberId, Member>>,

    /// Members that failed to start and were set aside.
    pub quarantined: QuarantineGroup,

    /// Whether `start()` has ever completed successfully. `stop()`/`resize()` before this is
    /// `true` are rejected per §4.7.
    pub started: AtomicBool,

    /// Cached result of the last `cluster_one_and_all_members_up` aggregation pass, read by
    /// operators without contending on `members`.
    pub one_and_all_members_up: RwLock<bool>,

    /// Cached result of the separate `service_up` enricher (the `up_quorum_check` predicate),
    /// read by operators without contending on `members`. Distinct from
    /// `one_and_all_members_up`: this one can be `true` for an empty cluster under the
    /// default "at-least-one-unless-empty" predicate (§4.7).
    pub service_up: RwLock<bool>,
}

impl ClusterState {
    pub fn new() -> Self {
        Self {
            location: RwLock::new(None),
            members: RwLock::new(IndexMap::new()),
            quarantined: QuarantineGroup::new(),
            started: AtomicBool::new(false),
            one_and_all_members_up: RwLock::new(false),
            service_up: RwLock::new(false),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn mark_started(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    pub async fn member_count(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn member_ids(&self) -> Vec<MemberId> {
        self.members.read().await.keys().cloned().collect()
    }
}

impl Default for ClusterState {
    fn default() -> Self {
        Self::new()
    }
}
