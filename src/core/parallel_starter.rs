// src/core/parallel_starter.rs

//! `ParallelStarter` (C9): starts a batch of freshly-constructed members concurrently and
//! sorts the results into started-successfully, quarantined, and failed-without-quarantine
//! groups per §4.9.
//!
//! Grounded on `spawner.rs`'s fan-out pattern, generalized from "spawn N identical worker
//! tasks" to "spawn N distinct start futures and correlate each back to its member."

use crate::core::entity::Entity;
use crate::core::errors::ClusterError;
use crate::core::member::{Member, MemberId};
use crate::core::tasks::{StartJob, TaskExecutor};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::warn;

/// The outcome of starting one batch of members.
pub struct StartBatchResult {
    /// Members that started successfully, ready to join the active set.
    pub started: Vec<Member>,
    /// Members that failed to start and should be quarantined, paired with the error.
    pub quarantined: Vec<(Member, ClusterError)>,
    /// Members that failed to start and quarantine is disabled, paired with the error.
    pub failed: Vec<(Member, ClusterError)>,
}

/// Starts a batch of members in parallel via a [`TaskExecutor`], then sorts the results.
pub struct ParallelStarter {
    executor: Arc<dyn TaskExecutor>,
    quarantine_failed: bool,
}

impl ParallelStarter {
    pub fn new(executor: Arc<dyn TaskExecutor>, quarantine_failed: bool) -> Self {
        Self {
            executor,
            quarantine_failed,
        }
    }

    /// Starts every member in `members` concurrently and classifies the outcomes. `members`
    /// is consumed; every input member ends up in exactly one of the three result buckets.
    /// Jobs are submitted in `members`' original order (an `IndexMap`, not a `HashMap`) so
    /// submission order is deterministic rather than hash-bucket dependent.
    pub async fn start_batch(&self, members: Vec<Member>) -> StartBatchResult {
        let mut by_id: IndexMap<MemberId, Member> =
            members.into_iter().map(|m| (m.id(), m)).collect();

        let jobs = by_id
            .values()
            .map(|member| {
                let entity = member.entity.clone();
                StartJob::new(
                    member.id(),
                    Box::pin(async move { entity.start().await }),
                )
            })
            .collect();

        let outcomes = self.executor.run_parallel(jobs).await;

        let mut result = StartBatchResult {
            started: Vec::new(),
            quarantined: Vec::new(),
            failed: Vec::new(),
        };

        for (member_id, outcome) in outcomes {
            let Some(member) = by_id.shift_remove(&member_id) else {
                warn!(%member_id, "start task reported a member id not in this batch");
                continue;
            };

            match outcome {
                Ok(()) => result.started.push(member),
                Err(err) if self.quarantine_failed => result.quarantined.push((member, err)),
                Err(err) => result.failed.push((member, err)),
            }
        }

        result
    }
}
