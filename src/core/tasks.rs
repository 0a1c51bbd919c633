// src/core/tasks.rs

//! `TaskExecutor`: fans out a batch of member start futures and collects their outcomes.
//!
//! Grounded on the teacher's `server/spawner.rs` fan-out-with-`JoinSet` pattern: spawn every
//! job onto the runtime so a slow start doesn't block a fast one, then drain the set and
//! correlate each result back to its member id.

use crate::core::errors::ClusterError;
use crate::core::member::MemberId;
use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::task::JoinSet;
use tracing::error;

/// One member's start attempt: its id, and the future that performs the effector call.
pub struct StartJob {
    pub member_id: MemberId,
    pub future: BoxFuture<'static, Result<(), ClusterError>>,
}

impl StartJob {
    pub fn new(
        member_id: MemberId,
        future: BoxFuture<'static, Result<(), ClusterError>>,
    ) -> Self {
        Self { member_id, future }
    }
}

/// Runs a batch of [`StartJob`]s to completion, possibly in parallel, and reports each job's
/// outcome keyed by member id. A custom implementation could rate-limit or serialize starts;
/// the default fans every job out immediately.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn run_parallel(&self, jobs: Vec<StartJob>) -> Vec<(MemberId, Result<(), ClusterError>)>;
}

/// The default executor: every job is spawned onto the Tokio runtime at once and awaited via
/// a [`JoinSet`], so the slowest member in a batch does not delay the others.
#[derive(Debug, Default)]
pub struct TokioTaskExecutor;

#[async_trait]
impl TaskExecutor for TokioTaskExecutor {
    async fn run_parallel(&self, jobs: Vec<StartJob>) -> Vec<(MemberId, Result<(), ClusterError>)> {
        let mut set = JoinSet::new();
        for job in jobs {
            let member_id = job.member_id.clone();
            set.spawn(async move { (member_id, job.future.await) });
        }

        let mut results = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((member_id, result)) => results.push((member_id, result)),
                Err(join_err) => {
                    error!(error = %join_err, "start task panicked");
                }
            }
        }
        results
    }
}
