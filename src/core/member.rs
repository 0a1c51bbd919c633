// src/core/member.rs

//! The [`Member`] record: a cluster member viewed as a plain data structure layered on top
//! of an [`Entity`], the way the teacher layers `NodeInfo` on top of a connection handle in
//! `core/cluster/state.rs`.

use crate::core::entity::{Entity, Location};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A member's id is simply its backing entity's id. A newtype keeps it from being confused
/// with other string-shaped identifiers (location ids, spec names) at call sites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub String);

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        MemberId(s.to_string())
    }
}

/// A single cluster member: its backing entity, the allocator-assigned ordinal that never
/// gets reused within a cluster's lifetime, the locations it was placed in, and when it was
/// added.
#[derive(Debug, Clone)]
pub struct Member {
    pub entity: Arc<dyn Entity>,
    pub cluster_member_id: u64,
    pub creation_time_ms: u64,
    pub locations: Vec<Location>,
}

impl Member {
    pub fn new(entity: Arc<dyn Entity>, cluster_member_id: u64, locations: Vec<Location>) -> Self {
        let creation_time_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            entity,
            cluster_member_id,
            creation_time_ms,
            locations,
        }
    }

    pub fn id(&self) -> MemberId {
        MemberId(self.entity.id().to_string())
    }

    pub fn is_startable(&self) -> bool {
        self.entity.is_startable()
    }

    /// The single availability zone this member is pinned to, if any. Members placed before
    /// zone support was enabled, or placed directly under the root location, have none.
    pub fn zone(&self) -> Option<&Location> {
        self.locations.iter().find(|l| l.is_machine_provisioning())
    }
}
