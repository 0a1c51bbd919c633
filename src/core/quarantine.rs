// src/core/quarantine.rs

//! `QuarantineGroup` (C5): holds members that failed to start, keeping them out of the
//! active set without discarding them, so an operator can inspect or manually retry them.
//!
//! Grounded on the teacher's `replica_states: Arc<DashMap<...>>` auxiliary-collection
//! pattern: a side map keyed by member id, independent of the cluster's primary member list.

use crate::core::entity::Entity;
use crate::core::member::{Member, MemberId};
use dashmap::DashMap;
use std::sync::Arc;

/// A quarantined member, plus the reason it was quarantined.
#[derive(Debug, Clone)]
pub struct QuarantinedMember {
    pub member: Member,
    pub reason: String,
}

/// Holds members removed from the active set due to a failed start. Quarantine is purely
/// bookkeeping: the underlying entity is not stopped or unmanaged (§4.5's note that
/// quarantine is reversible via `release`).
#[derive(Debug, Default)]
pub struct QuarantineGroup {
    members: DashMap<MemberId, QuarantinedMember>,
}

impl QuarantineGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quarantine(&self, member: Member, reason: impl Into<String>) {
        let id = member.id();
        self.members.insert(
            id,
            QuarantinedMember {
                member,
                reason: reason.into(),
            },
        );
    }

    /// Removes and returns a member from quarantine, e.g. after an operator retries its
    /// start out of band.
    pub fn release(&self, member_id: &MemberId) -> Option<Member> {
        self.members.remove(member_id).map(|(_, q)| q.member)
    }

    pub fn contains(&self, member_id: &MemberId) -> bool {
        self.members.contains_key(member_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn entities(&self) -> Vec<Arc<dyn Entity>> {
        self.members.iter().map(|e| e.member.entity.clone()).collect()
    }

    pub fn snapshot(&self) -> Vec<QuarantinedMember> {
        self.members.iter().map(|e| e.value().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::memory::MemoryEntity;

    fn member(id: &str) -> Member {
        Member::new(Arc::new(MemoryEntity::new(id)), 1, Vec::new())
    }

    #[test]
    fn quarantine_and_release_round_trip() {
        let group = QuarantineGroup::new();
        let m = member("m1");
        let id = m.id();
        group.quarantine(m, "start failed");
        assert!(group.contains(&id));
        assert_eq!(group.len(), 1);

        let released = group.release(&id).unwrap();
        assert_eq!(released.id(), id);
        assert!(group.is_empty());
    }
}
