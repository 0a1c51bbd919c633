// src/core/removal.rs

//! `RemovalStrategy` (C3): chooses which members to remove on a shrink.
//!
//! Grounded on the teacher's `cluster/failover.rs` candidate-comparison style: collect
//! candidates, sort by a total order, take the front. The default strategy is "newest
//! stoppable first" per §4.3 — prefer members that are actually startable (so a broken
//! member that can't be cleanly stopped isn't preferred for removal over a healthy one),
//! then prefer the highest `cluster_member_id`, falling back to creation time for a stable
//! tie-break.

use crate::core::member::Member;
use std::collections::HashMap;

/// Picks `count` members to remove from `candidates`. Implementations must not mutate
/// `candidates` and must return at most `candidates.len()` members, each present exactly
/// once in the input.
pub trait RemovalStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn select_for_removal<'a>(&self, candidates: &'a [Member], count: usize) -> Vec<&'a Member>;
}

/// Removes the newest, startable members first. A member that cannot be started (and so
/// presumably cannot be cleanly stopped either) is removed only once every startable member
/// has already been selected.
#[derive(Debug, Default)]
pub struct NewestStoppableFirst;

impl RemovalStrategy for NewestStoppableFirst {
    fn name(&self) -> &'static str {
        "newest_stoppable"
    }

    fn select_for_removal<'a>(&self, candidates: &'a [Member], count: usize) -> Vec<&'a Member> {
        let mut ordered: Vec<&Member> = candidates.iter().collect();
        ordered.sort_by(|a, b| {
            b.is_startable()
                .cmp(&a.is_startable())
                .then(b.cluster_member_id.cmp(&a.cluster_member_id))
                .then(b.creation_time_ms.cmp(&a.creation_time_ms))
        });
        ordered.into_iter().take(count).collect()
    }
}

/// A registry of [`RemovalStrategy`] implementations, looked up by the name configured in
/// `removal_strategy`. Mirrors the explicit-map approach the spec calls for in place of
/// reflective construction from a class name.
pub struct RemovalStrategyRegistry {
    strategies: HashMap<&'static str, Box<dyn RemovalStrategy>>,
}

impl RemovalStrategyRegistry {
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register(Box::new(NewestStoppableFirst));
        registry
    }

    pub fn register(&mut self, strategy: Box<dyn RemovalStrategy>) {
        self.strategies.insert(strategy.name(), strategy);
    }

    pub fn get(&self, name: &str) -> Option<&dyn RemovalStrategy> {
        self.strategies.get(name).map(|s| s.as_ref())
    }
}

impl Default for RemovalStrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::memory::MemoryEntity;
    use std::sync::Arc;

    fn member(id: u64, creation_time_ms: u64, startable: bool) -> Member {
        let entity: Arc<dyn crate::core::entity::Entity> = if startable {
            Arc::new(MemoryEntity::new(format!("m{id}")))
        } else {
            let e = MemoryEntity::new(format!("m{id}"));
            e.set_fail_start(true);
            Arc::new(e)
        };
        Member {
            entity,
            cluster_member_id: id,
            creation_time_ms,
            locations: Vec::new(),
        }
    }

    #[test]
    fn prefers_highest_member_id() {
        let members = vec![member(1, 100, true), member(2, 200, true), member(3, 50, true)];
        let strategy = NewestStoppableFirst;
        let picked = strategy.select_for_removal(&members, 1);
        assert_eq!(picked[0].cluster_member_id, 3);
    }

    #[test]
    fn registry_resolves_by_name() {
        let registry = RemovalStrategyRegistry::with_defaults();
        assert!(registry.get("newest_stoppable").is_some());
        assert!(registry.get("nonexistent").is_none());
    }
}
