// src/core/zone/placement.rs

//! `ZonePlacementStrategy`: picks which sub-location a new member should be placed in.
//!
//! Grounded on the teacher's slot-assignment fairness logic in `core/cluster/state.rs`
//! (distributing hash slots evenly across nodes): the default strategy here distributes new
//! members evenly across non-failed sub-locations using the same round-robin-by-running-count
//! idea, skipping any location a [`crate::core::zone::ZoneFailureDetector`] has marked failed.

use crate::core::entity::Location;
use crate::core::member::Member;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Chooses a sub-location for the next member to be added, and which members to remove on a
/// zone-mode shrink.
pub trait ZonePlacementStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Picks one location from `available` (guaranteed non-empty and already filtered down to
    /// non-failed sub-locations) for a single new member.
    fn pick_one<'a>(&self, available: &'a [Location], current_counts: &HashMap<String, usize>) -> &'a Location;

    /// Picks `count` locations, one per member being added at once, honoring the same
    /// fairness goal as repeated calls to [`Self::pick_one`] would, per §4.4's
    /// `add_in_each_location` semantics.
    fn pick_many<'a>(&self, available: &'a [Location], count: usize, current_counts: &HashMap<String, usize>) -> Vec<&'a Location> {
        let mut counts = current_counts.clone();
        let mut picks = Vec::with_capacity(count);
        for _ in 0..count {
            let chosen = self.pick_one(available, &counts);
            *counts.entry(chosen.id.clone()).or_insert(0) += 1;
            picks.push(chosen);
        }
        picks
    }

    /// Selects `count` members to remove on a zone-mode shrink, per §4.4: the inverse of
    /// placement fairness, repeatedly drawing from whichever zone currently holds the most
    /// candidates so a shrink rebalances the cluster rather than draining one zone first.
    /// `candidates` is assumed already ordered by removal preference within each zone (the
    /// caller sorts by [`crate::core::removal::RemovalStrategy`] first); this only decides
    /// *which zone* to draw from next.
    fn entities_to_remove<'a>(&self, candidates: &'a [Member], count: usize) -> Vec<&'a Member> {
        let mut by_zone: BTreeMap<String, Vec<&'a Member>> = BTreeMap::new();
        for member in candidates {
            let zone_id = member.zone().map(|l| l.id.clone()).unwrap_or_default();
            by_zone.entry(zone_id).or_default().push(member);
        }

        let mut picks = Vec::with_capacity(count.min(candidates.len()));
        for _ in 0..count {
            let Some((_, bucket)) = by_zone.iter_mut().filter(|(_, v)| !v.is_empty()).max_by_key(|(_, v)| v.len())
            else {
                break;
            };
            picks.push(bucket.remove(0));
        }
        picks
    }
}

/// Distributes members across available sub-locations by always picking the one with the
/// fewest current members, breaking ties by a monotonically advancing round-robin cursor so
/// repeated calls with identical counts don't all land on the same location.
#[derive(Debug, Default)]
pub struct RoundRobinPlacement {
    cursor: AtomicUsize,
}

impl ZonePlacementStrategy for RoundRobinPlacement {
    fn name(&self) -> &'static str {
        "round_robin"
    }

    fn pick_one<'a>(&self, available: &'a [Location], current_counts: &HashMap<String, usize>) -> &'a Location {
        let start = self.cursor.fetch_add(1, Ordering::SeqCst) % available.len();
        let mut best_idx = start;
        let mut best_count = usize::MAX;
        for offset in 0..available.len() {
            let idx = (start + offset) % available.len();
            let count = current_counts.get(&available[idx].id).copied().unwrap_or(0);
            if count < best_count {
                best_count = count;
                best_idx = idx;
            }
        }
        &available[best_idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::LocationCapabilities;

    fn zone(name: &str) -> Location {
        Location {
            id: name.to_string(),
            name: name.to_string(),
            parent: Some("root".to_string()),
            capabilities: LocationCapabilities::MACHINE_PROVISIONING,
        }
    }

    #[test]
    fn distributes_evenly_across_zones() {
        let zones = vec![zone("a"), zone("b"), zone("c")];
        let strategy = RoundRobinPlacement::default();
        let picks = strategy.pick_many(&zones, 6, &HashMap::new());
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for p in picks {
            *counts.entry(p.id.as_str()).or_insert(0) += 1;
        }
        assert_eq!(counts.get("a"), Some(&2));
        assert_eq!(counts.get("b"), Some(&2));
        assert_eq!(counts.get("c"), Some(&2));
    }

    #[test]
    fn entities_to_remove_draws_from_the_largest_zone_first() {
        use crate::core::entity::memory::MemoryEntity;
        use std::sync::Arc;

        fn member_in(id: u64, zone_id: &str) -> Member {
            Member {
                entity: Arc::new(MemoryEntity::new(format!("m{id}"))),
                cluster_member_id: id,
                creation_time_ms: 0,
                locations: vec![zone(zone_id)],
            }
        }

        let candidates = vec![
            member_in(1, "a"),
            member_in(2, "a"),
            member_in(3, "a"),
            member_in(4, "b"),
        ];
        let strategy = RoundRobinPlacement::default();

        let picks = strategy.entities_to_remove(&candidates, 2);
        assert_eq!(picks.len(), 2);
        assert!(picks.iter().all(|m| m.zone().unwrap().id == "a"));
    }
}
