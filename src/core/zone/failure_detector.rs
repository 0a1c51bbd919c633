// src/core/zone/failure_detector.rs

//! `ZoneFailureDetector`: decides when a sub-location should be treated as failed and
//! excluded from placement, and when it recovers.
//!
//! Grounded on the teacher's `NodeFlags::FAIL`/`PFAIL` consecutive-signal classification in
//! `core/cluster/gossip.rs`: a location isn't marked failed on the first bad signal, only
//! after a configurable number of consecutive start failures, and a single success clears it
//! immediately.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Tracks per-location consecutive-failure counts and exposes the failed/recovered
/// transition to the caller.
pub trait ZoneFailureDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Records a start failure in `zone_id`. Returns `true` if this call caused the zone to
    /// newly transition into the failed state.
    fn record_failure(&self, zone_id: &str) -> bool;

    /// Records a start success in `zone_id`. Returns `true` if this call caused the zone to
    /// newly transition out of the failed state.
    fn record_success(&self, zone_id: &str) -> bool;

    /// Whether `zone_id` is currently classified as failed.
    fn is_failed(&self, zone_id: &str) -> bool;

    /// All zone ids currently classified as failed.
    fn failed_zones(&self) -> Vec<String>;
}

/// Marks a zone failed after `threshold` consecutive start failures; a single success
/// resets its counter to zero and clears the failed state.
#[derive(Debug)]
pub struct ConsecutiveFailureDetector {
    threshold: u32,
    counts: DashMap<String, AtomicU32>,
    failed: DashMap<String, ()>,
}

impl ConsecutiveFailureDetector {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            counts: DashMap::new(),
            failed: DashMap::new(),
        }
    }
}

impl ZoneFailureDetector for ConsecutiveFailureDetector {
    fn name(&self) -> &'static str {
        "consecutive_failures"
    }

    fn record_failure(&self, zone_id: &str) -> bool {
        let entry = self
            .counts
            .entry(zone_id.to_string())
            .or_insert_with(|| AtomicU32::new(0));
        let count = entry.fetch_add(1, Ordering::SeqCst) + 1;

        if count >= self.threshold {
            self.failed.insert(zone_id.to_string(), ()).is_none()
        } else {
            false
        }
    }

    fn record_success(&self, zone_id: &str) -> bool {
        if let Some(entry) = self.counts.get(zone_id) {
            entry.store(0, Ordering::SeqCst);
        }
        self.failed.remove(zone_id).is_some()
    }

    fn is_failed(&self, zone_id: &str) -> bool {
        self.failed.contains_key(zone_id)
    }

    fn failed_zones(&self) -> Vec<String> {
        self.failed.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_failed_after_threshold() {
        let detector = ConsecutiveFailureDetector::new(2);
        assert!(!detector.record_failure("z1"));
        assert!(detector.record_failure("z1"));
        assert!(detector.is_failed("z1"));
    }

    #[test]
    fn single_success_clears_failure() {
        let detector = ConsecutiveFailureDetector::new(2);
        detector.record_failure("z1");
        detector.record_failure("z1");
        assert!(detector.is_failed("z1"));
        assert!(detector.record_success("z1"));
        assert!(!detector.is_failed("z1"));
    }
}
