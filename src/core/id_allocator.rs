// src/core/id_allocator.rs

//! `MemberIdAllocator` (C1): hands out strictly increasing, never-reused ordinals for new
//! members within a single cluster's lifetime.
//!
//! Grounded on the teacher's one-shot-init-guard idiom for server-wide counters: an
//! `AtomicU64` for the counter itself, plus an `AtomicBool` so the allocator can be
//! initialized from a persisted high-water mark exactly once, after which further attempts
//! are no-ops.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Allocates `cluster_member_id` values. Lock-free: a single `fetch_add` handles the common
/// path, and initialization is guarded so a late `restore_from` cannot rewind a counter that
/// has already issued ids.
#[derive(Debug)]
pub struct MemberIdAllocator {
    next: AtomicU64,
    initialized: AtomicBool,
}

impl MemberIdAllocator {
    /// Creates an allocator that starts counting from 0.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
            initialized: AtomicBool::new(true),
        }
    }

    /// Creates an allocator that has not yet been given a starting point; the first call to
    /// [`Self::restore_from`] sets it, after which it behaves like [`Self::new`] seeded from
    /// that value. Used when rehydrating a cluster's state from persisted members.
    pub fn uninitialized() -> Self {
        Self {
            next: AtomicU64::new(0),
            initialized: AtomicBool::new(false),
        }
    }

    /// Seeds the counter to continue from `highest_seen + 1`. Only takes effect the first
    /// time it is called; subsequent calls are ignored so a resize racing with a restore
    /// cannot be rewound.
    pub fn restore_from(&self, highest_seen: u64) {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.next.store(highest_seen + 1, Ordering::SeqCst);
        }
    }

    /// Returns the next id and advances the counter. Never blocks, never reuses a value.
    pub fn allocate(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for MemberIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_increasing_ids() {
        let alloc = MemberIdAllocator::new();
        assert_eq!(alloc.allocate(), 0);
        assert_eq!(alloc.allocate(), 1);
        assert_eq!(alloc.allocate(), 2);
    }

    #[test]
    fn restore_only_takes_effect_once() {
        let alloc = MemberIdAllocator::uninitialized();
        alloc.restore_from(10);
        assert_eq!(alloc.allocate(), 11);
        alloc.restore_from(100);
        assert_eq!(alloc.allocate(), 12);
    }
}
