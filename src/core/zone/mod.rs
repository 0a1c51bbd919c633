// src/core/zone/mod.rs

//! Availability-zone placement and failure detection (C4 in the component table):
//! [`ZonePlacementStrategy`] decides which sub-location a new member lands in,
//! [`ZoneFailureDetector`] decides when a sub-location should stop receiving new members.

pub mod failure_detector;
pub mod placement;

pub use failure_detector::{ConsecutiveFailureDetector, ZoneFailureDetector};
pub use placement::{RoundRobinPlacement, ZonePlacementStrategy};

use std::collections::HashMap;

/// A registry of [`ZonePlacementStrategy`] implementations, looked up by name.
pub struct ZonePlacementRegistry {
    strategies: HashMap<&'static str, Box<dyn ZonePlacementStrategy>>,
}

impl ZonePlacementRegistry {
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register(Box::new(RoundRobinPlacement::default()));
        registry
    }

    pub fn register(&mut self, strategy: Box<dyn ZonePlacementStrategy>) {
        self.strategies.insert(strategy.name(), strategy);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ZonePlacementStrategy> {
        self.strategies.get(name).map(|s| s.as_ref())
    }
}

impl Default for ZonePlacementRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// A registry of [`ZoneFailureDetector`] implementations, looked up by name.
pub struct ZoneFailureDetectorRegistry {
    detectors: HashMap<&'static str, Box<dyn ZoneFailureDetector>>,
}

impl ZoneFailureDetectorRegistry {
    pub fn with_defaults(threshold: u32) -> Self {
        let mut registry = Self {
            detectors: HashMap::new(),
        };
        registry.register(Box::new(ConsecutiveFailureDetector::new(threshold)));
        registry
    }

    pub fn register(&mut self, detector: Box<dyn ZoneFailureDetector>) {
        self.detectors.insert(detector.name(), detector);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ZoneFailureDetector> {
        self.detectors.get(name).map(|d| d.as_ref())
    }
}
