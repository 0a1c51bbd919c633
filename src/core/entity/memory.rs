// src/core/entity/memory.rs

//! An in-memory, synchronous-effector implementation of [`Entity`]/[`ManagementContext`].
//!
//! Grounded on the teacher's in-memory test doubles for server-side collaborators: no network
//! calls, deterministic bookkeeping behind a `DashMap`, and a way for tests to flip an entity
//! into a failing state before a start is attempted.

use super::{Entity, Location, LocationCapabilities, ManagementContext, SensorValue};
use crate::core::errors::ClusterError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A fake entity whose `start`/`stop` outcome is pre-programmed by the test, and whose
/// sensors live behind a lock-free map.
pub struct MemoryEntity {
    id: String,
    startable: bool,
    fail_start: AtomicBool,
    sensors: DashMap<String, SensorValue>,
}

impl fmt::Debug for MemoryEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryEntity").field("id", &self.id).finish()
    }
}

impl MemoryEntity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            startable: true,
            fail_start: AtomicBool::new(false),
            sensors: DashMap::new(),
        }
    }

    /// Makes the next (and every subsequent) call to [`Entity::start`] fail, simulating an
    /// unstartable member for quarantine/failure-detector tests.
    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Entity for MemoryEntity {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_startable(&self) -> bool {
        self.startable
    }

    fn get_sensor(&self, key: &str) -> Option<SensorValue> {
        self.sensors.get(key).map(|v| v.clone())
    }

    fn set_sensor(&self, key: &str, value: SensorValue) {
        self.sensors.insert(key.to_string(), value);
    }

    async fn start(&self) -> Result<(), ClusterError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(ClusterError::Management(format!(
                "entity {} refused to start",
                self.id
            )));
        }
        self.set_sensor("service_up", SensorValue::TriState(Some(true)));
        Ok(())
    }

    async fn stop(&self) -> Result<(), ClusterError> {
        self.set_sensor("service_up", SensorValue::TriState(Some(false)));
        Ok(())
    }
}

/// A fixed set of sub-locations under a single top-level location, with no dynamic
/// provisioning. Good enough for tests that exercise zone-aware placement without a real
/// cloud API behind it.
pub struct MemoryManagementContext {
    root: Location,
    zones: Vec<Location>,
    next_child_id: AtomicU64,
    parents: Mutex<std::collections::HashMap<String, String>>,
    fail_new_children: AtomicBool,
}

impl MemoryManagementContext {
    /// Builds a context with a single root location and `num_zones` availability zones
    /// beneath it, named `zone-0`..`zone-{n-1}`.
    pub fn new(root_id: impl Into<String>, num_zones: u32) -> Self {
        let root_id = root_id.into();
        let root = Location {
            id: root_id.clone(),
            name: root_id.clone(),
            parent: None,
            capabilities: if num_zones > 0 {
                LocationCapabilities::AVAILABILITY_ZONE
            } else {
                LocationCapabilities::empty()
            },
        };
        let zones = (0..num_zones)
            .map(|i| Location {
                id: format!("{root_id}/zone-{i}"),
                name: format!("zone-{i}"),
                parent: Some(root_id.clone()),
                capabilities: LocationCapabilities::MACHINE_PROVISIONING,
            })
            .collect();

        Self {
            root,
            zones,
            next_child_id: AtomicU64::new(0),
            parents: Mutex::new(std::collections::HashMap::new()),
            fail_new_children: AtomicBool::new(false),
        }
    }

    pub fn root(&self) -> Location {
        self.root.clone()
    }

    /// When `true`, every subsequently created child entity fails its first (and every)
    /// `start()` call. Lets tests exercise quorum and quarantine paths deterministically.
    pub fn set_fail_new_children(&self, fail: bool) {
        self.fail_new_children.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ManagementContext for MemoryManagementContext {
    async fn create_child(&self, spec: &str) -> Result<Arc<dyn Entity>, ClusterError> {
        let n = self.next_child_id.fetch_add(1, Ordering::SeqCst);
        let entity = MemoryEntity::new(format!("{spec}-{n}"));
        if self.fail_new_children.load(Ordering::SeqCst) {
            entity.set_fail_start(true);
        }
        Ok(Arc::new(entity))
    }

    fn set_parent(&self, child: &Arc<dyn Entity>, parent_id: &str) {
        let mut parents = self.parents.lock().unwrap();
        parents
            .entry(child.id().to_string())
            .or_insert_with(|| parent_id.to_string());
    }

    async fn manage(&self, _entity: &Arc<dyn Entity>) -> Result<(), ClusterError> {
        Ok(())
    }

    async fn unmanage(&self, _entity: &Arc<dyn Entity>) -> Result<(), ClusterError> {
        Ok(())
    }

    fn resolve_location(
        &self,
        existing: Option<&Location>,
        explicit: Option<Location>,
    ) -> Result<Location, ClusterError> {
        match (existing, explicit) {
            (None, None) => Err(ClusterError::NoLocation),
            (None, Some(loc)) => Ok(loc),
            (Some(existing), None) => Ok(existing.clone()),
            (Some(existing), Some(explicit)) if existing.id == explicit.id => Ok(explicit),
            (Some(_), Some(_)) => Err(ClusterError::AmbiguousLocation),
        }
    }

    fn sub_locations(&self, parent: &Location) -> Vec<Location> {
        if parent.id == self.root.id {
            self.zones.clone()
        } else {
            Vec::new()
        }
    }

    fn ancestors(&self, loc: &Location) -> Vec<Location> {
        let mut chain = vec![loc.clone()];
        let mut current = loc.parent.clone();
        while let Some(parent_id) = current {
            if parent_id == self.root.id {
                chain.push(self.root.clone());
                break;
            }
            if let Some(zone) = self.zones.iter().find(|z| z.id == parent_id) {
                chain.push(zone.clone());
                current = zone.parent.clone();
            } else {
                break;
            }
        }
        chain
    }
}
