// src/core/entity/mod.rs

//! Trait contracts for the entity/management/location collaborators the controller
//! consumes but does not own (see SPEC_FULL.md §6 and §1's "out of scope" note).
//!
//! A real deployment plugs in its own entity model, blueprint parser, and location
//! registry by implementing [`Entity`] and [`ManagementContext`]. [`memory`] ships a
//! minimal implementation of both, used by the demo binary and the integration tests.

pub mod memory;

use crate::core::errors::ClusterError;
use async_trait::async_trait;
use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

bitflags! {
    /// Capabilities a [`Location`] may advertise. Mirrors the spec's "AvailabilityZone
    /// capability" and "MachineProvisioningLocation capability-holder" checks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LocationCapabilities: u8 {
        const AVAILABILITY_ZONE     = 0b0000_0001;
        const MACHINE_PROVISIONING  = 0b0000_0010;
    }
}

/// A node in the location hierarchy: the cluster's single top-level location, or one of its
/// availability-zone sub-locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub parent: Option<String>,
    pub capabilities: LocationCapabilities,
}

impl Location {
    pub fn is_availability_zone(&self) -> bool {
        self.capabilities
            .contains(LocationCapabilities::AVAILABILITY_ZONE)
    }

    pub fn is_machine_provisioning(&self) -> bool {
        self.capabilities
            .contains(LocationCapabilities::MACHINE_PROVISIONING)
    }
}

/// An opaque, observable attribute on an [`Entity`]. Real deployments carry a much richer
/// sensor type; the controller only ever reads/writes the handful the spec names.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorValue {
    Bool(bool),
    TriState(Option<bool>),
    Text(String),
    Uint(u64),
}

/// One managed child entity: a cluster member, or a legacy/unmanaged entity the controller
/// is asked to adopt (e.g. the target of `replace_member`).
///
/// Out of scope: entity creation, parent/child linkage, and lifecycle management of
/// arbitrary entities belong to the management layer. This trait only exposes what the
/// controller needs to read and invoke.
#[async_trait]
pub trait Entity: Send + Sync + fmt::Debug {
    /// The entity's stable id, unique for the lifetime of the management context.
    fn id(&self) -> &str;

    /// Whether this entity responds to `start`/`stop` effectors.
    fn is_startable(&self) -> bool;

    /// Reads a sensor. Returns `None` if never set.
    fn get_sensor(&self, key: &str) -> Option<SensorValue>;

    /// Writes a sensor.
    fn set_sensor(&self, key: &str, value: SensorValue);

    /// Invokes the `start` effector. The returned future is the "start task" the spec
    /// describes; `ParallelStarter` fans these out.
    async fn start(&self) -> Result<(), ClusterError>;

    /// Invokes the `stop` effector.
    async fn stop(&self) -> Result<(), ClusterError>;

    /// Convenience accessor for the tri-state `service_up` sensor.
    fn service_up(&self) -> Option<bool> {
        match self.get_sensor("service_up") {
            Some(SensorValue::TriState(v)) => v,
            Some(SensorValue::Bool(v)) => Some(v),
            _ => None,
        }
    }
}

/// The entity/management/location layer the controller is built against.
///
/// Out of scope per SPEC_FULL.md §1: the blueprint parser, persistence, and the REST/CLI
/// surface that would normally sit behind this trait. This crate only defines the contract.
#[async_trait]
pub trait ManagementContext: Send + Sync {
    /// Instantiates a new child entity from an opaque spec identifier
    /// (`member_spec`/`first_member_spec` from configuration).
    async fn create_child(&self, spec: &str) -> Result<Arc<dyn Entity>, ClusterError>;

    /// Sets `child`'s parent to `parent_id`, if it does not already have one.
    fn set_parent(&self, child: &Arc<dyn Entity>, parent_id: &str);

    /// Registers the entity with the management layer, making it a first-class citizen
    /// (discoverable, its effectors invocable).
    async fn manage(&self, entity: &Arc<dyn Entity>) -> Result<(), ClusterError>;

    /// Unregisters the entity.
    async fn unmanage(&self, entity: &Arc<dyn Entity>) -> Result<(), ClusterError>;

    /// Resolves a single location from the cluster's existing location (if any) and an
    /// explicit one supplied to `start()`. Fails with `AmbiguousLocation`/`NoLocation` per
    /// §4.1.
    fn resolve_location(
        &self,
        existing: Option<&Location>,
        explicit: Option<Location>,
    ) -> Result<Location, ClusterError>;

    /// Enumerates the full set of availability-zone sub-locations under `parent`, if
    /// `parent` carries the `AvailabilityZone` capability. Empty otherwise.
    fn sub_locations(&self, parent: &Location) -> Vec<Location>;

    /// Returns `loc` followed by its ancestors, walking `parent` links to the root. Used by
    /// `replace_member`'s zone-inference walk (§4.1.1).
    fn ancestors(&self, loc: &Location) -> Vec<Location>;
}
