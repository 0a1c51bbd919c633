// src/core/node_factory.rs

//! `NodeFactory` (C8): builds and registers a single new member, per §4.8's step-by-step
//! recipe — create the entity, set custom flags, overlay the allocated `cluster_member_id`,
//! link it to its location's parent, mark it as a cluster member, hand it to the management
//! layer, and wrap the result in a [`Member`].
//!
//! Grounded on the teacher's `ServerState::initialize` step-by-step assembly style: each step
//! is its own statement, in a fixed order, with no attempt to parallelize within a single
//! member's construction (only across members, which is `ParallelStarter`'s job).

use crate::core::entity::{Entity, Location, ManagementContext, SensorValue};
use crate::core::errors::ClusterError;
use crate::core::id_allocator::MemberIdAllocator;
use crate::core::member::Member;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a new [`Member`] from a blueprint identifier and a target location.
pub struct NodeFactory {
    management: Arc<dyn ManagementContext>,
    id_allocator: Arc<MemberIdAllocator>,
    custom_child_flags: HashMap<String, String>,
}

impl NodeFactory {
    pub fn new(
        management: Arc<dyn ManagementContext>,
        id_allocator: Arc<MemberIdAllocator>,
        custom_child_flags: HashMap<String, String>,
    ) -> Self {
        Self {
            management,
            id_allocator,
            custom_child_flags,
        }
    }

    /// Creates one new member from `spec`, places it at `location`, and registers it with
    /// the management layer. Does not start it — that is `ParallelStarter`'s job, so a batch
    /// of members can be fully constructed before any of them are started.
    pub async fn add_node(
        &self,
        spec: &str,
        location: Location,
        parent_id: &str,
    ) -> Result<Member, ClusterError> {
        // 1. Instantiate the entity from its blueprint.
        let entity: Arc<dyn Entity> = self.management.create_child(spec).await?;

        // 2. Apply operator-configured custom flags.
        for (key, value) in &self.custom_child_flags {
            entity.set_sensor(key, SensorValue::Text(value.clone()));
        }

        // 3. Allocate and overlay the cluster-scoped ordinal, which always wins over a
        // colliding custom flag.
        let cluster_member_id = self.id_allocator.allocate();
        entity.set_sensor("cluster_member_id", SensorValue::Uint(cluster_member_id));

        // 4. Link the new entity to its parent in the management hierarchy.
        self.management.set_parent(&entity, parent_id);

        // 5. Mark it as a cluster member and record which cluster owns it.
        entity.set_sensor("cluster_member", SensorValue::Bool(true));
        entity.set_sensor("cluster", SensorValue::Text(parent_id.to_string()));

        // 6. Register it with the management layer so its effectors become invocable.
        self.management.manage(&entity).await?;

        // 7. Wrap it as a cluster member, recording its placement.
        let member = Member::new(entity, cluster_member_id, vec![location]);

        // 8. Return it for the caller to add to the active set once it starts successfully.
        Ok(member)
    }
}
