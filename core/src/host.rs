//! The boundary to the simulation host.
//!
//! RULE: the queue and behaviours learn about the world only through `Host`.
//! The host owns execution: it decides the final outcome of every action
//! handed to it at resolution time.

use crate::{
    action::QueuedAction,
    cpu::{CpuBudget, GlobalControlLevel},
    entity::{Entity, EntityKindTag},
    error::SimResult,
    result_code::ResultCode,
    types::{EntityId, Tick},
};
use serde::{Deserialize, Serialize};

pub trait Host {
    /// Username of the controlling player.
    fn username(&self) -> &str;

    fn object(&self, id: &str) -> Option<&Entity>;

    /// The player's own creep with this name. Names of other players'
    /// creeps are not reserved.
    fn creep_by_name(&self, name: &str) -> Option<&Entity>;

    fn spawn_by_name(&self, name: &str) -> Option<&Entity>;

    /// All objects in a room, in id order.
    fn objects_in_room(&self, room: &str) -> Vec<&Entity>;

    /// Every entity owned by the player, in id order.
    fn my_objects(&self) -> Vec<&Entity>;

    fn cpu(&self) -> CpuBudget;

    fn gcl(&self) -> GlobalControlLevel;

    /// Number of controllers the player owns; compared against GCL for claims.
    fn owned_controller_count(&self) -> u32;

    /// Called once before any submission for `tick`.
    fn begin_tick(&mut self, tick: Tick) -> SimResult<()>;

    /// Execute one accepted action. Called in submission order.
    fn execute(&mut self, tick: Tick, action: &QueuedAction) -> SimResult<ResultCode>;

    /// Called once after every action of `tick` has been executed.
    fn end_tick(&mut self, tick: Tick) -> SimResult<()>;

    /// Side effects observed since the last call.
    fn take_effects(&mut self) -> Vec<HostEffect>;
}

/// Lifecycle changes reported by the host. The engine uses these to keep
/// memory records in step with entity creation and destruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum HostEffect {
    CreepSpawning {
        spawn_id: EntityId,
        creep_id: EntityId,
        name:     String,
        memory:   Option<serde_json::Value>,
    },
    CreepSpawned {
        creep_id: EntityId,
        name:     String,
    },
    EntityDestroyed {
        id:    EntityId,
        name:  Option<String>,
        kind:  EntityKindTag,
        cause: DestroyCause,
    },
    ControllerClaimed {
        controller_id: EntityId,
        room:          String,
    },
    ControllerLevelChanged {
        controller_id: EntityId,
        room:          String,
        level:         u8,
    },
    StructureBuilt {
        site_id:        EntityId,
        structure_type: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestroyCause {
    Suicide,
    Recycled,
    Expired,
    Killed,
    Dismantled,
    Depleted,
}
