//! Entities as the host reports them: creeps, spawns, sources, controllers,
//! construction sites and dropped resources.

use crate::{
    body::Body,
    capability::{Capability, CapabilitySet},
    position::Position,
    resource::{CarryStore, ResourceType},
    types::{EntityId, Tick},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress needed to leave each controller level, indexed by level.
pub const CONTROLLER_LEVELS: [u64; 8] = [0, 200, 45_000, 135_000, 405_000, 1_215_000, 3_645_000, 10_935_000];
pub const MAX_CONTROLLER_LEVEL: u8 = 8;
pub const CONTROLLER_RESERVE_MAX: u32 = 5_000;
pub const SIGN_MAX_LENGTH: usize = 100;
pub const SAY_MAX_LENGTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "username", rename_all = "snake_case")]
pub enum Ownership {
    Mine,
    Hostile(String),
    Neutral,
}

impl Ownership {
    pub fn is_mine(&self) -> bool {
        matches!(self, Self::Mine)
    }

    pub fn is_hostile(&self) -> bool {
        matches!(self, Self::Hostile(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id:    EntityId,
    pub pos:   Position,
    pub owner: Ownership,
    pub kind:  EntityKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    Creep(CreepState),
    Spawn(SpawnState),
    Source(SourceState),
    Controller(ControllerState),
    ConstructionSite(SiteState),
    Resource(DroppedResource),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKindTag {
    Creep,
    Spawn,
    Source,
    Controller,
    ConstructionSite,
    Resource,
}

impl Entity {
    pub fn tag(&self) -> EntityKindTag {
        match &self.kind {
            EntityKind::Creep(_)            => EntityKindTag::Creep,
            EntityKind::Spawn(_)            => EntityKindTag::Spawn,
            EntityKind::Source(_)           => EntityKindTag::Source,
            EntityKind::Controller(_)       => EntityKindTag::Controller,
            EntityKind::ConstructionSite(_) => EntityKindTag::ConstructionSite,
            EntityKind::Resource(_)         => EntityKindTag::Resource,
        }
    }

    /// Creep and spawn names; other entities are anonymous.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Creep(c) => Some(&c.name),
            EntityKind::Spawn(s) => Some(&s.name),
            _ => None,
        }
    }

    pub fn is_mine(&self) -> bool {
        self.owner.is_mine()
    }

    pub fn capabilities(&self) -> CapabilitySet {
        match &self.kind {
            EntityKind::Creep(c) => c.body.capabilities(),
            EntityKind::Spawn(_) => CapabilitySet::empty().with(Capability::Spawn),
            _ => CapabilitySet::empty(),
        }
    }

    pub fn as_creep(&self) -> Option<&CreepState> {
        match &self.kind {
            EntityKind::Creep(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_creep_mut(&mut self) -> Option<&mut CreepState> {
        match &mut self.kind {
            EntityKind::Creep(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_spawn(&self) -> Option<&SpawnState> {
        match &self.kind {
            EntityKind::Spawn(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_spawn_mut(&mut self) -> Option<&mut SpawnState> {
        match &mut self.kind {
            EntityKind::Spawn(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_source(&self) -> Option<&SourceState> {
        match &self.kind {
            EntityKind::Source(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_source_mut(&mut self) -> Option<&mut SourceState> {
        match &mut self.kind {
            EntityKind::Source(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_controller(&self) -> Option<&ControllerState> {
        match &self.kind {
            EntityKind::Controller(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_controller_mut(&mut self) -> Option<&mut ControllerState> {
        match &mut self.kind {
            EntityKind::Controller(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_site(&self) -> Option<&SiteState> {
        match &self.kind {
            EntityKind::ConstructionSite(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_site_mut(&mut self) -> Option<&mut SiteState> {
        match &mut self.kind {
            EntityKind::ConstructionSite(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&DroppedResource> {
        match &self.kind {
            EntityKind::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_resource_mut(&mut self) -> Option<&mut DroppedResource> {
        match &mut self.kind {
            EntityKind::Resource(r) => Some(r),
            _ => None,
        }
    }

    /// Structures with hit points that can be attacked, repaired or dismantled.
    pub fn structure_hits(&self) -> Option<(u32, u32)> {
        match &self.kind {
            EntityKind::Spawn(s) => Some((s.hits, s.hits_max)),
            _ => None,
        }
    }

    /// Resource amount held by a creep or spawn.
    pub fn stored(&self, resource: ResourceType) -> Option<u32> {
        match &self.kind {
            EntityKind::Creep(c) => Some(c.carry.get(resource)),
            EntityKind::Spawn(s) if resource == ResourceType::Energy => Some(s.energy),
            EntityKind::Spawn(_) => Some(0),
            _ => None,
        }
    }

    /// Free room for `resource`, or `None` if this entity cannot hold it.
    pub fn free_capacity(&self, resource: ResourceType) -> Option<u32> {
        match &self.kind {
            EntityKind::Creep(c) => Some(c.carry.free()),
            EntityKind::Spawn(s) if resource == ResourceType::Energy => {
                Some(s.energy_capacity.saturating_sub(s.energy))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreepState {
    pub name:          String,
    pub body:          Body,
    pub carry:         CarryStore,
    pub fatigue:       u32,
    pub ticks_to_live: u32,
    /// Still being produced by a spawn; cannot act.
    pub spawning:      bool,
    #[serde(default)]
    pub saying:        Option<String>,
    #[serde(default = "default_true")]
    pub notify_when_attacked: bool,
}

fn default_true() -> bool {
    true
}

impl CreepState {
    pub fn hits(&self) -> u32 {
        self.body.hits()
    }

    pub fn hits_max(&self) -> u32 {
        self.body.hits_max()
    }

    /// Carry capacity follows the live CARRY parts. Returns what no longer
    /// fits after parts were lost.
    pub fn refresh_capacity(&mut self) -> Vec<(ResourceType, u32)> {
        self.carry.set_capacity(self.body.carry_capacity())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawningSpec {
    pub name:           String,
    pub need_time:      u32,
    pub remaining_time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnState {
    pub name:            String,
    pub energy:          u32,
    pub energy_capacity: u32,
    pub hits:            u32,
    pub hits_max:        u32,
    pub spawning:        Option<SpawningSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceState {
    pub energy:               u32,
    pub energy_capacity:      u32,
    /// Counts down once the source has been harvested; refills at zero.
    pub ticks_to_regeneration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub username:    String,
    pub ticks_to_end: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sign {
    pub username: String,
    pub text:     String,
    pub time:     Tick,
    pub datetime: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    pub level:               u8,
    pub progress:            u64,
    pub reservation:         Option<Reservation>,
    pub sign:                Option<Sign>,
    pub safe_mode_available: u32,
    /// Ticks before an unattended controller loses a level.
    pub ticks_to_downgrade:  u32,
}

impl ControllerState {
    pub fn progress_total(&self) -> Option<u64> {
        CONTROLLER_LEVELS.get(self.level as usize).copied().filter(|t| *t > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteState {
    pub structure_type: String,
    pub progress:       u32,
    pub progress_total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedResource {
    pub resource_type: ResourceType,
    pub amount:        u32,
}
