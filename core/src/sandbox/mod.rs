//! A small deterministic host for driving the queue end to end.
//!
//! The sandbox keeps the whole world in memory and applies simplified
//! effect rules. Every action is validated again when it executes, so an
//! action accepted at submission can still fail if an earlier action in
//! the same tick changed the world.

mod effects;
mod upkeep;

use crate::{
    action::QueuedAction,
    body::Body,
    config::SimConfig,
    cpu::{CpuBudget, GlobalControlLevel, INTENT_CPU_COST},
    entity::{
        ControllerState, CreepState, DroppedResource, Entity, EntityKind, Ownership, SiteState,
        SourceState, SpawnState,
    },
    error::SimResult,
    host::{DestroyCause, Host, HostEffect},
    position::Position,
    resource::{CarryStore, ResourceType},
    result_code::ResultCode,
    rng::{RngBank, RngSlot, SlotRng},
    types::{EntityId, Tick},
    validate,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ticks an owned controller survives without upgrades before losing a level.
pub const CONTROLLER_DOWNGRADE_TICKS: u32 = 20_000;
pub const SPAWN_HITS: u32 = 5_000;

/// Everything the sandbox needs to resume: snapshots store this verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub username: String,
    pub objects:  BTreeMap<EntityId, Entity>,
    pub cpu:      CpuBudget,
    pub gcl:      GlobalControlLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxSettings {
    pub source_regen_ticks: u32,
    pub sign_epoch:         DateTime<Utc>,
}

pub struct Sandbox {
    world:    World,
    settings: SandboxSettings,
    rng_bank: RngBank,
    /// Per-tick streams, recreated lazily when the tick changes.
    ids:      Option<(Tick, SlotRng)>,
    names:    Option<(Tick, SlotRng)>,
    effects:  Vec<HostEffect>,
}

impl Sandbox {
    pub fn new(world: World, settings: SandboxSettings, seed: u64) -> Self {
        Self {
            world,
            settings,
            rng_bank: RngBank::new(seed),
            ids:      None,
            names:    None,
            effects:  Vec::new(),
        }
    }

    /// Build the starting world described by a scenario. Objects without a
    /// configured id get one from the identity stream.
    pub fn from_config(config: &SimConfig, seed: u64) -> SimResult<Self> {
        config.validate()?;
        let cpu = config.cpu.clone();
        let world = World {
            username: config.username.clone(),
            objects:  BTreeMap::new(),
            cpu:      CpuBudget::new(cpu.limit, cpu.tick_limit, cpu.bucket),
            gcl:      GlobalControlLevel::new(config.gcl_level.max(1)),
        };
        let settings = SandboxSettings {
            source_regen_ticks: config.source_regen_ticks,
            sign_epoch:         config.sign_epoch,
        };
        let mut sandbox = Self::new(world, settings, seed);

        for room in &config.rooms {
            let at = |x: u8, y: u8| Position::new(room.name.clone(), x, y);

            if let Some(c) = &room.controller {
                let level = if c.owner.is_mine() || c.owner.is_hostile() { c.level.max(1) } else { 0 };
                sandbox.place(None, at(c.x, c.y), c.owner.clone(), EntityKind::Controller(ControllerState {
                    level,
                    progress: 0,
                    reservation: None,
                    sign: None,
                    safe_mode_available: 0,
                    ticks_to_downgrade: CONTROLLER_DOWNGRADE_TICKS,
                }));
            }
            for s in &room.sources {
                sandbox.place(s.id.clone(), at(s.x, s.y), Ownership::Neutral, EntityKind::Source(SourceState {
                    energy:                s.energy_capacity,
                    energy_capacity:       s.energy_capacity,
                    ticks_to_regeneration: None,
                }));
            }
            for s in &room.spawns {
                sandbox.place(s.id.clone(), at(s.x, s.y), Ownership::Mine, EntityKind::Spawn(SpawnState {
                    name:            s.name.clone(),
                    energy:          s.energy.min(s.energy_capacity),
                    energy_capacity: s.energy_capacity,
                    hits:            SPAWN_HITS,
                    hits_max:        SPAWN_HITS,
                    spawning:        None,
                }));
            }
            for c in &room.creeps {
                let body = Body::from_parts(&c.body);
                let mut carry = CarryStore::with_capacity(body.carry_capacity());
                for (resource, amount) in &c.carry {
                    carry.add(*resource, *amount);
                }
                let ticks_to_live = c.ticks_to_live.unwrap_or_else(|| body.life_time());
                sandbox.place(c.id.clone(), at(c.x, c.y), c.owner.clone(), EntityKind::Creep(CreepState {
                    name: c.name.clone(),
                    body,
                    carry,
                    fatigue: c.fatigue,
                    ticks_to_live,
                    spawning: false,
                    saying: None,
                    notify_when_attacked: true,
                }));
            }
            for s in &room.sites {
                sandbox.place(s.id.clone(), at(s.x, s.y), Ownership::Mine, EntityKind::ConstructionSite(SiteState {
                    structure_type: s.structure_type.clone(),
                    progress:       0,
                    progress_total: s.progress_total,
                }));
            }
        }

        log::info!(
            "sandbox: world built with {} objects in {} rooms",
            sandbox.world.objects.len(),
            config.rooms.len()
        );
        Ok(sandbox)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access for scenario setup in tests and tooling.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn replace_world(&mut self, world: World) {
        self.world = world;
        self.ids = None;
        self.names = None;
        self.effects.clear();
    }

    pub fn settings(&self) -> &SandboxSettings {
        &self.settings
    }

    fn place(&mut self, id: Option<EntityId>, pos: Position, owner: Ownership, kind: EntityKind) -> EntityId {
        let id = id.unwrap_or_else(|| self.mint_id(0));
        self.world.objects.insert(id.clone(), Entity { id: id.clone(), pos, owner, kind });
        id
    }

    /// New opaque id drawn from the identity stream of `tick`.
    fn mint_id(&mut self, tick: Tick) -> EntityId {
        let rng = stream(&mut self.ids, &self.rng_bank, RngSlot::Identity, tick);
        let bytes = rng.next_bytes16();
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .simple()
            .to_string()
    }

    fn naming_rng(&mut self, tick: Tick) -> &mut SlotRng {
        stream(&mut self.names, &self.rng_bank, RngSlot::Naming, tick)
    }

    fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.world.objects.get_mut(id)
    }

    fn creep_mut(&mut self, id: &str) -> Option<&mut CreepState> {
        self.entity_mut(id).and_then(Entity::as_creep_mut)
    }

    /// Whether a creep may step onto `pos`.
    fn is_walkable(&self, pos: &Position) -> bool {
        !self.world.objects.values().any(|e| {
            e.pos == *pos
                && matches!(
                    e.kind,
                    EntityKind::Creep(_) | EntityKind::Spawn(_) | EntityKind::Source(_) | EntityKind::Controller(_)
                )
        })
    }

    /// Put `amount` of `resource` on the ground, merging with an existing
    /// pile of the same type on that tile.
    fn drop_resource(&mut self, tick: Tick, pos: &Position, resource: ResourceType, amount: u32) {
        if amount == 0 {
            return;
        }
        let existing = self.world.objects.values_mut().find(|e| {
            e.pos == *pos && e.as_resource().is_some_and(|r| r.resource_type == resource)
        });
        if let Some(Entity { kind: EntityKind::Resource(pile), .. }) = existing {
            pile.amount += amount;
            return;
        }
        let id = self.mint_id(tick);
        self.world.objects.insert(id.clone(), Entity {
            id,
            pos: pos.clone(),
            owner: Ownership::Neutral,
            kind: EntityKind::Resource(DroppedResource { resource_type: resource, amount }),
        });
    }

    /// Remove an entity and report it. Carried resources fall to the ground.
    fn destroy(&mut self, tick: Tick, id: &str, cause: DestroyCause) {
        let Some(entity) = self.world.objects.remove(id) else {
            return;
        };
        if let EntityKind::Creep(creep) = &entity.kind {
            for (resource, amount) in &creep.carry.contents {
                self.drop_resource(tick, &entity.pos, *resource, *amount);
            }
        }
        log::debug!(
            "tick={tick} sandbox: {} ({}) destroyed: {cause:?}",
            entity.id,
            entity.name().unwrap_or("-")
        );
        self.effects.push(HostEffect::EntityDestroyed {
            id:    entity.id.clone(),
            name:  entity.name().map(str::to_string),
            kind:  entity.tag(),
            cause,
        });
    }
}

fn stream<'a>(slot: &'a mut Option<(Tick, SlotRng)>, bank: &RngBank, which: RngSlot, tick: Tick) -> &'a mut SlotRng {
    if slot.as_ref().map(|(t, _)| *t) != Some(tick) {
        *slot = None;
    }
    &mut slot.get_or_insert_with(|| (tick, bank.for_slot_at_tick(which, tick))).1
}

impl Host for Sandbox {
    fn username(&self) -> &str {
        &self.world.username
    }

    fn object(&self, id: &str) -> Option<&Entity> {
        self.world.objects.get(id)
    }

    fn creep_by_name(&self, name: &str) -> Option<&Entity> {
        self.world
            .objects
            .values()
            .find(|e| e.is_mine() && e.as_creep().is_some_and(|c| c.name == name))
    }

    fn spawn_by_name(&self, name: &str) -> Option<&Entity> {
        self.world
            .objects
            .values()
            .find(|e| e.is_mine() && e.as_spawn().is_some_and(|s| s.name == name))
    }

    fn objects_in_room(&self, room: &str) -> Vec<&Entity> {
        self.world.objects.values().filter(|e| e.pos.room == room).collect()
    }

    fn my_objects(&self) -> Vec<&Entity> {
        self.world.objects.values().filter(|e| e.is_mine()).collect()
    }

    fn cpu(&self) -> CpuBudget {
        self.world.cpu
    }

    fn gcl(&self) -> GlobalControlLevel {
        self.world.gcl
    }

    fn owned_controller_count(&self) -> u32 {
        self.world
            .objects
            .values()
            .filter(|e| e.is_mine() && e.as_controller().is_some())
            .count() as u32
    }

    fn begin_tick(&mut self, _tick: Tick) -> SimResult<()> {
        for entity in self.world.objects.values_mut() {
            if let Some(creep) = entity.as_creep_mut() {
                creep.saying = None;
            }
        }
        Ok(())
    }

    fn execute(&mut self, tick: Tick, queued: &QueuedAction) -> SimResult<ResultCode> {
        let host: &dyn Host = &*self;
        let code = match validate::validate_actor(host, &queued.entity_id) {
            Ok(actor) => validate::validate_action(host, actor, &queued.action),
            Err(code) => code,
        };
        if !code.is_ok() {
            log::debug!(
                "tick={tick} sandbox: {} {} failed at execution: {code}",
                queued.entity_id,
                queued.action.verb().name()
            );
            return Ok(code);
        }

        let code = self.apply(tick, &queued.entity_id, &queued.action)?;
        if code.is_ok() {
            self.world.cpu.charge(INTENT_CPU_COST);
        }
        Ok(code)
    }

    fn end_tick(&mut self, tick: Tick) -> SimResult<()> {
        self.upkeep(tick);
        self.world.cpu.settle();
        Ok(())
    }

    fn take_effects(&mut self) -> Vec<HostEffect> {
        std::mem::take(&mut self.effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_ids_are_kept_and_others_are_minted() {
        let mut config = SimConfig::default_test();
        config.rooms[0].sources[1].id = None;
        let a = Sandbox::from_config(&config, 5).unwrap();
        let b = Sandbox::from_config(&config, 5).unwrap();

        assert!(a.object("worker-1").is_some());
        assert!(a.object("source-a").is_some());
        let minted: Vec<_> = a.world().objects.keys().filter(|k| k.len() == 32).collect();
        assert_eq!(minted.len(), 2, "controller and one source get minted ids");
        assert_eq!(a.world(), b.world(), "same seed builds the same world");
    }

    #[test]
    fn dropped_piles_merge_on_one_tile() {
        let mut sandbox = Sandbox::from_config(&SimConfig::empty_room_test(), 1).unwrap();
        let pos = Position::new("W1N1", 3, 3);
        sandbox.drop_resource(1, &pos, ResourceType::Energy, 20);
        sandbox.drop_resource(1, &pos, ResourceType::Energy, 5);
        let piles: Vec<_> = sandbox
            .world()
            .objects
            .values()
            .filter_map(Entity::as_resource)
            .collect();
        assert_eq!(piles.len(), 1);
        assert_eq!(piles[0].amount, 25);
    }
}
