//! Effect rules for executed actions.
//!
//! Every function here runs after the action passed validation against the
//! current world, so lookups that fail mean the world changed underneath
//! and are answered with a result code, not an error.

use super::{Sandbox, CONTROLLER_DOWNGRADE_TICKS};
use crate::{
    action::{Action, MoveTarget, MoveToOpts},
    body::{BodyPart, CREEP_SPAWN_TIME},
    entity::{
        CreepState, Entity, EntityKind, Ownership, Reservation, Sign, SpawningSpec,
        CONTROLLER_RESERVE_MAX, MAX_CONTROLLER_LEVEL, SAY_MAX_LENGTH,
    },
    error::{SimError, SimResult},
    host::{DestroyCause, Host, HostEffect},
    name_generator::NameGenerator,
    position::Direction,
    resource::{CarryStore, ResourceType},
    result_code::ResultCode,
    types::Tick,
    validate::{self, SAFE_MODE_GHODIUM_COST},
};
use std::collections::HashSet;

pub const HARVEST_POWER: u32 = 2;
pub const BUILD_POWER: u32 = 5;
pub const REPAIR_POWER: u32 = 100;
pub const DISMANTLE_POWER: u32 = 50;
pub const UPGRADE_CONTROLLER_POWER: u32 = 1;
pub const ATTACK_POWER: u32 = 30;
pub const RANGED_ATTACK_POWER: u32 = 10;
pub const HEAL_POWER: u32 = 12;
pub const RANGED_HEAL_POWER: u32 = 4;
pub const CONTROLLER_RESERVE: u32 = 1;
pub const CONTROLLER_CLAIM_DOWNGRADE: u32 = 300;
/// Fatigue added per weighted part on each step.
pub const MOVE_FATIGUE: u32 = 2;
/// Mass attack damage per RANGED_ATTACK part, indexed by range.
const MASS_ATTACK_POWER: [u32; 4] = [10, 10, 4, 1];

impl Sandbox {
    pub(super) fn apply(&mut self, tick: Tick, actor_id: &str, action: &Action) -> SimResult<ResultCode> {
        let actor = self
            .world
            .objects
            .get(actor_id)
            .cloned()
            .ok_or_else(|| SimError::UnknownEntity { id: actor_id.to_string() })?;

        let code = match action {
            Action::Move { direction } => self.step(&actor, *direction),
            Action::MoveTo { target, opts } => self.move_toward(&actor, target, opts),
            Action::MoveByPath { path } => match validate::next_path_step(&actor, path) {
                Some(index) => self.step(&actor, path[index].direction),
                None => ResultCode::NotFound,
            },

            Action::Attack { target } => {
                self.damage(tick, target, ATTACK_POWER * active(&actor, BodyPart::Attack), DestroyCause::Killed);
                ResultCode::Ok
            }
            Action::RangedAttack { target } => {
                let amount = RANGED_ATTACK_POWER * active(&actor, BodyPart::RangedAttack);
                self.damage(tick, target, amount, DestroyCause::Killed);
                ResultCode::Ok
            }
            Action::RangedMassAttack => {
                self.mass_attack(tick, &actor);
                ResultCode::Ok
            }
            Action::Heal { target } => {
                self.heal(target, HEAL_POWER * active(&actor, BodyPart::Heal));
                ResultCode::Ok
            }
            Action::RangedHeal { target } => {
                self.heal(target, RANGED_HEAL_POWER * active(&actor, BodyPart::Heal));
                ResultCode::Ok
            }

            Action::Harvest { target } => self.harvest(tick, &actor, target),
            Action::Build { target } => self.build(&actor, target),
            Action::Repair { target } => self.repair(&actor, target),
            Action::Dismantle { target } => {
                let amount = DISMANTLE_POWER * active(&actor, BodyPart::Work);
                self.damage(tick, target, amount, DestroyCause::Dismantled);
                ResultCode::Ok
            }
            Action::Transfer { target, resource, amount } => {
                let held = actor.stored(*resource).unwrap_or(0);
                let free = self.object(target).and_then(|t| t.free_capacity(*resource)).unwrap_or(0);
                let wanted = amount.unwrap_or(held.min(free));
                self.move_resource(&actor.id, target, *resource, wanted)
            }
            Action::Withdraw { target, resource, amount } => {
                let held = self.object(target).and_then(|t| t.stored(*resource)).unwrap_or(0);
                let free = actor.free_capacity(*resource).unwrap_or(0);
                let wanted = amount.unwrap_or(held.min(free));
                self.move_resource(target, &actor.id, *resource, wanted)
            }
            Action::Drop { resource, amount } => {
                let wanted = amount.unwrap_or_else(|| actor.stored(*resource).unwrap_or(0));
                let taken = self.take(&actor.id, *resource, wanted);
                self.drop_resource(tick, &actor.pos, *resource, taken);
                ResultCode::Ok
            }
            Action::Pickup { target } => self.pickup(&actor, target),

            Action::UpgradeController { target } => self.upgrade(&actor, target),
            Action::ClaimController { target } => self.claim(target),
            Action::ReserveController { target } => {
                let added = CONTROLLER_RESERVE * active(&actor, BodyPart::Claim);
                let username = self.world.username.clone();
                let Some(controller) = self.entity_mut(target).and_then(Entity::as_controller_mut) else {
                    return Ok(ResultCode::InvalidTarget);
                };
                let ticks = controller.reservation.as_ref().map_or(0, |r| r.ticks_to_end);
                controller.reservation = Some(Reservation {
                    username,
                    ticks_to_end: (ticks + added).min(CONTROLLER_RESERVE_MAX),
                });
                ResultCode::Ok
            }
            Action::AttackController { target } => {
                let power = CONTROLLER_CLAIM_DOWNGRADE * active(&actor, BodyPart::Claim);
                let Some(controller) = self.entity_mut(target).and_then(Entity::as_controller_mut) else {
                    return Ok(ResultCode::InvalidTarget);
                };
                if let Some(reservation) = controller.reservation.as_mut() {
                    reservation.ticks_to_end = reservation.ticks_to_end.saturating_sub(power);
                    if reservation.ticks_to_end == 0 {
                        controller.reservation = None;
                    }
                } else {
                    controller.ticks_to_downgrade = controller.ticks_to_downgrade.saturating_sub(power);
                }
                ResultCode::Ok
            }
            Action::GenerateSafeMode { target } => {
                self.take(&actor.id, ResourceType::Ghodium, SAFE_MODE_GHODIUM_COST);
                if let Some(controller) = self.entity_mut(target).and_then(Entity::as_controller_mut) {
                    controller.safe_mode_available += 1;
                }
                ResultCode::Ok
            }
            Action::SignController { target, text } => {
                let sign = (!text.is_empty()).then(|| Sign {
                    username: self.world.username.clone(),
                    text:     text.clone(),
                    time:     tick,
                    datetime: self.settings.sign_epoch + chrono::Duration::seconds(tick as i64),
                });
                if let Some(controller) = self.entity_mut(target).and_then(Entity::as_controller_mut) {
                    controller.sign = sign;
                }
                ResultCode::Ok
            }

            Action::Suicide => {
                self.destroy(tick, &actor.id, DestroyCause::Suicide);
                ResultCode::Ok
            }
            Action::Say { message, .. } => {
                if let Some(creep) = self.creep_mut(&actor.id) {
                    creep.saying = Some(message.chars().take(SAY_MAX_LENGTH).collect());
                }
                ResultCode::Ok
            }
            Action::NotifyWhenAttacked { enabled } => {
                if let Some(creep) = self.creep_mut(&actor.id) {
                    creep.notify_when_attacked = *enabled;
                }
                ResultCode::Ok
            }

            Action::SpawnCreep { body, name, memory } => {
                self.spawn_creep(tick, &actor, body, name.as_deref(), memory.clone())
            }
            Action::RecycleCreep { target } => self.recycle(tick, &actor, target),
            Action::RenewCreep { target } => self.renew(&actor, target),
        };
        Ok(code)
    }

    // ── Movement ─────────────────────────────────────────────────────

    fn step(&mut self, actor: &Entity, direction: Direction) -> ResultCode {
        let Some(next) = actor.pos.step(direction) else {
            return ResultCode::NoPath;
        };
        if !self.is_walkable(&next) {
            return ResultCode::NoPath;
        }
        let Some(entity) = self.entity_mut(&actor.id) else {
            return ResultCode::NotFound;
        };
        entity.pos = next;
        if let Some(creep) = entity.as_creep_mut() {
            let fatigue = move_fatigue(creep);
            creep.fatigue += fatigue;
        }
        ResultCode::Ok
    }

    /// One greedy step toward the target. Prefers a step that closes the
    /// distance, straight first; falls back to a sidestep that keeps it.
    fn move_toward(&mut self, actor: &Entity, target: &MoveTarget, opts: &MoveToOpts) -> ResultCode {
        let goal = match validate::move_goal(&*self, actor, target) {
            Ok(goal) => goal,
            Err(code) => return code,
        };
        let Some(range) = actor.pos.range_to(&goal) else {
            return ResultCode::NoPath;
        };
        if range <= opts.range {
            return ResultCode::Ok;
        }
        let Some(straight) = actor.pos.direction_to(&goal) else {
            return ResultCode::Ok;
        };
        let candidates = [
            straight,
            rotate(straight, 1),
            rotate(straight, -1),
            rotate(straight, 2),
            rotate(straight, -2),
        ];
        let open = |direction: Direction| {
            actor
                .pos
                .step(direction)
                .filter(|next| self.is_walkable(next))
                .and_then(|next| next.range_to(&goal))
        };
        let chosen = candidates
            .iter()
            .find(|d| open(**d).is_some_and(|r| r < range))
            .or_else(|| candidates.iter().find(|d| open(**d).is_some_and(|r| r <= range)))
            .copied();
        match chosen {
            Some(direction) => self.step(actor, direction),
            None => ResultCode::NoPath,
        }
    }

    // ── Combat ───────────────────────────────────────────────────────

    fn damage(&mut self, tick: Tick, target_id: &str, amount: u32, cause: DestroyCause) {
        let Some(entity) = self.entity_mut(target_id) else {
            return;
        };
        let pos = entity.pos.clone();
        let (destroyed, spilled) = match &mut entity.kind {
            EntityKind::Creep(creep) => {
                creep.body.apply_damage(amount);
                (creep.hits() == 0, creep.refresh_capacity())
            }
            EntityKind::Spawn(spawn) => {
                spawn.hits = spawn.hits.saturating_sub(amount);
                (spawn.hits == 0, Vec::new())
            }
            _ => (false, Vec::new()),
        };
        for (resource, amount) in spilled {
            self.drop_resource(tick, &pos, resource, amount);
        }
        if destroyed {
            self.destroy(tick, target_id, cause);
        }
    }

    fn heal(&mut self, target_id: &str, amount: u32) {
        if let Some(creep) = self.creep_mut(target_id) {
            creep.body.apply_heal(amount);
            creep.refresh_capacity();
        }
    }

    fn mass_attack(&mut self, tick: Tick, actor: &Entity) {
        let parts = active(actor, BodyPart::RangedAttack);
        let victims: Vec<(String, u32)> = self
            .objects_in_room(&actor.pos.room)
            .into_iter()
            .filter(|e| e.owner.is_hostile() && (e.as_creep().is_some() || e.structure_hits().is_some()))
            .filter_map(|e| {
                let range = actor.pos.range_to(&e.pos)? as usize;
                MASS_ATTACK_POWER.get(range).map(|power| (e.id.clone(), power * parts))
            })
            .collect();
        for (id, amount) in victims {
            self.damage(tick, &id, amount, DestroyCause::Killed);
        }
    }

    // ── Economy ──────────────────────────────────────────────────────

    fn harvest(&mut self, tick: Tick, actor: &Entity, target_id: &str) -> ResultCode {
        let power = HARVEST_POWER * active(actor, BodyPart::Work);
        let regen = self.settings.source_regen_ticks;
        let Some(source) = self.entity_mut(target_id).and_then(Entity::as_source_mut) else {
            return ResultCode::InvalidTarget;
        };
        if source.energy == 0 {
            return ResultCode::NotEnoughResources;
        }
        let mined = power.min(source.energy);
        source.energy -= mined;
        source.ticks_to_regeneration.get_or_insert(regen);

        let stored = self.give(&actor.id, ResourceType::Energy, mined);
        self.drop_resource(tick, &actor.pos, ResourceType::Energy, mined - stored);
        ResultCode::Ok
    }

    fn build(&mut self, actor: &Entity, target_id: &str) -> ResultCode {
        let power = BUILD_POWER * active(actor, BodyPart::Work);
        let carried = actor.stored(ResourceType::Energy).unwrap_or(0);
        let Some(site) = self.entity_mut(target_id).and_then(Entity::as_site_mut) else {
            return ResultCode::InvalidTarget;
        };
        let spent = power.min(carried).min(site.progress_total.saturating_sub(site.progress));
        site.progress += spent;
        let finished = (site.progress >= site.progress_total).then(|| site.structure_type.clone());
        self.take(&actor.id, ResourceType::Energy, spent);

        if let Some(structure_type) = finished {
            self.world.objects.remove(target_id);
            self.effects.push(HostEffect::StructureBuilt {
                site_id: target_id.to_string(),
                structure_type,
            });
        }
        ResultCode::Ok
    }

    fn repair(&mut self, actor: &Entity, target_id: &str) -> ResultCode {
        let work = active(actor, BodyPart::Work);
        let carried = actor.stored(ResourceType::Energy).unwrap_or(0);
        let Some(spawn) = self.entity_mut(target_id).and_then(Entity::as_spawn_mut) else {
            return ResultCode::InvalidTarget;
        };
        let missing = spawn.hits_max - spawn.hits;
        let repaired = (work.min(carried) * REPAIR_POWER).min(missing);
        spawn.hits += repaired;
        self.take(&actor.id, ResourceType::Energy, repaired.div_ceil(REPAIR_POWER));
        ResultCode::Ok
    }

    fn move_resource(&mut self, from: &str, to: &str, resource: ResourceType, amount: u32) -> ResultCode {
        let taken = self.take(from, resource, amount);
        let stored = self.give(to, resource, taken);
        if stored < taken {
            self.give(from, resource, taken - stored);
        }
        ResultCode::Ok
    }

    fn pickup(&mut self, actor: &Entity, target_id: &str) -> ResultCode {
        let free = actor.free_capacity(ResourceType::Energy).unwrap_or(0);
        let Some(pile) = self.entity_mut(target_id).and_then(Entity::as_resource_mut) else {
            return ResultCode::InvalidTarget;
        };
        let picked = pile.amount.min(free);
        pile.amount -= picked;
        let (resource, left) = (pile.resource_type, pile.amount);
        if left == 0 {
            self.world.objects.remove(target_id);
        }
        self.give(&actor.id, resource, picked);
        ResultCode::Ok
    }

    /// Remove up to `amount` from a creep or spawn; returns what was taken.
    fn take(&mut self, id: &str, resource: ResourceType, amount: u32) -> u32 {
        match self.entity_mut(id).map(|e| &mut e.kind) {
            Some(EntityKind::Creep(creep)) => creep.carry.remove(resource, amount),
            Some(EntityKind::Spawn(spawn)) if resource == ResourceType::Energy => {
                let taken = spawn.energy.min(amount);
                spawn.energy -= taken;
                taken
            }
            _ => 0,
        }
    }

    /// Store up to `amount` in a creep or spawn; returns what fit.
    fn give(&mut self, id: &str, resource: ResourceType, amount: u32) -> u32 {
        match self.entity_mut(id).map(|e| &mut e.kind) {
            Some(EntityKind::Creep(creep)) => creep.carry.add(resource, amount),
            Some(EntityKind::Spawn(spawn)) if resource == ResourceType::Energy => {
                let stored = amount.min(spawn.energy_capacity.saturating_sub(spawn.energy));
                spawn.energy += stored;
                stored
            }
            _ => 0,
        }
    }

    // ── Controller ───────────────────────────────────────────────────

    fn upgrade(&mut self, actor: &Entity, target_id: &str) -> ResultCode {
        let power = UPGRADE_CONTROLLER_POWER * active(actor, BodyPart::Work);
        let spent = power.min(actor.stored(ResourceType::Energy).unwrap_or(0));
        let Some(entity) = self.world.objects.get_mut(target_id) else {
            return ResultCode::InvalidTarget;
        };
        let room = entity.pos.room.clone();
        let Some(controller) = entity.as_controller_mut() else {
            return ResultCode::InvalidTarget;
        };

        controller.progress += spent as u64;
        controller.ticks_to_downgrade = CONTROLLER_DOWNGRADE_TICKS;
        let mut new_level = None;
        while let Some(total) = controller.progress_total() {
            if controller.progress < total || controller.level >= MAX_CONTROLLER_LEVEL {
                break;
            }
            controller.progress -= total;
            controller.level += 1;
            new_level = Some(controller.level);
        }

        self.take(&actor.id, ResourceType::Energy, spent);
        self.world.gcl.add_progress(spent as u64);
        if let Some(level) = new_level {
            log::info!("sandbox: controller in {room} reached level {level}");
            self.effects.push(HostEffect::ControllerLevelChanged {
                controller_id: target_id.to_string(),
                room,
                level,
            });
        }
        ResultCode::Ok
    }

    fn claim(&mut self, target_id: &str) -> ResultCode {
        let Some(entity) = self.world.objects.get_mut(target_id) else {
            return ResultCode::InvalidTarget;
        };
        entity.owner = Ownership::Mine;
        let room = entity.pos.room.clone();
        if let Some(controller) = entity.as_controller_mut() {
            controller.level = 1;
            controller.progress = 0;
            controller.reservation = None;
            controller.ticks_to_downgrade = CONTROLLER_DOWNGRADE_TICKS;
        }
        self.effects.push(HostEffect::ControllerClaimed {
            controller_id: target_id.to_string(),
            room,
        });
        ResultCode::Ok
    }

    // ── Spawn ────────────────────────────────────────────────────────

    fn spawn_creep(
        &mut self,
        tick:   Tick,
        actor:  &Entity,
        parts:  &[BodyPart],
        name:   Option<&str>,
        memory: Option<serde_json::Value>,
    ) -> ResultCode {
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                let taken: HashSet<String> = self
                    .world
                    .objects
                    .values()
                    .filter_map(|e| e.as_creep().map(|c| c.name.clone()))
                    .collect();
                NameGenerator::generate_unique(self.naming_rng(tick), |n| taken.contains(n))
            }
        };

        let body = crate::body::Body::from_parts(parts);
        let cost = body.cost();
        let need_time = CREEP_SPAWN_TIME * body.len() as u32;
        let Some(spawn) = self.entity_mut(&actor.id).and_then(Entity::as_spawn_mut) else {
            return ResultCode::InvalidArgs;
        };
        spawn.energy -= cost.min(spawn.energy);
        spawn.spawning = Some(SpawningSpec {
            name: name.clone(),
            need_time,
            remaining_time: need_time,
        });

        let creep_id = self.mint_id(tick);
        let creep = CreepState {
            name: name.clone(),
            carry: CarryStore::with_capacity(body.carry_capacity()),
            ticks_to_live: body.life_time(),
            body,
            fatigue: 0,
            spawning: true,
            saying: None,
            notify_when_attacked: true,
        };
        self.world.objects.insert(creep_id.clone(), Entity {
            id:    creep_id.clone(),
            pos:   actor.pos.clone(),
            owner: Ownership::Mine,
            kind:  EntityKind::Creep(creep),
        });

        log::debug!("tick={tick} sandbox: {} started spawning {name} ({need_time} ticks)", actor.id);
        self.effects.push(HostEffect::CreepSpawning {
            spawn_id: actor.id.clone(),
            creep_id,
            name,
            memory,
        });
        ResultCode::Ok
    }

    fn recycle(&mut self, tick: Tick, actor: &Entity, target_id: &str) -> ResultCode {
        let Some(creep) = self.object(target_id).and_then(Entity::as_creep) else {
            return ResultCode::InvalidTarget;
        };
        let life_time = creep.body.life_time();
        let remaining = u64::from(creep.ticks_to_live.min(life_time));
        let refund = u64::from(creep.body.cost()) * remaining / u64::from(life_time) / 2;
        let refund = u32::try_from(refund).unwrap_or(u32::MAX);
        self.destroy(tick, target_id, DestroyCause::Recycled);
        self.give(&actor.id, ResourceType::Energy, refund);
        ResultCode::Ok
    }

    fn renew(&mut self, actor: &Entity, target_id: &str) -> ResultCode {
        let Some(creep) = self.object(target_id).and_then(Entity::as_creep) else {
            return ResultCode::InvalidTarget;
        };
        let (gain, cost) = validate::renew_terms(&creep.body);
        self.take(&actor.id, ResourceType::Energy, cost);
        if let Some(creep) = self.creep_mut(target_id) {
            creep.ticks_to_live = creep.ticks_to_live.saturating_add(gain);
            creep.fatigue = 0;
        }
        ResultCode::Ok
    }
}

fn active(actor: &Entity, part: BodyPart) -> u32 {
    actor.as_creep().map_or(0, |c| c.body.active_parts(part))
}

/// Every non-MOVE part weighs on a step; CARRY parts only while loaded.
fn move_fatigue(creep: &CreepState) -> u32 {
    let loaded = !creep.carry.is_empty();
    let weighted = creep
        .body
        .parts()
        .filter(|part| match part {
            BodyPart::Move => false,
            BodyPart::Carry => loaded,
            _ => true,
        })
        .count() as u32;
    weighted * MOVE_FATIGUE
}

fn rotate(direction: Direction, turns: i32) -> Direction {
    let index = (direction as i32 - 1 + turns).rem_euclid(8) + 1;
    Direction::from_number(index as u8).unwrap_or(direction)
}
