//! End-of-tick world upkeep: aging, regeneration, spawn progress, decay.

use super::{effects::MOVE_FATIGUE, Sandbox, CONTROLLER_DOWNGRADE_TICKS};
use crate::{
    body::BodyPart,
    entity::{EntityKind, CONTROLLER_LEVELS},
    host::{DestroyCause, HostEffect},
    types::{EntityId, Tick},
};

/// Dropped piles lose this fraction of their amount (rounded up) per tick.
pub const ENERGY_DECAY_DIVISOR: u32 = 1000;

impl Sandbox {
    pub(super) fn upkeep(&mut self, tick: Tick) {
        let mut expired: Vec<EntityId> = Vec::new();
        let mut decayed: Vec<EntityId> = Vec::new();
        let mut finished_spawns: Vec<String> = Vec::new();
        let mut downgraded: Vec<(EntityId, String, u8)> = Vec::new();

        for entity in self.world.objects.values_mut() {
            let id = entity.id.clone();
            let room = entity.pos.room.clone();
            let mine = entity.is_mine();
            match &mut entity.kind {
                EntityKind::Creep(creep) if !creep.spawning => {
                    let recovery = creep.body.active_parts(BodyPart::Move) * MOVE_FATIGUE;
                    creep.fatigue = creep.fatigue.saturating_sub(recovery);
                    creep.ticks_to_live = creep.ticks_to_live.saturating_sub(1);
                    if creep.ticks_to_live == 0 {
                        expired.push(id);
                    }
                }
                EntityKind::Spawn(spawn) => {
                    if let Some(spec) = spawn.spawning.as_mut() {
                        spec.remaining_time = spec.remaining_time.saturating_sub(1);
                        if spec.remaining_time == 0 {
                            finished_spawns.push(spec.name.clone());
                            spawn.spawning = None;
                        }
                    }
                }
                EntityKind::Source(source) => {
                    if let Some(ticks) = source.ticks_to_regeneration.as_mut() {
                        *ticks = ticks.saturating_sub(1);
                        if *ticks == 0 {
                            source.energy = source.energy_capacity;
                            source.ticks_to_regeneration = None;
                        }
                    }
                }
                EntityKind::Controller(controller) => {
                    if let Some(reservation) = controller.reservation.as_mut() {
                        reservation.ticks_to_end = reservation.ticks_to_end.saturating_sub(1);
                        if reservation.ticks_to_end == 0 {
                            controller.reservation = None;
                        }
                    }
                    if mine && controller.level > 0 {
                        controller.ticks_to_downgrade = controller.ticks_to_downgrade.saturating_sub(1);
                        if controller.ticks_to_downgrade == 0 {
                            controller.level -= 1;
                            controller.progress = controller
                                .progress
                                .min(CONTROLLER_LEVELS.get(controller.level as usize).copied().unwrap_or(0));
                            controller.ticks_to_downgrade = CONTROLLER_DOWNGRADE_TICKS;
                            downgraded.push((id, room, controller.level));
                        }
                    }
                }
                EntityKind::Resource(pile) => {
                    pile.amount -= pile.amount.div_ceil(ENERGY_DECAY_DIVISOR);
                    if pile.amount == 0 {
                        decayed.push(id);
                    }
                }
                _ => {}
            }
        }

        for name in finished_spawns {
            let creep = self
                .world
                .objects
                .values_mut()
                .filter(|e| e.is_mine())
                .find_map(|e| {
                    let id = e.id.clone();
                    e.as_creep_mut().filter(|c| c.name == name && c.spawning).map(|c| (id, c))
                });
            if let Some((creep_id, creep)) = creep {
                creep.spawning = false;
                log::debug!("tick={tick} sandbox: {name} finished spawning");
                self.effects.push(HostEffect::CreepSpawned { creep_id, name });
            }
        }

        for (controller_id, room, level) in downgraded {
            log::info!("tick={tick} sandbox: controller in {room} downgraded to level {level}");
            self.effects.push(HostEffect::ControllerLevelChanged { controller_id, room, level });
        }

        for id in expired {
            self.destroy(tick, &id, DestroyCause::Expired);
        }

        for id in decayed {
            self.world.objects.remove(&id);
        }
    }
}
