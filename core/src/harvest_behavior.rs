//! Worker loop: harvest until full, then feed the spawn, then upgrade the
//! room controller. The `working` flag in creep memory switches between
//! the gathering and the delivering half.

use crate::{
    action::{Action, MoveTarget, MoveToOpts},
    behavior::{Behavior, TickContext},
    entity::Entity,
    error::SimResult,
    host::Host,
    memory::MemoryNamespace,
    resource::ResourceType,
    validate::{ADJACENT, RANGED},
};
use serde_json::json;
use std::any::Any;

#[derive(Debug, Default)]
pub struct HarvestBehavior;

impl HarvestBehavior {
    pub fn new() -> Self {
        Self
    }
}

impl Behavior for HarvestBehavior {
    fn name(&self) -> &'static str {
        "harvest"
    }

    fn plan(&mut self, ctx: &mut TickContext<'_>) -> SimResult<()> {
        let host = ctx.host;
        let role = ctx.settings.worker_role.clone();

        for creep_entity in host.my_objects() {
            let Some(creep) = creep_entity.as_creep() else {
                continue;
            };
            if creep.spawning {
                continue;
            }
            let has_role = ctx
                .memory
                .field(MemoryNamespace::Creeps, &creep.name, "role")
                .and_then(|v| v.as_str())
                == Some(role.as_str());
            if !has_role {
                continue;
            }

            let mut working = ctx
                .memory
                .field(MemoryNamespace::Creeps, &creep.name, "working")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let energy = creep.carry.get(ResourceType::Energy);
            if working && energy == 0 {
                working = false;
            } else if !working && creep.carry.free() == 0 {
                working = true;
            }
            ctx.memory.set_field(MemoryNamespace::Creeps, &creep.name, "working", json!(working));

            let action = if working {
                deliver(host, creep_entity)
            } else {
                gather(ctx, creep_entity)
            };
            if let Some(action) = action {
                ctx.submit(&creep_entity.id, action);
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn approach(target: &Entity, range: u32) -> Action {
    Action::MoveTo {
        target: MoveTarget::Object(target.id.clone()),
        opts:   MoveToOpts { range, ..MoveToOpts::default() },
    }
}

/// Harvest the remembered source, or pick the nearest one with energy.
fn gather(ctx: &mut TickContext<'_>, creep: &Entity) -> Option<Action> {
    let host = ctx.host;
    let name = creep.name()?.to_string();
    let remembered = ctx
        .memory
        .field(MemoryNamespace::Creeps, &name, "source")
        .and_then(|v| v.as_str())
        .and_then(|id| host.object(id))
        .filter(|e| e.as_source().is_some_and(|s| s.energy > 0));

    let source = match remembered {
        Some(source) => source,
        None => {
            let candidates: Vec<&Entity> = host
                .objects_in_room(&creep.pos.room)
                .into_iter()
                .filter(|e| e.as_source().is_some_and(|s| s.energy > 0))
                .collect();
            let nearest = candidates.iter().filter_map(|e| creep.pos.range_to(&e.pos)).min()?;
            let tied: Vec<&Entity> = candidates
                .into_iter()
                .filter(|e| creep.pos.range_to(&e.pos) == Some(nearest))
                .collect();
            let pick = tied[ctx.rng.next_u64_below(tied.len() as u64) as usize];
            ctx.memory.set_field(MemoryNamespace::Creeps, &name, "source", json!(pick.id));
            pick
        }
    };

    if creep.pos.in_range_to(&source.pos, ADJACENT) {
        Some(Action::Harvest { target: source.id.clone() })
    } else {
        Some(approach(source, ADJACENT))
    }
}

/// Fill a spawn with room for energy, otherwise upgrade an owned controller.
fn deliver(host: &dyn Host, creep: &Entity) -> Option<Action> {
    let room = host.objects_in_room(&creep.pos.room);

    let spawn = room
        .iter()
        .filter(|e| e.is_mine() && e.free_capacity(ResourceType::Energy).is_some_and(|f| f > 0))
        .find(|e| e.as_spawn().is_some());
    if let Some(spawn) = spawn {
        return Some(if creep.pos.in_range_to(&spawn.pos, ADJACENT) {
            Action::Transfer { target: spawn.id.clone(), resource: ResourceType::Energy, amount: None }
        } else {
            approach(spawn, ADJACENT)
        });
    }

    let controller = room
        .iter()
        .find(|e| e.is_mine() && e.as_controller().is_some_and(|c| c.level > 0))?;
    Some(if creep.pos.in_range_to(&controller.pos, RANGED) {
        Action::UpgradeController { target: controller.id.clone() }
    } else {
        approach(controller, RANGED)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approach_keeps_default_path_options() {
        let target = Entity {
            id:    "source-a".into(),
            pos:   crate::position::Position::new("W1N1", 1, 1),
            owner: crate::entity::Ownership::Neutral,
            kind:  crate::entity::EntityKind::Resource(crate::entity::DroppedResource {
                resource_type: ResourceType::Energy,
                amount:        1,
            }),
        };
        let Action::MoveTo { target, opts } = approach(&target, 3) else {
            panic!("expected move_to");
        };
        assert_eq!(target, MoveTarget::Object("source-a".into()));
        assert_eq!(opts.range, 3);
        assert_eq!(opts.max_rooms, MoveToOpts::default().max_rooms);
    }
}
