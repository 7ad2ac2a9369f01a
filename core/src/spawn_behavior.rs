//! Keeps every owned spawn topped up with workers.
//!
//! A worker belongs to the spawn recorded in its memory. Creeps still being
//! spawned count, since their memory exists from the tick the spawn started.

use crate::{
    action::Action,
    behavior::{Behavior, TickContext},
    body::body_cost,
    error::SimResult,
    memory::MemoryNamespace,
    queue::Validation,
};
use serde_json::json;
use std::any::Any;

#[derive(Debug, Default)]
pub struct SpawnBehavior {
    /// Spawn orders accepted over the lifetime of the run.
    pub orders_placed: u64,
}

impl SpawnBehavior {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for SpawnBehavior {
    fn name(&self) -> &'static str {
        "spawn"
    }

    fn plan(&mut self, ctx: &mut TickContext<'_>) -> SimResult<()> {
        let host = ctx.host;
        let role = ctx.settings.worker_role.clone();
        let body = ctx.settings.worker_body.clone();
        let cost = body_cost(body.iter().copied());

        for spawn_entity in host.my_objects() {
            let Some(spawn) = spawn_entity.as_spawn() else {
                continue;
            };
            if spawn.spawning.is_some() || spawn.energy < cost {
                continue;
            }

            let workers = ctx
                .memory
                .creeps
                .values()
                .filter(|m| m.get("role").and_then(|v| v.as_str()) == Some(role.as_str()))
                .filter(|m| m.get("spawn").and_then(|v| v.as_str()) == Some(spawn.name.as_str()))
                .count() as u32;
            if workers >= ctx.settings.workers_per_spawn {
                continue;
            }

            let memory = json!({ "role": role, "spawn": spawn.name, "working": false });
            let action = Action::SpawnCreep { body: body.clone(), name: None, memory: Some(memory) };
            if let Validation::Accepted(ticket) = ctx.submit(&spawn_entity.id, action) {
                self.orders_placed += 1;
                log::info!(
                    "tick={} spawn: {} ordered worker {} of {}",
                    ctx.tick,
                    spawn.name,
                    workers + 1,
                    ctx.settings.workers_per_spawn
                );
                ctx.memory.set_field(
                    MemoryNamespace::Spawns,
                    &spawn.name,
                    "last_order_tick",
                    json!(ticket.tick),
                );
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
