//! Behaviour trait and the context it plans in.
//!
//! RULE: Every behaviour implements Behavior.
//! The engine calls plan() on each registered behaviour in registration
//! order, every tick, between begin_tick and commit_tick. Behaviours only
//! submit actions and edit memory; the host applies effects at resolution.

use crate::{
    action::Action,
    config::BehaviorConfig,
    error::SimResult,
    host::Host,
    memory::MemoryStore,
    queue::{ActionQueue, Validation},
    rng::SlotRng,
    types::Tick,
};
use std::any::Any;

/// Everything a behaviour may touch during one tick.
pub struct TickContext<'a> {
    pub tick:     Tick,
    pub host:     &'a dyn Host,
    pub queue:    &'a mut ActionQueue,
    pub memory:   &'a mut MemoryStore,
    /// This behaviour's deterministic stream for this tick.
    pub rng:      &'a mut SlotRng,
    pub settings: &'a BehaviorConfig,
}

impl TickContext<'_> {
    pub fn submit(&mut self, entity_id: &str, action: Action) -> Validation {
        self.queue.submit(self.host, entity_id, action)
    }
}

/// The contract every behaviour must fulfill.
pub trait Behavior: Send {
    /// Unique stable name, used as the origin of the events it causes.
    fn name(&self) -> &'static str;

    /// Called once per tick by the engine.
    fn plan(&mut self, ctx: &mut TickContext<'_>) -> SimResult<()>;

    /// For downcasting in tests and tooling only.
    fn as_any(&self) -> &dyn Any;
}
