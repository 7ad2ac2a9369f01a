//! Action queue and result reconciler.
//!
//! Two explicit phases per tick:
//!   1. submit / cancel: static validation, at most one primary action
//!      per entity, nothing touches the host.
//!   2. resolve_tick:    every accepted action goes to the host in
//!      submission order; the returned codes form the `ResultMap`.
//!
//! The queue is always open for exactly one tick. Resolving advances it,
//! so a tick cannot be resolved twice or overlap with the next one.

use crate::{
    action::{Action, ActionSlot, QueuedAction, Verb},
    error::SimResult,
    event::SimEvent,
    host::Host,
    result_code::ResultCode,
    types::{EntityId, Tick},
    validate,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Handle to an accepted action; used to withdraw it before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionTicket {
    pub seq:       u64,
    pub tick:      Tick,
    pub entity_id: EntityId,
    pub verb:      Verb,
}

/// Outcome of `submit`. Acceptance says nothing about execution success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Accepted(ActionTicket),
    Rejected(ResultCode),
}

impl Validation {
    pub fn code(&self) -> ResultCode {
        match self {
            Self::Accepted(_) => ResultCode::Ok,
            Self::Rejected(code) => *code,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn ticket(&self) -> Option<&ActionTicket> {
        match self {
            Self::Accepted(t) => Some(t),
            Self::Rejected(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAction {
    pub seq:       u64,
    pub entity_id: EntityId,
    pub verb:      Verb,
    pub slot:      ActionSlot,
    pub code:      ResultCode,
}

/// Final codes for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMap {
    pub tick:     Tick,
    /// Primary action outcome per entity.
    pub primary:  BTreeMap<EntityId, ResultCode>,
    /// Every resolved action, primary and secondary, in resolution order.
    pub resolved: Vec<ResolvedAction>,
}

impl ResultMap {
    pub fn get(&self, entity_id: &str) -> Option<ResultCode> {
        self.primary.get(entity_id).copied()
    }

    /// Secondary action outcomes for one entity, in resolution order.
    pub fn secondary(&self, entity_id: &str) -> Vec<(Verb, ResultCode)> {
        self.resolved
            .iter()
            .filter(|r| r.slot == ActionSlot::Secondary && r.entity_id == entity_id)
            .map(|r| (r.verb, r.code))
            .collect()
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.resolved.iter().any(|r| r.entity_id == entity_id)
    }

    /// Number of entities with a primary outcome.
    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    pub fn ok_count(&self) -> usize {
        self.resolved.iter().filter(|r| r.code.is_ok()).count()
    }
}

pub struct ActionQueue {
    tick:     Tick,
    next_seq: u64,
    pending:  Vec<QueuedAction>,
    /// entity id → seq of its primary action this tick.
    primary:  HashMap<EntityId, u64>,
    events:   Vec<SimEvent>,
}

impl ActionQueue {
    pub fn new(tick: Tick) -> Self {
        Self {
            tick,
            next_seq: 0,
            pending:  Vec::new(),
            primary:  HashMap::new(),
            events:   Vec::new(),
        }
    }

    /// The tick submissions currently target.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn pending(&self) -> &[QueuedAction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn has_primary(&self, entity_id: &str) -> bool {
        self.primary.contains_key(entity_id)
    }

    /// Validate and enqueue an action for the current tick.
    pub fn submit(&mut self, host: &dyn Host, entity_id: &str, action: Action) -> Validation {
        let verb = action.verb();
        let code = self.check(host, entity_id, &action);
        if !code.is_ok() {
            log::debug!("tick={} queue: {entity_id} {} rejected: {code}", self.tick, verb.name());
            self.events.push(SimEvent::ActionRejected {
                tick:      self.tick,
                entity_id: entity_id.to_string(),
                verb,
                code,
            });
            return Validation::Rejected(code);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        if action.is_primary() {
            self.primary.insert(entity_id.to_string(), seq);
        }
        self.pending.push(QueuedAction {
            seq,
            tick: self.tick,
            entity_id: entity_id.to_string(),
            action,
        });
        self.events.push(SimEvent::ActionSubmitted {
            tick:      self.tick,
            seq,
            entity_id: entity_id.to_string(),
            verb,
        });
        Validation::Accepted(ActionTicket {
            seq,
            tick: self.tick,
            entity_id: entity_id.to_string(),
            verb,
        })
    }

    /// Dry run of `submit`: the code it would return, without enqueuing.
    pub fn check(&self, host: &dyn Host, entity_id: &str, action: &Action) -> ResultCode {
        let actor = match validate::validate_actor(host, entity_id) {
            Ok(actor) => actor,
            Err(code) => return code,
        };
        if action.is_primary() && self.has_primary(entity_id) {
            return ResultCode::Busy;
        }
        let code = validate::validate_action(host, actor, action);
        if !code.is_ok() {
            return code;
        }
        if let Action::SpawnCreep { name: Some(name), .. } = action {
            if self.pending_spawn_names().any(|n| n == name) {
                return ResultCode::NameExists;
            }
        }
        ResultCode::Ok
    }

    /// Withdraw one accepted action. Only actions of the current tick can be
    /// withdrawn.
    pub fn cancel(&mut self, ticket: &ActionTicket) -> ResultCode {
        if ticket.tick != self.tick {
            return ResultCode::NotFound;
        }
        match self.pending.iter().position(|q| q.seq == ticket.seq) {
            Some(index) => {
                self.remove_at(index);
                ResultCode::Ok
            }
            None => ResultCode::NotFound,
        }
    }

    /// Withdraw every pending action of `entity_id` with the given verb.
    pub fn cancel_order(&mut self, entity_id: &str, verb: Verb) -> ResultCode {
        let mut removed = false;
        while let Some(index) = self
            .pending
            .iter()
            .position(|q| q.entity_id == entity_id && q.action.verb() == verb)
        {
            self.remove_at(index);
            removed = true;
        }
        if removed { ResultCode::Ok } else { ResultCode::NotFound }
    }

    /// Hand every pending action to the host in submission order and
    /// advance to the next tick.
    ///
    /// If the host fails, the queue stays on the current tick. Actions the
    /// host already executed are dropped; the rest remain pending.
    pub fn resolve_tick(&mut self, host: &mut dyn Host) -> SimResult<ResultMap> {
        let tick = self.tick;
        let mut results = ResultMap { tick, ..ResultMap::default() };
        let mut executed = 0;
        while executed < self.pending.len() {
            let code = match host.execute(tick, &self.pending[executed]) {
                Ok(code) => code,
                Err(err) => {
                    self.pending.drain(..executed);
                    return Err(err);
                }
            };
            let queued = &self.pending[executed];
            let verb = queued.action.verb();
            let slot = queued.action.slot();
            if slot == ActionSlot::Primary {
                results.primary.insert(queued.entity_id.clone(), code);
            }
            results.resolved.push(ResolvedAction {
                seq:       queued.seq,
                entity_id: queued.entity_id.clone(),
                verb,
                slot,
                code,
            });
            self.events.push(SimEvent::ActionResolved {
                tick,
                seq: queued.seq,
                entity_id: queued.entity_id.clone(),
                verb,
                code,
            });
            executed += 1;
        }

        self.pending.clear();
        self.primary.clear();
        self.tick += 1;

        log::debug!(
            "tick={tick} queue: resolved {} actions ({} ok)",
            results.resolved.len(),
            results.ok_count()
        );
        Ok(results)
    }

    /// Queue events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    fn remove_at(&mut self, index: usize) {
        let queued = self.pending.remove(index);
        if queued.action.is_primary() {
            self.primary.remove(&queued.entity_id);
        }
        log::debug!(
            "tick={} queue: {} {} cancelled",
            self.tick,
            queued.entity_id,
            queued.action.verb().name()
        );
        self.events.push(SimEvent::ActionCancelled {
            tick:      self.tick,
            seq:       queued.seq,
            entity_id: queued.entity_id,
            verb:      queued.action.verb(),
        });
    }

    fn pending_spawn_names(&self) -> impl Iterator<Item = &String> {
        self.pending.iter().filter_map(|q| match &q.action {
            Action::SpawnCreep { name: Some(name), .. } => Some(name),
            _ => None,
        })
    }
}
