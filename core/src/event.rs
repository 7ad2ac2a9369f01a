//! The event log: every observable change during a run.
//!
//! RULE: events are appended, never edited. Variants are only appended too,
//! so stored payloads stay readable.

use crate::{
    action::Verb,
    host::DestroyCause,
    result_code::ResultCode,
    types::{EntityId, RunId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        tick: Tick,
    },
    TickCompleted {
        tick: Tick,
    },
    RunInitialized {
        run_id: RunId,
        seed:   u64,
    },
    CpuOverrun {
        tick:       Tick,
        used:       f64,
        tick_limit: f64,
    },

    // ── Queue events ───────────────────────────────
    ActionSubmitted {
        tick:      Tick,
        seq:       u64,
        entity_id: EntityId,
        verb:      Verb,
    },
    ActionRejected {
        tick:      Tick,
        entity_id: EntityId,
        verb:      Verb,
        code:      ResultCode,
    },
    ActionCancelled {
        tick:      Tick,
        seq:       u64,
        entity_id: EntityId,
        verb:      Verb,
    },
    ActionResolved {
        tick:      Tick,
        seq:       u64,
        entity_id: EntityId,
        verb:      Verb,
        code:      ResultCode,
    },

    // ── Host lifecycle events ──────────────────────
    CreepSpawning {
        tick:     Tick,
        spawn_id: EntityId,
        name:     String,
    },
    CreepSpawned {
        tick: Tick,
        name: String,
    },
    EntityDestroyed {
        tick:  Tick,
        id:    EntityId,
        name:  Option<String>,
        cause: DestroyCause,
    },
    ControllerClaimed {
        tick: Tick,
        room: String,
    },
    ControllerLevelChanged {
        tick:  Tick,
        room:  String,
        level: u8,
    },
    StructureBuilt {
        tick:           Tick,
        site_id:        EntityId,
        structure_type: String,
    },

    // ── Memory events ──────────────────────────────
    MemoryFlushed {
        tick:    Tick,
        records: usize,
        bytes:   usize,
    },
}

impl SimEvent {
    /// Stable name stored in the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TickStarted { .. }            => "tick_started",
            Self::TickCompleted { .. }          => "tick_completed",
            Self::RunInitialized { .. }         => "run_initialized",
            Self::CpuOverrun { .. }             => "cpu_overrun",
            Self::ActionSubmitted { .. }        => "action_submitted",
            Self::ActionRejected { .. }         => "action_rejected",
            Self::ActionCancelled { .. }        => "action_cancelled",
            Self::ActionResolved { .. }         => "action_resolved",
            Self::CreepSpawning { .. }          => "creep_spawning",
            Self::CreepSpawned { .. }           => "creep_spawned",
            Self::EntityDestroyed { .. }        => "entity_destroyed",
            Self::ControllerClaimed { .. }      => "controller_claimed",
            Self::ControllerLevelChanged { .. } => "controller_level_changed",
            Self::StructureBuilt { .. }         => "structure_built",
            Self::MemoryFlushed { .. }          => "memory_flushed",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub tick:       Tick,
    /// "engine", "queue", "host", "memory" or a behaviour name.
    pub origin:     String,
    pub event_type: String,
    pub payload:    String, // JSON-serialized SimEvent
}
