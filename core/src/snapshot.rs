//! Snapshot serialization: full run state to/from JSON.
//!
//! A snapshot is taken every `snapshot_interval` ticks, after the tick is
//! committed. It captures everything needed to resume from that tick
//! without replaying from tick 0: RNG streams are derived from
//! (seed, slot, tick), so no generator state is stored.

use crate::{
    clock::SimClock,
    error::{SimError, SimResult},
    memory::MemoryStore,
    sandbox::World,
    store::SimStore,
    types::{RunId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub run_id: RunId,
    pub tick:   Tick,
    pub seed:   u64,
    pub clock:  SimClock,
    pub world:  World,
    pub memory: MemoryStore,
}

impl SimSnapshot {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Latest snapshot of `run_id` taken at or before `tick`.
    pub fn latest(store: &SimStore, run_id: &str, tick: Tick) -> SimResult<Option<Self>> {
        let Some((_, json)) = store.latest_snapshot_before(run_id, tick)? else {
            return Ok(None);
        };
        let snapshot = Self::from_json(&json)?;
        if snapshot.run_id != run_id {
            return Err(SimError::SnapshotMismatch {
                expected: snapshot.run_id,
                actual:   run_id.to_string(),
            });
        }
        Ok(Some(snapshot))
    }
}
