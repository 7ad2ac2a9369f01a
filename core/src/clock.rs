//! Tick clock. Owns the current tick and whether one is in progress.

use crate::types::{RunId, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub run_id:       RunId,
    /// Last tick that was started. 0 before the first tick.
    pub current_tick: Tick,
    /// True between `begin_tick` and `commit_tick`.
    pub in_tick:      bool,
}

impl SimClock {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            current_tick: 0,
            in_tick: false,
        }
    }

    /// Start the next tick. Returns the new tick number.
    pub fn advance(&mut self) -> Tick {
        self.current_tick += 1;
        self.in_tick = true;
        self.current_tick
    }

    pub fn close(&mut self) {
        self.in_tick = false;
    }

    /// The tick the next `advance` will start.
    pub fn next_tick(&self) -> Tick {
        self.current_tick + 1
    }
}
