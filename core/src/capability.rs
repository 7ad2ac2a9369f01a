//! Capability sets: what an entity can currently do, tested by membership.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Move,
    Work,
    Carry,
    Attack,
    RangedAttack,
    Heal,
    Tough,
    Claim,
    /// Granted to spawns rather than derived from body parts.
    Spawn,
}

impl Capability {
    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, cap: Capability) -> Self {
        self.insert(cap);
        self
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    pub fn remove(&mut self, cap: Capability) {
        self.0 &= !cap.bit();
    }

    pub fn contains(&self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn contains_all(&self, caps: &[Capability]) -> bool {
        caps.iter().all(|c| self.contains(*c))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Self::empty();
        for cap in iter {
            set.insert(cap);
        }
        set
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const ALL: [Capability; 9] = [
            Capability::Move,
            Capability::Work,
            Capability::Carry,
            Capability::Attack,
            Capability::RangedAttack,
            Capability::Heal,
            Capability::Tough,
            Capability::Claim,
            Capability::Spawn,
        ];
        f.debug_set()
            .entries(ALL.iter().filter(|c| self.contains(**c)))
            .finish()
    }
}
