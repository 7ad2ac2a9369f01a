//! Creep bodies: part types, per-part durability, costs and derived stats.

use crate::{
    capability::{Capability, CapabilitySet},
    resource::ResourceType,
};
use serde::{Deserialize, Serialize};

pub const MAX_CREEP_SIZE: usize = 50;
pub const BODYPART_HITS: u32 = 100;
pub const CARRY_CAPACITY: u32 = 50;
pub const CREEP_SPAWN_TIME: u32 = 3;
pub const CREEP_LIFE_TIME: u32 = 1500;
pub const CREEP_CLAIM_LIFE_TIME: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Move,
    Work,
    Carry,
    Attack,
    RangedAttack,
    Heal,
    Tough,
    Claim,
}

impl BodyPart {
    pub fn cost(self) -> u32 {
        match self {
            Self::Move         => 50,
            Self::Work         => 100,
            Self::Carry        => 50,
            Self::Attack       => 80,
            Self::RangedAttack => 150,
            Self::Heal         => 250,
            Self::Tough        => 10,
            Self::Claim        => 600,
        }
    }

    pub fn capability(self) -> Capability {
        match self {
            Self::Move         => Capability::Move,
            Self::Work         => Capability::Work,
            Self::Carry        => Capability::Carry,
            Self::Attack       => Capability::Attack,
            Self::RangedAttack => Capability::RangedAttack,
            Self::Heal         => Capability::Heal,
            Self::Tough        => Capability::Tough,
            Self::Claim        => Capability::Claim,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyPartDefinition {
    #[serde(rename = "type")]
    pub part:  BodyPart,
    /// Remaining hit points of this part.
    pub hits:  u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<ResourceType>,
}

impl BodyPartDefinition {
    pub fn fresh(part: BodyPart) -> Self {
        Self { part, hits: BODYPART_HITS, boost: None }
    }

    pub fn is_active(&self) -> bool {
        self.hits > 0
    }
}

/// An ordered list of parts. Damage eats parts front to back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Body(pub Vec<BodyPartDefinition>);

impl Body {
    pub fn from_parts(parts: &[BodyPart]) -> Self {
        Self(parts.iter().copied().map(BodyPartDefinition::fresh).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parts(&self) -> impl Iterator<Item = BodyPart> + '_ {
        self.0.iter().map(|d| d.part)
    }

    /// Number of live parts of `part`. Fully damaged parts do not count.
    pub fn active_parts(&self, part: BodyPart) -> u32 {
        self.0.iter().filter(|d| d.part == part && d.is_active()).count() as u32
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.0
            .iter()
            .filter(|d| d.is_active())
            .map(|d| d.part.capability())
            .collect()
    }

    pub fn hits(&self) -> u32 {
        self.0.iter().map(|d| d.hits).sum()
    }

    pub fn hits_max(&self) -> u32 {
        self.0.len() as u32 * BODYPART_HITS
    }

    pub fn cost(&self) -> u32 {
        body_cost(self.parts())
    }

    /// Total carry capacity of live CARRY parts.
    pub fn carry_capacity(&self) -> u32 {
        self.active_parts(BodyPart::Carry) * CARRY_CAPACITY
    }

    pub fn life_time(&self) -> u32 {
        if self.parts().any(|p| p == BodyPart::Claim) {
            CREEP_CLAIM_LIFE_TIME
        } else {
            CREEP_LIFE_TIME
        }
    }

    /// Apply damage front to back. Returns the damage actually absorbed.
    pub fn apply_damage(&mut self, mut amount: u32) -> u32 {
        let mut absorbed = 0;
        for def in self.0.iter_mut() {
            if amount == 0 {
                break;
            }
            let taken = def.hits.min(amount);
            def.hits -= taken;
            amount -= taken;
            absorbed += taken;
        }
        absorbed
    }

    /// Restore hits back to front. Returns the amount actually healed.
    pub fn apply_heal(&mut self, mut amount: u32) -> u32 {
        let mut healed = 0;
        for def in self.0.iter_mut().rev() {
            if amount == 0 {
                break;
            }
            let missing = BODYPART_HITS - def.hits.min(BODYPART_HITS);
            let restored = missing.min(amount);
            def.hits += restored;
            amount -= restored;
            healed += restored;
        }
        healed
    }
}

pub fn body_cost(parts: impl IntoIterator<Item = BodyPart>) -> u32 {
    parts.into_iter().map(BodyPart::cost).sum()
}

/// A spawnable body has 1..=50 parts.
pub fn is_valid_spawn_body(parts: &[BodyPart]) -> bool {
    (1..=MAX_CREEP_SIZE).contains(&parts.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damaged_parts_lose_their_capability() {
        let mut body = Body::from_parts(&[BodyPart::Tough, BodyPart::Work, BodyPart::Move]);
        assert!(body.capabilities().contains(Capability::Work));

        body.apply_damage(150);
        assert_eq!(body.active_parts(BodyPart::Tough), 0);
        assert_eq!(body.active_parts(BodyPart::Work), 1);

        body.apply_damage(50);
        assert!(!body.capabilities().contains(Capability::Work));
        assert!(body.capabilities().contains(Capability::Move));
        assert_eq!(body.hits(), 100);
    }

    #[test]
    fn healing_restores_from_the_back() {
        let mut body = Body::from_parts(&[BodyPart::Work, BodyPart::Move]);
        body.apply_damage(180);
        assert_eq!(body.apply_heal(50), 50);
        assert_eq!(body.0[1].hits, 70);
        assert_eq!(body.0[0].hits, 0);
    }

    #[test]
    fn costs_follow_the_part_table() {
        let parts = [BodyPart::Work, BodyPart::Carry, BodyPart::Move];
        assert_eq!(body_cost(parts), 200);
        assert!(is_valid_spawn_body(&parts));
        assert!(!is_valid_spawn_body(&[]));
        assert!(!is_valid_spawn_body(&[BodyPart::Move; 51]));
    }
}
