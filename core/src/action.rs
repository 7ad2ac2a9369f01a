use serde::{Deserialize, Serialize};
use crate::{
    body::BodyPart,
    position::{Direction, PathStep, Position, ROOM_SIZE},
    resource::ResourceType,
    types::{EntityId, Tick},
};

/// Every action an entity can request during a tick.
/// Variants mirror the host's creep and spawn methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "snake_case")]
pub enum Action {
    // ── Movement ──────────────────────────────────
    Move { direction: Direction },
    MoveTo {
        target: MoveTarget,
        #[serde(default)]
        opts:   MoveToOpts,
    },
    MoveByPath { path: Vec<PathStep> },

    // ── Combat ────────────────────────────────────
    Attack { target: EntityId },
    RangedAttack { target: EntityId },
    RangedMassAttack,
    Heal { target: EntityId },
    RangedHeal { target: EntityId },

    // ── Economy ───────────────────────────────────
    Harvest { target: EntityId },
    Build { target: EntityId },
    Repair { target: EntityId },
    Dismantle { target: EntityId },
    Transfer {
        target:   EntityId,
        resource: ResourceType,
        #[serde(default)]
        amount:   Option<u32>,
    },
    Withdraw {
        target:   EntityId,
        resource: ResourceType,
        #[serde(default)]
        amount:   Option<u32>,
    },
    Drop {
        resource: ResourceType,
        #[serde(default)]
        amount:   Option<u32>,
    },
    Pickup { target: EntityId },

    // ── Controller ────────────────────────────────
    UpgradeController { target: EntityId },
    ClaimController { target: EntityId },
    ReserveController { target: EntityId },
    AttackController { target: EntityId },
    GenerateSafeMode { target: EntityId },
    SignController { target: EntityId, text: String },

    // ── Misc ──────────────────────────────────────
    Suicide,
    Say {
        message: String,
        #[serde(default)]
        public:  bool,
    },
    NotifyWhenAttacked { enabled: bool },

    // ── Spawn ─────────────────────────────────────
    SpawnCreep {
        body:   Vec<BodyPart>,
        #[serde(default)]
        name:   Option<String>,
        #[serde(default)]
        memory: Option<serde_json::Value>,
    },
    RecycleCreep { target: EntityId },
    RenewCreep { target: EntityId },
}

/// Stable verb names; `cancel_order` addresses actions by verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Move,
    MoveTo,
    MoveByPath,
    Attack,
    RangedAttack,
    RangedMassAttack,
    Heal,
    RangedHeal,
    Harvest,
    Build,
    Repair,
    Dismantle,
    Transfer,
    Withdraw,
    Drop,
    Pickup,
    UpgradeController,
    ClaimController,
    ReserveController,
    AttackController,
    GenerateSafeMode,
    SignController,
    Suicide,
    Say,
    NotifyWhenAttacked,
    SpawnCreep,
    RecycleCreep,
    RenewCreep,
}

impl Verb {
    pub fn name(self) -> &'static str {
        match self {
            Self::Move               => "move",
            Self::MoveTo             => "move_to",
            Self::MoveByPath         => "move_by_path",
            Self::Attack             => "attack",
            Self::RangedAttack       => "ranged_attack",
            Self::RangedMassAttack   => "ranged_mass_attack",
            Self::Heal               => "heal",
            Self::RangedHeal         => "ranged_heal",
            Self::Harvest            => "harvest",
            Self::Build              => "build",
            Self::Repair             => "repair",
            Self::Dismantle          => "dismantle",
            Self::Transfer           => "transfer",
            Self::Withdraw           => "withdraw",
            Self::Drop               => "drop",
            Self::Pickup             => "pickup",
            Self::UpgradeController  => "upgrade_controller",
            Self::ClaimController    => "claim_controller",
            Self::ReserveController  => "reserve_controller",
            Self::AttackController   => "attack_controller",
            Self::GenerateSafeMode   => "generate_safe_mode",
            Self::SignController     => "sign_controller",
            Self::Suicide            => "suicide",
            Self::Say                => "say",
            Self::NotifyWhenAttacked => "notify_when_attacked",
            Self::SpawnCreep         => "spawn_creep",
            Self::RecycleCreep       => "recycle_creep",
            Self::RenewCreep         => "renew_creep",
        }
    }
}

/// Whether an action occupies the entity's single exclusive slot for the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSlot {
    Primary,
    Secondary,
}

impl Action {
    pub fn verb(&self) -> Verb {
        match self {
            Self::Move { .. }               => Verb::Move,
            Self::MoveTo { .. }             => Verb::MoveTo,
            Self::MoveByPath { .. }         => Verb::MoveByPath,
            Self::Attack { .. }             => Verb::Attack,
            Self::RangedAttack { .. }       => Verb::RangedAttack,
            Self::RangedMassAttack          => Verb::RangedMassAttack,
            Self::Heal { .. }               => Verb::Heal,
            Self::RangedHeal { .. }         => Verb::RangedHeal,
            Self::Harvest { .. }            => Verb::Harvest,
            Self::Build { .. }              => Verb::Build,
            Self::Repair { .. }             => Verb::Repair,
            Self::Dismantle { .. }          => Verb::Dismantle,
            Self::Transfer { .. }           => Verb::Transfer,
            Self::Withdraw { .. }           => Verb::Withdraw,
            Self::Drop { .. }               => Verb::Drop,
            Self::Pickup { .. }             => Verb::Pickup,
            Self::UpgradeController { .. }  => Verb::UpgradeController,
            Self::ClaimController { .. }    => Verb::ClaimController,
            Self::ReserveController { .. }  => Verb::ReserveController,
            Self::AttackController { .. }   => Verb::AttackController,
            Self::GenerateSafeMode { .. }   => Verb::GenerateSafeMode,
            Self::SignController { .. }     => Verb::SignController,
            Self::Suicide                   => Verb::Suicide,
            Self::Say { .. }                => Verb::Say,
            Self::NotifyWhenAttacked { .. } => Verb::NotifyWhenAttacked,
            Self::SpawnCreep { .. }         => Verb::SpawnCreep,
            Self::RecycleCreep { .. }       => Verb::RecycleCreep,
            Self::RenewCreep { .. }         => Verb::RenewCreep,
        }
    }

    pub fn slot(&self) -> ActionSlot {
        match self {
            Self::Say { .. } | Self::NotifyWhenAttacked { .. } => ActionSlot::Secondary,
            _ => ActionSlot::Primary,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.slot() == ActionSlot::Primary
    }

    /// The entity this action is aimed at, if any.
    pub fn target(&self) -> Option<&EntityId> {
        match self {
            Self::MoveTo { target: MoveTarget::Object(target), .. }
            | Self::Attack { target }
            | Self::RangedAttack { target }
            | Self::Heal { target }
            | Self::RangedHeal { target }
            | Self::Harvest { target }
            | Self::Build { target }
            | Self::Repair { target }
            | Self::Dismantle { target }
            | Self::Transfer { target, .. }
            | Self::Withdraw { target, .. }
            | Self::Pickup { target }
            | Self::UpgradeController { target }
            | Self::ClaimController { target }
            | Self::ReserveController { target }
            | Self::AttackController { target }
            | Self::GenerateSafeMode { target }
            | Self::SignController { target, .. }
            | Self::RecycleCreep { target }
            | Self::RenewCreep { target } => Some(target),
            _ => None,
        }
    }
}

/// Where `move_to` heads: an object, a position, or a tile in the actor's
/// own room. On the wire an id is a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveTarget {
    Object(EntityId),
    Pos(Position),
    Xy { x: u8, y: u8 },
}

impl MoveTarget {
    /// Coordinates lie inside a room. Object targets are checked by lookup.
    pub fn is_valid(&self) -> bool {
        let inside = |x: u8, y: u8| x < ROOM_SIZE && y < ROOM_SIZE;
        match self {
            Self::Object(_) => true,
            Self::Pos(pos) => inside(pos.x, pos.y),
            Self::Xy { x, y } => inside(*x, *y),
        }
    }
}

impl From<EntityId> for MoveTarget {
    fn from(id: EntityId) -> Self {
        Self::Object(id)
    }
}

impl From<&str> for MoveTarget {
    fn from(id: &str) -> Self {
        Self::Object(id.to_string())
    }
}

impl From<Position> for MoveTarget {
    fn from(pos: Position) -> Self {
        Self::Pos(pos)
    }
}

/// Path options for `move_to`. Pathfinding itself belongs to the host;
/// these are validated and passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveToOpts {
    pub reuse_path:                     u32,
    pub serialize_memory:               bool,
    pub no_path_finding:                bool,
    pub ignore_creeps:                  bool,
    pub ignore_destructible_structures: bool,
    pub ignore_roads:                   bool,
    pub max_ops:                        u32,
    pub heuristic_weight:               f64,
    pub max_rooms:                      u32,
    /// Stop within this many tiles of the target.
    pub range:                          u32,
}

impl Default for MoveToOpts {
    fn default() -> Self {
        Self {
            reuse_path:                     5,
            serialize_memory:               true,
            no_path_finding:                false,
            ignore_creeps:                  false,
            ignore_destructible_structures: false,
            ignore_roads:                   false,
            max_ops:                        2000,
            heuristic_weight:               1.2,
            max_rooms:                      16,
            range:                          0,
        }
    }
}

impl MoveToOpts {
    pub const MAX_ROOMS: u32 = 16;

    pub fn is_valid(&self) -> bool {
        self.max_ops > 0
            && self.heuristic_weight.is_finite()
            && self.heuristic_weight > 0.0
            && (1..=Self::MAX_ROOMS).contains(&self.max_rooms)
    }
}

/// An accepted action waiting for tick resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    /// Submission order within the run; resolution follows it.
    pub seq:       u64,
    pub tick:      Tick,
    pub entity_id: EntityId,
    pub action:    Action,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_targets_parse_from_ids_positions_and_tiles() {
        let parse = |json: &str| match serde_json::from_str::<Action>(json).unwrap() {
            Action::MoveTo { target, .. } => target,
            other => panic!("expected move_to, got {other:?}"),
        };
        assert_eq!(parse(r#"{"verb":"move_to","target":"source-a"}"#), MoveTarget::Object("source-a".into()));
        assert_eq!(
            parse(r#"{"verb":"move_to","target":{"room":"W1N1","x":3,"y":4}}"#),
            MoveTarget::Pos(Position::new("W1N1", 3, 4))
        );
        assert_eq!(parse(r#"{"verb":"move_to","target":{"x":3,"y":4}}"#), MoveTarget::Xy { x: 3, y: 4 });
    }

    #[test]
    fn only_object_targets_are_reported_as_targets() {
        let action = Action::MoveTo { target: MoveTarget::Xy { x: 1, y: 1 }, opts: MoveToOpts::default() };
        assert_eq!(action.target(), None);
        assert!(!MoveTarget::Xy { x: 50, y: 1 }.is_valid());
    }
}
