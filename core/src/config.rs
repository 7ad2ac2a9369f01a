use crate::{
    body::{self, Body, BodyPart, MAX_CREEP_SIZE},
    entity::Ownership,
    error::{SimError, SimResult},
    position::ROOM_SIZE,
    resource::ResourceType,
    types::Tick,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuConfig {
    pub limit:      f64,
    pub tick_limit: f64,
    pub bucket:     f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Workers each spawn keeps alive.
    pub workers_per_spawn: u32,
    pub worker_body:       Vec<BodyPart>,
    /// Creep memory `role` value the built-in behaviours manage.
    pub worker_role:       String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerSeed {
    pub x:     u8,
    pub y:     u8,
    pub owner: Ownership,
    #[serde(default)]
    pub level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSeed {
    #[serde(default)]
    pub id:              Option<String>,
    pub x:               u8,
    pub y:               u8,
    pub energy_capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnSeed {
    #[serde(default)]
    pub id:              Option<String>,
    pub name:            String,
    pub x:               u8,
    pub y:               u8,
    pub energy:          u32,
    pub energy_capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreepSeed {
    #[serde(default)]
    pub id:            Option<String>,
    pub name:          String,
    pub x:             u8,
    pub y:             u8,
    #[serde(default = "mine")]
    pub owner:         Ownership,
    pub body:          Vec<BodyPart>,
    #[serde(default)]
    pub carry:         BTreeMap<ResourceType, u32>,
    #[serde(default)]
    pub ticks_to_live: Option<u32>,
    #[serde(default)]
    pub fatigue:       u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSeed {
    #[serde(default)]
    pub id:             Option<String>,
    pub x:              u8,
    pub y:              u8,
    pub structure_type: String,
    pub progress_total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSeed {
    pub name:       String,
    #[serde(default)]
    pub controller: Option<ControllerSeed>,
    #[serde(default)]
    pub sources:    Vec<SourceSeed>,
    #[serde(default)]
    pub spawns:     Vec<SpawnSeed>,
    #[serde(default)]
    pub creeps:     Vec<CreepSeed>,
    #[serde(default)]
    pub sites:      Vec<SiteSeed>,
}

fn mine() -> Ownership {
    Ownership::Mine
}

/// A complete scenario: player, limits, tuning and the starting world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub username:           String,
    pub cpu:                CpuConfig,
    pub gcl_level:          u32,
    pub snapshot_interval:  Tick,
    /// Ticks between the first harvest of a full source and its refill.
    pub source_regen_ticks: u32,
    /// Wall-clock time of tick 0; one tick is one second after it.
    pub sign_epoch:         DateTime<Utc>,
    pub behavior:           BehaviorConfig,
    pub rooms:              Vec<RoomSeed>,
}

impl SimConfig {
    /// Load a scenario from a JSON file.
    /// In tests, use SimConfig::default_test().
    pub fn load(path: &str) -> SimResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SimError::ConfigIo {
            path: path.to_string(),
            source,
        })?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.username.is_empty() {
            return Err(SimError::InvalidConfig("username must not be empty".into()));
        }
        if self.snapshot_interval == 0 {
            return Err(SimError::InvalidConfig("snapshot_interval must be at least 1".into()));
        }
        if !body::is_valid_spawn_body(&self.behavior.worker_body) {
            return Err(SimError::InvalidConfig(format!(
                "worker_body must have 1..={MAX_CREEP_SIZE} parts"
            )));
        }

        let mut rooms = HashSet::new();
        let mut ids = HashSet::new();
        let mut spawn_names = HashSet::new();
        let mut creep_names = HashSet::new();
        for room in &self.rooms {
            if !rooms.insert(room.name.as_str()) {
                return Err(SimError::InvalidConfig(format!("duplicate room {}", room.name)));
            }

            let mut tiles: Vec<(u8, u8)> = Vec::new();
            if let Some(c) = &room.controller {
                tiles.push((c.x, c.y));
            }
            tiles.extend(room.sources.iter().map(|s| (s.x, s.y)));
            tiles.extend(room.spawns.iter().map(|s| (s.x, s.y)));
            tiles.extend(room.creeps.iter().map(|c| (c.x, c.y)));
            tiles.extend(room.sites.iter().map(|s| (s.x, s.y)));
            if let Some((x, y)) = tiles.iter().find(|(x, y)| *x >= ROOM_SIZE || *y >= ROOM_SIZE) {
                return Err(SimError::InvalidConfig(format!(
                    "position {x},{y} in room {} is outside the room",
                    room.name
                )));
            }

            let configured_ids = room
                .sources
                .iter()
                .filter_map(|s| s.id.as_deref())
                .chain(room.spawns.iter().filter_map(|s| s.id.as_deref()))
                .chain(room.creeps.iter().filter_map(|c| c.id.as_deref()))
                .chain(room.sites.iter().filter_map(|s| s.id.as_deref()));
            for id in configured_ids {
                if !ids.insert(id) {
                    return Err(SimError::InvalidConfig(format!("duplicate entity id {id}")));
                }
            }

            for spawn in &room.spawns {
                if !spawn_names.insert(spawn.name.as_str()) {
                    return Err(SimError::InvalidConfig(format!("duplicate spawn name {}", spawn.name)));
                }
            }

            for creep in &room.creeps {
                if !body::is_valid_spawn_body(&creep.body) {
                    return Err(SimError::InvalidConfig(format!(
                        "creep {} has an invalid body",
                        creep.name
                    )));
                }
                // Names are unique per player.
                if !creep_names.insert((&creep.owner, creep.name.as_str())) {
                    return Err(SimError::InvalidConfig(format!(
                        "duplicate creep name {}",
                        creep.name
                    )));
                }
                let life_time = Body::from_parts(&creep.body).life_time();
                if let Some(ttl) = creep.ticks_to_live {
                    if ttl == 0 || ttl > life_time {
                        return Err(SimError::InvalidConfig(format!(
                            "creep {} ticks_to_live must be in 1..={life_time}",
                            creep.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Config with hardcoded defaults for use in unit tests: one owned room
    /// with a spawn, two sources and a level 1 controller, and one worker
    /// named `worker-1`.
    pub fn default_test() -> Self {
        let room = RoomSeed {
            name: "W1N1".into(),
            controller: Some(ControllerSeed {
                x:     25,
                y:     5,
                owner: Ownership::Mine,
                level: 1,
            }),
            sources: vec![
                SourceSeed { id: Some("source-a".into()), x: 10, y: 10, energy_capacity: 3000 },
                SourceSeed { id: Some("source-b".into()), x: 40, y: 40, energy_capacity: 3000 },
            ],
            spawns: vec![SpawnSeed {
                id:              Some("spawn-1".into()),
                name:            "Spawn1".into(),
                x:               25,
                y:               25,
                energy:          300,
                energy_capacity: 300,
            }],
            creeps: vec![CreepSeed {
                id:            Some("worker-1".into()),
                name:          "worker-1".into(),
                x:             20,
                y:             20,
                owner:         Ownership::Mine,
                body:          vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move],
                carry:         BTreeMap::new(),
                ticks_to_live: None,
                fatigue:       0,
            }],
            sites: Vec::new(),
        };

        Self {
            username: "player".into(),
            cpu: CpuConfig { limit: 20.0, tick_limit: 500.0, bucket: 10_000.0 },
            gcl_level: 1,
            snapshot_interval: 100,
            source_regen_ticks: 300,
            sign_epoch: Utc.with_ymd_and_hms(2016, 11, 1, 0, 0, 0).single().unwrap_or_default(),
            behavior: BehaviorConfig {
                workers_per_spawn: 2,
                worker_body:       vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move],
                worker_role:       "harvester".into(),
            },
            rooms: vec![room],
        }
    }

    /// `default_test` with the seeded worker removed, for tests that
    /// place their own creeps.
    pub fn empty_room_test() -> Self {
        let mut config = Self::default_test();
        for room in &mut config.rooms {
            room.creeps.clear();
        }
        config
    }
}
