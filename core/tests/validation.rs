//! One scenario per result code: each rejection is produced by the check
//! that owns it, and resolution re-checks against the state earlier actions
//! in the same tick left behind.

use colony_core::{
    action::{Action, MoveTarget, MoveToOpts},
    body::BodyPart,
    config::{ControllerSeed, CreepSeed, RoomSeed, SimConfig, SourceSeed, SpawnSeed},
    engine::TickEngine,
    entity::Ownership,
    host::Host,
    position::{Direction, Position},
    resource::ResourceType,
    result_code::ResultCode,
};
use std::collections::BTreeMap;

fn creep(name: &str, x: u8, y: u8, body: &[BodyPart]) -> CreepSeed {
    CreepSeed {
        id: Some(name.to_string()),
        name: name.to_string(),
        x,
        y,
        owner: Ownership::Mine,
        body: body.to_vec(),
        carry: BTreeMap::new(),
        ticks_to_live: None,
        fatigue: 0,
    }
}

fn engine_with(config: &SimConfig) -> TickEngine {
    let mut engine = TickEngine::build_test_with("validation-test".into(), 42, config).unwrap();
    engine.begin_tick().unwrap();
    engine
}

fn controller_of(engine: &TickEngine, room: &str) -> String {
    engine
        .host()
        .objects_in_room(room)
        .into_iter()
        .find(|e| e.as_controller().is_some())
        .map(|e| e.id.clone())
        .expect("room has a controller")
}

fn submit_code(engine: &mut TickEngine, id: &str, action: Action) -> ResultCode {
    engine.submit(id, action).unwrap().code()
}

#[test]
fn unknown_actor_is_not_found() {
    let mut engine = engine_with(&SimConfig::default_test());
    let code = submit_code(&mut engine, "ghost", Action::Suicide);
    assert_eq!(code, ResultCode::NotFound);
}

#[test]
fn hostile_actor_is_not_owner() {
    let mut config = SimConfig::default_test();
    let mut raider = creep("raider", 30, 30, &[BodyPart::Move]);
    raider.owner = Ownership::Hostile("invader".into());
    config.rooms[0].creeps.push(raider);

    let mut engine = engine_with(&config);
    let code = submit_code(&mut engine, "raider", Action::Move { direction: Direction::Top });
    assert_eq!(code, ResultCode::NotOwner);
}

#[test]
fn malformed_arguments_are_invalid_args() {
    let mut engine = engine_with(&SimConfig::default_test());

    let opts = MoveToOpts { max_rooms: 0, ..MoveToOpts::default() };
    let code = submit_code(&mut engine, "worker-1", Action::MoveTo { target: "source-a".into(), opts });
    assert_eq!(code, ResultCode::InvalidArgs, "max_rooms must be 1..=16");

    let code = submit_code(&mut engine, "spawn-1", Action::SpawnCreep {
        body:   Vec::new(),
        name:   None,
        memory: None,
    });
    assert_eq!(code, ResultCode::InvalidArgs, "an empty body cannot be spawned");

    let controller = controller_of(&engine, "W1N1");
    let text = "x".repeat(101);
    let code = submit_code(&mut engine, "worker-1", Action::SignController { target: controller, text });
    assert_eq!(code, ResultCode::InvalidArgs, "signs are limited to 100 characters");

    let code = submit_code(&mut engine, "spawn-1", Action::Move { direction: Direction::Top });
    assert_eq!(code, ResultCode::InvalidArgs, "spawns cannot move");
}

/// The capability check comes before the target lookup.
#[test]
fn missing_body_part_is_reported_before_the_target() {
    let mut engine = engine_with(&SimConfig::default_test());
    let code = submit_code(&mut engine, "worker-1", Action::Attack { target: "nobody".into() });
    assert_eq!(code, ResultCode::NoBodypart);
}

#[test]
fn wrong_kind_of_target_is_invalid_target() {
    let mut engine = engine_with(&SimConfig::default_test());
    let code = submit_code(&mut engine, "worker-1", Action::Harvest { target: "spawn-1".into() });
    assert_eq!(code, ResultCode::InvalidTarget);
}

#[test]
fn upgrading_with_an_empty_carry_is_not_enough_resources() {
    let mut engine = engine_with(&SimConfig::default_test());
    let controller = controller_of(&engine, "W1N1");
    let code = submit_code(&mut engine, "worker-1", Action::UpgradeController { target: controller });
    assert_eq!(code, ResultCode::NotEnoughResources);
}

#[test]
fn transferring_into_a_full_spawn_is_full() {
    let mut config = SimConfig::default_test();
    let mut hauler = creep("hauler", 24, 25, &[BodyPart::Work, BodyPart::Carry, BodyPart::Move]);
    hauler.carry.insert(ResourceType::Energy, 50);
    config.rooms[0].creeps.push(hauler);

    let mut engine = engine_with(&config);
    let code = submit_code(&mut engine, "hauler", Action::Transfer {
        target:   "spawn-1".into(),
        resource: ResourceType::Energy,
        amount:   None,
    });
    assert_eq!(code, ResultCode::Full);
}

#[test]
fn fatigued_creep_is_tired() {
    let mut config = SimConfig::default_test();
    let mut tired = creep("tired-1", 30, 30, &[BodyPart::Work, BodyPart::Move]);
    tired.fatigue = 4;
    config.rooms[0].creeps.push(tired);

    let mut engine = engine_with(&config);
    let code = submit_code(&mut engine, "tired-1", Action::Move { direction: Direction::Left });
    assert_eq!(code, ResultCode::Tired);
}

#[test]
fn taken_and_pending_names_are_name_exists() {
    let mut config = SimConfig::default_test();
    config.rooms[0].spawns.push(SpawnSeed {
        id:              Some("spawn-2".into()),
        name:            "Spawn2".into(),
        x:               30,
        y:               25,
        energy:          300,
        energy_capacity: 300,
    });
    let mut engine = engine_with(&config);
    let body = vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move];

    let code = submit_code(&mut engine, "spawn-1", Action::SpawnCreep {
        body:   body.clone(),
        name:   Some("worker-1".into()),
        memory: None,
    });
    assert_eq!(code, ResultCode::NameExists, "a living creep holds the name");

    let code = submit_code(&mut engine, "spawn-1", Action::SpawnCreep {
        body:   body.clone(),
        name:   Some("Bob".into()),
        memory: None,
    });
    assert_eq!(code, ResultCode::Ok);
    let code = submit_code(&mut engine, "spawn-2", Action::SpawnCreep {
        body,
        name:   Some("Bob".into()),
        memory: None,
    });
    assert_eq!(code, ResultCode::NameExists, "a queued spawn reserves the name");
}

#[test]
fn hostile_creeps_do_not_hold_names() {
    let mut config = SimConfig::default_test();
    let mut raider = creep("raider", 30, 30, &[BodyPart::Move]);
    raider.name = "bob".into();
    raider.owner = Ownership::Hostile("invader".into());
    config.rooms[0].creeps.push(raider);

    let mut engine = engine_with(&config);
    assert!(engine.host().creep_by_name("bob").is_none());
    let code = submit_code(&mut engine, "spawn-1", Action::SpawnCreep {
        body:   vec![BodyPart::Move],
        name:   Some("bob".into()),
        memory: None,
    });
    assert_eq!(code, ResultCode::Ok);
}

#[test]
fn renewing_past_the_lifetime_is_full() {
    let mut config = SimConfig::default_test();
    config.rooms[0].creeps.push(creep("old", 26, 25, &[BodyPart::Work, BodyPart::Carry, BodyPart::Move]));
    let mut engine = TickEngine::build_test_with("validation-test".into(), 42, &config).unwrap();
    let set_ttl = |engine: &mut TickEngine, ttl: u32| {
        let old = engine.host_mut().world_mut().objects.get_mut("old").unwrap();
        old.as_creep_mut().unwrap().ticks_to_live = ttl;
    };

    set_ttl(&mut engine, u32::MAX);
    engine.begin_tick().unwrap();
    let code = submit_code(&mut engine, "spawn-1", Action::RenewCreep { target: "old".into() });
    assert_eq!(code, ResultCode::Full);
    let code = submit_code(&mut engine, "spawn-1", Action::RecycleCreep { target: "old".into() });
    assert_eq!(code, ResultCode::Ok);
    let results = engine.commit_tick().unwrap();
    assert_eq!(results.get("spawn-1"), Some(ResultCode::Ok));
    assert!(engine.host().object("old").is_none());
}

#[test]
fn renewal_adds_life_within_the_limit() {
    let mut config = SimConfig::default_test();
    config.rooms[0].creeps.push(creep("old", 26, 25, &[BodyPart::Work, BodyPart::Carry, BodyPart::Move]));
    config.rooms[0].creeps.last_mut().unwrap().ticks_to_live = Some(1_000);
    let mut engine = engine_with(&config);

    let code = submit_code(&mut engine, "spawn-1", Action::RenewCreep { target: "old".into() });
    assert_eq!(code, ResultCode::Ok);
    engine.commit_tick().unwrap();

    // 500 / 3 parts gained, one tick of age spent in upkeep.
    let old = engine.host().object("old").unwrap().as_creep().unwrap();
    assert_eq!(old.ticks_to_live, 1_000 + 166 - 1);
}

#[test]
fn spawning_under_a_neutral_controller_is_rcl_not_enough() {
    let mut config = SimConfig::default_test();
    if let Some(controller) = config.rooms[0].controller.as_mut() {
        controller.owner = Ownership::Neutral;
    }
    let mut engine = engine_with(&config);
    let code = submit_code(&mut engine, "spawn-1", Action::SpawnCreep {
        body:   vec![BodyPart::Move],
        name:   None,
        memory: None,
    });
    assert_eq!(code, ResultCode::RclNotEnough);
}

#[test]
fn claiming_beyond_gcl_is_gcl_not_enough() {
    let mut config = SimConfig::default_test();
    config.rooms.push(RoomSeed {
        name:       "W2N1".into(),
        controller: Some(ControllerSeed { x: 10, y: 10, owner: Ownership::Neutral, level: 0 }),
        sources:    vec![SourceSeed { id: None, x: 40, y: 40, energy_capacity: 1500 }],
        spawns:     Vec::new(),
        creeps:     vec![creep("claimer", 11, 10, &[BodyPart::Claim, BodyPart::Move])],
        sites:      Vec::new(),
    });
    let mut engine = engine_with(&config);
    let controller = controller_of(&engine, "W2N1");

    let code = submit_code(&mut engine, "claimer", Action::ClaimController { target: controller });
    assert_eq!(code, ResultCode::GclNotEnough, "GCL 1 allows a single room");
}

#[test]
fn unaffordable_body_is_not_enough_energy() {
    let mut engine = engine_with(&SimConfig::default_test());
    // 600 energy against 300 stored.
    let code = submit_code(&mut engine, "spawn-1", Action::SpawnCreep {
        body:   vec![BodyPart::Claim],
        name:   None,
        memory: None,
    });
    assert_eq!(code, ResultCode::NotEnoughEnergy);
    assert_eq!(code.code(), -6);
}

#[test]
fn stepping_off_the_room_edge_is_no_path() {
    let mut config = SimConfig::default_test();
    config.rooms[0].creeps.push(creep("edge", 0, 10, &[BodyPart::Move]));
    let mut engine = engine_with(&config);

    let code = submit_code(&mut engine, "edge", Action::Move { direction: Direction::Left });
    assert_eq!(code, ResultCode::Ok, "accepted at submission");
    let results = engine.commit_tick().unwrap();
    assert_eq!(results.get("edge"), Some(ResultCode::NoPath));
}

/// Both moves are valid when submitted; the earlier submission takes the
/// tile and the later one finds it occupied.
#[test]
fn move_to_heads_for_positions_and_tiles() {
    let mut engine = engine_with(&SimConfig::default_test());

    let outside = Action::MoveTo { target: MoveTarget::Xy { x: 60, y: 20 }, opts: MoveToOpts::default() };
    assert_eq!(submit_code(&mut engine, "worker-1", outside), ResultCode::InvalidArgs);

    let east = Action::MoveTo { target: MoveTarget::Xy { x: 25, y: 20 }, opts: MoveToOpts::default() };
    assert_eq!(submit_code(&mut engine, "worker-1", east), ResultCode::Ok);
    engine.commit_tick().unwrap();
    assert_eq!(engine.host().object("worker-1").unwrap().pos, Position::new("W1N1", 21, 20));

    engine.begin_tick().unwrap();
    let north = Action::MoveTo {
        target: MoveTarget::Pos(Position::new("W1N1", 21, 10)),
        opts:   MoveToOpts::default(),
    };
    assert_eq!(submit_code(&mut engine, "worker-1", north), ResultCode::Ok);
    let results = engine.commit_tick().unwrap();
    assert_eq!(results.get("worker-1"), Some(ResultCode::Ok));
    assert_eq!(engine.host().object("worker-1").unwrap().pos, Position::new("W1N1", 21, 19));
}

#[test]
fn earlier_submission_wins_a_contested_tile() {
    let mut config = SimConfig::default_test();
    config.rooms[0].creeps.push(creep("west", 30, 30, &[BodyPart::Move]));
    config.rooms[0].creeps.push(creep("east", 32, 30, &[BodyPart::Move]));
    let mut engine = engine_with(&config);

    submit_code(&mut engine, "east", Action::Move { direction: Direction::Left });
    submit_code(&mut engine, "west", Action::Move { direction: Direction::Right });
    let results = engine.commit_tick().unwrap();

    assert_eq!(results.get("east"), Some(ResultCode::Ok));
    assert_eq!(results.get("west"), Some(ResultCode::NoPath));
    let west = engine.host().object("west").unwrap();
    assert_eq!((west.pos.x, west.pos.y), (30, 30), "loser stays put");
}

#[test]
fn earlier_harvest_drains_a_small_source() {
    let mut config = SimConfig::default_test();
    config.rooms[0].sources.push(SourceSeed {
        id:              Some("tiny".into()),
        x:               5,
        y:               5,
        energy_capacity: 2,
    });
    let body = [BodyPart::Work, BodyPart::Carry, BodyPart::Move];
    config.rooms[0].creeps.push(creep("miner-a", 4, 5, &body));
    config.rooms[0].creeps.push(creep("miner-b", 6, 5, &body));
    let mut engine = engine_with(&config);

    assert_eq!(submit_code(&mut engine, "miner-a", Action::Harvest { target: "tiny".into() }), ResultCode::Ok);
    assert_eq!(submit_code(&mut engine, "miner-b", Action::Harvest { target: "tiny".into() }), ResultCode::Ok);
    let results = engine.commit_tick().unwrap();

    assert_eq!(results.get("miner-a"), Some(ResultCode::Ok));
    assert_eq!(results.get("miner-b"), Some(ResultCode::NotEnoughResources));
    let carried = engine.host().object("miner-a").unwrap().as_creep().unwrap().carry.get(ResourceType::Energy);
    assert_eq!(carried, 2);
}
