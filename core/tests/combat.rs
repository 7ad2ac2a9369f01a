//! Combat resolution: damage eats body parts front to back, destroyed
//! creeps leave the world and damaged parts stop counting.

use colony_core::{
    action::Action,
    body::BodyPart,
    config::{CreepSeed, SimConfig},
    engine::TickEngine,
    entity::Ownership,
    resource::ResourceType,
    host::Host,
    result_code::ResultCode,
};
use std::collections::BTreeMap;

fn seed(name: &str, x: u8, y: u8, owner: Ownership, body: &[BodyPart]) -> CreepSeed {
    CreepSeed {
        id: Some(name.to_string()),
        name: name.to_string(),
        x,
        y,
        owner,
        body: body.to_vec(),
        carry: BTreeMap::new(),
        ticks_to_live: None,
        fatigue: 0,
    }
}

fn hostile() -> Ownership {
    Ownership::Hostile("invader".into())
}

fn hits(engine: &TickEngine, id: &str) -> u32 {
    engine.host().object(id).and_then(|e| e.as_creep()).map(|c| c.hits()).unwrap_or(0)
}

#[test]
fn melee_attack_kills_a_one_part_raider_in_four_hits() {
    let mut config = SimConfig::empty_room_test();
    config.rooms[0].creeps.push(seed("guard", 30, 30, Ownership::Mine, &[BodyPart::Attack, BodyPart::Move]));
    config.rooms[0].creeps.push(seed("raider", 31, 30, hostile(), &[BodyPart::Move]));
    let mut engine = TickEngine::build_test_with("melee-test".into(), 42, &config).unwrap();

    for round in 1..=3 {
        engine.begin_tick().unwrap();
        engine.submit("guard", Action::Attack { target: "raider".into() }).unwrap();
        let results = engine.commit_tick().unwrap();
        assert_eq!(results.get("guard"), Some(ResultCode::Ok));
        assert_eq!(hits(&engine, "raider"), 100 - 30 * round, "after round {round}");
    }

    engine.begin_tick().unwrap();
    engine.submit("guard", Action::Attack { target: "raider".into() }).unwrap();
    engine.commit_tick().unwrap();

    assert!(engine.host().object("raider").is_none(), "raider destroyed");
    assert_eq!(engine.store().event_count("melee-test", "entity_destroyed").unwrap(), 1);

    engine.begin_tick().unwrap();
    let code = engine.submit("guard", Action::Attack { target: "raider".into() }).unwrap().code();
    assert_eq!(code, ResultCode::InvalidTarget, "nothing left to hit");
}

#[test]
fn heal_restores_damaged_parts() {
    let mut config = SimConfig::empty_room_test();
    config.rooms[0].creeps.push(seed("medic", 10, 30, Ownership::Mine, &[BodyPart::Heal, BodyPart::Move]));
    config.rooms[0].creeps.push(seed("patient", 11, 30, Ownership::Mine, &[BodyPart::Move, BodyPart::Move]));
    config.rooms[0].creeps.push(seed("distant", 13, 30, Ownership::Mine, &[BodyPart::Move]));
    let mut engine = TickEngine::build_test_with("heal-test".into(), 42, &config).unwrap();

    for id in ["patient", "distant"] {
        if let Some(creep) = engine.host_mut().world_mut().objects.get_mut(id).and_then(|e| e.as_creep_mut()) {
            creep.body.apply_damage(50);
        }
    }

    engine.begin_tick().unwrap();
    engine.submit("medic", Action::Heal { target: "patient".into() }).unwrap();
    let code = engine.submit("medic", Action::RangedHeal { target: "distant".into() }).unwrap().code();
    assert_eq!(code, ResultCode::Busy, "heal and ranged heal share the primary slot");
    engine.commit_tick().unwrap();
    assert_eq!(hits(&engine, "patient"), 162);

    engine.begin_tick().unwrap();
    engine.submit("medic", Action::RangedHeal { target: "distant".into() }).unwrap();
    engine.commit_tick().unwrap();
    assert_eq!(hits(&engine, "distant"), 54);
}

/// Mass attack falls off with range and never hits the player's own creeps.
#[test]
fn mass_attack_scales_with_range_and_spares_own_creeps() {
    let mut config = SimConfig::empty_room_test();
    config.rooms[0].creeps.push(seed("archer", 20, 40, Ownership::Mine, &[BodyPart::RangedAttack, BodyPart::Move]));
    config.rooms[0].creeps.push(seed("near", 21, 40, hostile(), &[BodyPart::Move, BodyPart::Move]));
    config.rooms[0].creeps.push(seed("far", 23, 40, hostile(), &[BodyPart::Move, BodyPart::Move]));
    config.rooms[0].creeps.push(seed("outside", 25, 40, hostile(), &[BodyPart::Move]));
    config.rooms[0].creeps.push(seed("buddy", 20, 41, Ownership::Mine, &[BodyPart::Move]));
    let mut engine = TickEngine::build_test_with("mass-test".into(), 42, &config).unwrap();

    engine.begin_tick().unwrap();
    engine.submit("archer", Action::RangedMassAttack).unwrap();
    let results = engine.commit_tick().unwrap();

    assert_eq!(results.get("archer"), Some(ResultCode::Ok));
    assert_eq!(hits(&engine, "near"), 190);
    assert_eq!(hits(&engine, "far"), 199);
    assert_eq!(hits(&engine, "outside"), 100, "range 5 is out of reach");
    assert_eq!(hits(&engine, "buddy"), 100);
}

#[test]
fn destroyed_attack_part_is_no_bodypart() {
    let mut config = SimConfig::empty_room_test();
    config.rooms[0].creeps.push(seed("broken", 30, 10, Ownership::Mine, &[BodyPart::Attack, BodyPart::Move]));
    config.rooms[0].creeps.push(seed("target", 31, 10, hostile(), &[BodyPart::Move]));
    let mut engine = TickEngine::build_test_with("broken-test".into(), 42, &config).unwrap();

    if let Some(creep) = engine.host_mut().world_mut().objects.get_mut("broken").and_then(|e| e.as_creep_mut()) {
        creep.body.apply_damage(100);
    }

    engine.begin_tick().unwrap();
    let code = engine.submit("broken", Action::Attack { target: "target".into() }).unwrap().code();
    assert_eq!(code, ResultCode::NoBodypart);
    let code = engine.submit("broken", Action::Move { direction: colony_core::position::Direction::Top }).unwrap().code();
    assert_eq!(code, ResultCode::Ok, "the MOVE part still works");
}

/// Losing a CARRY part shrinks the store; what no longer fits falls to the
/// ground.
#[test]
fn lost_carry_parts_spill_their_load() {
    let mut config = SimConfig::empty_room_test();
    config.rooms[0].creeps.push(seed(
        "brute",
        30,
        30,
        Ownership::Mine,
        &[BodyPart::Attack, BodyPart::Attack, BodyPart::Attack, BodyPart::Attack, BodyPart::Move],
    ));
    let mut mule = seed("mule", 31, 30, hostile(), &[BodyPart::Carry, BodyPart::Carry, BodyPart::Move]);
    mule.carry.insert(ResourceType::Energy, 100);
    config.rooms[0].creeps.push(mule);
    let mut engine = TickEngine::build_test_with("spill-test".into(), 42, &config).unwrap();

    engine.begin_tick().unwrap();
    engine.submit("brute", Action::Attack { target: "mule".into() }).unwrap();
    engine.commit_tick().unwrap();

    let mule = engine.host().object("mule").and_then(|e| e.as_creep()).unwrap();
    assert_eq!(mule.hits(), 300 - 120);
    assert_eq!(mule.carry.capacity, 50);
    assert_eq!(mule.carry.get(ResourceType::Energy), 50);

    let pile = engine
        .host()
        .objects_in_room("W1N1")
        .into_iter()
        .find_map(|e| e.as_resource().map(|r| (e.pos.x, e.pos.y, r.amount)))
        .expect("spilled energy on the ground");
    // One tick of decay has already happened.
    assert_eq!(pile, (31, 30, 49));
}
