//! What a tick leaves in SQLite: the event log, the resolved-action log,
//! flushed memory and periodic snapshots, and resuming a run from one.

use colony_core::{
    action::Action,
    config::SimConfig,
    engine::TickEngine,
    error::SimError,
    memory::{MemoryNamespace, MemoryStore},
    position::Direction,
    result_code::ResultCode,
    snapshot::SimSnapshot,
    store::SimStore,
};
use serde_json::json;

const RUN: &str = "persist-test";

fn behaviour_engine(config: &SimConfig) -> TickEngine {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store.insert_run(RUN, 42, "0.1.0-test").expect("insert run");
    TickEngine::build(RUN.into(), 42, store, config).expect("engine")
}

#[test]
fn every_tick_is_recorded_in_the_event_log() {
    let mut engine = TickEngine::build_test(RUN.into(), 42).unwrap();

    engine.begin_tick().unwrap();
    engine.submit("worker-1", Action::Move { direction: Direction::Right }).unwrap();
    let busy = engine.submit("worker-1", Action::Harvest { target: "source-a".into() }).unwrap();
    assert_eq!(busy.code(), ResultCode::Busy);
    engine.submit("worker-1", Action::Say { message: "hi".into(), public: false }).unwrap();
    engine.commit_tick().unwrap();

    engine.begin_tick().unwrap();
    engine.submit("worker-1", Action::Move { direction: Direction::Right }).unwrap();
    engine.commit_tick().unwrap();

    engine.tick().unwrap();

    let store = engine.store();
    let count = |event_type: &str| store.event_count(RUN, event_type).unwrap();
    assert_eq!(count("run_initialized"), 1);
    assert_eq!(count("tick_started"), 3);
    assert_eq!(count("tick_completed"), 3);
    assert_eq!(count("memory_flushed"), 3);
    assert_eq!(count("action_submitted"), 3);
    assert_eq!(count("action_rejected"), 1);
    assert_eq!(count("action_resolved"), 3);

    let genesis = engine.store_events_for_tick(RUN, 0).unwrap();
    assert_eq!(genesis.len(), 1);
    assert_eq!(genesis[0].event_type, "run_initialized");

    let first = engine.store_events_for_tick(RUN, 1).unwrap();
    assert_eq!(first.first().map(|e| e.event_type.as_str()), Some("tick_started"));
    assert_eq!(first.last().map(|e| e.event_type.as_str()), Some("tick_completed"));
    let rejected = first.iter().find(|e| e.event_type == "action_rejected").expect("rejection logged");
    assert_eq!(rejected.origin, "queue");
    assert!(rejected.payload.contains("ERR_BUSY"), "payload: {}", rejected.payload);
}

/// Only actions that reached resolution are in the action log; rejected
/// submissions are not.
#[test]
fn resolved_actions_are_logged_with_their_codes() {
    let mut engine = TickEngine::build_test(RUN.into(), 42).unwrap();

    engine.begin_tick().unwrap();
    engine.submit("worker-1", Action::Move { direction: Direction::Right }).unwrap();
    engine.submit("worker-1", Action::Harvest { target: "source-a".into() }).unwrap();
    engine.submit("worker-1", Action::Say { message: "hi".into(), public: false }).unwrap();
    engine.commit_tick().unwrap();

    engine.begin_tick().unwrap();
    engine.submit("worker-1", Action::Move { direction: Direction::Right }).unwrap();
    engine.commit_tick().unwrap();

    let rows = engine.store().actions_for_entity(RUN, "worker-1").unwrap();
    let summary: Vec<(u64, u64, &str, &str, i32)> = rows
        .iter()
        .map(|r| (r.tick, r.seq, r.verb.as_str(), r.slot.as_str(), r.code))
        .collect();
    assert_eq!(summary, vec![
        (1, 0, "move", "primary", 0),
        (1, 1, "say", "secondary", 0),
        (2, 2, "move", "primary", 0),
    ]);
    assert_eq!(engine.store().action_count_with_code(RUN, ResultCode::Busy.code()).unwrap(), 0);
}

#[test]
fn memory_is_flushed_at_commit() {
    let mut engine = TickEngine::build_test(RUN.into(), 42).unwrap();

    engine.begin_tick().unwrap();
    engine.memory_mut().set_field(MemoryNamespace::Creeps, "worker-1", "role", json!("idle"));
    engine.memory_mut().insert(MemoryNamespace::Flags, "home", json!({ "room": "W1N1" }));
    engine.commit_tick().unwrap();

    assert_eq!(engine.store().memory_record_count(RUN, "creeps").unwrap(), 1);
    assert_eq!(engine.store().memory_record_count(RUN, "flags").unwrap(), 1);
    assert_eq!(engine.store().memory_record_count(RUN, "rooms").unwrap(), 0);

    let flushed = engine
        .store_events_for_tick(RUN, 1)
        .unwrap()
        .into_iter()
        .find(|e| e.event_type == "memory_flushed")
        .expect("memory_flushed event");
    assert_eq!(flushed.origin, "memory");
    assert!(flushed.payload.contains("\"records\":2"), "payload: {}", flushed.payload);

    let loaded = MemoryStore::load(engine.store(), RUN).unwrap();
    assert_eq!(&loaded, engine.memory());
    let raw = loaded.to_raw().unwrap();
    assert_eq!(MemoryStore::from_raw(&raw).unwrap(), loaded);
}

#[test]
fn snapshots_follow_the_configured_interval() {
    let mut config = SimConfig::default_test();
    config.snapshot_interval = 5;
    let mut engine = TickEngine::build_test_with(RUN.into(), 42, &config).unwrap();

    engine.run_ticks(12).unwrap();

    assert_eq!(engine.store().snapshot_count(RUN).unwrap(), 2);
    let latest = SimSnapshot::latest(engine.store(), RUN, 12).unwrap().expect("snapshot");
    assert_eq!(latest.tick, 10);
    assert_eq!(latest.clock.current_tick, 10);
    assert!(!latest.clock.in_tick);
    assert!(SimSnapshot::latest(engine.store(), RUN, 4).unwrap().is_none());
}

/// A second engine restored from the tick-10 snapshot continues exactly
/// like the original.
#[test]
fn restored_run_continues_identically() {
    let mut config = SimConfig::default_test();
    config.snapshot_interval = 5;

    let mut original = behaviour_engine(&config);
    original.run_ticks(10).unwrap();
    let world_at_10 = original.host().world().clone();
    let memory_at_10 = original.memory().clone();
    original.run_ticks(5).unwrap();

    let snapshot = SimSnapshot::latest(original.store(), RUN, 12).unwrap().expect("snapshot");
    let mut resumed = behaviour_engine(&config);
    resumed.restore(snapshot).unwrap();

    assert_eq!(resumed.clock.current_tick, 10);
    assert_eq!(resumed.host().world(), &world_at_10);
    assert_eq!(resumed.memory(), &memory_at_10);

    resumed.run_ticks(5).unwrap();
    assert_eq!(resumed.clock.current_tick, 15);
    assert_eq!(resumed.host().world(), original.host().world(), "worlds diverged after restore");
    assert_eq!(resumed.memory(), original.memory());
}

#[test]
fn restore_rejects_foreign_snapshots_and_open_ticks() {
    let mut engine = TickEngine::build_test(RUN.into(), 42).unwrap();
    engine.tick().unwrap();
    let mut snapshot = engine.snapshot();

    snapshot.run_id = "someone-else".into();
    let err = engine.restore(snapshot.clone()).unwrap_err();
    assert!(matches!(err, SimError::SnapshotMismatch { .. }), "got {err:?}");

    snapshot.run_id = RUN.into();
    engine.begin_tick().unwrap();
    let err = engine.restore(snapshot).unwrap_err();
    assert!(matches!(err, SimError::TickInProgress { tick: 2 }), "got {err:?}");
}
