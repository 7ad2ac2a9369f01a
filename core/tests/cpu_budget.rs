//! CPU accounting: every accepted intent costs CPU, overruns are reported
//! and the bucket absorbs what a tick leaves unused.

use colony_core::{
    action::Action,
    config::SimConfig,
    cpu::INTENT_CPU_COST,
    engine::TickEngine,
    host::Host,
    position::Direction,
};

#[test]
fn exceeding_the_tick_limit_is_reported() {
    let mut config = SimConfig::default_test();
    config.cpu.tick_limit = 0.1;
    let mut engine = TickEngine::build_test_with("cpu-overrun".into(), 42, &config).unwrap();

    engine.tick().unwrap();
    assert_eq!(engine.store().event_count("cpu-overrun", "cpu_overrun").unwrap(), 0, "an empty tick costs nothing");

    engine.begin_tick().unwrap();
    engine.submit("worker-1", Action::Move { direction: Direction::Top }).unwrap();
    engine.commit_tick().unwrap();

    assert_eq!(engine.store().event_count("cpu-overrun", "cpu_overrun").unwrap(), 1);
}

#[test]
fn unused_cpu_refills_the_bucket() {
    let mut config = SimConfig::default_test();
    config.cpu.bucket = 100.0;
    let mut engine = TickEngine::build_test_with("cpu-bucket".into(), 42, &config).unwrap();

    engine.begin_tick().unwrap();
    engine.submit("worker-1", Action::Move { direction: Direction::Top }).unwrap();
    engine.commit_tick().unwrap();

    let cpu = engine.host().cpu();
    let expected = 100.0 + config.cpu.limit - INTENT_CPU_COST;
    assert!((cpu.bucket - expected).abs() < 1e-9, "bucket {} != {expected}", cpu.bucket);
    assert_eq!(cpu.used, 0.0, "usage resets when the tick settles");
}

/// Rejected submissions are free; only intents the host accepted cost CPU.
#[test]
fn rejected_actions_cost_nothing() {
    let mut config = SimConfig::default_test();
    config.cpu.bucket = 0.0;
    let mut engine = TickEngine::build_test_with("cpu-free".into(), 42, &config).unwrap();

    engine.begin_tick().unwrap();
    engine.submit("worker-1", Action::Harvest { target: "source-a".into() }).unwrap();
    engine.commit_tick().unwrap();

    assert!((engine.host().cpu().bucket - config.cpu.limit).abs() < 1e-9);
}
