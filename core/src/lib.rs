//! colony-core: a tick-synchronous action queue and result reconciler for a
//! Screeps-style host, with a small deterministic sandbox host, per-entity
//! memory and SQLite persistence.

pub mod action;
pub mod behavior;
pub mod body;
pub mod capability;
pub mod clock;
pub mod config;
pub mod cpu;
pub mod engine;
pub mod entity;
pub mod error;
pub mod event;
pub mod harvest_behavior;
pub mod host;
pub mod memory;
pub mod name_generator;
pub mod position;
pub mod queue;
pub mod resource;
pub mod result_code;
pub mod rng;
pub mod sandbox;
pub mod snapshot;
pub mod spawn_behavior;
pub mod store;
pub mod types;
pub mod validate;
