//! The tick engine. Drives one tick at a time through two phases.
//!
//! TICK ORDER (fixed, documented, never reordered):
//!   1. begin_tick   clock advance, host begin_tick, memory load,
//!                   dead-creep memory cleanup
//!   2. behaviours   plan() in registration order (spawn, harvest)
//!   3. commit_tick  queue resolution, host end_tick, host effects applied
//!                   to memory, CPU check, event and action log
//!                   persistence, memory flush, snapshot on interval
//!
//! Submissions from outside (tests, the runner) go between 1 and 3.
//!
//! RULES:
//!   - Behaviours execute in registration order, every tick.
//!   - Behaviours reach the world only through the Host trait.
//!   - All randomness flows through the RngBank.
//!   - All observable changes are recorded in the event log.

use crate::{
    action::Action,
    behavior::{Behavior, TickContext},
    clock::SimClock,
    config::{BehaviorConfig, SimConfig},
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    harvest_behavior::HarvestBehavior,
    host::{Host, HostEffect},
    memory::{MemoryNamespace, MemoryStore},
    queue::{ActionQueue, ActionTicket, ResultMap, Validation},
    result_code::ResultCode,
    rng::{RngBank, RngSlot},
    sandbox::Sandbox,
    snapshot::SimSnapshot,
    spawn_behavior::SpawnBehavior,
    store::SimStore,
    types::{RunId, Tick},
};
use serde_json::{json, Value};

pub struct TickEngine {
    pub run_id:        RunId,
    pub clock:         SimClock,
    pub rng_bank:      RngBank,
    seed:              u64,
    queue:             ActionQueue,
    memory:            MemoryStore,
    host:              Sandbox,
    behaviors:         Vec<Box<dyn Behavior>>,
    settings:          BehaviorConfig,
    snapshot_interval: Tick,
    store:             SimStore,
    /// Events of the open tick with their origin, persisted at commit.
    pending:           Vec<(String, SimEvent)>,
}

impl TickEngine {
    pub fn new(run_id: RunId, seed: u64, store: SimStore, host: Sandbox, config: &SimConfig) -> Self {
        Self {
            clock:             SimClock::new(run_id.clone()),
            rng_bank:          RngBank::new(seed),
            seed,
            queue:             ActionQueue::new(1),
            memory:            MemoryStore::new(),
            host,
            behaviors:         Vec::new(),
            settings:          config.behavior.clone(),
            snapshot_interval: config.snapshot_interval.max(1),
            store,
            pending:           Vec::new(),
            run_id,
        }
    }

    /// Build a fully wired engine with the built-in behaviours registered.
    /// The store must already be migrated and hold the run record.
    /// Call this instead of new() + manual register() calls.
    pub fn build(run_id: RunId, seed: u64, store: SimStore, config: &SimConfig) -> SimResult<Self> {
        if !store.run_exists(&run_id)? {
            return Err(SimError::RunNotInitialized);
        }
        let host = Sandbox::from_config(config, seed)?;
        let mut engine = TickEngine::new(run_id, seed, store, host, config);

        // EXECUTION ORDER: fixed, documented, never reordered.
        engine.register(Box::new(SpawnBehavior::new()));
        engine.register(Box::new(HarvestBehavior::new()));
        Ok(engine)
    }

    /// Engine without behaviours over an in-memory store and
    /// `SimConfig::default_test()`. Tests drive it with submit().
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        Self::build_test_with(run_id, seed, &SimConfig::default_test())
    }

    pub fn build_test_with(run_id: RunId, seed: u64, config: &SimConfig) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        store.insert_run(&run_id, seed, "0.1.0-test")?;
        let host = Sandbox::from_config(config, seed)?;
        Ok(TickEngine::new(run_id, seed, store, host, config))
    }

    /// Register a behaviour. Call in the documented execution order.
    pub fn register(&mut self, behavior: Box<dyn Behavior>) {
        self.behaviors.push(behavior);
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn host(&self) -> &Sandbox {
        &self.host
    }

    /// Direct host access for scenario setup. Use between ticks only.
    pub fn host_mut(&mut self) -> &mut Sandbox {
        &mut self.host
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Memory edits are kept only while a tick is open; between ticks the
    /// store is the source of truth and the next begin_tick reloads it.
    pub fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.memory
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    pub fn store(&self) -> &SimStore {
        &self.store
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn behavior<T: 'static>(&self) -> Option<&T> {
        self.behaviors.iter().find_map(|b| b.as_any().downcast_ref::<T>())
    }

    // ── Phase 1 ──────────────────────────────────────────────────────

    /// Open the next tick. Returns its number.
    pub fn begin_tick(&mut self) -> SimResult<Tick> {
        if self.clock.in_tick {
            return Err(SimError::TickInProgress { tick: self.clock.current_tick });
        }
        if self.clock.current_tick == 0 {
            self.record("engine", SimEvent::RunInitialized {
                run_id: self.run_id.clone(),
                seed:   self.seed,
            });
            self.persist_pending(0)?;
        }

        let tick = self.clock.advance();
        self.host.begin_tick(tick)?;
        self.memory = MemoryStore::load(&self.store, &self.run_id)?;

        let host = &self.host;
        let dropped = self.memory.retain_creeps(|name| host.creep_by_name(name).is_some());
        if !dropped.is_empty() {
            log::debug!("tick={tick} memory: dropped records of {} dead creeps", dropped.len());
        }

        self.record("engine", SimEvent::TickStarted { tick });
        Ok(tick)
    }

    /// Validate and enqueue an action for the open tick.
    pub fn submit(&mut self, entity_id: &str, action: Action) -> SimResult<Validation> {
        self.require_open()?;
        Ok(self.queue.submit(&self.host, entity_id, action))
    }

    /// Dry run of `submit`.
    pub fn check(&self, entity_id: &str, action: &Action) -> ResultCode {
        self.queue.check(&self.host, entity_id, action)
    }

    pub fn cancel(&mut self, ticket: &ActionTicket) -> SimResult<ResultCode> {
        self.require_open()?;
        Ok(self.queue.cancel(ticket))
    }

    pub fn cancel_order(&mut self, entity_id: &str, verb: crate::action::Verb) -> SimResult<ResultCode> {
        self.require_open()?;
        Ok(self.queue.cancel_order(entity_id, verb))
    }

    // ── Phase 2 ──────────────────────────────────────────────────────

    /// Let every registered behaviour plan for the open tick.
    pub fn run_behaviors(&mut self) -> SimResult<()> {
        self.require_open()?;
        let tick = self.clock.current_tick;
        self.flush_queue_events("queue");

        for behavior in &mut self.behaviors {
            let mut rng = self.rng_bank.for_slot_at_tick(RngSlot::Behavior, tick);
            let mut ctx = TickContext {
                tick,
                host:     &self.host,
                queue:    &mut self.queue,
                memory:   &mut self.memory,
                rng:      &mut rng,
                settings: &self.settings,
            };
            behavior.plan(&mut ctx)?;
            let origin = behavior.name().to_string();
            self.pending
                .extend(self.queue.drain_events().into_iter().map(|e| (origin.clone(), e)));
        }
        Ok(())
    }

    // ── Phase 3 ──────────────────────────────────────────────────────

    /// Resolve the open tick and persist everything it produced.
    pub fn commit_tick(&mut self) -> SimResult<ResultMap> {
        self.require_open()?;
        let tick = self.clock.current_tick;
        self.flush_queue_events("queue");

        let results = self.queue.resolve_tick(&mut self.host)?;
        self.flush_queue_events("queue");

        let cpu = self.host.cpu();
        if cpu.used > cpu.tick_limit {
            log::warn!(
                "tick={tick} engine: CPU overrun, used {:.1} of {:.1}",
                cpu.used,
                cpu.tick_limit
            );
            self.record("engine", SimEvent::CpuOverrun {
                tick,
                used:       cpu.used,
                tick_limit: cpu.tick_limit,
            });
        }

        self.host.end_tick(tick)?;
        for effect in self.host.take_effects() {
            self.apply_effect(tick, effect);
        }

        self.store.insert_results(&self.run_id, &results)?;
        let bytes = self.memory.flush(&self.store, &self.run_id, tick)?;
        self.record("memory", SimEvent::MemoryFlushed {
            tick,
            records: self.memory.record_count(),
            bytes,
        });
        self.record("engine", SimEvent::TickCompleted { tick });
        self.persist_pending(tick)?;
        self.clock.close();

        if tick % self.snapshot_interval == 0 {
            self.take_snapshot(tick)?;
        }
        log::debug!("tick={tick} engine: committed {} results", results.resolved.len());
        Ok(results)
    }

    /// One full tick: begin, behaviours, commit.
    pub fn tick(&mut self) -> SimResult<ResultMap> {
        self.begin_tick()?;
        self.run_behaviors()?;
        self.commit_tick()
    }

    /// Run n ticks in a loop. Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<()> {
        for _ in 0..n {
            self.tick()?;
        }
        Ok(())
    }

    /// Query events for a specific tick from the store.
    /// Used by the determinism test and replay tooling.
    pub fn store_events_for_tick(&self, run_id: &str, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(run_id, tick)
    }

    // ── Snapshots ────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            run_id: self.run_id.clone(),
            tick:   self.clock.current_tick,
            seed:   self.seed,
            clock:  self.clock.clone(),
            world:  self.host.world().clone(),
            memory: self.memory.clone(),
        }
    }

    /// Resume from a snapshot. The engine must belong to the same run and
    /// have no tick open.
    pub fn restore(&mut self, snapshot: SimSnapshot) -> SimResult<()> {
        if snapshot.run_id != self.run_id {
            return Err(SimError::SnapshotMismatch {
                expected: snapshot.run_id,
                actual:   self.run_id.clone(),
            });
        }
        self.require_closed()?;
        self.seed = snapshot.seed;
        self.rng_bank = RngBank::new(snapshot.seed);
        self.clock = snapshot.clock;
        self.clock.close();
        self.queue = ActionQueue::new(self.clock.next_tick());
        self.host.replace_world(snapshot.world);
        self.memory = snapshot.memory;
        self.memory.flush(&self.store, &self.run_id, snapshot.tick)?;
        self.pending.clear();
        log::info!("engine: run {} restored at tick {}", self.run_id, snapshot.tick);
        Ok(())
    }

    fn take_snapshot(&self, tick: Tick) -> SimResult<()> {
        let json = self.snapshot().to_json()?;
        self.store.save_snapshot(&self.run_id, tick, &json)?;
        log::debug!("Snapshot saved at tick {tick}");
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Keep memory in step with entity lifecycles and log the change.
    fn apply_effect(&mut self, tick: Tick, effect: HostEffect) {
        let event = match effect {
            HostEffect::CreepSpawning { spawn_id, name, memory, .. } => {
                let record = memory.unwrap_or_else(|| json!({}));
                self.memory.insert(MemoryNamespace::Creeps, &name, record);
                SimEvent::CreepSpawning { tick, spawn_id, name }
            }
            HostEffect::CreepSpawned { name, .. } => SimEvent::CreepSpawned { tick, name },
            HostEffect::EntityDestroyed { id, name, kind, cause } => {
                if let Some(name) = &name {
                    let namespace = match kind {
                        crate::entity::EntityKindTag::Creep => Some(MemoryNamespace::Creeps),
                        crate::entity::EntityKindTag::Spawn => Some(MemoryNamespace::Spawns),
                        _ => None,
                    };
                    if let Some(ns) = namespace {
                        self.memory.remove(ns, name);
                    }
                }
                SimEvent::EntityDestroyed { tick, id, name, cause }
            }
            HostEffect::ControllerClaimed { room, .. } => {
                self.memory.set_field(MemoryNamespace::Rooms, &room, "claimed_at", Value::from(tick));
                SimEvent::ControllerClaimed { tick, room }
            }
            HostEffect::ControllerLevelChanged { room, level, .. } => {
                SimEvent::ControllerLevelChanged { tick, room, level }
            }
            HostEffect::StructureBuilt { site_id, structure_type } => {
                SimEvent::StructureBuilt { tick, site_id, structure_type }
            }
        };
        self.record("host", event);
    }

    fn record(&mut self, origin: &str, event: SimEvent) {
        self.pending.push((origin.to_string(), event));
    }

    fn flush_queue_events(&mut self, origin: &str) {
        for event in self.queue.drain_events() {
            self.record(origin, event);
        }
    }

    fn persist_pending(&mut self, tick: Tick) -> SimResult<()> {
        for (origin, event) in std::mem::take(&mut self.pending) {
            let entry = EventLogEntry {
                id:         None,
                run_id:     self.run_id.clone(),
                tick,
                origin,
                event_type: event.type_name().to_string(),
                payload:    serde_json::to_string(&event)?,
            };
            self.store.append_event(&entry)?;
        }
        Ok(())
    }

    fn require_open(&self) -> SimResult<()> {
        if self.clock.in_tick {
            Ok(())
        } else {
            Err(SimError::NoTickInProgress)
        }
    }

    fn require_closed(&self) -> SimResult<()> {
        if self.clock.in_tick {
            Err(SimError::TickInProgress { tick: self.clock.current_tick })
        } else {
            Ok(())
        }
    }
}
