//! tick-runner: headless runner for the colony action queue.
//!
//! Usage:
//!   tick-runner --seed 12345 --ticks 500 --db run.db
//!   tick-runner --seed 12345 --scenario scenario.json --ipc-mode

use anyhow::Result;
use colony_core::{
    action::Action,
    config::SimConfig,
    engine::TickEngine,
    host::Host,
    memory::MemoryNamespace,
    queue::{ActionTicket, ResultMap, Validation},
    result_code::ResultCode,
    store::SimStore,
    types::Tick,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick {
        count: u64,
    },
    Submit {
        entity_id: String,
        action:    Action,
    },
    Cancel {
        ticket: ActionTicket,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct CreepView {
    id:            String,
    name:          String,
    room:          String,
    x:             u8,
    y:             u8,
    hits:          u32,
    hits_max:      u32,
    energy:        u32,
    ticks_to_live: u32,
    spawning:      bool,
}

#[derive(serde::Serialize)]
struct UiState {
    tick:           Tick,
    in_tick:        bool,
    pending:        usize,
    cpu_bucket:     f64,
    gcl:            u32,
    memory_records: usize,
    creeps:         Vec<CreepView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_results:   Option<ResultMap>,
}

#[derive(serde::Serialize)]
struct SubmitReply {
    code:   ResultCode,
    ticket: Option<ActionTicket>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 300u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let scenario = string_arg(&args, "--scenario");

    let config = match scenario {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default_test(),
    };

    if !ipc_mode {
        println!("colony tick-runner");
        println!("  seed:      {seed}");
        println!("  ticks:     {ticks}");
        println!("  db:        {db}");
        println!("  scenario:  {}", scenario.unwrap_or("(built-in)"));
        println!();
    }

    let store = if db == ":memory:" { SimStore::in_memory()? } else { SimStore::open(db)? };
    store.migrate()?;

    let run_id = format!("run-{seed}-{}", chrono_tick());
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;

    let mut engine = TickEngine::build(run_id.clone(), seed, store, &config)?;
    log::info!("run {run_id} ready (seed {seed}, ipc={ipc_mode})");

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        engine.run_ticks(ticks)?;
        print_summary(&engine, &run_id, ticks)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut TickEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Unknown command: {}", buffer.trim());
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => {
                let state = build_ui_state(engine, None);
                writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
            }
            IpcCommand::Tick { count } => {
                let mut last = None;
                for _ in 0..count {
                    last = Some(finish_tick(engine)?);
                }
                let state = build_ui_state(engine, last);
                writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
            }
            IpcCommand::Submit { entity_id, action } => {
                ensure_open(engine)?;
                let reply = match engine.submit(&entity_id, action)? {
                    Validation::Accepted(ticket) => SubmitReply { code: ResultCode::Ok, ticket: Some(ticket) },
                    Validation::Rejected(code) => SubmitReply { code, ticket: None },
                };
                writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
            }
            IpcCommand::Cancel { ticket } => {
                ensure_open(engine)?;
                let code = engine.cancel(&ticket)?;
                writeln!(stdout, "{}", serde_json::json!({ "code": code }))?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

/// Submissions arrive between ticks; they open the next one.
fn ensure_open(engine: &mut TickEngine) -> Result<()> {
    if !engine.clock.in_tick {
        engine.begin_tick()?;
    }
    Ok(())
}

/// Complete the open tick, or run a whole one if none is open.
fn finish_tick(engine: &mut TickEngine) -> Result<ResultMap> {
    ensure_open(engine)?;
    engine.run_behaviors()?;
    Ok(engine.commit_tick()?)
}

fn build_ui_state(engine: &TickEngine, last_results: Option<ResultMap>) -> UiState {
    let host = engine.host();
    let creeps = host
        .my_objects()
        .into_iter()
        .filter_map(|e| {
            let creep = e.as_creep()?;
            Some(CreepView {
                id:            e.id.clone(),
                name:          creep.name.clone(),
                room:          e.pos.room.clone(),
                x:             e.pos.x,
                y:             e.pos.y,
                hits:          creep.hits(),
                hits_max:      creep.hits_max(),
                energy:        creep.carry.get(colony_core::resource::ResourceType::Energy),
                ticks_to_live: creep.ticks_to_live,
                spawning:      creep.spawning,
            })
        })
        .collect();

    UiState {
        tick: engine.clock.current_tick,
        in_tick: engine.clock.in_tick,
        pending: engine.queue().len(),
        cpu_bucket: host.cpu().bucket,
        gcl: host.gcl().level,
        memory_records: engine.memory().record_count(),
        creeps,
        last_results,
    }
}

fn print_summary(engine: &TickEngine, run_id: &str, ticks: u64) -> Result<()> {
    let store = engine.store();
    let host = engine.host();
    let resolved = store.event_count(run_id, "action_resolved")?;
    let rejected = store.event_count(run_id, "action_rejected")?;
    let ok = store.action_count_with_code(run_id, ResultCode::Ok.code())?;
    let spawned = store.event_count(run_id, "creep_spawned")?;
    let destroyed = store.event_count(run_id, "entity_destroyed")?;
    let overruns = store.event_count(run_id, "cpu_overrun")?;
    let snapshots = store.snapshot_count(run_id)?;
    let creeps = host.my_objects().into_iter().filter(|e| e.as_creep().is_some()).count();
    let per_tick = resolved as f64 / ticks.max(1) as f64;

    println!("=== RUN SUMMARY ===");
    println!("  run_id:          {run_id}");
    println!("  ticks run:       {ticks}");
    println!("  final tick:      {}", engine.clock.current_tick);
    println!("  actions:         {resolved} resolved ({ok} ok), {rejected} rejected");
    println!("  actions/tick:    {per_tick:.2}");
    println!("  creeps alive:    {creeps}");
    println!("  creeps spawned:  {spawned}");
    println!("  destroyed:       {destroyed}");
    println!("  cpu overruns:    {overruns}");
    println!("  cpu bucket:      {:.1}", host.cpu().bucket);
    println!("  gcl:             {}", host.gcl().level);
    println!("  snapshots:       {snapshots}");

    println!();
    println!("=== CONTROLLERS ===");
    for entity in host.my_objects() {
        if let Some(controller) = entity.as_controller() {
            println!(
                "  {} | level {} | progress {} | downgrade in {}",
                entity.pos.room, controller.level, controller.progress, controller.ticks_to_downgrade
            );
        }
    }

    let workers = engine.memory().namespace(MemoryNamespace::Creeps).len();
    println!();
    println!("=== MEMORY ===");
    println!("  creep records:   {workers}");
    println!("  total records:   {}", engine.memory().record_count());
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn chrono_tick() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
