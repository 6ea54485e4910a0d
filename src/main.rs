//! Gravitoids headless runner
//!
//! Runs the simulation without a renderer and logs a summary.
//!
//! Usage: `gravitoids [config.json] [--ticks N] [--seed S] [--players P] [--level L]`

#[cfg(not(target_arch = "wasm32"))]
use gravitoids::SimConfig;
#[cfg(not(target_arch = "wasm32"))]
use gravitoids::sim::{ShipInput, SimState, tick};

/// Command-line options
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
struct Options {
    config_path: Option<String>,
    ticks: u64,
    seed: u64,
    players: usize,
    level: u32,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for Options {
    fn default() -> Self {
        Self {
            config_path: None,
            ticks: 120 * 60,
            seed: 12345,
            players: 1,
            level: 0,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_args(mut args: impl Iterator<Item = String>) -> Options {
    fn number<T: std::str::FromStr>(flag: &str, value: Option<String>, fallback: T) -> T {
        match value.as_deref().map(str::parse::<T>) {
            Some(Ok(v)) => v,
            _ => {
                log::warn!("{flag} expects a number; using default");
                fallback
            }
        }
    }

    let mut opts = Options::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ticks" => opts.ticks = number("--ticks", args.next(), opts.ticks),
            "--seed" => opts.seed = number("--seed", args.next(), opts.seed),
            "--players" => opts.players = number("--players", args.next(), opts.players),
            "--level" => opts.level = number("--level", args.next(), opts.level),
            _ if opts.config_path.is_none() && !arg.starts_with("--") => opts.config_path = Some(arg.clone()),
            _ => log::warn!("ignoring unknown argument {arg}"),
        }
    }
    opts
}

#[cfg(not(target_arch = "wasm32"))]
fn load_config(path: Option<&str>) -> SimConfig {
    let Some(path) = path else {
        return SimConfig::default();
    };
    match SimConfig::load(path) {
        Ok(config) => {
            log::info!("loaded config from {path}");
            config
        }
        Err(e) => {
            log::warn!("{e}; falling back to defaults");
            SimConfig::default()
        }
    }
}

/// Simple autopilot so a headless run exercises every input path
#[cfg(not(target_arch = "wasm32"))]
fn autopilot(tick: u64, player: usize) -> ShipInput {
    let phase = (tick / 90 + player as u64) % 4;
    ShipInput {
        left: phase == 0,
        right: phase == 2,
        thrust: phase == 1,
        brake: phase == 3,
        shoot: tick % 15 == 0,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let opts = parse_args(std::env::args().skip(1));
    let config = load_config(opts.config_path.as_deref());
    log::info!("Gravitoids (headless) starting: {opts:?}");

    let mut state = SimState::new(config, opts.seed, opts.players);
    state.set_level(opts.level);

    let mut collisions = 0usize;
    let mut splits = 0usize;
    let mut frozen = 0usize;
    for t in 0..opts.ticks {
        for player in 0..opts.players {
            state.set_input(player, autopilot(t, player));
        }
        let report = tick(&mut state);
        collisions += report.collisions;
        splits += report.resolve.asteroids_split;
        frozen += report.step.frozen;

        if state.is_game_over() {
            log::info!("all ships destroyed after {} ticks", state.time_ticks);
            break;
        }
    }

    let lives: Vec<u32> = state.ships().iter().map(|s| s.lives).collect();
    println!("Simulated {:.2} s ({} ticks), seed {}", state.time, state.time_ticks, state.seed);
    println!("  potential:   {}", state.potential().name());
    println!("  asteroids:   {}", state.asteroids().len());
    println!("  black holes: {}", state.black_holes().len());
    println!("  total mass:  {:.1}", state.entities().total_mass());
    println!("  collisions:  {collisions} ({splits} splits, {frozen} frozen bodies)");
    println!("  lives:       {lives:?}");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Host bindings live outside this crate
}
