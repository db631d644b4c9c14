//! rally-player: play a rally definition through the engine and print what
//! happens as JSON lines.
//!
//! Usage:
//!   rally-player run --rally rallies/doubles_demo.json --match doubles
//!   rally-player run --rally clear.json --config engine.json --realtime --snapshots
//!   rally-player preview --rally rallies/doubles_demo.json

mod game_loop;
mod logger;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::mpsc;

use shuttle_core::commands::RallyCommand;
use shuttle_core::config::{RallyDefinition, RallyPlan};
use shuttle_core::constants::FRAME_RATE;
use shuttle_core::enums::{MatchType, RallyOutcome};
use shuttle_core::error::RallyError;
use shuttle_core::events::RallyEvent;
use shuttle_core::state::RallySnapshot;
use shuttle_sim::{EngineConfig, HeadlessScene, RallyEngine};

use game_loop::LoopCommand;

/// Give up on a rally after this many simulated seconds.
const DEFAULT_MAX_SECS: f64 = 120.0;

struct RunOptions {
    rally: PathBuf,
    config: Option<PathBuf>,
    match_type: MatchType,
    fps: u32,
    max_secs: f64,
    realtime: bool,
    show_path: bool,
    snapshots: bool,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let verbose = has_flag(&args, "--verbose");
    if let Err(err) = logger::init(verbose) {
        eprintln!("Failed to install logger: {err}");
    }

    let result = match args[1].as_str() {
        "run" => parse_run(&args[2..]).and_then(|opts| cmd_run(&opts)),
        "preview" => parse_run(&args[2..]).and_then(|opts| cmd_preview(&opts)),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!(
        "rally-player: play shuttle rallies headless\n\
         \n\
         Commands:\n\
         \n\
         run       Play a rally definition and print events as JSON lines\n\
         \n\
           --rally <path>     Rally definition JSON (array of points)\n\
           --config <path>    Engine config JSON (optional)\n\
           --match <type>     none | singles | doubles (default: doubles)\n\
           --fps <N>          Frames per simulated second (default: 60)\n\
           --max-secs <N>     Give up after N simulated seconds (default: 120)\n\
           --realtime         Run on the 60 Hz loop thread instead of as fast as possible\n\
           --no-path          Do not draw the flight path\n\
           --snapshots        Print every snapshot, not just events\n\
           --verbose          Debug logging on stderr\n\
         \n\
         preview   Print the preview snapshot for a rally definition\n\
         \n\
           --rally <path>     Rally definition JSON\n\
         \n\
         Examples:\n\
         \n\
           rally-player run --rally rallies/doubles_demo.json\n\
           rally-player run --rally rallies/doubles_demo.json --realtime --snapshots\n"
    );
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_run(args: &[String]) -> Result<RunOptions, String> {
    let rally = parse_value(args, "--rally")
        .map(PathBuf::from)
        .ok_or("--rally <path> is required")?;

    let match_type = match parse_value(args, "--match").unwrap_or("doubles") {
        "none" => MatchType::None,
        "singles" => MatchType::Singles,
        "doubles" => MatchType::Doubles,
        other => return Err(format!("unknown match type: {other}")),
    };

    let fps = match parse_value(args, "--fps") {
        Some(v) => v
            .parse::<u32>()
            .ok()
            .filter(|&f| f > 0)
            .ok_or(format!("invalid --fps: {v}"))?,
        None => FRAME_RATE,
    };

    let max_secs = match parse_value(args, "--max-secs") {
        Some(v) => v
            .parse::<f64>()
            .ok()
            .filter(|s| s.is_finite() && *s > 0.0)
            .ok_or(format!("invalid --max-secs: {v}"))?,
        None => DEFAULT_MAX_SECS,
    };

    Ok(RunOptions {
        rally,
        config: parse_value(args, "--config").map(PathBuf::from),
        match_type,
        fps,
        max_secs,
        realtime: has_flag(args, "--realtime"),
        show_path: !has_flag(args, "--no-path"),
        snapshots: has_flag(args, "--snapshots"),
    })
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, String> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    EngineConfig::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))
}

fn load_plan(path: &Path, show_path: bool) -> Result<RallyPlan, String> {
    RallyDefinition::load(path)
        .and_then(|definition| definition.into_plan(show_path))
        .map_err(|e: RallyError| format!("{}: {e}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("failed to serialize output: {err}"),
    }
}

/// Print a snapshot (or only its events) and report how the rally ended.
fn emit(snapshot: &RallySnapshot, print_snapshots: bool) -> Option<RallyOutcome> {
    if print_snapshots {
        print_json(snapshot);
    } else {
        for event in &snapshot.events {
            print_json(event);
        }
    }
    snapshot.events.iter().find_map(|event| match event {
        RallyEvent::RallyFinished { outcome, .. } => Some(*outcome),
        _ => None,
    })
}

fn cmd_run(opts: &RunOptions) -> Result<(), String> {
    let config = load_config(opts.config.as_deref())?;
    let plan = load_plan(&opts.rally, opts.show_path)?;
    log::info!(
        "playing {} ({} points, {:?})",
        opts.rally.display(),
        plan.points.len(),
        opts.match_type
    );

    let outcome = if opts.realtime {
        run_realtime(config, plan, opts)?
    } else {
        run_headless(config, plan, opts)?
    };
    log::info!("rally ended: {outcome:?}");
    Ok(())
}

fn run_headless(config: EngineConfig, plan: RallyPlan, opts: &RunOptions) -> Result<RallyOutcome, String> {
    let mut engine = RallyEngine::new(HeadlessScene::new(), config);
    engine.init_roster(opts.match_type);
    engine.play(plan).map_err(|e| e.to_string())?;

    let dt = 1.0 / opts.fps as f64;
    let max_frames = (opts.max_secs * opts.fps as f64).ceil() as u64;
    for _ in 0..max_frames {
        let snapshot = engine.tick(dt);
        if let Some(outcome) = emit(&snapshot, opts.snapshots) {
            return Ok(outcome);
        }
    }
    engine.cancel();
    Err(format!("rally did not finish within {} s", opts.max_secs))
}

fn run_realtime(config: EngineConfig, plan: RallyPlan, opts: &RunOptions) -> Result<RallyOutcome, String> {
    let (snapshot_tx, snapshot_rx) = mpsc::channel();
    let (cmd_tx, handle) = game_loop::spawn_game_loop(config, snapshot_tx);

    let commands = [
        RallyCommand::InitRoster {
            match_type: opts.match_type,
        },
        RallyCommand::Play { plan },
    ];
    for command in commands {
        cmd_tx
            .send(LoopCommand::Rally(command))
            .map_err(|_| "rally loop stopped".to_string())?;
    }

    let max_frames = (opts.max_secs * FRAME_RATE as f64).ceil() as usize;
    let outcome = snapshot_rx
        .iter()
        .take(max_frames)
        .find_map(|snapshot| emit(&snapshot, opts.snapshots));

    let _ = cmd_tx.send(LoopCommand::Shutdown);
    drop(snapshot_rx);
    if handle.join().is_err() {
        log::error!("rally loop thread panicked");
    }
    outcome.ok_or_else(|| format!("rally did not finish within {} s", opts.max_secs))
}

fn cmd_preview(opts: &RunOptions) -> Result<(), String> {
    let config = load_config(opts.config.as_deref())?;
    let plan = load_plan(&opts.rally, opts.show_path)?;

    let mut engine = RallyEngine::new(HeadlessScene::new(), config);
    engine.init_roster(opts.match_type);
    engine.preview_points(&plan.points);
    print_json(&engine.tick(0.0));
    Ok(())
}
