mod script;

use std::fs;
use std::io::{self, Read};
use std::str::FromStr;

use canvas::doc::SceneError;
use canvas::engine::{EngineConfig, EngineCore};
use canvas::history::HistoryLog;
use canvas::input::MarqueeMode;
use canvas::viewport::Point;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::script::{Gesture, PickReport, SceneFile};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("scene rejected: {0}")]
    Scene(#[from] SceneError),
    #[error("only one input may come from stdin")]
    StdinTwice,
}

/// Viewport size in CSS pixels, written `WIDTHxHEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ViewportSize {
    width: f64,
    height: f64,
}

impl FromStr for ViewportSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid viewport '{s}' (expected WIDTHxHEIGHT, e.g. 1024x768)");
        let (w, h) = s.split_once('x').ok_or_else(invalid)?;
        let width: f64 = w.trim().parse().map_err(|_| invalid())?;
        let height: f64 = h.trim().parse().map_err(|_| invalid())?;
        if width <= 0.0 || height <= 0.0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

#[derive(Parser, Debug)]
#[command(name = "scenekit", about = "Replay pointer gestures against a scene and inspect hit-testing")]
struct Cli {
    #[arg(long, env = "SCENEKIT_MARQUEE_MODE", default_value = "containment")]
    marquee_mode: MarqueeMode,

    #[arg(long, env = "SCENEKIT_VIEWPORT", default_value = "1024x768")]
    viewport: ViewportSize,

    #[arg(long, env = "SCENEKIT_DPR", default_value_t = 1.0)]
    dpr: f64,

    #[arg(long, env = "SCENEKIT_ZOOM", default_value_t = 1.0)]
    zoom: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a gesture script against a scene and print the result.
    Replay {
        #[arg(help = "Scene file path, or - for stdin")]
        scene: String,
        #[arg(long, help = "Gesture script path, or - for stdin")]
        script: String,
    },
    /// Report what the identity raster holds under a screen point.
    Pick {
        #[arg(help = "Scene file path, or - for stdin")]
        scene: String,
        x: f64,
        y: f64,
    },
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let cli = Cli::parse();

    let config = EngineConfig { marquee_mode: cli.marquee_mode, ..EngineConfig::default() };
    let mut core = EngineCore::with_config(config);
    core.set_viewport(cli.viewport.width, cli.viewport.height, cli.dpr);
    core.set_camera(0.0, 0.0, cli.zoom);

    match cli.command {
        Command::Replay { scene, script } => run_replay(&mut core, &scene, &script),
        Command::Pick { scene, x, y } => run_pick(&mut core, &scene, x, y),
    }
}

fn run_replay(core: &mut EngineCore, scene_path: &str, script_path: &str) -> Result<(), CliError> {
    if scene_path == "-" && script_path == "-" {
        return Err(CliError::StdinTwice);
    }
    let scene: SceneFile = serde_json::from_str(&read_input(scene_path)?)?;
    let gestures: Vec<Gesture> = serde_json::from_str(&read_input(script_path)?)?;
    scene.load_into(core)?;

    let mut history = HistoryLog::with_baseline(usize::MAX, core.scene.shapes().to_vec());
    let report = script::replay(core, &gestures, &mut history);
    print_json(&report)
}

fn run_pick(core: &mut EngineCore, scene_path: &str, x: f64, y: f64) -> Result<(), CliError> {
    let scene: SceneFile = serde_json::from_str(&read_input(scene_path)?)?;
    scene.load_into(core)?;
    let report = PickReport::from(core.pick(Point::new(x, y)));
    print_json(&report)
}

fn read_input(path: &str) -> Result<String, CliError> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| CliError::Read { path: "stdin".to_owned(), source })?;
        return Ok(buf);
    }
    fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
