//! Arena Reaper - Development Tools

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use reaper_core::config::{DecisionConfig, PlannerPresets};
use reaper_core::planner::{PlanInput, PlannerPreset};
use reaper_core::qstate::QTable;
use reaper_tools::plan::{distance_range, run_plan, sweep, PlanRequest};
use reaper_tools::{inspect, validate, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reaper-tools")]
#[command(about = "Development tools for the arena reaper decision core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Fast,
    Precise,
}

impl From<Preset> for PlannerPreset {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self::Fast,
            Preset::Precise => Self::Precise,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a decision config, or every .ron file in a directory
    Validate {
        /// Path to a config file or directory
        #[arg(default_value = "assets/decision.ron")]
        path: PathBuf,
    },
    /// Run the throttle planner once
    Plan {
        /// Distance to cover
        #[arg(long)]
        distance: f64,
        /// Current speed
        #[arg(long, default_value_t = 0.0)]
        speed: f64,
        /// Reaper mass
        #[arg(long, default_value_t = 0.5)]
        mass: f64,
        /// Friction per round
        #[arg(long, default_value_t = 0.2)]
        friction: f64,
        /// Planner preset
        #[arg(long, value_enum, default_value_t = Preset::Fast)]
        preset: Preset,
        /// Search seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Take planner presets from this config
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run the planner over a range of distances in parallel
    Sweep {
        /// First distance
        #[arg(long)]
        from: f64,
        /// Last distance
        #[arg(long)]
        to: f64,
        /// Distance increment
        #[arg(long, default_value_t = 100.0)]
        step: f64,
        /// Planner preset
        #[arg(long, value_enum, default_value_t = Preset::Fast)]
        preset: Preset,
        /// Base seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Take planner presets from this config
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the strongest weights of a saved value table
    Inspect {
        /// Path to a saved table
        path: PathBuf,
        /// Number of entries to list
        #[arg(long, default_value_t = 20)]
        top: usize,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn presets(config: Option<&Path>) -> Result<PlannerPresets> {
    Ok(match config {
        Some(path) => DecisionConfig::load(path)?.planner,
        None => PlannerPresets::default(),
    })
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Validate { path } => {
            tracing::info!("Validating configs in: {}", path.display());
            for summary in validate::validate_path(&path)? {
                tracing::info!(
                    path = %summary.path.display(),
                    seed = summary.seed,
                    exploration = summary.exploration_rate,
                    "Config valid"
                );
            }
        }
        Commands::Plan {
            distance,
            speed,
            mass,
            friction,
            preset,
            seed,
            config,
            json,
        } => {
            let request = PlanRequest {
                input: PlanInput::new(speed, mass, friction, distance),
                preset: preset.into(),
                seed,
            };
            let report = run_plan(&request, &presets(config.as_deref())?);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("sequence: {:?}", report.sequence);
                println!("score: {:.3}  distance error: {:.2}", report.score, report.distance_error);
                for (round, (covered, speed)) in report.trajectory.iter().enumerate() {
                    println!("{round:>3}  distance {covered:>9.2}  speed {speed:>8.2}");
                }
                if report.timed_out {
                    tracing::warn!("Search stopped on the time budget");
                }
            }
        }
        Commands::Sweep {
            from,
            to,
            step,
            preset,
            seed,
            config,
            json,
        } => {
            let distances = distance_range(from, to, step)?;
            let template = PlanInput::new(0.0, 0.5, 0.2, 0.0);
            let reports = sweep(&distances, template, preset.into(), seed, &presets(config.as_deref())?);
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!(
                        "{:>8.1}  error {:>8.2}  len {:>3}  score {:.3}",
                        report.distance,
                        report.distance_error,
                        report.sequence.len(),
                        report.score
                    );
                }
            }
        }
        Commands::Inspect { path, top, json } => {
            let table = QTable::load(&path)?;
            let report = inspect::inspect_table(&table, top);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", inspect::render_text(&report));
            }
        }
    }
    Ok(())
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}
