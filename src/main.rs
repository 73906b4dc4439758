//! Rally Racer CLI
//!
//! Runs an AI-only race headless and prints the results as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rally_lib::race_sim::{Difficulty, RaceConfig};

#[derive(Parser)]
#[command(name = "rally_racer")]
#[command(about = "Run a headless AI rally race", long_about = None)]
struct Cli {
    /// Race configuration JSON; defaults are used for anything omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for AI tuning
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    laps: Option<u32>,

    /// Number of AI cars
    #[arg(long)]
    opponents: Option<u32>,

    /// Easy, Medium, Hard or Random
    #[arg(long)]
    difficulty: Option<Difficulty>,

    /// Fixed timestep in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Stop after this much race time even if cars are still running
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f32,

    /// Pretty-print the JSON report
    #[arg(long, default_value = "false")]
    pretty: bool,
}

fn init_runtime() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr so stdout stays clean JSON
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn build_config(cli: &Cli) -> Result<RaceConfig> {
    let mut config = match &cli.config {
        Some(path) => RaceConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => RaceConfig::default(),
    };

    config.include_human = false;
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(laps) = cli.laps {
        config.total_laps = laps;
    }
    if let Some(opponents) = cli.opponents {
        config.opponents = opponents;
    }
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    init_runtime();
    let cli = Cli::parse();

    if !(cli.dt > 0.0) {
        anyhow::bail!("--dt must be positive, got {}", cli.dt);
    }

    let config = build_config(&cli)?;
    tracing::info!(
        laps = config.total_laps,
        opponents = config.opponents,
        difficulty = %config.difficulty,
        "starting headless race"
    );

    let report = rally_lib::run_race(config, cli.dt, cli.max_seconds);

    let out = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{out}");
    Ok(())
}
