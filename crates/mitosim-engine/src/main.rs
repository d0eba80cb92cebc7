//! Simulation engine binary for Mitosim.
//!
//! Wires together configuration, the shared draw stream, the cell
//! population, and the checkpoint archive, then drives the sequential tick
//! loop until the configured tick count is reached.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `mitosim-config.yaml`
//! 3. Seed a fresh population, or restore one with `--resume <checkpoint>`
//! 4. Run the tick loop with periodic checkpoints
//! 5. Write a final checkpoint and log the summary

mod config;
mod error;
mod runner;

use std::path::{Path, PathBuf};

use anyhow::Context;
use mitosim_archive::read_checkpoint_file;
use mitosim_random::RandomStreamRegistry;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::SimulationConfig;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, restore, or the run itself fails.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("mitosim-engine starting");

    let config_path =
        std::env::var("MITOSIM_CONFIG").unwrap_or_else(|_| "mitosim-config.yaml".to_owned());
    let config = load_config(Path::new(&config_path))?;
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        initial_cells = config.population.initial_cells,
        ticks = config.run.ticks,
        "configuration loaded"
    );

    let (mut models, mut stream) = if let Some(checkpoint_path) = resume_path_from_args() {
        let checkpoint = read_checkpoint_file(&checkpoint_path)
            .with_context(|| format!("failed to read checkpoint {}", checkpoint_path.display()))?;
        info!(
            saved_at = %checkpoint.saved_at,
            cells = checkpoint.records.len(),
            "resuming from checkpoint"
        );
        runner::resume_population(checkpoint)?
    } else {
        let mut stream = RandomStreamRegistry::from_seed(config.world.seed);
        let models = runner::seed_population(config.population.initial_cells, &mut stream)?;
        (models, stream)
    };

    let summary = runner::run(&mut models, &mut stream, &config.run, &config.population)?;

    mitosim_archive::write_checkpoint_file(
        Path::new(&config.run.checkpoint_path),
        &models,
        &stream,
    )
    .context("failed to write final checkpoint")?;

    info!(
        ticks = summary.ticks_run,
        divisions = summary.divisions,
        divisions_dropped = summary.divisions_dropped,
        population = summary.final_population,
        checkpoints = summary.checkpoints_written,
        "mitosim-engine finished"
    );
    Ok(())
}

/// Load and validate the simulation configuration.
fn load_config(path: &Path) -> anyhow::Result<SimulationConfig> {
    if path.exists() {
        SimulationConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))
    } else {
        info!(path = %path.display(), "no config file found, using defaults");
        Ok(SimulationConfig::default())
    }
}

/// Parse `--resume <path>` from the command line, if present.
fn resume_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--resume" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
