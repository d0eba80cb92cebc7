//! The sequential tick loop: update every cell, divide the ready ones,
//! checkpoint on cadence.
//!
//! Stepping is single-threaded and cooperative: each tick walks the
//! population in a fixed order and drives every model synchronously to
//! completion. That fixed iteration order is what makes the shared draw
//! stream reproducible, both within a run and across a checkpoint restore.
//! Daughters created during a tick join the population at the end and take
//! their first step on the following tick.

use std::path::Path;

use mitosim_archive::{Checkpoint, write_checkpoint_file};
use mitosim_cycle::{GermlineStatechart, LifecycleModel};
use mitosim_random::RandomStreamRegistry;
use mitosim_types::CellId;
use tracing::{debug, info, warn};

use crate::config::{PopulationConfig, RunConfig};
use crate::error::EngineError;

/// The lifecycle model type this engine drives.
pub type Model = LifecycleModel<GermlineStatechart>;

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks actually executed.
    pub ticks_run: u64,
    /// Division events handled.
    pub divisions: u64,
    /// Divisions dropped because the population cap was reached.
    pub divisions_dropped: u64,
    /// Population size at the end of the run.
    pub final_population: usize,
    /// Checkpoints written during the run.
    pub checkpoints_written: u64,
}

/// Seed a fresh population: construct, bind, and desynchronize each model.
///
/// # Errors
///
/// Propagates lifecycle errors; none occur for a correctly ordered seeding.
pub fn seed_population(
    count: usize,
    stream: &mut RandomStreamRegistry,
) -> Result<Vec<Model>, EngineError> {
    let mut models = Vec::new();
    for _ in 0..count {
        let mut model = Model::fresh();
        model.set_host(CellId::new())?;
        model.initialise(stream)?;
        models.push(model);
    }
    info!(cells = models.len(), "population seeded");
    Ok(models)
}

/// Rebuild a population from a parsed checkpoint.
///
/// Performs phase-1 reconstruction, restores the draw stream, and runs the
/// fixup pass binding every model to a new host cell -- the ordering contract
/// the rebind protocol requires before any update.
///
/// # Errors
///
/// Propagates archive and rebind errors; a version-skewed snapshot fails
/// here rather than silently defaulting.
pub fn resume_population(
    checkpoint: Checkpoint,
) -> Result<(Vec<Model>, RandomStreamRegistry), EngineError> {
    let (mut models, stream_state) = checkpoint.into_pending_models::<GermlineStatechart>()?;
    let stream = RandomStreamRegistry::restore(stream_state);
    for model in &mut models {
        model.set_host(CellId::new())?;
    }
    info!(
        cells = models.len(),
        draws = stream.draws(),
        "population restored from checkpoint"
    );
    Ok((models, stream))
}

/// Drive the population for the configured number of ticks.
///
/// # Errors
///
/// Propagates lifecycle errors (fatal ordering bugs) and checkpoint write
/// failures.
pub fn run(
    models: &mut Vec<Model>,
    stream: &mut RandomStreamRegistry,
    run_config: &RunConfig,
    population_config: &PopulationConfig,
) -> Result<RunSummary, EngineError> {
    let mut summary = RunSummary {
        ticks_run: 0,
        divisions: 0,
        divisions_dropped: 0,
        final_population: models.len(),
        checkpoints_written: 0,
    };

    for tick in 1..=run_config.ticks {
        // Update every model in population order, then handle divisions so
        // daughters never advance within their birth tick.
        let mut ready = Vec::new();
        for (index, model) in models.iter_mut().enumerate() {
            model.update(run_config.dt_hours, stream)?;
            if model.ready_to_divide() {
                ready.push(index);
            }
        }

        for index in ready {
            let Some(parent) = models.get_mut(index) else {
                continue;
            };
            parent.reset_for_division();
            if models.len() >= population_config.max_cells {
                summary.divisions_dropped = summary.divisions_dropped.saturating_add(1);
                warn!(tick, "division dropped: population cap reached");
                continue;
            }
            let Some(parent) = models.get(index) else {
                continue;
            };
            let mut daughter = parent.fork()?;
            daughter.set_host(CellId::new())?;
            daughter.initialise(stream)?;
            models.push(daughter);
            summary.divisions = summary.divisions.saturating_add(1);
            debug!(tick, population = models.len(), "cell divided");
        }

        if run_config.checkpoint_interval > 0
            && tick.checked_rem(run_config.checkpoint_interval) == Some(0)
        {
            write_checkpoint_file(Path::new(&run_config.checkpoint_path), models, stream)?;
            summary.checkpoints_written = summary.checkpoints_written.saturating_add(1);
        }

        summary.ticks_run = tick;
    }

    summary.final_population = models.len();
    info!(
        ticks = summary.ticks_run,
        divisions = summary.divisions,
        population = summary.final_population,
        "run complete"
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mitosim_archive::load_checkpoint;

    use super::*;

    fn quiet_run_config(ticks: u64) -> RunConfig {
        RunConfig {
            dt_hours: 1.0,
            ticks,
            checkpoint_interval: 0,
            checkpoint_path: String::new(),
        }
    }

    #[test]
    fn seeded_population_is_attached_and_initialised() {
        let mut stream = RandomStreamRegistry::from_seed(10);
        let models = seed_population(5, &mut stream).unwrap();
        assert_eq!(models.len(), 5);
        // One desynchronization draw per cell.
        assert_eq!(stream.draws(), 5);
        assert!(models.iter().all(Model::is_attached));
    }

    #[test]
    fn population_grows_through_division() {
        let mut stream = RandomStreamRegistry::from_seed(10);
        let mut models = seed_population(4, &mut stream).unwrap();
        let summary = run(
            &mut models,
            &mut stream,
            &quiet_run_config(60),
            &PopulationConfig {
                initial_cells: 4,
                max_cells: 1024,
            },
        )
        .unwrap();

        // 60 hours covers several ~15-hour cycles; every lineage divides.
        assert!(summary.divisions >= 4);
        assert_eq!(summary.final_population, models.len());
        assert!(models.len() > 4);
    }

    #[test]
    fn population_cap_drops_divisions() {
        let mut stream = RandomStreamRegistry::from_seed(10);
        let mut models = seed_population(4, &mut stream).unwrap();
        let summary = run(
            &mut models,
            &mut stream,
            &quiet_run_config(60),
            &PopulationConfig {
                initial_cells: 4,
                max_cells: 4,
            },
        )
        .unwrap();

        assert_eq!(summary.divisions, 0);
        assert!(summary.divisions_dropped >= 4);
        assert_eq!(models.len(), 4);
    }

    #[test]
    fn identical_seeds_yield_identical_runs() {
        let run_once = || {
            let mut stream = RandomStreamRegistry::from_seed(123);
            let mut models = seed_population(6, &mut stream).unwrap();
            let summary = run(
                &mut models,
                &mut stream,
                &quiet_run_config(50),
                &PopulationConfig {
                    initial_cells: 6,
                    max_cells: 256,
                },
            )
            .unwrap();
            (summary, stream.draws())
        };
        assert_eq!(run_once(), run_once());
    }

    #[test]
    fn resumed_run_matches_uninterrupted_run() {
        let population_config = PopulationConfig {
            initial_cells: 4,
            max_cells: 256,
        };

        // Uninterrupted: 30 ticks straight.
        let mut stream_a = RandomStreamRegistry::from_seed(2718);
        let mut models_a = seed_population(4, &mut stream_a).unwrap();
        let _ = run(
            &mut models_a,
            &mut stream_a,
            &quiet_run_config(30),
            &population_config,
        )
        .unwrap();

        // Interrupted: 15 ticks, checkpoint in memory, resume for 15 more.
        let mut stream_b = RandomStreamRegistry::from_seed(2718);
        let mut models_b = seed_population(4, &mut stream_b).unwrap();
        let _ = run(
            &mut models_b,
            &mut stream_b,
            &quiet_run_config(15),
            &population_config,
        )
        .unwrap();
        let bytes = mitosim_archive::save_checkpoint(&models_b, &stream_b).unwrap();
        let checkpoint = load_checkpoint(&bytes).unwrap();
        let (mut resumed, mut resumed_stream) = resume_population(checkpoint).unwrap();
        let _ = run(
            &mut resumed,
            &mut resumed_stream,
            &quiet_run_config(15),
            &population_config,
        )
        .unwrap();

        assert_eq!(models_a.len(), resumed.len());
        let observations = |models: &[Model]| {
            models
                .iter()
                .map(|m| (m.current_phase(), m.ready_to_divide(), m.age().to_bits()))
                .collect::<Vec<_>>()
        };
        assert_eq!(observations(&models_a), observations(&resumed));
        assert_eq!(stream_a.draws(), resumed_stream.draws());
    }
}
