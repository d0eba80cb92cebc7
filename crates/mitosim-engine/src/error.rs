//! Error type for the engine binary.

use crate::config::ConfigError;

/// Errors that abort the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A lifecycle operation failed; call ordering bug or version skew.
    #[error(transparent)]
    Cycle(#[from] mitosim_cycle::CycleError),

    /// Checkpoint save or restore failed.
    #[error(transparent)]
    Archive(#[from] mitosim_archive::ArchiveError),
}
