//! Checkpoint archive format and restore orchestration for Mitosim.
//!
//! Serializes a population of lifecycle models plus the shared draw stream
//! into a strict little-endian binary format, and parses it back for the
//! two-phase restore. Parsing is exact-or-refuse: truncated records, unknown
//! codes, and trailing bytes are all load-time failures, never guesses.
//!
//! # Modules
//!
//! - [`checkpoint`] -- Format layout, [`save_checkpoint`]/[`load_checkpoint`],
//!   and phase-1 model reconstruction
//! - [`error`] -- Fatal archive error taxonomy ([`ArchiveError`])

pub mod checkpoint;
pub mod error;

mod reader;

pub use checkpoint::{
    Checkpoint, ModelRecord, load_checkpoint, read_checkpoint_file, save_checkpoint,
    write_checkpoint_file,
};
pub use error::ArchiveError;
