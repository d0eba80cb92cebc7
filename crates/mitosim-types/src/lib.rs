//! Shared type definitions for the Mitosim cell population simulation.
//!
//! This crate holds the data structures every other crate agrees on and
//! nothing else -- no logic, no I/O. It sits at the bottom of the workspace
//! dependency graph.
//!
//! # Modules
//!
//! - [`ids`] -- Strongly-typed identifiers ([`CellId`])
//! - [`phase`] -- The cell cycle phase set ([`CellPhase`])
//! - [`snapshot`] -- Persisted automaton configuration ([`AutomatonSnapshot`])

pub mod ids;
pub mod phase;
pub mod snapshot;

pub use ids::CellId;
pub use phase::CellPhase;
pub use snapshot::{AutomatonSnapshot, SnapshotError};
