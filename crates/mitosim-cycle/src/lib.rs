//! Cell cycle lifecycle models and the checkpoint rebind protocol.
//!
//! This crate is the bridge between opaque, externally authored behavioral
//! automatons and the generic checkpoint/restore machinery. An automaton has
//! no native serialization; its observable configuration is captured as a
//! flat `(state_id, variables)` snapshot, and restoring one requires a
//! two-phase protocol because the owning cell does not exist yet when the
//! archive reconstructs the model record.
//!
//! # Modules
//!
//! - [`automaton`] -- The capability contract an automaton must satisfy
//!   ([`BehavioralAutomaton`], [`AdvanceEvents`])
//! - [`codec`] -- Snapshot encode/decode with strict mismatch rejection
//! - [`error`] -- Fatal error taxonomy ([`CycleError`])
//! - [`model`] -- The per-cell [`LifecycleModel`] with its three-state
//!   attach machine and deferred rebind
//! - [`statechart`] -- [`GermlineStatechart`], the reference automaton the
//!   engine and tests drive

pub mod automaton;
pub mod codec;
pub mod error;
pub mod model;
pub mod statechart;

pub use automaton::{AdvanceEvents, AutomatonError, BehavioralAutomaton};
pub use error::CycleError;
pub use model::{LifecycleModel, RestoredState};
pub use statechart::GermlineStatechart;
