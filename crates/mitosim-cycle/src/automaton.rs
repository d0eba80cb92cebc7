//! The behavioral automaton capability contract.
//!
//! A behavioral automaton is an externally authored state machine encoding a
//! cell's regulatory logic. The lifecycle layer treats it as an opaque tagged
//! blob: an implementation-defined state ID plus a variable vector whose
//! meaning and length only the automaton knows. The capabilities below are
//! the complete set the rest of the system relies on -- enough to tick the
//! automaton, desynchronize it, and move its observable configuration in and
//! out of a checkpoint, and nothing more.
//!
//! The automaton reports phase and division-readiness changes through the
//! [`AdvanceEvents`] value returned from [`BehavioralAutomaton::advance`].
//! Only the owning lifecycle model applies those events to its protected
//! flags; no general caller can reach them.

use mitosim_random::RandomStreamRegistry;
use mitosim_types::{CellId, CellPhase};

/// Errors an automaton raises when asked to accept a decoded configuration.
#[derive(Debug, thiserror::Error)]
pub enum AutomatonError {
    /// The state ID is not one this automaton implementation defines.
    #[error("unknown automaton state id {state_id}")]
    UnknownStateId {
        /// The unrecognized state encoding.
        state_id: i32,
    },

    /// The variable vector has the wrong length for this automaton.
    #[error("automaton expects {expected} variables, snapshot carries {actual}")]
    VariableCountMismatch {
        /// Number of variables this automaton defines.
        expected: usize,
        /// Number of variables offered.
        actual: usize,
    },
}

/// Observable events produced by one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdvanceEvents {
    /// The phase the automaton entered during this step, if it changed.
    pub phase_changed: Option<CellPhase>,

    /// Whether the automaton completed mitosis during this step.
    ///
    /// True only on the step that finishes the M phase; the engine is
    /// expected to divide the cell and clear the model's flag before the
    /// next step.
    pub division_ready: bool,
}

/// Minimal capability set of an externally authored cell-behavior automaton.
///
/// # Contract
///
/// - [`attach_host`](Self::attach_host) must be called before the first
///   [`advance`](Self::advance). The lifecycle model enforces this ordering
///   and rejects violations before they reach the automaton.
/// - `(state_id, variables)` must capture the automaton's complete observable
///   configuration: restoring both into a fresh instance and advancing it
///   with the same `dt` sequence and the same continued draws must reproduce
///   the same event sequence the original would have produced.
/// - The setters validate; the caller does not. An automaton offered a state
///   ID or variable count it does not define must refuse it rather than
///   guess.
pub trait BehavioralAutomaton {
    /// Implementation-defined encoding of the current state.
    fn state_id(&self) -> i32;

    /// The automaton's variable vector, in its canonical order.
    fn variables(&self) -> Vec<f64>;

    /// Replace the current state with a decoded state encoding.
    ///
    /// # Errors
    ///
    /// Returns [`AutomatonError::UnknownStateId`] if this implementation
    /// does not define the given encoding.
    fn set_state_id(&mut self, state_id: i32) -> Result<(), AutomatonError>;

    /// Replace the variable vector with decoded values.
    ///
    /// # Errors
    ///
    /// Returns [`AutomatonError::VariableCountMismatch`] if the vector length
    /// is not the one this implementation defines.
    fn set_variables(&mut self, variables: &[f64]) -> Result<(), AutomatonError>;

    /// Bind the automaton to its owning cell.
    fn attach_host(&mut self, host: CellId);

    /// Apply a one-time perturbation to the automaton's internal timers.
    ///
    /// `fraction` is a uniform draw in `[0, 1)` taken from the shared stream
    /// by the lifecycle model. Used at population seeding and after division
    /// so unrelated lineages do not divide in lockstep.
    fn desynchronize(&mut self, fraction: f64);

    /// Advance the automaton by `dt`, drawing any needed randomness from the
    /// shared stream, and report what changed.
    fn advance(&mut self, dt: f64, stream: &mut RandomStreamRegistry) -> AdvanceEvents;
}
