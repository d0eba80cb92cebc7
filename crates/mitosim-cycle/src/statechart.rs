//! Reference statechart automaton for germline cells.
//!
//! A deliberately simple behavioral automaton: the four mitotic phases run as
//! countdown timers, S/G2/M with fixed durations and G1 with a duration drawn
//! from the shared stream at the start of each cycle. It exists so the engine
//! and the test suite have a concrete automaton to drive; the lifecycle layer
//! works against the [`BehavioralAutomaton`] trait and never depends on the
//! specifics here.
//!
//! The observable configuration is `(state_id, [time_remaining,
//! g1_duration])`. Those three numbers, plus the shared stream position, fully
//! determine all future events, which is what makes the checkpoint round-trip
//! exact.

use mitosim_random::RandomStreamRegistry;
use mitosim_types::{CellId, CellPhase};

use crate::automaton::{AdvanceEvents, AutomatonError, BehavioralAutomaton};

/// State encoding for G1 in persisted snapshots.
const STATE_G1: i32 = 1;
/// State encoding for S.
const STATE_S: i32 = 2;
/// State encoding for G2.
const STATE_G2: i32 = 3;
/// State encoding for M.
const STATE_M: i32 = 4;

/// Nominal G1 duration in simulation hours, before the per-cycle draw.
const G1_BASE_HOURS: f64 = 7.0;
/// Fixed S phase duration in simulation hours.
const S_HOURS: f64 = 4.0;
/// Fixed G2 phase duration in simulation hours.
const G2_HOURS: f64 = 3.0;
/// Fixed M phase duration in simulation hours.
const M_HOURS: f64 = 1.0;
/// Lower bound of the per-cycle G1 duration multiplier.
const G1_SCALE_MIN: f64 = 0.75;
/// Upper bound of the per-cycle G1 duration multiplier.
const G1_SCALE_MAX: f64 = 1.25;

/// Number of variables in this automaton's observable configuration.
const VARIABLE_COUNT: usize = 2;

/// Countdown-timer statechart over the four mitotic phases.
#[derive(Debug, Clone)]
pub struct GermlineStatechart {
    host: Option<CellId>,
    phase: CellPhase,
    time_remaining: f64,
    g1_duration: f64,
}

impl Default for GermlineStatechart {
    fn default() -> Self {
        Self {
            host: None,
            phase: CellPhase::G1,
            time_remaining: G1_BASE_HOURS,
            g1_duration: G1_BASE_HOURS,
        }
    }
}

impl GermlineStatechart {
    /// The cell this statechart is bound to, if attached.
    pub const fn host(&self) -> Option<CellId> {
        self.host
    }

    /// The phase the statechart currently sits in.
    pub const fn phase(&self) -> CellPhase {
        self.phase
    }

    /// Fixed duration of a phase, or the current drawn duration for G1.
    const fn duration_of(&self, phase: CellPhase) -> f64 {
        match phase {
            CellPhase::G1 => self.g1_duration,
            CellPhase::S => S_HOURS,
            CellPhase::G2 => G2_HOURS,
            CellPhase::M => M_HOURS,
        }
    }
}

impl BehavioralAutomaton for GermlineStatechart {
    fn state_id(&self) -> i32 {
        match self.phase {
            CellPhase::G1 => STATE_G1,
            CellPhase::S => STATE_S,
            CellPhase::G2 => STATE_G2,
            CellPhase::M => STATE_M,
        }
    }

    fn variables(&self) -> Vec<f64> {
        vec![self.time_remaining, self.g1_duration]
    }

    fn set_state_id(&mut self, state_id: i32) -> Result<(), AutomatonError> {
        self.phase = match state_id {
            STATE_G1 => CellPhase::G1,
            STATE_S => CellPhase::S,
            STATE_G2 => CellPhase::G2,
            STATE_M => CellPhase::M,
            other => return Err(AutomatonError::UnknownStateId { state_id: other }),
        };
        Ok(())
    }

    fn set_variables(&mut self, variables: &[f64]) -> Result<(), AutomatonError> {
        let [time_remaining, g1_duration] = variables else {
            return Err(AutomatonError::VariableCountMismatch {
                expected: VARIABLE_COUNT,
                actual: variables.len(),
            });
        };
        self.time_remaining = *time_remaining;
        self.g1_duration = *g1_duration;
        Ok(())
    }

    fn attach_host(&mut self, host: CellId) {
        self.host = Some(host);
    }

    fn desynchronize(&mut self, fraction: f64) {
        // Shortens the first phase by a random fraction so a population
        // seeded in lockstep spreads out over one cycle length.
        self.time_remaining *= fraction;
    }

    fn advance(&mut self, dt: f64, stream: &mut RandomStreamRegistry) -> AdvanceEvents {
        let mut events = AdvanceEvents::default();
        self.time_remaining -= dt;

        // A large dt can cross several phase boundaries in one step; the
        // leftover time carries into each successor phase.
        while self.time_remaining <= 0.0 {
            let leftover = self.time_remaining;
            if self.phase == CellPhase::M {
                events.division_ready = true;
            }
            self.phase = self.phase.next();
            if self.phase == CellPhase::G1 {
                self.g1_duration = G1_BASE_HOURS * stream.uniform_in(G1_SCALE_MIN, G1_SCALE_MAX);
            }
            self.time_remaining = self.duration_of(self.phase) + leftover;
            events.phase_changed = Some(self.phase);
        }
        events
    }
}
