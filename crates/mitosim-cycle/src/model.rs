//! Per-cell lifecycle model and the deferred rebind protocol.
//!
//! A [`LifecycleModel`] owns exactly one behavioral automaton for its entire
//! life, delegates per-tick stepping to it, and exposes the phase and
//! division-readiness flags the engine reads. It also orchestrates the hard
//! part of checkpointing: an automaton cannot accept decoded state until it
//! is attached to its eventual host cell, yet the archive reconstructs model
//! records before any cell exists. The model therefore lives in one of three
//! attachment states:
//!
//! - **Fresh** -- created at cell birth; the automaton exists but no host has
//!   been bound yet.
//! - **`PendingRebind`** -- created only by the archive loader; holds the
//!   decoded snapshot and no automaton.
//! - **Attached** -- host bound, automaton live, stepping permitted.
//!
//! [`set_host`](LifecycleModel::set_host) is the single one-shot transition
//! into `Attached`. On a fresh model it binds the existing automaton; on a
//! restored model it performs the full phase-2 rebind: construct a fresh
//! automaton, attach the host, replay the pending snapshot into it, and
//! consume the snapshot. The enum payloads carry the state invariants
//! directly -- a pending snapshot exists exactly while the model is
//! `PendingRebind`, an automaton exactly while it is not.

use core::fmt::Write;

use mitosim_random::RandomStreamRegistry;
use mitosim_types::{AutomatonSnapshot, CellId, CellPhase};
use tracing::debug;

use crate::automaton::BehavioralAutomaton;
use crate::codec;
use crate::error::CycleError;

/// Attachment state of a lifecycle model.
///
/// The payloads encode the ownership invariants: a snapshot is held exactly
/// while rebinding is pending, an automaton exactly while it is not.
#[derive(Debug)]
enum AttachState<A> {
    /// Born at cell birth; automaton present, host not yet bound.
    Fresh {
        /// The automaton awaiting host attachment.
        automaton: A,
    },
    /// Reconstructed by the archive loader; snapshot held, no automaton.
    PendingRebind {
        /// The decoded configuration awaiting phase-2 replay.
        snapshot: AutomatonSnapshot,
    },
    /// Host bound and automaton live.
    Attached {
        /// The automaton driving this cell.
        automaton: A,
        /// The owning cell.
        host: CellId,
    },
    /// Transient marker used while `set_host` moves the automaton between
    /// variants. Never observable between calls.
    Transitioning,
}

/// Base fields and snapshot of a model as read back from a checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredState {
    /// Phase at the moment of the save.
    pub phase: CellPhase,
    /// Division-readiness flag at the moment of the save.
    pub ready_to_divide: bool,
    /// Cell age in simulation hours at the moment of the save.
    pub age: f64,
    /// The automaton's observable configuration at the moment of the save.
    pub snapshot: AutomatonSnapshot,
}

/// Per-cell controller deciding division timing and phase.
#[derive(Debug)]
pub struct LifecycleModel<A> {
    state: AttachState<A>,
    phase: CellPhase,
    ready_to_divide: bool,
    age: f64,
    initialised: bool,
}

impl<A: BehavioralAutomaton> LifecycleModel<A> {
    /// Create a fresh model around an explicit automaton instance.
    ///
    /// The model starts unattached, in G1, age zero, not yet desynchronized.
    pub const fn with_automaton(automaton: A) -> Self {
        Self {
            state: AttachState::Fresh { automaton },
            phase: CellPhase::G1,
            ready_to_divide: false,
            age: 0.0,
            initialised: false,
        }
    }

    /// Create a fresh model with a default-initialized automaton.
    pub fn fresh() -> Self
    where
        A: Default,
    {
        Self::with_automaton(A::default())
    }

    /// Phase-1 reconstruction from a checkpoint record.
    ///
    /// Stores the decoded snapshot and builds no automaton; the owning cell
    /// does not exist yet. The engine's post-load fixup pass must call
    /// [`set_host`](Self::set_host) before the first
    /// [`update`](Self::update). Restored models are born initialised so the
    /// one-shot desynchronization can never apply a second perturbation
    /// after a load.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::MalformedSnapshot`] if the snapshot's declared
    /// variable count disagrees with its payload length.
    pub fn for_restore(restored: RestoredState) -> Result<Self, CycleError> {
        if !restored.snapshot.is_consistent() {
            return Err(CycleError::MalformedSnapshot {
                declared: restored.snapshot.variable_count,
                actual: restored.snapshot.variables.len(),
            });
        }
        Ok(Self {
            state: AttachState::PendingRebind {
                snapshot: restored.snapshot,
            },
            phase: restored.phase,
            ready_to_divide: restored.ready_to_divide,
            age: restored.age,
            initialised: true,
        })
    }

    /// Bind the model to its owning cell. One-shot.
    ///
    /// On a fresh model this attaches the existing automaton to `host`. On a
    /// restored model this performs the phase-2 rebind: constructs a fresh
    /// automaton, attaches it, replays the pending snapshot into it, and
    /// consumes the snapshot. Either way the model ends `Attached`.
    ///
    /// # Errors
    ///
    /// - [`CycleError::PreconditionViolation`] if the model is already
    ///   attached; `set_host` must be called exactly once per instance.
    /// - [`CycleError::DecodeMismatch`] if a restored snapshot declares a
    ///   configuration the automaton implementation does not recognize. The
    ///   model is left pending and the run must abort.
    pub fn set_host(&mut self, host: CellId) -> Result<(), CycleError>
    where
        A: Default,
    {
        match core::mem::replace(&mut self.state, AttachState::Transitioning) {
            AttachState::Fresh { mut automaton } => {
                automaton.attach_host(host);
                self.state = AttachState::Attached { automaton, host };
                Ok(())
            }
            AttachState::PendingRebind { snapshot } => {
                let mut automaton = A::default();
                automaton.attach_host(host);
                match codec::decode(&snapshot, &mut automaton) {
                    Ok(()) => {
                        debug!(%host, state_id = snapshot.state_id, "rebind complete");
                        self.state = AttachState::Attached { automaton, host };
                        Ok(())
                    }
                    Err(err) => {
                        self.state = AttachState::PendingRebind { snapshot };
                        Err(err)
                    }
                }
            }
            AttachState::Attached { automaton, host: bound } => {
                self.state = AttachState::Attached {
                    automaton,
                    host: bound,
                };
                Err(CycleError::PreconditionViolation {
                    context: format!("set_host called twice; model already bound to cell {bound}"),
                })
            }
            AttachState::Transitioning => Err(CycleError::PreconditionViolation {
                context: "model abandoned mid-transition by an earlier failure".to_owned(),
            }),
        }
    }

    /// Apply the one-shot desynchronization perturbation.
    ///
    /// Draws one value from the shared stream and hands it to the automaton,
    /// which perturbs its internal timers so populations seeded together do
    /// not divide in lockstep. A second call on the same instance is a
    /// guarded no-op and consumes no draw.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::PreconditionViolation`] if the model is awaiting
    /// rebind; restored models are already initialised and never reach this.
    pub fn initialise(&mut self, stream: &mut RandomStreamRegistry) -> Result<(), CycleError> {
        if self.initialised {
            return Ok(());
        }
        match &mut self.state {
            AttachState::Fresh { automaton } | AttachState::Attached { automaton, .. } => {
                let fraction = stream.uniform();
                automaton.desynchronize(fraction);
                self.initialised = true;
                Ok(())
            }
            AttachState::PendingRebind { .. } | AttachState::Transitioning => {
                Err(CycleError::PreconditionViolation {
                    context: "initialise called on a model with no automaton".to_owned(),
                })
            }
        }
    }

    /// Advance the model by one time step.
    ///
    /// Delegates to the automaton and applies the reported events to the
    /// protected phase and division-readiness flags. Requires an attached
    /// model: the engine must have bound a host (and, for restored models,
    /// completed the rebind) before the first step.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::PreconditionViolation`] if the model is not
    /// attached. This is an engine ordering bug and fatal to the run.
    pub fn update(&mut self, dt: f64, stream: &mut RandomStreamRegistry) -> Result<(), CycleError> {
        let AttachState::Attached { automaton, .. } = &mut self.state else {
            return Err(CycleError::PreconditionViolation {
                context: "update called before set_host bound the model to a cell".to_owned(),
            });
        };
        self.age += dt;
        let events = automaton.advance(dt, stream);
        if let Some(phase) = events.phase_changed {
            self.phase = phase;
        }
        self.ready_to_divide = events.division_ready;
        Ok(())
    }

    /// Whether the cell is ready to divide.
    pub const fn ready_to_divide(&self) -> bool {
        self.ready_to_divide
    }

    /// The cell's current cycle phase.
    pub const fn current_phase(&self) -> CellPhase {
        self.phase
    }

    /// Cell age in simulation hours.
    pub const fn age(&self) -> f64 {
        self.age
    }

    /// Whether the model has been bound to a host cell.
    pub const fn is_attached(&self) -> bool {
        matches!(self.state, AttachState::Attached { .. })
    }

    /// Whether the model is awaiting its phase-2 rebind.
    pub const fn is_pending_rebind(&self) -> bool {
        matches!(self.state, AttachState::PendingRebind { .. })
    }

    /// The owning cell, once bound.
    pub const fn host(&self) -> Option<CellId> {
        match &self.state {
            AttachState::Attached { host, .. } => Some(*host),
            _ => None,
        }
    }

    /// Build the daughter model for a division event.
    ///
    /// The daughter gets a brand-new default automaton -- never a copy of the
    /// parent's configuration. The engine binds it to the daughter cell with
    /// [`set_host`](Self::set_host) and desynchronizes it with
    /// [`initialise`](Self::initialise), so sibling lineages diverge from
    /// their first G1 onward.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::PreconditionViolation`] if the parent is not
    /// attached; only live cells divide.
    pub fn fork(&self) -> Result<Self, CycleError>
    where
        A: Default,
    {
        if !self.is_attached() {
            return Err(CycleError::PreconditionViolation {
                context: "fork called on a model not attached to a cell".to_owned(),
            });
        }
        Ok(Self::fresh())
    }

    /// Clear the division-readiness flag after the engine consumes a
    /// division event. The automaton restarts its own cycle, so the phase is
    /// left alone.
    pub const fn reset_for_division(&mut self) {
        self.ready_to_divide = false;
    }

    /// Append descriptive configuration metadata to `sink` as key/value
    /// lines. Reads nothing mutable; model state is unaffected.
    ///
    /// # Errors
    ///
    /// Propagates formatter errors from `sink`.
    pub fn output_parameters(&self, sink: &mut impl Write) -> core::fmt::Result {
        writeln!(sink, "LifecycleModel: statechart-driven")?;
        let phases: Vec<String> = CellPhase::ALL.iter().map(ToString::to_string).collect();
        writeln!(sink, "PhaseSet: {}", phases.join(","))?;
        writeln!(sink, "Desynchronisation: uniform one-shot")?;
        Ok(())
    }

    /// Capture the automaton's observable configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::PreconditionViolation`] if the model is not
    /// attached, or a snapshot assembly error from the codec.
    pub fn encode_snapshot(&self) -> Result<AutomatonSnapshot, CycleError> {
        let AttachState::Attached { automaton, .. } = &self.state else {
            return Err(CycleError::PreconditionViolation {
                context: "encode_snapshot called on a model with no live automaton".to_owned(),
            });
        };
        codec::encode(automaton)
    }
}
