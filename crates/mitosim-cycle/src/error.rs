//! Error types for the mitosim-cycle crate.
//!
//! Nothing here is transient or retriable. A [`CycleError`] means either the
//! engine violated a call-ordering contract or a checkpoint record cannot be
//! replayed into the running automaton implementation; both are fatal to the
//! run.

use crate::automaton::AutomatonError;

/// Errors raised by lifecycle model operations and the checkpoint codec.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// A call arrived in an order the lifecycle contract forbids.
    ///
    /// This indicates an engine bug (e.g. `update` before `set_host`, or a
    /// second `set_host` on an attached model), not a data error. The run
    /// must abort.
    #[error("lifecycle precondition violated: {context}")]
    PreconditionViolation {
        /// Description of the violated ordering contract.
        context: String,
    },

    /// A snapshot could not be replayed into the running automaton.
    ///
    /// Raised when an archive declares a state ID or variable count the
    /// automaton implementation does not recognize (version skew). Silently
    /// substituting a default configuration is forbidden: it would break
    /// replay reproducibility without any visible failure.
    #[error("snapshot rejected by automaton: {source}")]
    DecodeMismatch {
        /// The automaton's reason for rejecting the snapshot.
        #[source]
        source: AutomatonError,
    },

    /// A snapshot's declared variable count disagrees with its payload.
    #[error("malformed snapshot: declares {declared} variables but carries {actual}")]
    MalformedSnapshot {
        /// The count the snapshot's length field declares.
        declared: u32,
        /// The number of variable values actually present.
        actual: usize,
    },

    /// The automaton's variable vector does not fit the snapshot layout.
    #[error(transparent)]
    Snapshot(#[from] mitosim_types::SnapshotError),
}
