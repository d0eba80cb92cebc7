//! Persisted automaton configuration.
//!
//! An [`AutomatonSnapshot`] is the complete observable configuration of one
//! behavioral automaton at one instant: an implementation-defined state ID
//! plus a variable-length vector of real-valued variables. The rest of the
//! system never interprets either field; it only moves them between a live
//! automaton and the checkpoint archive.
//!
//! The snapshot carries its own declared variable count because the persisted
//! record layout is length-prefixed. A snapshot whose declared count disagrees
//! with its payload length is malformed and must be rejected before it ever
//! reaches an automaton.

use serde::{Deserialize, Serialize};

/// Errors raised while assembling a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The variable vector is too long for the length-prefixed record layout.
    #[error("variable vector of length {actual} exceeds the record layout limit")]
    CountOverflow {
        /// Length of the offending variable vector.
        actual: usize,
    },
}

/// The complete observable configuration of one automaton at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomatonSnapshot {
    /// Implementation-defined encoding of the automaton's current state.
    pub state_id: i32,

    /// Declared number of variables (length prefix in the record layout).
    pub variable_count: u32,

    /// Variable values, in the order the automaton reports them.
    pub variables: Vec<f64>,
}

impl AutomatonSnapshot {
    /// Build a snapshot from a state ID and variable vector, deriving the
    /// declared count from the vector length.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::CountOverflow`] if the vector length does not
    /// fit the 32-bit length prefix.
    pub fn new(state_id: i32, variables: Vec<f64>) -> Result<Self, SnapshotError> {
        let variable_count = u32::try_from(variables.len())
            .map_err(|_err| SnapshotError::CountOverflow {
                actual: variables.len(),
            })?;
        Ok(Self {
            state_id,
            variable_count,
            variables,
        })
    }

    /// Assemble a snapshot from raw parts without consistency checking.
    ///
    /// Used by the archive reader, which validates separately, and by tests
    /// that need to construct deliberately malformed records.
    pub const fn from_raw_parts(state_id: i32, variable_count: u32, variables: Vec<f64>) -> Self {
        Self {
            state_id,
            variable_count,
            variables,
        }
    }

    /// Whether the declared variable count matches the payload length.
    pub fn is_consistent(&self) -> bool {
        usize::try_from(self.variable_count)
            .map(|count| count == self.variables.len())
            .unwrap_or(false)
    }
}
