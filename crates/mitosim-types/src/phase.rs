//! Cell cycle phases.
//!
//! The phase set is the classical four-stage mitotic cycle. The engine and
//! checkpoint archive treat the phase as an opaque label; only the automaton
//! driving a cell decides when transitions happen.

use serde::{Deserialize, Serialize};

/// Discrete phase of the cell cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellPhase {
    /// First gap phase (growth before DNA replication).
    G1,
    /// Synthesis phase (DNA replication).
    S,
    /// Second gap phase (growth before mitosis).
    G2,
    /// Mitotic phase (division).
    M,
}

impl CellPhase {
    /// All phases in cycle order.
    pub const ALL: [Self; 4] = [Self::G1, Self::S, Self::G2, Self::M];

    /// Return the phase that follows this one, wrapping M back to G1.
    pub const fn next(self) -> Self {
        match self {
            Self::G1 => Self::S,
            Self::S => Self::G2,
            Self::G2 => Self::M,
            Self::M => Self::G1,
        }
    }

    /// Integer code used in the persisted record layout.
    pub const fn wire_code(self) -> i32 {
        match self {
            Self::G1 => 0,
            Self::S => 1,
            Self::G2 => 2,
            Self::M => 3,
        }
    }

    /// Decode a persisted phase code. Returns `None` for unknown codes.
    pub const fn from_wire_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::G1),
            1 => Some(Self::S),
            2 => Some(Self::G2),
            3 => Some(Self::M),
            _ => None,
        }
    }
}

impl core::fmt::Display for CellPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::G1 => "G1",
            Self::S => "S",
            Self::G2 => "G2",
            Self::M => "M",
        };
        write!(f, "{name}")
    }
}
