//! Error types for the checkpoint archive.
//!
//! Every error here is fatal to the load or save in progress. A checkpoint
//! that cannot be read exactly as written is refused outright; guessing at a
//! shorter record or defaulting a field would silently break replay
//! reproducibility.

use mitosim_cycle::CycleError;

/// Errors raised while writing or reading a checkpoint archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Underlying file I/O failed.
    #[error("checkpoint file I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The buffer does not start with the checkpoint magic.
    #[error("not a mitosim checkpoint (bad magic {found:?})")]
    BadMagic {
        /// The first four bytes actually found.
        found: [u8; 4],
    },

    /// The archive was written by an unsupported format version.
    #[error("unsupported checkpoint format version {found}")]
    UnsupportedVersion {
        /// The version field read from the header.
        found: u32,
    },

    /// The archive ended before a declared field could be fully read.
    #[error("truncated checkpoint: ran out of bytes reading {context}")]
    Truncated {
        /// What was being read when the buffer ran out.
        context: &'static str,
    },

    /// Bytes remained after the last declared field.
    #[error("corrupt checkpoint: {remaining} unexpected trailing bytes")]
    TrailingBytes {
        /// Number of bytes left over.
        remaining: usize,
    },

    /// A record carried a phase code outside the known set.
    #[error("corrupt checkpoint: unknown phase code {found}")]
    InvalidPhaseCode {
        /// The unrecognized code.
        found: i32,
    },

    /// A record's division-readiness flag was neither 0 nor 1.
    #[error("corrupt checkpoint: invalid readiness flag {found}")]
    InvalidReadyFlag {
        /// The byte actually found.
        found: u8,
    },

    /// A record declared a negative variable count.
    #[error("corrupt checkpoint: negative variable count {found}")]
    NegativeVariableCount {
        /// The declared count.
        found: i32,
    },

    /// The header timestamp does not denote a representable instant.
    #[error("corrupt checkpoint: unrepresentable save timestamp {found}")]
    InvalidTimestamp {
        /// The raw epoch-seconds value.
        found: i64,
    },

    /// An automaton reported more variables than the record layout holds.
    #[error("cannot checkpoint a {count}-variable automaton: exceeds the length prefix")]
    OversizedVariableVector {
        /// Number of variables the automaton reported.
        count: u32,
    },

    /// The population is too large for the record count field.
    #[error("cannot checkpoint {count} models: exceeds the record count field")]
    TooManyModels {
        /// Number of models offered for saving.
        count: usize,
    },

    /// A lifecycle operation failed while capturing or restoring a model.
    #[error(transparent)]
    Cycle(#[from] CycleError),
}
