//! Checkpoint format: header, per-model records, and the shared stream state.
//!
//! Layout (all integers and floats little-endian):
//!
//! ```text
//! magic            4 bytes  "MTSM"
//! format version   u32
//! saved at         i64      unix epoch seconds
//! model count      u32
//! per model:
//!   phase          i32
//!   ready flag     u8       0 or 1
//!   age            f64
//!   state id       i32
//!   variable count i32
//!   variables      f64 * variable count
//! stream seed      u64
//! stream draws     u64
//! ```
//!
//! The variable count is a length prefix, read before the array. A record
//! whose declared count cannot be fully read is refused as truncated; the
//! reader never guesses a shorter length. The stream state is written once,
//! after the records, so a restored run continues the exact draw sequence
//! the interrupted run would have produced.

use chrono::{DateTime, Utc};
use mitosim_cycle::{BehavioralAutomaton, LifecycleModel, RestoredState};
use mitosim_random::{RandomStreamRegistry, StreamState};
use mitosim_types::{AutomatonSnapshot, CellPhase};
use tracing::{debug, info};

use crate::error::ArchiveError;
use crate::reader::ByteReader;

/// First four bytes of every checkpoint.
const MAGIC: [u8; 4] = *b"MTSM";

/// Current checkpoint format version.
const FORMAT_VERSION: u32 = 1;

/// One model's persisted fields: base state plus the automaton snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecord {
    /// Phase at the moment of the save.
    pub phase: CellPhase,
    /// Division-readiness flag at the moment of the save.
    pub ready_to_divide: bool,
    /// Cell age in simulation hours.
    pub age: f64,
    /// The automaton's observable configuration.
    pub snapshot: AutomatonSnapshot,
}

impl ModelRecord {
    /// Capture a record from a live, attached model.
    ///
    /// # Errors
    ///
    /// Returns a [`CycleError`](mitosim_cycle::CycleError) wrapped in
    /// [`ArchiveError::Cycle`] if the model has no live automaton to read.
    pub fn capture<A: BehavioralAutomaton>(
        model: &LifecycleModel<A>,
    ) -> Result<Self, ArchiveError> {
        Ok(Self {
            phase: model.current_phase(),
            ready_to_divide: model.ready_to_divide(),
            age: model.age(),
            snapshot: model.encode_snapshot()?,
        })
    }

    /// Convert into the phase-1 restore input for a lifecycle model.
    pub fn into_restored_state(self) -> RestoredState {
        RestoredState {
            phase: self.phase,
            ready_to_divide: self.ready_to_divide,
            age: self.age,
            snapshot: self.snapshot,
        }
    }

    /// Append the record's wire form to `buf`.
    fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), ArchiveError> {
        let variable_count =
            i32::try_from(self.snapshot.variable_count).map_err(|_err| {
                ArchiveError::OversizedVariableVector {
                    count: self.snapshot.variable_count,
                }
            })?;
        buf.extend_from_slice(&self.phase.wire_code().to_le_bytes());
        buf.push(u8::from(self.ready_to_divide));
        buf.extend_from_slice(&self.age.to_le_bytes());
        buf.extend_from_slice(&self.snapshot.state_id.to_le_bytes());
        buf.extend_from_slice(&variable_count.to_le_bytes());
        for value in &self.snapshot.variables {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }

    /// Read one record from the cursor.
    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, ArchiveError> {
        let phase_code = reader.read_i32("phase")?;
        let phase = CellPhase::from_wire_code(phase_code)
            .ok_or(ArchiveError::InvalidPhaseCode { found: phase_code })?;

        let ready_flag = reader.read_u8("readiness flag")?;
        let ready_to_divide = match ready_flag {
            0 => false,
            1 => true,
            found => return Err(ArchiveError::InvalidReadyFlag { found }),
        };

        let age = reader.read_f64("age")?;
        let state_id = reader.read_i32("state id")?;

        let declared = reader.read_i32("variable count")?;
        if declared < 0 {
            return Err(ArchiveError::NegativeVariableCount { found: declared });
        }
        let variable_count = u32::try_from(declared)
            .map_err(|_err| ArchiveError::NegativeVariableCount { found: declared })?;

        let mut variables = Vec::new();
        for _ in 0..variable_count {
            variables.push(reader.read_f64("automaton variable")?);
        }

        Ok(Self {
            phase,
            ready_to_divide,
            age,
            snapshot: AutomatonSnapshot::from_raw_parts(state_id, variable_count, variables),
        })
    }
}

/// A fully parsed checkpoint, ready for the two-phase restore.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// When the checkpoint was written.
    pub saved_at: DateTime<Utc>,
    /// One record per model, in engine iteration order.
    pub records: Vec<ModelRecord>,
    /// Persisted state of the shared draw stream.
    pub stream: StreamState,
}

impl Checkpoint {
    /// Phase-1 reconstruction: build `PendingRebind` models from the records.
    ///
    /// No automatons are constructed and no hosts exist yet. The engine must
    /// restore the draw stream from [`Self::stream`] and run its fixup pass,
    /// calling `set_host` on every returned model, before the first update.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Cycle`] if any record's snapshot is
    /// internally inconsistent.
    pub fn into_pending_models<A: BehavioralAutomaton>(
        self,
    ) -> Result<(Vec<LifecycleModel<A>>, StreamState), ArchiveError> {
        let stream = self.stream;
        let models = self
            .records
            .into_iter()
            .map(|record| {
                LifecycleModel::for_restore(record.into_restored_state()).map_err(ArchiveError::from)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(models = models.len(), "phase-1 reconstruction complete");
        Ok((models, stream))
    }
}

/// Serialize a population and the shared stream into a checkpoint buffer.
///
/// Every model must be attached; the save happens between ticks, never
/// mid-step.
///
/// # Errors
///
/// Returns [`ArchiveError::TooManyModels`] if the population exceeds the
/// record count field, or [`ArchiveError::Cycle`] if any model has no live
/// automaton.
pub fn save_checkpoint<A: BehavioralAutomaton>(
    models: &[LifecycleModel<A>],
    stream: &RandomStreamRegistry,
) -> Result<Vec<u8>, ArchiveError> {
    let count = u32::try_from(models.len())
        .map_err(|_err| ArchiveError::TooManyModels {
            count: models.len(),
        })?;

    let mut buf = Vec::new();
    buf.extend_from_slice(&MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&Utc::now().timestamp().to_le_bytes());
    buf.extend_from_slice(&count.to_le_bytes());

    for model in models {
        let record = ModelRecord::capture(model)?;
        record.write_to(&mut buf)?;
    }

    let state = stream.state();
    buf.extend_from_slice(&state.seed.to_le_bytes());
    buf.extend_from_slice(&state.draws.to_le_bytes());

    info!(
        models = models.len(),
        draws = state.draws,
        bytes = buf.len(),
        "checkpoint captured"
    );
    Ok(buf)
}

/// Parse a checkpoint buffer.
///
/// The buffer must parse exactly: truncated fields, unknown codes, and
/// trailing bytes are all refused.
///
/// # Errors
///
/// See [`ArchiveError`] for the full taxonomy.
pub fn load_checkpoint(bytes: &[u8]) -> Result<Checkpoint, ArchiveError> {
    let mut reader = ByteReader::new(bytes);

    let magic = reader.read_magic()?;
    if magic != MAGIC {
        return Err(ArchiveError::BadMagic { found: magic });
    }
    let version = reader.read_u32("format version")?;
    if version != FORMAT_VERSION {
        return Err(ArchiveError::UnsupportedVersion { found: version });
    }

    let epoch_seconds = reader.read_i64("save timestamp")?;
    let saved_at = DateTime::from_timestamp(epoch_seconds, 0).ok_or(
        ArchiveError::InvalidTimestamp {
            found: epoch_seconds,
        },
    )?;

    let count = reader.read_u32("model count")?;
    let mut records = Vec::new();
    for _ in 0..count {
        records.push(ModelRecord::read_from(&mut reader)?);
    }

    let seed = reader.read_u64("stream seed")?;
    let draws = reader.read_u64("stream draws")?;

    if reader.remaining() > 0 {
        return Err(ArchiveError::TrailingBytes {
            remaining: reader.remaining(),
        });
    }

    Ok(Checkpoint {
        saved_at,
        records,
        stream: StreamState { seed, draws },
    })
}

/// Write a checkpoint buffer to disk.
///
/// # Errors
///
/// Propagates serialization and file I/O errors.
pub fn write_checkpoint_file<A: BehavioralAutomaton>(
    path: &std::path::Path,
    models: &[LifecycleModel<A>],
    stream: &RandomStreamRegistry,
) -> Result<(), ArchiveError> {
    let bytes = save_checkpoint(models, stream)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Read and parse a checkpoint file from disk.
///
/// # Errors
///
/// Propagates file I/O and parse errors.
pub fn read_checkpoint_file(path: &std::path::Path) -> Result<Checkpoint, ArchiveError> {
    let bytes = std::fs::read(path)?;
    load_checkpoint(&bytes)
}
