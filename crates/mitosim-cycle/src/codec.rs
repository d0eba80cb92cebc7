//! Checkpoint codec: moving automaton configurations in and out of snapshots.
//!
//! [`encode`] reads an automaton's observable configuration into a flat
//! [`AutomatonSnapshot`]; [`decode`] replays a snapshot into a fresh
//! automaton. The pair is total and mutually inverse over every reachable
//! configuration: decode-of-encode yields an automaton whose future behavior
//! is indistinguishable from the original's, given the same time steps and
//! the same continued draws.
//!
//! The codec never interprets state IDs or variable values. Validation is
//! split by responsibility: the codec checks the snapshot's own internal
//! consistency (declared count vs payload), while the automaton checks
//! whether it recognizes the decoded configuration.

use mitosim_types::AutomatonSnapshot;

use crate::automaton::BehavioralAutomaton;
use crate::error::CycleError;

/// Capture an automaton's observable configuration.
///
/// Read-only. Must only be called between steps, never mid-`advance`; the
/// single-threaded stepping model makes that the natural call site.
///
/// # Errors
///
/// Returns [`CycleError::Snapshot`] if the automaton reports a variable
/// vector too long for the length-prefixed record layout.
pub fn encode<A: BehavioralAutomaton + ?Sized>(automaton: &A) -> Result<AutomatonSnapshot, CycleError> {
    let snapshot = AutomatonSnapshot::new(automaton.state_id(), automaton.variables())?;
    Ok(snapshot)
}

/// Replay a snapshot into an automaton.
///
/// Sets the state ID first, then the variables. The automaton validates both
/// against its own definition; the codec does not second-guess it.
///
/// # Errors
///
/// - [`CycleError::MalformedSnapshot`] if the snapshot's declared variable
///   count disagrees with its payload length.
/// - [`CycleError::DecodeMismatch`] if the automaton does not recognize the
///   state ID or variable count (version skew between the archive and the
///   running implementation). The automaton is left untouched past the point
///   of rejection; the run must abort rather than continue from a silently
///   defaulted configuration.
pub fn decode<A: BehavioralAutomaton + ?Sized>(
    snapshot: &AutomatonSnapshot,
    automaton: &mut A,
) -> Result<(), CycleError> {
    if !snapshot.is_consistent() {
        return Err(CycleError::MalformedSnapshot {
            declared: snapshot.variable_count,
            actual: snapshot.variables.len(),
        });
    }
    automaton
        .set_state_id(snapshot.state_id)
        .map_err(|source| CycleError::DecodeMismatch { source })?;
    automaton
        .set_variables(&snapshot.variables)
        .map_err(|source| CycleError::DecodeMismatch { source })?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mitosim_random::RandomStreamRegistry;
    use mitosim_types::{CellId, CellPhase};

    use super::*;
    use crate::automaton::{AdvanceEvents, AutomatonError};
    use crate::statechart::GermlineStatechart;

    /// Records the order of setter calls so the decode ordering contract
    /// (state ID before variables) is pinned by a test.
    #[derive(Default)]
    struct OrderProbe {
        calls: Vec<&'static str>,
        reject_variables: bool,
    }

    impl BehavioralAutomaton for OrderProbe {
        fn state_id(&self) -> i32 {
            0
        }

        fn variables(&self) -> Vec<f64> {
            Vec::new()
        }

        fn set_state_id(&mut self, _state_id: i32) -> Result<(), AutomatonError> {
            self.calls.push("state_id");
            Ok(())
        }

        fn set_variables(&mut self, variables: &[f64]) -> Result<(), AutomatonError> {
            self.calls.push("variables");
            if self.reject_variables {
                return Err(AutomatonError::VariableCountMismatch {
                    expected: 2,
                    actual: variables.len(),
                });
            }
            Ok(())
        }

        fn attach_host(&mut self, _host: CellId) {}

        fn desynchronize(&mut self, _fraction: f64) {}

        fn advance(&mut self, _dt: f64, _stream: &mut RandomStreamRegistry) -> AdvanceEvents {
            AdvanceEvents::default()
        }
    }

    #[test]
    fn decode_sets_state_id_before_variables() {
        let snapshot = AutomatonSnapshot::new(3, vec![1.0]).unwrap();
        let mut probe = OrderProbe::default();
        decode(&snapshot, &mut probe).unwrap();
        assert_eq!(probe.calls, vec!["state_id", "variables"]);
    }

    #[test]
    fn decode_surfaces_automaton_rejection() {
        let snapshot = AutomatonSnapshot::new(3, vec![1.0, 2.0, 3.0]).unwrap();
        let mut probe = OrderProbe {
            reject_variables: true,
            ..OrderProbe::default()
        };
        let result = decode(&snapshot, &mut probe);
        assert!(matches!(result, Err(CycleError::DecodeMismatch { .. })));
    }

    #[test]
    fn decode_rejects_inconsistent_snapshot_before_touching_automaton() {
        let snapshot = AutomatonSnapshot::from_raw_parts(3, 5, vec![1.0]);
        let mut probe = OrderProbe::default();
        let result = decode(&snapshot, &mut probe);
        assert!(matches!(
            result,
            Err(CycleError::MalformedSnapshot {
                declared: 5,
                actual: 1
            })
        ));
        assert!(probe.calls.is_empty());
    }

    #[test]
    fn wrong_variable_count_raises_decode_mismatch() {
        // A consistent record declaring 3 variables, decoded into a
        // statechart that defines exactly 2, must be refused -- never
        // truncated, padded, or defaulted.
        let snapshot = AutomatonSnapshot::new(2, vec![1.0, 2.0, 3.0]).unwrap();
        let mut chart = GermlineStatechart::default();
        let before = chart.variables();
        let result = decode(&snapshot, &mut chart);
        assert!(matches!(result, Err(CycleError::DecodeMismatch { .. })));
        assert_eq!(chart.variables(), before);
    }

    #[test]
    fn unknown_state_id_raises_decode_mismatch() {
        let snapshot = AutomatonSnapshot::new(99, vec![1.0, 2.0]).unwrap();
        let mut chart = GermlineStatechart::default();
        let result = decode(&snapshot, &mut chart);
        assert!(matches!(result, Err(CycleError::DecodeMismatch { .. })));
    }

    #[test]
    fn encode_then_decode_preserves_behavior() {
        let mut stream = RandomStreamRegistry::from_seed(1234);
        let mut original = GermlineStatechart::default();
        original.attach_host(CellId::new());
        original.desynchronize(0.4);

        // Advance the original partway through its cycle.
        for _ in 0..4 {
            let _ = original.advance(1.0, &mut stream);
        }

        let snapshot = encode(&original).unwrap();
        let mut replica = GermlineStatechart::default();
        replica.attach_host(CellId::new());
        decode(&snapshot, &mut replica).unwrap();

        // Both continue from identical stream positions: clone the stream so
        // each consumes the same draws.
        let mut stream_replica = stream.clone();
        let original_tail: Vec<(Option<CellPhase>, bool)> = (0..30)
            .map(|_| {
                let events = original.advance(1.0, &mut stream);
                (events.phase_changed, events.division_ready)
            })
            .collect();
        let replica_tail: Vec<(Option<CellPhase>, bool)> = (0..30)
            .map(|_| {
                let events = replica.advance(1.0, &mut stream_replica);
                (events.phase_changed, events.division_ready)
            })
            .collect();
        assert_eq!(original_tail, replica_tail);
    }
}
