//! Integration tests for the checkpoint archive: exact round-trips, strict
//! rejection of damaged buffers, and the full save/restore replay contract.

#![allow(clippy::unwrap_used)]

use mitosim_archive::{ArchiveError, load_checkpoint, save_checkpoint};
use mitosim_cycle::{CycleError, GermlineStatechart, LifecycleModel};
use mitosim_random::RandomStreamRegistry;
use mitosim_types::{CellId, CellPhase};

type Model = LifecycleModel<GermlineStatechart>;

/// Build a small attached, initialised population advanced by `ticks` hours.
fn population(count: usize, ticks: u32, stream: &mut RandomStreamRegistry) -> Vec<Model> {
    let mut models = Vec::new();
    for _ in 0..count {
        let mut model = Model::fresh();
        model.set_host(CellId::new()).unwrap();
        model.initialise(stream).unwrap();
        models.push(model);
    }
    for _ in 0..ticks {
        for model in &mut models {
            model.update(1.0, stream).unwrap();
        }
    }
    models
}

#[test]
fn roundtrip_preserves_records_and_stream_state() {
    let mut stream = RandomStreamRegistry::from_seed(31);
    let models = population(3, 6, &mut stream);

    let bytes = save_checkpoint(&models, &stream).unwrap();
    let checkpoint = load_checkpoint(&bytes).unwrap();

    assert_eq!(checkpoint.records.len(), 3);
    assert_eq!(checkpoint.stream, stream.state());
    for (record, model) in checkpoint.records.iter().zip(&models) {
        assert_eq!(record.phase, model.current_phase());
        assert_eq!(record.ready_to_divide, model.ready_to_divide());
        assert!((record.age - model.age()).abs() < f64::EPSILON);
        assert_eq!(record.snapshot, model.encode_snapshot().unwrap());
    }
}

#[test]
fn every_truncation_is_rejected() {
    let mut stream = RandomStreamRegistry::from_seed(31);
    let models = population(2, 4, &mut stream);
    let bytes = save_checkpoint(&models, &stream).unwrap();

    // The format has a fixed total length once the declared counts are in;
    // no proper prefix may parse. In particular a cut inside a variable
    // array must surface as truncation, never as a shorter record.
    for len in 0..bytes.len() {
        let result = load_checkpoint(bytes.get(..len).unwrap());
        assert!(result.is_err(), "prefix of {len} bytes unexpectedly parsed");
    }
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut stream = RandomStreamRegistry::from_seed(31);
    let models = population(1, 2, &mut stream);
    let mut bytes = save_checkpoint(&models, &stream).unwrap();
    bytes.push(0);

    assert!(matches!(
        load_checkpoint(&bytes),
        Err(ArchiveError::TrailingBytes { remaining: 1 })
    ));
}

#[test]
fn bad_magic_is_rejected() {
    let mut stream = RandomStreamRegistry::from_seed(31);
    let models = population(1, 2, &mut stream);
    let mut bytes = save_checkpoint(&models, &stream).unwrap();
    if let Some(first) = bytes.first_mut() {
        *first = b'X';
    }

    assert!(matches!(
        load_checkpoint(&bytes),
        Err(ArchiveError::BadMagic { .. })
    ));
}

#[test]
fn unsupported_version_is_rejected() {
    let mut stream = RandomStreamRegistry::from_seed(31);
    let models = population(1, 2, &mut stream);
    let mut bytes = save_checkpoint(&models, &stream).unwrap();
    // Version field sits right after the 4-byte magic.
    bytes
        .get_mut(4..8)
        .unwrap()
        .copy_from_slice(&99_u32.to_le_bytes());

    assert!(matches!(
        load_checkpoint(&bytes),
        Err(ArchiveError::UnsupportedVersion { found: 99 })
    ));
}

#[test]
fn unknown_phase_code_is_rejected() {
    let mut stream = RandomStreamRegistry::from_seed(31);
    let models = population(1, 2, &mut stream);
    let mut bytes = save_checkpoint(&models, &stream).unwrap();
    // First record starts after magic(4) + version(4) + timestamp(8) + count(4).
    bytes
        .get_mut(20..24)
        .unwrap()
        .copy_from_slice(&7_i32.to_le_bytes());

    assert!(matches!(
        load_checkpoint(&bytes),
        Err(ArchiveError::InvalidPhaseCode { found: 7 })
    ));
}

#[test]
fn invalid_ready_flag_is_rejected() {
    let mut stream = RandomStreamRegistry::from_seed(31);
    let models = population(1, 2, &mut stream);
    let mut bytes = save_checkpoint(&models, &stream).unwrap();
    // Readiness flag is the byte after the record's phase code.
    if let Some(flag) = bytes.get_mut(24) {
        *flag = 2;
    }

    assert!(matches!(
        load_checkpoint(&bytes),
        Err(ArchiveError::InvalidReadyFlag { found: 2 })
    ));
}

#[test]
fn negative_variable_count_is_rejected() {
    let mut stream = RandomStreamRegistry::from_seed(31);
    let models = population(1, 2, &mut stream);
    let mut bytes = save_checkpoint(&models, &stream).unwrap();
    // Variable count follows phase(4) + flag(1) + age(8) + state id(4).
    bytes
        .get_mut(37..41)
        .unwrap()
        .copy_from_slice(&(-1_i32).to_le_bytes());

    assert!(matches!(
        load_checkpoint(&bytes),
        Err(ArchiveError::NegativeVariableCount { found: -1 })
    ));
}

#[test]
fn saving_an_unattached_model_is_a_precondition_violation() {
    let stream = RandomStreamRegistry::from_seed(31);
    let models = vec![Model::fresh()];
    let result = save_checkpoint(&models, &stream);
    assert!(matches!(
        result,
        Err(ArchiveError::Cycle(CycleError::PreconditionViolation { .. }))
    ));
}

#[test]
fn restored_population_replays_the_interrupted_run_exactly() {
    // Run a population to hour 12, checkpoint, run 8 more hours recording
    // observations. Then restore from the checkpoint and replay the same 8
    // hours: phases and readiness flags must match tick for tick.
    let mut stream = RandomStreamRegistry::from_seed(4242);
    let mut originals = population(4, 12, &mut stream);
    let bytes = save_checkpoint(&originals, &stream).unwrap();

    let mut expected = Vec::new();
    for _ in 0..8 {
        for model in &mut originals {
            model.update(1.0, &mut stream).unwrap();
            expected.push((model.current_phase(), model.ready_to_divide()));
        }
    }

    let checkpoint = load_checkpoint(&bytes).unwrap();
    let (mut restored, stream_state) = checkpoint
        .into_pending_models::<GermlineStatechart>()
        .unwrap();
    let mut restored_stream = RandomStreamRegistry::restore(stream_state);

    // Post-load fixup pass: bind every model before the first update.
    for model in &mut restored {
        assert!(model.is_pending_rebind());
        model.set_host(CellId::new()).unwrap();
    }

    let mut actual = Vec::new();
    for _ in 0..8 {
        for model in &mut restored {
            model.update(1.0, &mut restored_stream).unwrap();
            actual.push((model.current_phase(), model.ready_to_divide()));
        }
    }

    assert_eq!(expected, actual);
}

#[test]
fn checkpoint_of_a_dividing_cell_restores_the_ready_flag() {
    let mut stream = RandomStreamRegistry::from_seed(9);
    let mut model = Model::fresh();
    model.set_host(CellId::new()).unwrap();
    model.initialise(&mut stream).unwrap();

    // Advance until the cell reports division readiness.
    let mut hours = 0_u32;
    while !model.ready_to_divide() && hours < 200 {
        model.update(0.5, &mut stream).unwrap();
        hours = hours.checked_add(1).unwrap();
    }
    assert!(model.ready_to_divide());
    assert_eq!(model.current_phase(), CellPhase::G1);

    let bytes = save_checkpoint(std::slice::from_ref(&model), &stream).unwrap();
    let checkpoint = load_checkpoint(&bytes).unwrap();
    let record = checkpoint.records.first().unwrap();
    assert!(record.ready_to_divide);
}
