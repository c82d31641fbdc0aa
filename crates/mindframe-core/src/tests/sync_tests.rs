use super::*;
use crate::value::Value;
use pretty_assertions::assert_eq;

fn snapshot(round: i64, phase: &str) -> StateSnapshot {
    StateSnapshot::new()
        .with("round", round)
        .with("phase", phase)
        .with("score", 0)
        .with("level", 1)
}

fn encoder(policy: MismatchPolicy) -> StateEncoder {
    StateEncoder::new(SyncConfig::default().with_mismatch_policy(policy))
}

#[test]
fn first_observation_is_full() {
    let mut encoder = StateEncoder::default();
    let update = encoder.observe(&snapshot(1, "show")).expect("update");
    assert_eq!(
        update,
        SyncUpdate::Full {
            version: 1,
            snapshot: snapshot(1, "show"),
        }
    );
}

#[test]
fn unchanged_ticks_emit_nothing() {
    let mut encoder = StateEncoder::default();
    encoder.observe(&snapshot(1, "show"));
    assert_eq!(encoder.observe(&snapshot(1, "show")), None);
    assert_eq!(encoder.observe(&snapshot(1, "show")), None);
    assert_eq!(encoder.version(), 1);
    assert_eq!(encoder.stats().unchanged, 2);
    assert_eq!(encoder.stats().total_updates(), 1);
}

#[test]
fn small_changes_are_deltas_against_previous_version() {
    let mut encoder = StateEncoder::default();
    encoder.observe(&snapshot(1, "show"));
    let update = encoder.observe(&snapshot(1, "recall")).expect("update");
    let SyncUpdate::Delta {
        version,
        base_version,
        delta,
    } = update
    else {
        panic!("expected a delta, got {update:?}");
    };
    assert_eq!((version, base_version), (2, 1));
    assert_eq!(delta.get("phase"), Some(Some(&Value::from("recall"))));
    assert_eq!(delta.len(), 1);
}

#[test]
fn periodic_full_resend() {
    let mut encoder = StateEncoder::new(SyncConfig::default().with_full_resend_interval(3));
    let kinds: Vec<bool> = (0..7)
        .filter_map(|round| encoder.observe(&snapshot(round, "show")))
        .map(|update| update.is_delta())
        .collect();
    assert_eq!(kinds, vec![false, true, false, true, true, false, true]);
    assert_eq!(encoder.stats().full_updates, 3);
}

#[test]
fn delta_as_large_as_snapshot_is_sent_full() {
    let mut encoder = StateEncoder::default();
    encoder.observe(&StateSnapshot::new().with("a", 1).with("b", 1));
    let update = encoder
        .observe(&StateSnapshot::new().with("a", 2).with("b", 2))
        .expect("update");
    assert!(!update.is_delta());
    assert_eq!(update.version(), 2);
}

#[test]
fn decoder_replays_the_stream() {
    let mut encoder = StateEncoder::default();
    let mut decoder = StateDecoder::new();
    let states = [
        snapshot(1, "show"),
        snapshot(1, "recall"),
        snapshot(1, "recall"),
        snapshot(2, "recall").with("streak", 1),
        snapshot(2, "show"),
    ];
    for state in &states {
        if let Some(update) = encoder.observe(state) {
            let json = serde_json::to_string(&update).unwrap();
            let received: SyncUpdate = serde_json::from_str(&json).unwrap();
            decoder.apply(&received).unwrap();
        }
        assert_eq!(decoder.snapshot(), state);
    }
    assert_eq!(decoder.version(), encoder.version());
}

#[test]
fn decoder_rejects_out_of_order_delta() {
    let mut decoder = StateDecoder::new();
    let update = SyncUpdate::Delta {
        version: 5,
        base_version: 4,
        delta: StateDelta::default(),
    };
    assert_eq!(
        decoder.apply(&update).unwrap_err(),
        SyncError::BaseVersionMismatch {
            expected: 0,
            found: 4,
        }
    );
    assert_eq!(decoder.version(), 0);
}

#[test]
fn updates_carry_a_kind_tag() {
    let mut encoder = StateEncoder::default();
    let update = encoder.observe(&snapshot(1, "show")).unwrap();
    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(json["kind"], "full");
    assert_eq!(json["version"], 1);
}

#[test]
fn force_full_resets_the_baseline() {
    let mut encoder = StateEncoder::default();
    encoder.observe(&snapshot(1, "show"));
    encoder.force_full();
    let update = encoder.observe(&snapshot(1, "show")).expect("update");
    assert!(!update.is_delta());
    assert_eq!(update.version(), 2);
}

fn inject_ghost_key(delta: &mut StateDelta) {
    delta.insert_raw("ghost", Some(Value::Bool(true)));
}

#[test]
fn verification_failure_falls_back_to_full() {
    let mut encoder = encoder(MismatchPolicy::ResendFull);
    encoder.observe(&snapshot(1, "show"));
    encoder.tamper = Some(inject_ghost_key);
    let update = encoder.observe(&snapshot(1, "recall")).expect("update");
    assert_eq!(
        update,
        SyncUpdate::Full {
            version: 2,
            snapshot: snapshot(1, "recall"),
        }
    );
    assert_eq!(encoder.stats().forced_full, 1);
}

#[test]
#[should_panic(expected = "does not reproduce")]
fn verification_failure_panics_when_asked() {
    let mut encoder = encoder(MismatchPolicy::Panic);
    encoder.observe(&snapshot(1, "show"));
    encoder.tamper = Some(inject_ghost_key);
    encoder.observe(&snapshot(1, "recall"));
}
