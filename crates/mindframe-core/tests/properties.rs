//! Property tests for the differ and the state delta encoder.

use std::collections::{BTreeMap, HashSet};

use mindframe_core::{
    apply_patches, diff, state, MirrorNode, Node, StateDecoder, StateEncoder, StateSnapshot,
    SyncConfig, SyncUpdate, Value,
};
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-50i64..50).prop_map(Value::Int),
        "[a-z]{0,4}".prop_map(Value::Text),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => scalar(),
        1 => any::<f64>().prop_map(Value::Float),
        1 => prop::collection::vec(scalar(), 0..3).prop_map(Value::List),
    ]
}

fn snapshot_of(values: impl Strategy<Value = Value>) -> impl Strategy<Value = StateSnapshot> {
    prop::collection::btree_map("[a-f]", values, 0..6)
        .prop_map(|entries: BTreeMap<String, Value>| {
            entries.into_iter().collect::<StateSnapshot>()
        })
}

type CellSpec = (i64, i64, Vec<i64>);

fn grid_from(cells: Vec<CellSpec>) -> Node {
    let mut seen = HashSet::new();
    let children = cells
        .into_iter()
        .filter(|(key, _, _)| seen.insert(*key))
        .map(|(key, value, dots)| {
            Node::new("cell")
                .key(key)
                .prop("v", value)
                .children(dots.into_iter().map(|dot| {
                    let tag = if dot % 2 == 0 { "dot" } else { "ring" };
                    Node::new(tag).prop("size", dot).build()
                }))
                .build()
        });
    Node::new("grid").children(children).build()
}

fn grid() -> impl Strategy<Value = Node> {
    prop::collection::vec(
        (0i64..10, 0i64..3, prop::collection::vec(0i64..4, 0..3)),
        0..8,
    )
    .prop_map(grid_from)
}

proptest! {
    /// Applying the delta between two snapshots reproduces the target.
    #[test]
    fn delta_round_trip(prev in snapshot_of(value()), next in snapshot_of(value())) {
        let delta = state::diff(&prev, &next);
        prop_assert_eq!(state::apply(&prev, &delta), next.clone());
        prop_assert_eq!(delta.is_empty(), prev == next);
    }

    /// A serialized update stream replays to the same snapshots.
    #[test]
    fn sync_stream_replays(
        states in prop::collection::vec(snapshot_of(scalar()), 1..12),
        interval in 0u64..5,
    ) {
        let mut encoder = StateEncoder::new(SyncConfig::default().with_full_resend_interval(interval));
        let mut decoder = StateDecoder::new();
        for state in &states {
            if let Some(update) = encoder.observe(state) {
                let json = serde_json::to_string(&update).unwrap();
                let received: SyncUpdate = serde_json::from_str(&json).unwrap();
                decoder.apply(&received).unwrap();
            }
            prop_assert_eq!(decoder.snapshot(), state);
        }
    }

    /// Patches produced by the differ turn the previous tree into the next one.
    #[test]
    fn patches_converge(previous in grid(), next in grid()) {
        let patches = diff(Some(&previous), &next).unwrap();
        let mut roots = MirrorNode::list_from(Some(&previous));
        apply_patches(&mut roots, &patches, &mut ()).unwrap();
        prop_assert_eq!(roots.len(), 1);
        prop_assert_eq!(format!("{:?}", roots[0].to_node()), format!("{:?}", next));
    }

    /// Rebuilding an identical tree never produces patches.
    #[test]
    fn identical_rebuild_is_a_no_op(cells in prop::collection::vec(
        (0i64..10, 0i64..3, prop::collection::vec(0i64..4, 0..3)),
        0..8,
    )) {
        let a = grid_from(cells.clone());
        let b = grid_from(cells);
        prop_assert!(diff(Some(&a), &b).unwrap().is_empty());
    }
}
