use proptest::prelude::*;
use qviz_core::{Ces, Direction, Distinction, ElementSet, Mice};
use smallvec::smallvec;

fn mice(direction: Direction, mechanism: usize, purview: &[usize], phi: f64) -> Mice {
    Mice::new(
        direction,
        ElementSet::new([mechanism]),
        ElementSet::new(purview.iter().copied()),
        phi,
        vec![smallvec![1; purview.len()]],
    )
}

fn arbitrary_indices() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..16usize, 0..12)
}

fn arbitrary_purview() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::btree_set(0..8usize, 1..4).prop_map(|s| s.into_iter().collect())
}

fn arbitrary_ces() -> impl Strategy<Value = Ces> {
    prop::collection::vec(
        (arbitrary_purview(), arbitrary_purview(), 0.0f64..1.0),
        1..6,
    )
    .prop_map(|specs| {
        Ces::new(
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (cp, ep, phi))| {
                    Distinction::new(
                        mice(Direction::Cause, i, &cp, phi),
                        mice(Direction::Effect, i, &ep, phi),
                        phi,
                    )
                    .unwrap()
                })
                .collect(),
        )
    })
}

#[test]
fn element_set_is_sorted_and_deduplicated() {
    proptest!(|(indices in arbitrary_indices())| {
        let set = ElementSet::new(indices.iter().copied());
        let canonical = set.indices();
        prop_assert!(canonical.windows(2).all(|w| w[0] < w[1]));
        for n in &indices {
            prop_assert!(set.contains(*n));
        }
        prop_assert!(canonical.iter().all(|n| indices.contains(n)));
    });
}

#[test]
fn element_set_equality_ignores_input_order() {
    proptest!(|(indices in arbitrary_indices())| {
        let forward = ElementSet::new(indices.iter().copied());
        let reversed = ElementSet::new(indices.iter().rev().copied());
        prop_assert_eq!(forward, reversed);
    });
}

#[test]
fn subset_implies_overlap_for_nonempty_sets() {
    proptest!(|(small in arbitrary_purview(), extra in arbitrary_indices())| {
        let sub = ElementSet::new(small.iter().copied());
        let sup = ElementSet::new(small.iter().copied().chain(extra.iter().copied()));
        prop_assert!(sub.is_subset_of(&sup));
        prop_assert!(sub.overlaps(&sup));
    });
}

#[test]
fn separated_ces_interleaves_causes_and_effects() {
    proptest!(|(ces in arbitrary_ces())| {
        let separated = ces.separate();
        prop_assert_eq!(separated.len(), 2 * ces.len());
        prop_assert_eq!(separated.pair_count(), ces.len());

        for (i, distinction) in ces.iter().enumerate() {
            prop_assert_eq!(separated.entry(2 * i), Some(distinction.cause()));
            prop_assert_eq!(separated.entry(2 * i + 1), Some(distinction.effect()));
        }

        let directions: Vec<Direction> = separated.iter().map(|m| m.direction).collect();
        for (flat, direction) in directions.iter().enumerate() {
            let expected = if flat % 2 == 0 {
                Direction::Cause
            } else {
                Direction::Effect
            };
            prop_assert_eq!(*direction, expected);
        }
    });
}

#[test]
fn position_of_inverts_flat_indexing() {
    proptest!(|(ces in arbitrary_ces())| {
        let separated = ces.separate();
        // Distinct mechanisms per distinction keep all entries value-distinct,
        // so every entry finds exactly its own flat index.
        for flat in 0..separated.len() {
            let entry = separated.entry(flat).unwrap();
            prop_assert_eq!(separated.position_of(entry), Some(flat));
        }
    });
}
