use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::ops::Bound;

use cursor_btree::less::Descending;
use cursor_btree::{Map, Natural};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

mod common;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

/// A key range small enough that puts and deletes collide.
fn key_strategy() -> impl Strategy<Value = i64> {
    -1_500i64..1_500i64
}

fn bound_strategy() -> impl Strategy<Value = Bound<i64>> {
    prop_oneof![
        1 => Just(Bound::Unbounded),
        3 => key_strategy().prop_map(Bound::Included),
        3 => key_strategy().prop_map(Bound::Excluded),
    ]
}

fn in_bounds(key: i64, lower: Bound<i64>, upper: Bound<i64>) -> bool {
    let above = match lower {
        Bound::Unbounded => true,
        Bound::Included(lower) => key >= lower,
        Bound::Excluded(lower) => key > lower,
    };
    let below = match upper {
        Bound::Unbounded => true,
        Bound::Included(upper) => key <= upper,
        Bound::Excluded(upper) => key < upper,
    };
    above && below
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum MapOp {
    Put(i64, i64),
    Delete(i64),
    Get(i64),
    Lookup(i64),
    Contains(i64),
    First,
    Last,
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        5 => (key_strategy(), any::<i64>()).prop_map(|(k, v)| MapOp::Put(k, v)),
        4 => key_strategy().prop_map(MapOp::Delete),
        2 => key_strategy().prop_map(MapOp::Get),
        1 => key_strategy().prop_map(MapOp::Lookup),
        1 => key_strategy().prop_map(MapOp::Contains),
        1 => Just(MapOp::First),
        1 => Just(MapOp::Last),
    ]
}

// ─── Core operations ─────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays random operations on both `Map` and `BTreeMap` and checks identical
    /// results and a structurally valid tree at every step.
    #[test]
    fn map_ops_match_btreemap(ops in proptest::collection::vec(map_op_strategy(), TEST_SIZE)) {
        common::init_tracing();
        let map: Map<i64, i64> = Map::new();
        let mut oracle: BTreeMap<i64, i64> = BTreeMap::new();

        for op in ops {
            match op {
                MapOp::Put(k, v) => prop_assert_eq!(map.put(k, v), oracle.insert(k, v)),
                MapOp::Delete(k) => prop_assert_eq!(map.delete(&k), oracle.remove(&k)),
                MapOp::Get(k) => prop_assert_eq!(map.get(&k), oracle.get(&k).copied()),
                MapOp::Lookup(k) => {
                    prop_assert_eq!(map.lookup(&k, |v| v.wrapping_mul(3)), oracle.get(&k).map(|v| v.wrapping_mul(3)));
                }
                MapOp::Contains(k) => prop_assert_eq!(map.contains(&k), oracle.contains_key(&k)),
                MapOp::First => prop_assert_eq!(map.first(), oracle.first_key_value().map(|(k, v)| (*k, *v))),
                MapOp::Last => prop_assert_eq!(map.last(), oracle.last_key_value().map(|(k, v)| (*k, *v))),
            }
            prop_assert_eq!(map.len(), oracle.len());
            prop_assert_eq!(map.validate(), Ok(()));
        }

        let entries: Vec<(i64, i64)> = map.iter().collect();
        let expected: Vec<(i64, i64)> = oracle.into_iter().collect();
        prop_assert_eq!(entries, expected);
    }

    /// Both range directions agree with a filtered `BTreeMap` for arbitrary bounds,
    /// including inverted ones.
    #[test]
    fn ranges_match_filtered_btreemap(
        keys in proptest::collection::btree_set(key_strategy(), 0..1_500),
        lower in bound_strategy(),
        upper in bound_strategy(),
    ) {
        let map: Map<i64, i64> = keys.iter().map(|&k| (k, -k)).collect();
        let expected: Vec<(i64, i64)> = keys
            .iter()
            .filter(|&&k| in_bounds(k, lower, upper))
            .map(|&k| (k, -k))
            .collect();

        prop_assert_eq!(map.range((lower, upper)).collect::<Vec<_>>(), expected.clone());
        let mut reversed: Vec<(i64, i64)> = map.range_reverse((lower, upper)).collect();
        reversed.reverse();
        prop_assert_eq!(reversed, expected);
    }
}

// ─── Deterministic scenarios ─────────────────────────────────────────────────

#[test]
fn range_over_a_dense_map() {
    let map: Map<i32, i32> = (0..128).map(|k| (k, k * k)).collect();

    let forward: Vec<i32> = map.range((Bound::Included(5), Bound::Included(16))).map(|(k, _)| k).collect();
    assert_eq!(forward, (5..=16).collect::<Vec<_>>());

    let backward: Vec<i32> = map.range_reverse(5..=16).map(|(k, _)| k).collect();
    assert_eq!(backward, (5..=16).rev().collect::<Vec<_>>());

    assert_eq!(map.range(..).count(), 128);
    assert_eq!(map.range_reverse(120..).next(), Some((127, 127 * 127)));
}

#[test]
fn empty_map_answers_none() {
    let map: Map<u8, u8> = Map::new();
    assert!(map.is_empty());
    assert_eq!(map.first(), None);
    assert_eq!(map.last(), None);
    assert_eq!(map.get(&0), None);
    assert_eq!(map.delete(&0), None);
    assert_eq!(map.iter().next(), None);
    assert_eq!(map.range_reverse(..).next(), None);
    assert!(!map.cursor().is_positioned());
    assert_eq!(map.height(), 1);
    map.validate().unwrap();
}

#[test]
fn grows_and_shrinks_through_many_levels() {
    common::init_tracing();
    let map = Map::new();
    for k in 0..50_000u32 {
        map.put(k, k);
    }
    assert_eq!(map.len(), 50_000);
    assert!(map.height() >= 3);
    map.validate().unwrap();

    // Remove from the middle outwards to exercise merges on both sides.
    for k in (0..25_000u32).rev().chain(25_000..50_000) {
        assert_eq!(map.delete(&k), Some(k));
    }
    assert!(map.is_empty());
    assert_eq!(map.height(), 1);
    map.validate().unwrap();
}

#[test]
fn overwrite_keeps_the_original_key() {
    // Case-insensitive ordering: "Key" and "KEY" are the same key.
    let map = Map::with_less(|a: &String, b: &String| a.to_lowercase() < b.to_lowercase());
    map.put(String::from("Key"), 1);
    assert_eq!(map.put(String::from("KEY"), 2), Some(1));
    assert_eq!(map.len(), 1);
    assert_eq!(map.first(), Some((String::from("Key"), 2)));
}

#[test]
fn custom_orderings_match_reversed_btreemap() {
    let descending = Map::with_less(Descending(Natural));
    let closure = Map::with_less(|a: &i64, b: &i64| b < a);
    let mut oracle = BTreeMap::new();

    for k in (0..3_000i64).map(|k| (k * 7_919) % 3_001) {
        descending.put(k, k);
        closure.put(k, k);
        oracle.insert(Reverse(k), k);
    }

    let expected: Vec<i64> = oracle.keys().map(|k| k.0).collect();
    assert_eq!(descending.iter().map(|(k, _)| k).collect::<Vec<_>>(), expected);
    assert_eq!(closure.iter().map(|(k, _)| k).collect::<Vec<_>>(), expected);
    descending.validate().unwrap();
    closure.validate().unwrap();
}

#[test]
fn handles_share_one_tree() {
    let a: Map<&str, u32> = Map::default();
    let b = a.clone();
    a.put("x", 1);
    b.put("y", 2);
    assert_eq!(a.len(), 2);
    assert_eq!(format!("{b:?}"), r#"{"x": 1, "y": 2}"#);

    let mut c = b.clone();
    c.extend([("z", 3)]);
    assert_eq!(a.last(), Some(("z", 3)));
}

#[test]
fn conversions_build_sorted_maps() {
    let from_array = Map::from([(3, 'c'), (1, 'a'), (2, 'b'), (1, 'z')]);
    assert_eq!(from_array.iter().collect::<Vec<_>>(), [(1, 'z'), (2, 'b'), (3, 'c')]);

    let mut seen = Vec::new();
    for (k, v) in &from_array {
        seen.push((k, v));
    }
    assert_eq!(seen.len(), 3);
}

#[test]
fn iteration_tolerates_deleting_the_current_entry() {
    let map: Map<u32, u32> = (0..1_000).map(|k| (k, k)).collect();
    let mut seen = Vec::new();
    for (k, _) in map.iter() {
        seen.push(k);
        map.delete(&k);
    }
    assert_eq!(seen, (0..1_000).collect::<Vec<_>>());
    assert!(map.is_empty());
    map.validate().unwrap();
}

#[test]
fn iteration_sees_inserts_ahead_but_not_behind() {
    let map: Map<u32, ()> = (0..100).map(|k| (k * 10, ())).collect();
    let mut seen = Vec::new();
    for (k, ()) in map.range(..500) {
        seen.push(k);
        if k == 100 {
            map.put(105, ());
            map.put(5, ());
        }
    }
    let mut expected: Vec<u32> = (0..50).map(|k| k * 10).collect();
    expected.insert(11, 105);
    assert_eq!(seen, expected);
    assert_eq!(map.first(), Some((0, ())));
    assert!(map.contains(&5));
}

#[test]
fn extend_from_its_own_range() {
    let map: Map<i32, i32> = (0..10).map(|k| (k, k)).collect();
    let mut handle = map.clone();
    handle.extend(map.range(..10).map(|(k, v)| (k + 100, v)));

    assert_eq!(map.len(), 20);
    let expected: Vec<(i32, i32)> = (0..10).map(|k| (k, k)).chain((0..10).map(|k| (k + 100, k))).collect();
    assert_eq!(map.iter().collect::<Vec<_>>(), expected);
    map.validate().unwrap();
}

#[test]
fn reverse_range_tolerates_deletes_on_both_sides() {
    common::init_tracing();
    let map: Map<u32, u32> = (0..=3_000).map(|k| (k, k)).collect();
    let mut seen = Vec::new();
    for (k, _) in map.range_reverse(..) {
        seen.push(k);
        // Ahead of the walk.
        if k % 3 == 0 && k > 0 {
            map.delete(&(k - 1));
        }
        // Behind it.
        map.delete(&(k + 1));
        map.validate().unwrap();
    }

    assert_eq!(seen, (0..=3_000).rev().filter(|k| k % 3 != 2).collect::<Vec<_>>());
    assert_eq!(map.len(), 1_001);
    assert!(map.iter().all(|(k, _)| k % 3 == 0));
}
