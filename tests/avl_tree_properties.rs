//! Properties of AvlTree checked through its public structural
//! accessors (height, balance, left, right, root).

use immutable_avltree::{AvlTree, Comparator, Descending, NoSuchElement};
use proptest::prelude::*;
use rstest::rstest;
use std::collections::BTreeMap;

// =============================================================================
// Helpers
// =============================================================================

/// Walk the tree and check the cached heights, the balance factors, and
/// the key order. Returns the height.
fn check_avl<K, V, C>(t: &AvlTree<K, V, C>) -> usize
where
    K: Ord + Clone,
    C: Comparator<K> + Clone,
{
    match t.root() {
        None => {
            assert_eq!(t.height(), 0);
            assert_eq!(t.balance(), 0);
            assert!(t.is_empty());
            0
        }
        Some((k, _)) => {
            let (l, r) = (t.left(), t.right());
            if let Ok((lk, _)) = l.last() {
                assert_eq!(t.comparator().compare(lk, k), std::cmp::Ordering::Less);
            }
            if let Ok((rk, _)) = r.first() {
                assert_eq!(t.comparator().compare(rk, k), std::cmp::Ordering::Greater);
            }
            let (hl, hr) = (check_avl(&l), check_avl(&r));
            assert_eq!(t.height(), 1 + hl.max(hr));
            assert_eq!(t.balance(), hl as i32 - hr as i32);
            assert!(t.balance().abs() <= 1, "unbalanced at height {}", t.height());
            assert_eq!(t.len(), 1 + l.len() + r.len());
            t.height()
        }
    }
}

fn build(keys: &[i32]) -> AvlTree<i32, String> {
    keys.iter()
        .fold(AvlTree::new(), |t, k| t.put(*k, format!("v{}", k)))
}

fn keys<V>(t: &AvlTree<i32, V>) -> Vec<i32> {
    t.keys().copied().collect()
}

#[derive(Debug, Clone)]
enum Op {
    Put(i16, u8),
    Remove(i16),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (-64i16..64, any::<u8>()).prop_map(|(k, v)| Op::Put(k, v)),
        2 => (-64i16..64).prop_map(Op::Remove),
    ]
}

// =============================================================================
// Rotation Scenarios
// =============================================================================

#[rstest]
#[case::right_right(&[1, 2, 3])]
#[case::left_left(&[3, 2, 1])]
#[case::right_left(&[1, 3, 2])]
#[case::left_right(&[3, 1, 2])]
fn test_three_inserts_rotate_to_middle(#[case] order: &[i32]) {
    let t = build(order);
    assert_eq!(t.root(), Some((&2, &"v2".to_string())));
    assert_eq!(t.left().root().map(|(k, _)| *k), Some(1));
    assert_eq!(t.right().root().map(|(k, _)| *k), Some(3));
    assert_eq!(t.height(), 2);
    assert_eq!(t.balance(), 0);
}

#[rstest]
#[case(&[], 0)]
#[case(&[7], 1)]
#[case(&[1, 2, 3, 4, 5, 6, 7], 3)]
#[case(&[1, 2, 3, 4, 5, 6, 7, 8], 4)]
fn test_sequential_inserts_height(#[case] order: &[i32], #[case] height: usize) {
    let t = build(order);
    check_avl(&t);
    assert_eq!(t.height(), height);
}

// =============================================================================
// Removal
// =============================================================================

#[rstest]
fn test_remove_first_of_example_tree() {
    let t = build(&[5, 3, 8, 1, 4, 7, 9]);
    let (rest, first) = t.remove_first().unwrap();
    assert_eq!(first, (1, "v1".to_string()));
    assert_eq!(keys(&rest), vec![3, 4, 5, 7, 8, 9]);
    check_avl(&rest);
    // the original is untouched
    assert_eq!(keys(&t), vec![1, 3, 4, 5, 7, 8, 9]);
}

#[rstest]
fn test_remove_last_of_example_tree() {
    let t = build(&[5, 3, 8, 1, 4, 7, 9]);
    let (rest, last) = t.remove_last().unwrap();
    assert_eq!(last, (9, "v9".to_string()));
    assert_eq!(keys(&rest), vec![1, 3, 4, 5, 7, 8]);
    check_avl(&rest);
}

#[rstest]
fn test_remove_from_empty_is_noop() {
    let t: AvlTree<i32, String> = AvlTree::new();
    let t2 = t.remove(&3);
    assert!(t2.is_empty());
    assert_eq!(t2.height(), 0);
    assert_eq!(t2.remove_first().err(), Some(NoSuchElement));
    assert_eq!(t2.remove_last().err(), Some(NoSuchElement));
}

#[rstest]
fn test_remove_root_with_two_children() {
    let t = build(&[5, 3, 8, 1, 4, 7, 9]);
    let t2 = t.remove(&5);
    check_avl(&t2);
    // the in order successor replaces the removed root
    assert_eq!(t2.root().map(|(k, _)| *k), Some(7));
    assert_eq!(keys(&t2), vec![1, 3, 4, 7, 8, 9]);
}

// =============================================================================
// Filter / Map
// =============================================================================

#[rstest]
fn test_filter_keys_rebalances() {
    let t = build(&(0..100).collect::<Vec<_>>());
    let small = t.filter_keys(|k| *k < 10 || *k == 99);
    check_avl(&small);
    assert_eq!(keys(&small), (0..10).chain(Some(99)).collect::<Vec<_>>());
}

#[rstest]
fn test_filter_values() {
    let t = build(&(0..50).collect::<Vec<_>>());
    let sevens = t.filter_values(|v| v.ends_with('7'));
    check_avl(&sevens);
    assert_eq!(keys(&sevens), vec![7, 17, 27, 37, 47]);
}

#[rstest]
fn test_map_values_shape() {
    let t = build(&[40, 20, 60, 10, 30, 50, 70, 5]);
    let lens = t.map_values(|v| v.len());
    assert_eq!(lens.height(), t.height());
    assert_eq!(lens.balance(), t.balance());
    assert_eq!(lens.root().map(|(k, _)| *k), t.root().map(|(k, _)| *k));
    assert_eq!(keys(&lens), keys(&t));
    assert_eq!(lens.get(&5), Some(&2));
    assert_eq!(lens.get(&40), Some(&3));
}

#[rstest]
fn test_descending_order() {
    let t = [3, 1, 2]
        .iter()
        .fold(AvlTree::with_comparator(Descending), |t, k| t.put(*k, ()));
    check_avl(&t);
    assert_eq!(t.keys().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
    assert_eq!(t.remove_first().unwrap().1, (3, ()));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_ops_match_model_and_stay_balanced(ops in prop::collection::vec(op(), 0..200)) {
        let mut t: AvlTree<i16, u8> = AvlTree::new();
        let mut model = BTreeMap::new();
        let mut history = vec![(t.clone(), model.clone())];
        for op in ops {
            match op {
                Op::Put(k, v) => {
                    t = t.put(k, v);
                    model.insert(k, v);
                }
                Op::Remove(k) => {
                    t = t.remove(&k);
                    model.remove(&k);
                }
            }
            check_avl(&t);
            history.push((t.clone(), model.clone()));
        }
        // every version still reads the way it did when it was made
        for (t, m) in &history {
            prop_assert!(t.iter().eq(m.iter()));
            prop_assert_eq!(t.len(), m.len());
        }
    }

    #[test]
    fn prop_replace_keeps_shape(ks in prop::collection::vec(-500i32..500, 1..100), v1 in any::<u8>(), v2 in any::<u8>()) {
        let t: AvlTree<i32, u8> = ks.iter().map(|k| (*k, 0)).collect();
        let k = ks[0];
        let a = t.put(k, v1).put(k, v2);
        let b = t.put(k, v2);
        prop_assert_eq!(a.height(), b.height());
        prop_assert_eq!(a.height(), t.height());
        prop_assert_eq!(a.root().map(|(k, _)| *k), t.root().map(|(k, _)| *k));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_filter_is_balanced(ks in prop::collection::vec(any::<i32>(), 0..300), m in 1i32..7) {
        let t: AvlTree<i32, i32> = ks.iter().map(|k| (*k, *k)).collect();
        let f = t.filter_keys(|k| k % m == 0);
        check_avl(&f);
        prop_assert!(f.keys().all(|k| k % m == 0));
        prop_assert_eq!(f.len(), t.keys().filter(|k| *k % m == 0).count());
    }

    #[test]
    fn prop_drain_first_is_sorted(ks in prop::collection::vec(any::<i16>(), 0..200)) {
        let mut t: AvlTree<i16, ()> = ks.iter().map(|k| (*k, ())).collect();
        let mut out = Vec::new();
        while let Ok((rest, (k, ()))) = t.remove_first() {
            check_avl(&rest);
            out.push(k);
            t = rest;
        }
        let mut expected = ks.clone();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(out, expected);
    }
}
