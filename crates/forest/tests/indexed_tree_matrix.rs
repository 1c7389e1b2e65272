use glaze_forest::{ForestError, IndexedTree};
use glaze_util::{Edit, Fuzzer};
use proptest::prelude::*;

fn assert_indices<V>(tree: &IndexedTree<V>) {
    for i in 0..tree.len() {
        let node = tree.get(i).unwrap();
        assert_eq!(tree.index_of(node).unwrap(), i);
    }
}

#[test]
fn positional_ladder_matrix() {
    let mut tree = IndexedTree::new();
    for i in 0..300 {
        tree.insert_at(i, i).unwrap();
        tree.assert_valid().unwrap();
    }
    assert_indices(&tree);
    for i in (0..300).step_by(3).rev() {
        assert_eq!(tree.remove_at(i).unwrap(), i);
        tree.assert_valid().unwrap();
    }
    assert_eq!(tree.len(), 200);
    assert!(tree.iter().all(|v| v % 3 != 0));
    assert_indices(&tree);
}

#[test]
fn sorted_duplicates_matrix() {
    let mut tree = IndexedTree::with_comparator(|a: &(i32, u32), b: &(i32, u32)| a.0.cmp(&b.0));
    for (n, key) in [5, 1, 5, 3, 1, 5].into_iter().enumerate() {
        tree.insert((key, n as u32)).unwrap();
    }
    // Equal keys keep insertion order.
    let values: Vec<_> = tree.iter().copied().collect();
    assert_eq!(values, vec![(1, 1), (1, 4), (3, 3), (5, 0), (5, 2), (5, 5)]);
    assert_eq!(tree.find_index(&(5, 99)).unwrap(), Some(3));
    assert_eq!(tree.find_index(&(4, 0)).unwrap(), None);
    assert_eq!(tree.insert_at(0, (0, 0)), Err(ForestError::WrongMode));
}

#[test]
fn stale_handles_matrix() {
    let mut tree = IndexedTree::new();
    let a = tree.insert_at(0, 'a').unwrap();
    let b = tree.insert_at(1, 'b').unwrap();
    tree.remove(a).unwrap();
    assert_eq!(tree.index_of(a), Err(ForestError::StaleNode));
    assert_eq!(tree.index_of(b).unwrap(), 0);

    // The freed slot is refilled, the old handle stays dead.
    let c = tree.insert_at(0, 'c').unwrap();
    assert_eq!(tree.value(a), Err(ForestError::StaleNode));
    assert_eq!(tree.set(a, 'x'), Err(ForestError::StaleNode));
    assert_eq!(*tree.value(c).unwrap(), 'c');
    assert_eq!(tree.iter().copied().collect::<String>(), "cb");
}

#[test]
fn seeded_random_workloads_match_vec() {
    for seed in 0..20u64 {
        let fuzzer = Fuzzer::from_u64(seed);
        let mut model: Vec<u8> = Vec::new();
        let mut tree = IndexedTree::new();
        for edit in fuzzer.random_edits(0, 300, &[1u8, 2, 3, 4]) {
            match &edit {
                Edit::Insert(i, v) => {
                    tree.insert_at(*i, *v).unwrap();
                }
                Edit::Remove(i) => {
                    tree.remove_at(*i).unwrap();
                }
                Edit::Set(i, v) => {
                    let node = tree.get(*i).unwrap();
                    tree.set(node, *v).unwrap();
                }
            }
            edit.apply(&mut model);
        }
        assert_eq!(tree.iter().copied().collect::<Vec<_>>(), model, "seed={seed}");
        tree.assert_valid().unwrap();
    }
}

proptest! {
    #[test]
    fn node_index_matches_position(ops in prop::collection::vec((any::<bool>(), 0usize..64), 1..120)) {
        let mut tree = IndexedTree::new();
        for (n, (insert, at)) in ops.into_iter().enumerate() {
            if insert || tree.is_empty() {
                let at = at % (tree.len() + 1);
                tree.insert_at(at, n).unwrap();
            } else {
                tree.remove_at(at % tree.len()).unwrap();
            }
            for i in 0..tree.len() {
                let node = tree.get(i).unwrap();
                prop_assert_eq!(tree.index_of(node).unwrap(), i);
            }
        }
        prop_assert!(tree.assert_valid().is_ok());
    }
}
