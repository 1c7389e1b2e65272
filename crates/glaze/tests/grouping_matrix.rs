mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{apply_edit, replay, runs};
use glaze::{FilterList, GroupingList, Grouper, ListEvent, ObservableList, UNIQUE};
use glaze_util::Fuzzer;

const ALPHABET: [char; 3] = ['a', 'b', 'c'];

fn expected_flags(list: &[char]) -> Vec<bool> {
    (0..list.len())
        .map(|i| i == 0 || list[i - 1] != list[i])
        .collect()
}

#[test]
fn grouper_matches_recomputed_partition() {
    let fuzzer = Fuzzer::from_u64(17);
    for round in 0..60 {
        let mut list = ObservableList::from(fuzzer.random_list(fuzzer.random_int(0, 10), &ALPHABET));
        let grouper = Rc::new(RefCell::new(Grouper::new(list.as_slice(), |a: &char, b: &char| a.cmp(b))));
        let shared = grouper.clone();
        list.add_listener_fn(move |event: &mut ListEvent<'_, char>| {
            shared
                .borrow_mut()
                .process(event, &mut |_: &glaze::GroupChange<'_, char>| {})
                .unwrap();
        });

        for _ in 0..5 {
            let edits = fuzzer.random_edits(list.len(), fuzzer.random_int(1, 5), &ALPHABET);
            list.begin_event().unwrap();
            for edit in &edits {
                apply_edit(&mut list, edit);
            }
            list.commit_event().unwrap();

            let flags: Vec<bool> = grouper.borrow().barcode().iter().map(|c| c == UNIQUE).collect();
            assert_eq!(flags, expected_flags(list.as_slice()), "round {round}, edits {edits:?}");
        }
    }
}

#[test]
fn grouping_list_events_replay_onto_groups() {
    let fuzzer = Fuzzer::from_u64(99);
    for round in 0..60 {
        let mut list = ObservableList::from(fuzzer.random_list(fuzzer.random_int(0, 10), &ALPHABET));
        let (groups, _) = GroupingList::attach(&mut list, |a: &char, b: &char| a.cmp(b));
        let mirror = Rc::new(RefCell::new(groups.borrow().as_slice().to_vec()));
        let sink = mirror.clone();
        groups
            .borrow_mut()
            .add_listener_fn(move |event: &mut ListEvent<'_, Vec<char>>| {
                replay(&mut sink.borrow_mut(), event);
            });

        for _ in 0..5 {
            let edits = fuzzer.random_edits(list.len(), fuzzer.random_int(1, 5), &ALPHABET);
            list.begin_event().unwrap();
            for edit in &edits {
                apply_edit(&mut list, edit);
            }
            list.commit_event().unwrap();

            let expected = runs(list.as_slice());
            assert_eq!(groups.borrow().as_slice(), expected.as_slice(), "round {round}");
            assert_eq!(*mirror.borrow(), expected, "round {round}, edits {edits:?}");
        }
    }
}

#[test]
fn filter_list_tracks_random_edits() {
    let fuzzer = Fuzzer::from_u64(3);
    let mut list = ObservableList::from(fuzzer.random_list(8, &ALPHABET));
    let (filtered, _) = FilterList::attach(&mut list, |c: &char| *c != 'b');
    let mirror = Rc::new(RefCell::new(filtered.borrow().as_slice().to_vec()));
    let sink = mirror.clone();
    filtered
        .borrow_mut()
        .add_listener_fn(move |event: &mut ListEvent<'_, char>| {
            replay(&mut sink.borrow_mut(), event);
        });

    for _ in 0..100 {
        let edits = fuzzer.random_edits(list.len(), fuzzer.random_int(1, 4), &ALPHABET);
        list.begin_event().unwrap();
        for edit in &edits {
            apply_edit(&mut list, edit);
        }
        list.commit_event().unwrap();

        let expected: Vec<char> = list.iter().copied().filter(|c| *c != 'b').collect();
        assert_eq!(filtered.borrow().as_slice(), expected.as_slice());
        assert_eq!(*mirror.borrow(), expected);
    }
}
