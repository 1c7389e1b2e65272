#![allow(dead_code)]

use glaze::{ChangeKind, ListEvent};
use glaze_util::Edit;

/// Applies the current atomic change of `event` to `mirror`, checking every
/// reported old value on the way.
pub fn replay<T: Clone + PartialEq + std::fmt::Debug>(mirror: &mut Vec<T>, event: &mut ListEvent<'_, T>) {
    while event.next() {
        let i = event.index();
        match event.kind() {
            ChangeKind::Insert => mirror.insert(i, event.new_value().unwrap().clone()),
            ChangeKind::Delete => {
                let old = mirror.remove(i);
                assert_eq!(Some(&old), event.old_value(), "delete at {i}");
            }
            ChangeKind::Update => {
                let new = event.new_value().unwrap().clone();
                let old = std::mem::replace(&mut mirror[i], new);
                assert_eq!(Some(&old), event.old_value(), "update at {i}");
            }
        }
    }
}

/// Replays every atomic change of a pull cursor.
pub fn replay_all<T: Clone + PartialEq + std::fmt::Debug>(mirror: &mut Vec<T>, event: &mut ListEvent<'_, T>) {
    if event.atomic_change_count() == 0 {
        return;
    }
    loop {
        replay(mirror, event);
        if !event.next_atomic_change() {
            break;
        }
    }
}

/// Applies a random edit through the observable list API.
pub fn apply_edit<T: Clone>(list: &mut glaze::ObservableList<T>, edit: &Edit<T>) {
    match edit {
        Edit::Insert(i, v) => list.insert(*i, v.clone()).unwrap(),
        Edit::Remove(i) => {
            list.remove(*i).unwrap();
        }
        Edit::Set(i, v) => {
            list.set(*i, v.clone()).unwrap();
        }
    }
}

/// Groups of consecutive equal elements.
pub fn runs<T: Clone + PartialEq>(list: &[T]) -> Vec<Vec<T>> {
    let mut out: Vec<Vec<T>> = Vec::new();
    for v in list {
        match out.last_mut() {
            Some(group) if group[0] == *v => group.push(v.clone()),
            _ => out.push(vec![v.clone()]),
        }
    }
    out
}
