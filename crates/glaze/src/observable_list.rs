//! A `Vec`-backed list that reports every mutation as a change event.

use std::mem;

use crate::diff::{self, DiffOptions, MutableSequence};
use crate::error::{EventError, ListError};
use crate::event::{ListEvent, ListEventAssembler, ListenerId, SharedListener};

/// Each mutation is its own atomic change unless the caller groups several
/// with [`begin_event`](Self::begin_event) / [`commit_event`](Self::commit_event).
pub struct ObservableList<T> {
    data: Vec<T>,
    assembler: ListEventAssembler<T>,
    /// Set while a caller-opened atomic change is in progress.
    explicit: bool,
}

/// Applies diff edits to the backing `Vec` and records each one with the
/// assembler. The first recording failure is kept for the caller.
struct Recorder<'a, T> {
    data: &'a mut Vec<T>,
    assembler: &'a mut ListEventAssembler<T>,
    error: Option<EventError>,
}

impl<T> Recorder<'_, T> {
    fn record(&mut self, result: Result<(), EventError>) {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
    }
}

impl<T> MutableSequence<T> for Recorder<'_, T> {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn get(&self, index: usize) -> &T {
        &self.data[index]
    }

    fn set(&mut self, index: usize, value: T) {
        let old = mem::replace(&mut self.data[index], value);
        let result = self.assembler.element_updated(index, old);
        self.record(result);
    }

    fn insert(&mut self, index: usize, value: T) {
        self.data.insert(index, value);
        let result = self.assembler.element_inserted(index);
        self.record(result);
    }

    fn remove(&mut self, index: usize) {
        let old = self.data.remove(index);
        let result = self.assembler.element_deleted(index, old);
        self.record(result);
    }
}

impl<T: Clone> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> From<Vec<T>> for ObservableList<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            data,
            assembler: ListEventAssembler::new(),
            explicit: false,
        }
    }
}

impl<T: Clone> ObservableList<T> {
    pub fn new() -> Self {
        Vec::new().into()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        <[T]>::get(&self.data, index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Opens an atomic change spanning several mutations.
    pub fn begin_event(&mut self) -> Result<(), ListError> {
        self.assembler.begin_event()?;
        self.explicit = true;
        Ok(())
    }

    pub fn commit_event(&mut self) -> Result<(), ListError> {
        if !self.explicit {
            return Err(EventError::NoTransaction.into());
        }
        self.explicit = false;
        self.assembler.commit_event(&self.data)?;
        Ok(())
    }

    /// Runs `f` inside the open atomic change, or inside one of its own.
    fn write<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R, ListError>) -> Result<R, ListError> {
        if self.explicit {
            return f(self);
        }
        self.assembler.begin_event()?;
        let result = f(self);
        self.assembler.commit_event(&self.data)?;
        result
    }

    fn check(&self, index: usize, len: usize) -> Result<(), ListError> {
        if index >= len {
            return Err(ListError::IndexOutOfBounds { index, len });
        }
        Ok(())
    }

    pub fn push(&mut self, value: T) -> Result<(), ListError> {
        self.write(|list| {
            list.data.push(value);
            list.assembler.element_inserted(list.data.len() - 1)?;
            Ok(())
        })
    }

    pub fn insert(&mut self, index: usize, value: T) -> Result<(), ListError> {
        if index > self.data.len() {
            return Err(ListError::IndexOutOfBounds {
                index,
                len: self.data.len(),
            });
        }
        self.write(|list| {
            list.data.insert(index, value);
            list.assembler.element_inserted(index)?;
            Ok(())
        })
    }

    /// Replaces the element at `index`, returning the old one.
    pub fn set(&mut self, index: usize, value: T) -> Result<T, ListError> {
        self.check(index, self.data.len())?;
        self.write(|list| {
            let old = mem::replace(&mut list.data[index], value);
            list.assembler.element_updated(index, old.clone())?;
            Ok(old)
        })
    }

    pub fn remove(&mut self, index: usize) -> Result<T, ListError> {
        self.check(index, self.data.len())?;
        self.write(|list| {
            let old = list.data.remove(index);
            list.assembler.element_deleted(index, old.clone())?;
            Ok(old)
        })
    }

    pub fn clear(&mut self) -> Result<(), ListError> {
        if self.data.is_empty() {
            return Ok(());
        }
        self.write(|list| {
            let old = mem::take(&mut list.data);
            list.assembler.delete_range(0, old)?;
            Ok(())
        })
    }

    pub fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) -> Result<(), ListError> {
        self.write(|list| {
            let start = list.data.len();
            list.data.extend(values);
            list.assembler.insert_range(start, list.data.len() - start)?;
            Ok(())
        })
    }

    /// Rewrites the list into `source` with the fewest inserts and removes.
    pub fn replace_all(&mut self, source: &[T], options: DiffOptions) -> Result<(), ListError>
    where
        T: PartialEq,
    {
        self.replace_all_with(source, options, |a: &T, b: &T| a == b)
    }

    pub fn replace_all_with<F>(&mut self, source: &[T], options: DiffOptions, eq: F) -> Result<(), ListError>
    where
        F: Fn(&T, &T) -> bool,
    {
        self.write(|list| {
            let mut recorder = Recorder {
                data: &mut list.data,
                assembler: &mut list.assembler,
                error: None,
            };
            diff::replace_all_with(&mut recorder, source, options, eq);
            match recorder.error {
                Some(err) => Err(err.into()),
                None => Ok(()),
            }
        })
    }

    pub fn add_listener(&mut self, listener: SharedListener<T>) -> ListenerId {
        self.assembler.add_listener(listener)
    }

    pub fn add_listener_fn<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&mut ListEvent<'_, T>) + 'static,
    {
        self.assembler.add_listener_fn(listener)
    }

    pub fn add_cursor(&mut self) -> ListenerId {
        self.assembler.add_cursor()
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> Result<(), ListError> {
        Ok(self.assembler.remove_listener(id)?)
    }

    /// Changes committed since cursor `id` last read.
    pub fn events(&mut self, id: ListenerId) -> Result<ListEvent<'_, T>, ListError> {
        Ok(self.assembler.events_for(id, &self.data)?)
    }

    pub fn assembler(&self) -> &ListEventAssembler<T> {
        &self.assembler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ChangeKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn single_mutations_are_atomic() {
        let mut list = ObservableList::from(vec!['a', 'b']);
        let cursor = list.add_cursor();
        list.push('c').unwrap();
        list.remove(0).unwrap();
        let mut event = list.events(cursor).unwrap();
        assert_eq!(event.atomic_change_count(), 2);
        assert_eq!(event.drain_changes(), vec![(2, ChangeKind::Insert)]);
        assert!(event.next_atomic_change());
        assert_eq!(event.drain_changes(), vec![(0, ChangeKind::Delete)]);
    }

    #[test]
    fn out_of_bounds_is_rejected_without_event() {
        let mut list = ObservableList::from(vec![1]);
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        list.add_listener_fn(move |_: &mut ListEvent<'_, i32>| *counter.borrow_mut() += 1);
        assert_eq!(
            list.insert(3, 0),
            Err(ListError::IndexOutOfBounds { index: 3, len: 1 })
        );
        assert_eq!(
            list.remove(1),
            Err(ListError::IndexOutOfBounds { index: 1, len: 1 })
        );
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn explicit_transactions_do_not_nest() {
        let mut list = ObservableList::<u8>::new();
        list.begin_event().unwrap();
        assert_eq!(
            list.begin_event(),
            Err(ListError::Event(EventError::TransactionOpen))
        );
        list.push(1).unwrap();
        list.push(2).unwrap();
        list.commit_event().unwrap();
        assert_eq!(
            list.commit_event(),
            Err(ListError::Event(EventError::NoTransaction))
        );
        assert_eq!(list.assembler().atomic_change_count(), 1);
    }

    #[test]
    fn replace_all_reaches_source() {
        let mut list = ObservableList::from("abcabba".chars().collect::<Vec<_>>());
        let cursor = list.add_cursor();
        let target: Vec<char> = "cbabac".chars().collect();
        list.replace_all(&target, DiffOptions::default()).unwrap();
        assert_eq!(list.as_slice(), target.as_slice());
        let changes = list.events(cursor).unwrap().drain_changes();
        assert_eq!(changes.len(), 5);
    }

    #[test]
    fn replace_all_with_updates_reports_old_and_new_values() {
        let mut list = ObservableList::from(vec!['a', 'B', 'c']);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        list.add_listener_fn(move |event: &mut ListEvent<'_, char>| {
            while event.next() {
                sink.borrow_mut().push((
                    event.kind(),
                    event.index(),
                    event.old_value().copied(),
                    event.new_value().copied(),
                ));
            }
        });

        let source = ['A', 'b', 'X', 'c'];
        list.replace_all_with(&source, DiffOptions { updates: true }, |a: &char, b: &char| {
            a.eq_ignore_ascii_case(b)
        })
        .unwrap();
        assert_eq!(list.as_slice(), &source);
        assert_eq!(
            *seen.borrow(),
            vec![
                (ChangeKind::Update, 0, Some('a'), Some('A')),
                (ChangeKind::Update, 1, Some('B'), Some('b')),
                (ChangeKind::Insert, 2, None, Some('X')),
                (ChangeKind::Update, 3, Some('c'), Some('c')),
            ]
        );
    }
}
