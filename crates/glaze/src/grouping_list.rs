//! A derived list of groups: each element is a `Vec` of consecutive source
//! elements that compare equal.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::mem;
use std::rc::Rc;

use tracing::trace;

use crate::error::ListError;
use crate::event::{ChangeKind, ListEvent, ListEventAssembler, ListEventListener, ListenerId, SharedListener};
use crate::grouper::{GroupChange, Grouper, UNIQUE};
use crate::observable_list::ObservableList;

pub struct GroupingList<T> {
    grouper: Grouper<T>,
    groups: Vec<Vec<T>>,
    assembler: ListEventAssembler<Vec<T>>,
}

impl<T: Clone> GroupingList<T> {
    pub fn new<C>(source: &[T], comparator: C) -> Self
    where
        C: Fn(&T, &T) -> Ordering + 'static,
    {
        let grouper = Grouper::new(source, comparator);
        let mut list = Self {
            grouper,
            groups: Vec::new(),
            assembler: ListEventAssembler::new(),
        };
        list.regroup(source);
        list
    }

    /// Builds a grouping over `source` and registers it as a listener.
    pub fn attach<C>(source: &mut ObservableList<T>, comparator: C) -> (Rc<RefCell<Self>>, ListenerId)
    where
        T: 'static,
        C: Fn(&T, &T) -> Ordering + 'static,
    {
        let list = Rc::new(RefCell::new(Self::new(source.as_slice(), comparator)));
        let id = source.add_listener(list.clone());
        (list, id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[T]> {
        self.groups.get(index).map(Vec::as_slice)
    }

    pub fn as_slice(&self) -> &[Vec<T>] {
        &self.groups
    }

    pub fn grouper(&self) -> &Grouper<T> {
        &self.grouper
    }

    /// Replaces the comparator. The regrouping is reported as one atomic
    /// change that deletes every old group and inserts the new ones.
    pub fn set_comparator<C>(&mut self, comparator: C, source: &[T]) -> Result<(), ListError>
    where
        C: Fn(&T, &T) -> Ordering + 'static,
    {
        self.assembler.begin_event()?;
        let old = mem::take(&mut self.groups);
        self.assembler.delete_range(0, old)?;
        self.grouper.set_comparator(comparator, source);
        self.regroup(source);
        self.assembler.insert_range(0, self.groups.len())?;
        self.assembler.commit_event(&self.groups)?;
        Ok(())
    }

    fn regroup(&mut self, source: &[T]) {
        self.groups.clear();
        for (value, colour) in source.iter().zip(self.grouper.barcode().iter()) {
            match self.groups.last_mut() {
                Some(group) if colour != UNIQUE => group.push(value.clone()),
                _ => self.groups.push(vec![value.clone()]),
            }
        }
    }

    fn apply(&mut self, event: &mut ListEvent<'_, T>) -> Result<(), ListError> {
        let mut changes = Vec::new();
        self.grouper.process(event, &mut |c: &GroupChange<'_, T>| {
            changes.push((c.group_index, c.group_change))
        })?;

        // Group changes are sequential: replaying them on the old groups
        // yields the values the assembler needs. Only the groups they name
        // are read back off the partition.
        let mut stale = vec![false; self.groups.len()];
        self.assembler.begin_event()?;
        for (group, kind) in changes {
            let len = self.groups.len();
            match kind {
                ChangeKind::Insert if group <= len => {
                    self.groups.insert(group, Vec::new());
                    stale.insert(group, true);
                    self.assembler.element_inserted(group)?;
                }
                ChangeKind::Delete if group < len => {
                    let old = self.groups.remove(group);
                    stale.remove(group);
                    self.assembler.element_deleted(group, old)?;
                }
                ChangeKind::Update if group < len => {
                    stale[group] = true;
                    self.assembler.element_updated(group, self.groups[group].clone())?;
                }
                _ => return Err(ListError::IndexOutOfBounds { index: group, len }),
            }
        }

        let source = event.source();
        let count = self.grouper.group_count();
        if self.groups.len() != count {
            return Err(ListError::IndexOutOfBounds {
                index: count,
                len: self.groups.len(),
            });
        }
        let mut rebuilt = 0;
        for (group, _) in stale.iter().enumerate().filter(|(_, &s)| s) {
            let range = self.grouper.group_range(group)?;
            let values = source.get(range.clone()).ok_or(ListError::IndexOutOfBounds {
                index: range.end,
                len: source.len(),
            })?;
            self.groups[group] = values.to_vec();
            rebuilt += 1;
        }
        trace!(groups = self.groups.len(), rebuilt, "regrouped");
        self.assembler.commit_event(&self.groups)?;
        Ok(())
    }

    pub fn add_listener(&mut self, listener: SharedListener<Vec<T>>) -> ListenerId {
        self.assembler.add_listener(listener)
    }

    pub fn add_listener_fn<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&mut ListEvent<'_, Vec<T>>) + 'static,
    {
        self.assembler.add_listener_fn(listener)
    }

    pub fn add_cursor(&mut self) -> ListenerId {
        self.assembler.add_cursor()
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> Result<(), ListError> {
        Ok(self.assembler.remove_listener(id)?)
    }

    pub fn events(&mut self, id: ListenerId) -> Result<ListEvent<'_, Vec<T>>, ListError> {
        Ok(self.assembler.events_for(id, &self.groups)?)
    }
}

impl<T: Clone> ListEventListener<T> for GroupingList<T> {
    fn list_changed(&mut self, event: &mut ListEvent<'_, T>) {
        if let Err(err) = self.apply(event) {
            panic!("grouping out of sync with its source: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_follow_source() {
        let mut source = ObservableList::from(vec!['a', 'a', 'b', 'c', 'c']);
        let (groups, _) = GroupingList::attach(&mut source, |a: &char, b: &char| a.cmp(b));
        assert_eq!(groups.borrow().len(), 3);

        source.set(2, 'a').unwrap();
        assert_eq!(
            groups.borrow().as_slice(),
            &[vec!['a', 'a', 'a'], vec!['c', 'c']]
        );

        source.insert(4, 'x').unwrap();
        assert_eq!(
            groups.borrow().as_slice(),
            &[vec!['a', 'a', 'a'], vec!['c'], vec!['x'], vec!['c']]
        );
    }

    #[test]
    fn group_events_carry_old_groups() {
        let mut source = ObservableList::from(vec![1, 1, 2]);
        let (groups, _) = GroupingList::attach(&mut source, |a: &i32, b: &i32| a.cmp(b));
        let cursor = groups.borrow_mut().add_cursor();

        source.remove(2).unwrap();
        let mut groups = groups.borrow_mut();
        let mut event = groups.events(cursor).unwrap();
        assert!(event.next());
        assert_eq!(event.kind(), ChangeKind::Delete);
        assert_eq!(event.index(), 1);
        assert_eq!(event.old_value(), Some(&vec![2]));
        assert!(!event.next());
    }

    #[test]
    fn changing_comparator_replaces_everything() {
        let source = vec![1, 2, 3, 4];
        let mut groups = GroupingList::new(&source, |a: &i32, b: &i32| a.cmp(b));
        let cursor = groups.add_cursor();
        groups
            .set_comparator(|a: &i32, b: &i32| (a / 2).cmp(&(b / 2)), &source)
            .unwrap();
        assert_eq!(groups.as_slice(), &[vec![1], vec![2, 3], vec![4]]);
        let event = groups.events(cursor).unwrap();
        let kinds: Vec<_> = event.blocks().iter().map(|b| (b.kind(), b.start(), b.len())).collect();
        assert_eq!(
            kinds,
            vec![(ChangeKind::Delete, 0, 4), (ChangeKind::Insert, 0, 3)]
        );
    }

    #[test]
    fn only_named_groups_change() {
        let mut source = ObservableList::from(vec!['a', 'a', 'b', 'c', 'c', 'd']);
        let (groups, _) = GroupingList::attach(&mut source, |a: &char, b: &char| a.cmp(b));
        let cursor = groups.borrow_mut().add_cursor();

        source.insert(2, 'b').unwrap();
        let mut groups = groups.borrow_mut();
        assert_eq!(
            groups.as_slice(),
            &[vec!['a', 'a'], vec!['b', 'b'], vec!['c', 'c'], vec!['d']]
        );
        let mut event = groups.events(cursor).unwrap();
        assert!(event.next());
        assert_eq!((event.kind(), event.index()), (ChangeKind::Update, 1));
        assert_eq!(event.old_value(), Some(&vec!['b']));
        assert_eq!(event.new_value(), Some(&vec!['b', 'b']));
        assert!(!event.next());
    }
}
