//! A derived list showing the elements of a source list that match a
//! predicate.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use glaze_forest::{Barcode, Colour};

use crate::error::ListError;
use crate::event::{ChangeKind, ListEvent, ListEventAssembler, ListEventListener, ListenerId, SharedListener};
use crate::observable_list::ObservableList;

const SHOWN: Colour = Colour::Black;
const HIDDEN: Colour = Colour::White;

/// Membership is a [`Barcode`] over source indices, so the filtered index of
/// a source element is the number of shown elements before it.
pub struct FilterList<T> {
    predicate: Box<dyn Fn(&T) -> bool>,
    flags: Barcode,
    elements: Vec<T>,
    assembler: ListEventAssembler<T>,
}

impl<T: Clone> FilterList<T> {
    pub fn new<P>(source: &[T], predicate: P) -> Self
    where
        P: Fn(&T) -> bool + 'static,
    {
        let mut flags = Barcode::new();
        let mut elements = Vec::new();
        for value in source {
            let shown = predicate(value);
            if shown {
                elements.push(value.clone());
            }
            flags.push(if shown { SHOWN } else { HIDDEN }, 1);
        }
        Self {
            predicate: Box::new(predicate),
            flags,
            elements,
            assembler: ListEventAssembler::new(),
        }
    }

    /// Builds a filter over `source` and registers it as a listener.
    pub fn attach<P>(source: &mut ObservableList<T>, predicate: P) -> (Rc<RefCell<Self>>, ListenerId)
    where
        T: 'static,
        P: Fn(&T) -> bool + 'static,
    {
        let list = Rc::new(RefCell::new(Self::new(source.as_slice(), predicate)));
        let id = source.add_listener(list.clone());
        (list, id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    /// Source index of the element at filtered `index`.
    pub fn source_index(&self, index: usize) -> Option<usize> {
        self.flags.get_index(index, SHOWN).ok()
    }

    /// Replaces the predicate and reports the elements that appear or
    /// disappear. `source` must be the current contents of the source list.
    pub fn set_predicate<P>(&mut self, predicate: P, source: &[T]) -> Result<(), ListError>
    where
        P: Fn(&T) -> bool + 'static,
    {
        if source.len() != self.flags.len() {
            return Err(ListError::IndexOutOfBounds {
                index: source.len(),
                len: self.flags.len(),
            });
        }
        self.predicate = Box::new(predicate);
        self.assembler.begin_event()?;
        let mut at = 0;
        for (i, value) in source.iter().enumerate() {
            let was = self.flags.get(i)? == SHOWN;
            match (was, (self.predicate)(value)) {
                (true, true) => at += 1,
                (true, false) => {
                    let old = self.elements.remove(at);
                    self.assembler.element_deleted(at, old)?;
                    self.flags.set(i, HIDDEN, 1)?;
                }
                (false, true) => {
                    self.elements.insert(at, value.clone());
                    self.assembler.element_inserted(at)?;
                    self.flags.set(i, SHOWN, 1)?;
                    at += 1;
                }
                (false, false) => {}
            }
        }
        self.assembler.commit_event(&self.elements)?;
        Ok(())
    }

    fn apply(&mut self, event: &mut ListEvent<'_, T>) -> Result<(), ListError> {
        let source = event.source();
        self.assembler.begin_event()?;
        event.reset();
        while event.next() {
            let i = event.index();
            match event.kind() {
                ChangeKind::Insert => {
                    let value = &source[i];
                    if (self.predicate)(value) {
                        self.flags.add(i, SHOWN, 1)?;
                        let at = self.flags.colour_count_before(i, SHOWN);
                        self.elements.insert(at, value.clone());
                        self.assembler.element_inserted(at)?;
                    } else {
                        self.flags.add(i, HIDDEN, 1)?;
                    }
                }
                ChangeKind::Delete => {
                    if self.flags.get(i)? == SHOWN {
                        let at = self.flags.colour_count_before(i, SHOWN);
                        let old = self.elements.remove(at);
                        self.assembler.element_deleted(at, old)?;
                    }
                    self.flags.remove(i, 1)?;
                }
                ChangeKind::Update => {
                    let value = &source[i];
                    let at = self.flags.colour_count_before(i, SHOWN);
                    match (self.flags.get(i)? == SHOWN, (self.predicate)(value)) {
                        (true, true) => {
                            let old = mem::replace(&mut self.elements[at], value.clone());
                            self.assembler.element_updated(at, old)?;
                        }
                        (true, false) => {
                            let old = self.elements.remove(at);
                            self.assembler.element_deleted(at, old)?;
                            self.flags.set(i, HIDDEN, 1)?;
                        }
                        (false, true) => {
                            self.elements.insert(at, value.clone());
                            self.assembler.element_inserted(at)?;
                            self.flags.set(i, SHOWN, 1)?;
                        }
                        (false, false) => {}
                    }
                }
            }
        }
        self.assembler.commit_event(&self.elements)?;
        Ok(())
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

    pub fn events(&mut self, id: ListenerId) -> Result<ListEvent<'_, T>, ListError> {
        Ok(self.assembler.events_for(id, &self.elements)?)
    }
}

impl<T: Clone> ListEventListener<T> for FilterList<T> {
    fn list_changed(&mut self, event: &mut ListEvent<'_, T>) {
        if let Err(err) = self.apply(event) {
            panic!("filter out of sync with its source: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_source_changes() {
        let mut source = ObservableList::from(vec![1, 2, 3, 4]);
        let (evens, _) = FilterList::attach(&mut source, |v: &i32| v % 2 == 0);
        let cursor = evens.borrow_mut().add_cursor();
        assert_eq!(evens.borrow().as_slice(), &[2, 4]);

        source.push(6).unwrap();
        source.set(0, 8).unwrap();
        source.set(1, 5).unwrap();
        source.remove(3).unwrap();
        assert_eq!(evens.borrow().as_slice(), &[8, 6]);
        assert_eq!(evens.borrow().source_index(1), Some(3));

        let mut evens = evens.borrow_mut();
        let mut event = evens.events(cursor).unwrap();
        let mut seen = event.drain_changes();
        while event.next_atomic_change() {
            seen.extend(event.drain_changes());
        }
        assert_eq!(
            seen,
            vec![
                (2, ChangeKind::Insert),
                (0, ChangeKind::Insert),
                (1, ChangeKind::Delete),
                (1, ChangeKind::Delete)
            ]
        );
    }

    #[test]
    fn changing_predicate_reports_delta() {
        let source = vec![1, 2, 3, 4, 5];
        let mut filter = FilterList::new(&source, |v: &i32| *v < 3);
        let cursor = filter.add_cursor();
        filter.set_predicate(|v: &i32| v % 2 == 1, &source).unwrap();
        assert_eq!(filter.as_slice(), &[1, 3, 5]);
        let changes = filter.events(cursor).unwrap().drain_changes();
        assert_eq!(
            changes,
            vec![
                (1, ChangeKind::Delete),
                (1, ChangeKind::Insert),
                (2, ChangeKind::Insert)
            ]
        );
    }
}
