//! Incremental partition of a list into runs of equal neighbours.
//!
//! The partition is a [`Barcode`] over the source list: an element is
//! [`UNIQUE`] when it starts a group and [`DUPLICATE`] when it compares equal
//! to its predecessor. The first element is always unique, so group `g` starts
//! at the `g`-th unique element.
//!
//! [`Grouper::process`] consumes a committed [`ListEvent`] of the source and
//! reports group-level changes to a [`GroupClient`]. It runs in two passes.
//! The first pass sweeps the changes in order over the barcode. Positions
//! before the current change already hold their final flags and positions
//! after it still hold the old ones, which is exactly the partition a client
//! replaying the reported changes in order sees at that point. Every flag
//! flip is journaled as a group change against that view. The second pass
//! walks the event again and hands the journal to the client, tagged with
//! the element change that caused each entry, so clients never observe a
//! half-updated barcode.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Range;

use glaze_forest::{Barcode, Colour, ForestError};
use tracing::debug;

use crate::event::{ChangeKind, ListEvent};

pub const UNIQUE: Colour = Colour::Black;
pub const DUPLICATE: Colour = Colour::White;

/// Which group an element belongs to relative to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    /// A group of its own.
    NoGroup,
    /// The group of its predecessor.
    Left,
    /// The group of its successor, which it heads.
    Right,
}

/// One group-level change.
///
/// `primary` is set on exactly one change per element-level change: the one
/// for the group the element now belongs to (or left, for deletes). Secondary
/// changes report groups affected as a side effect, such as a group split in
/// two by an inserted element.
#[derive(Debug)]
pub struct GroupChange<'a, T> {
    pub index: usize,
    pub group_index: usize,
    pub group_change: ChangeKind,
    pub primary: bool,
    pub element_change: ChangeKind,
    pub old_value: Option<&'a T>,
    pub new_value: Option<&'a T>,
}

pub trait GroupClient<T> {
    fn group_changed(&mut self, change: &GroupChange<'_, T>);
}

impl<T, F> GroupClient<T> for F
where
    F: FnMut(&GroupChange<'_, T>),
{
    fn group_changed(&mut self, change: &GroupChange<'_, T>) {
        self(change)
    }
}

/// A group change waiting to be reported, keyed by the ordinal of the
/// element change that caused it.
#[derive(Debug, Clone, Copy)]
struct GroupOp {
    change: usize,
    group_index: usize,
    group_change: ChangeKind,
    primary: bool,
}

/// Collects the group changes of one atomic change and remembers which
/// groups were already reported.
#[derive(Default)]
struct Journal {
    change: usize,
    touched: BTreeSet<usize>,
    ops: Vec<GroupOp>,
}

impl Journal {
    fn emit(&mut self, group_index: usize, group_change: ChangeKind, primary: bool) {
        self.ops.push(GroupOp {
            change: self.change,
            group_index,
            group_change,
            primary,
        });

        // Keep reported group indices in step with later changes.
        self.touched = match group_change {
            ChangeKind::Insert => self
                .touched
                .iter()
                .map(|&t| if t >= group_index { t + 1 } else { t })
                .chain([group_index])
                .collect(),
            ChangeKind::Delete => self
                .touched
                .iter()
                .filter(|&&t| t != group_index)
                .map(|&t| if t > group_index { t - 1 } else { t })
                .collect(),
            ChangeKind::Update => {
                let mut touched = std::mem::take(&mut self.touched);
                touched.insert(group_index);
                touched
            }
        };
    }

    /// Secondary update, unless the group was already reported.
    fn touch(&mut self, group_index: usize) {
        if !self.touched.contains(&group_index) {
            self.emit(group_index, ChangeKind::Update, false);
        }
    }
}

pub struct Grouper<T> {
    barcode: Barcode,
    comparator: Box<dyn Fn(&T, &T) -> Ordering>,
}

impl<T> Grouper<T> {
    pub fn new<C>(source: &[T], comparator: C) -> Self
    where
        C: Fn(&T, &T) -> Ordering + 'static,
    {
        let mut grouper = Self {
            barcode: Barcode::new(),
            comparator: Box::new(comparator),
        };
        grouper.rebuild(source);
        grouper
    }

    fn same(&self, a: &T, b: &T) -> bool {
        (self.comparator)(a, b) == Ordering::Equal
    }

    /// Recomputes the partition from scratch, without reporting changes.
    pub fn rebuild(&mut self, source: &[T]) {
        self.barcode.clear();
        for (i, value) in source.iter().enumerate() {
            let colour = if i > 0 && self.same(&source[i - 1], value) {
                DUPLICATE
            } else {
                UNIQUE
            };
            self.barcode.push(colour, 1);
        }
    }

    /// Replaces the comparator and recomputes the partition.
    pub fn set_comparator<C>(&mut self, comparator: C, source: &[T])
    where
        C: Fn(&T, &T) -> Ordering + 'static,
    {
        self.comparator = Box::new(comparator);
        self.rebuild(source);
    }

    pub fn barcode(&self) -> &Barcode {
        &self.barcode
    }

    pub fn group_count(&self) -> usize {
        self.barcode.colour_count(UNIQUE)
    }

    /// Group containing the element at `index`.
    pub fn group_of(&self, index: usize) -> Option<usize> {
        if index >= self.barcode.len() {
            return None;
        }
        self.barcode.colour_index_left(index, UNIQUE)
    }

    /// Source indices of the elements of group `group`.
    pub fn group_range(&self, group: usize) -> Result<Range<usize>, ForestError> {
        let start = self.barcode.get_index(group, UNIQUE)?;
        let end = if group + 1 < self.group_count() {
            self.barcode.get_index(group + 1, UNIQUE)?
        } else {
            self.barcode.len()
        };
        Ok(start..end)
    }

    /// Applies a committed change of the source list and reports the group
    /// changes it implies. The event must describe a single atomic change
    /// of the list this grouper was built from.
    pub fn process<C>(&mut self, event: &mut ListEvent<'_, T>, client: &mut C) -> Result<(), ForestError>
    where
        C: GroupClient<T> + ?Sized,
    {
        let source = event.source();
        let mut journal = Journal::default();
        event.reset();
        while event.next() {
            let i = event.index();
            let peek = event.peek_index();
            let g = self.barcode.colour_count_before(i, UNIQUE);
            match event.kind() {
                ChangeKind::Insert => self.inserted(i, g, peek, source, &mut journal)?,
                ChangeKind::Update => self.updated(i, g, peek, source, &mut journal)?,
                ChangeKind::Delete => self.deleted(i, g, peek, source, &mut journal)?,
            }
            journal.change += 1;
        }

        let mut ops = journal.ops.iter().peekable();
        let mut change = 0;
        event.reset();
        while event.next() {
            while let Some(op) = ops.next_if(|op| op.change == change) {
                client.group_changed(&GroupChange {
                    index: event.index(),
                    group_index: op.group_index,
                    group_change: op.group_change,
                    primary: op.primary,
                    element_change: event.kind(),
                    old_value: event.old_value(),
                    new_value: event.new_value(),
                });
            }
            change += 1;
        }

        debug!(
            changes = change,
            group_changes = journal.ops.len(),
            groups = self.group_count(),
            "grouped atomic change"
        );
        Ok(())
    }

    /// Whether the element at `q` is an old element no later change touches.
    /// Such an element already sits at its final index.
    fn untouched(&self, q: usize, peek: Option<usize>) -> bool {
        q < self.barcode.len() && peek != Some(q)
    }

    /// Group the new value at `i` belongs to in the final list.
    fn joined(&self, i: usize, untouched_next: bool, source: &[T]) -> Side {
        if i > 0 && self.same(&source[i - 1], &source[i]) {
            Side::Left
        } else if untouched_next && self.same(&source[i], &source[i + 1]) {
            Side::Right
        } else {
            Side::NoGroup
        }
    }

    fn inserted(
        &mut self,
        i: usize,
        g: usize,
        peek: Option<usize>,
        source: &[T],
        journal: &mut Journal,
    ) -> Result<(), ForestError> {
        self.barcode.add(i, UNIQUE, 1)?;
        let q = i + 1;
        let untouched = self.untouched(q, peek);
        let next_duplicate = q < self.barcode.len() && self.barcode.get(q)? == DUPLICATE;
        match self.joined(i, untouched, source) {
            Side::Left => {
                self.barcode.set(i, DUPLICATE, 1)?;
                journal.emit(g - 1, ChangeKind::Update, true);
            }
            Side::Right if !next_duplicate => {
                self.barcode.set(q, DUPLICATE, 1)?;
                journal.emit(g, ChangeKind::Update, true);
            }
            Side::Right | Side::NoGroup => {
                journal.emit(g, ChangeKind::Insert, true);
                if next_duplicate {
                    // The element lands inside an existing group and takes
                    // its tail along.
                    journal.touch(g - 1);
                }
            }
        }
        if untouched {
            self.normalize(q, source, journal)?;
        }
        Ok(())
    }

    fn updated(
        &mut self,
        i: usize,
        g: usize,
        peek: Option<usize>,
        source: &[T],
        journal: &mut Journal,
    ) -> Result<(), ForestError> {
        use ChangeKind::{Delete, Insert, Update};
        use Side::{Left, NoGroup, Right};

        let q = i + 1;
        let untouched = self.untouched(q, peek);
        let next_duplicate = q < self.barcode.len() && self.barcode.get(q)? == DUPLICATE;
        let left = if self.barcode.get(i)? == DUPLICATE {
            Left
        } else if next_duplicate {
            Right
        } else {
            NoGroup
        };

        match (left, self.joined(i, untouched, source)) {
            (NoGroup, NoGroup) | (Right, Right) | (Right, NoGroup) => journal.emit(g, Update, true),
            (Left, Left) => journal.emit(g - 1, Update, true),
            (NoGroup, Left) => {
                self.barcode.set(i, DUPLICATE, 1)?;
                journal.emit(g - 1, Update, true);
                journal.emit(g, Delete, false);
            }
            (NoGroup, Right) => {
                self.barcode.set(q, DUPLICATE, 1)?;
                journal.emit(g, Update, true);
                journal.emit(g + 1, Delete, false);
            }
            (Left, NoGroup) => {
                self.barcode.set(i, UNIQUE, 1)?;
                journal.touch(g - 1);
                journal.emit(g, Insert, true);
            }
            (Left, Right) => {
                self.barcode.set(i, UNIQUE, 1)?;
                journal.touch(g - 1);
                if next_duplicate {
                    journal.emit(g, Insert, true);
                } else {
                    self.barcode.set(q, DUPLICATE, 1)?;
                    journal.emit(g, Update, true);
                }
            }
            (Right, Left) => {
                self.barcode.set(i, DUPLICATE, 1)?;
                if untouched && !self.same(&source[i], &source[q]) {
                    // The successor now heads what is left of the old group.
                    self.barcode.set(q, UNIQUE, 1)?;
                    journal.emit(g - 1, Update, true);
                    journal.touch(g);
                } else {
                    journal.emit(g - 1, Update, true);
                    journal.emit(g, Delete, false);
                }
            }
        }
        if untouched {
            self.normalize(q, source, journal)?;
        }
        Ok(())
    }

    fn deleted(
        &mut self,
        i: usize,
        g: usize,
        peek: Option<usize>,
        source: &[T],
        journal: &mut Journal,
    ) -> Result<(), ForestError> {
        let was = self.barcode.get(i)?;
        let next_duplicate = i + 1 < self.barcode.len() && self.barcode.get(i + 1)? == DUPLICATE;
        if was == UNIQUE && next_duplicate {
            // The successor now heads the group.
            self.barcode.set(i + 1, UNIQUE, 1)?;
        }
        self.barcode.remove(i, 1)?;
        match (was, next_duplicate) {
            (DUPLICATE, _) => journal.emit(g - 1, ChangeKind::Update, true),
            (_, true) => journal.emit(g, ChangeKind::Update, true),
            _ => journal.emit(g, ChangeKind::Delete, true),
        }
        if self.untouched(i, peek) {
            self.normalize(i, source, journal)?;
        }
        Ok(())
    }

    /// Splits or merges at an untouched element whose flag no longer
    /// matches its predecessor.
    fn normalize(&mut self, q: usize, source: &[T], journal: &mut Journal) -> Result<(), ForestError> {
        let duplicate = q > 0 && self.same(&source[q - 1], &source[q]);
        let flag = self.barcode.get(q)?;
        let gq = self.barcode.colour_count_before(q, UNIQUE);
        match (flag, duplicate) {
            (DUPLICATE, false) => {
                self.barcode.set(q, UNIQUE, 1)?;
                journal.emit(gq, ChangeKind::Insert, false);
            }
            (UNIQUE, true) => {
                self.barcode.set(q, DUPLICATE, 1)?;
                journal.emit(gq, ChangeKind::Delete, false);
            }
            _ => return Ok(()),
        }
        if let Some(prev) = gq.checked_sub(1) {
            journal.touch(prev);
        }
        Ok(())
    }
}
