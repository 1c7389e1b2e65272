//! Change blocks and the commit-time block ordering.
//!
//! A block is a run of same-kind changes over consecutive indices. Indices
//! are post-prior: each block is expressed against the list as it looks after
//! every earlier block of the same atomic change has been applied. Deleting
//! `n` elements at `start` is therefore `n` deletes at the same index, while
//! inserts and updates cover `start..start + n`.

use std::mem;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A contiguous run of changes of one kind.
///
/// Delete and update blocks carry the values the elements had before the
/// atomic change, one per element. Once committed, insert and update blocks
/// also carry the values the elements had right after it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListChangeBlock<T> {
    kind: ChangeKind,
    start: usize,
    len: usize,
    old_values: Vec<T>,
    new_values: Vec<T>,
}

impl<T> ListChangeBlock<T> {
    pub(crate) fn insert(start: usize, len: usize) -> Self {
        Self {
            kind: ChangeKind::Insert,
            start,
            len,
            old_values: Vec::new(),
            new_values: Vec::new(),
        }
    }

    pub(crate) fn with_old_values(kind: ChangeKind, start: usize, old_values: Vec<T>) -> Self {
        Self {
            kind,
            start,
            len: old_values.len(),
            old_values,
            new_values: Vec::new(),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Last index covered by the block, inclusive. For deletes this is the
    /// index the last element had before the block was applied.
    pub fn end(&self) -> usize {
        self.start + self.len.saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Values of the changed elements before the atomic change. Empty for
    /// inserts.
    pub fn old_values(&self) -> &[T] {
        &self.old_values
    }

    /// Values of the inserted or updated elements right after the atomic
    /// change. Empty for deletes and for blocks not yet committed.
    pub fn new_values(&self) -> &[T] {
        &self.new_values
    }

    /// Captures the new values from `source`, the list right after the
    /// atomic change. The blocks must already be sorted, so that no later
    /// block shifts this one.
    pub(crate) fn capture_new_values(&mut self, source: &[T])
    where
        T: Clone,
    {
        self.new_values = match self.kind {
            ChangeKind::Delete => Vec::new(),
            ChangeKind::Insert | ChangeKind::Update => source
                .get(self.start..self.start + self.len)
                .map(<[T]>::to_vec)
                .unwrap_or_default(),
        };
    }

    /// First index not touched by the block, in post-block coordinates.
    fn post_end(&self) -> usize {
        match self.kind {
            ChangeKind::Delete => self.start,
            ChangeKind::Insert | ChangeKind::Update => self.start + self.len,
        }
    }

    /// Whether `next` lies entirely after this block.
    pub(crate) fn precedes(&self, next: &Self) -> bool {
        next.start >= self.post_end()
    }

    /// Folds `next`, applied right after `self`, into `self`. Hands `next`
    /// back when the two do not form one contiguous run.
    pub(crate) fn merge(&mut self, next: Self) -> Result<(), Self> {
        let mut next = next;
        match (self.kind, next.kind) {
            (ChangeKind::Insert, ChangeKind::Insert)
                if self.start <= next.start && next.start <= self.start + self.len =>
            {
                self.len += next.len;
            }
            (ChangeKind::Delete, ChangeKind::Delete)
                if next.start <= self.start && self.start <= next.start + next.len =>
            {
                // `next` straddles the gap: the part before it comes first.
                let tail = next.old_values.split_off(self.start - next.start);
                next.old_values.append(&mut self.old_values);
                next.old_values.extend(tail);
                self.old_values = next.old_values;
                self.start = next.start;
                self.len += next.len;
            }
            (ChangeKind::Update, ChangeKind::Update)
                if next.start <= self.start + self.len && self.start <= next.start + next.len =>
            {
                // Where the ranges overlap the older value wins.
                let end = self.start + self.len;
                let next_end = next.start + next.len;
                let suffix = if next_end > end {
                    let at = next.old_values.len() - (next_end - end);
                    next.old_values.split_off(at)
                } else {
                    Vec::new()
                };
                let mut old = next.old_values;
                old.truncate(self.start.saturating_sub(next.start));
                old.append(&mut self.old_values);
                old.extend(suffix);
                self.start = self.start.min(next.start);
                self.len = old.len();
                self.old_values = old;
            }
            _ => return Err(next),
        }
        Ok(())
    }

    /// Keeps `len` elements from `at` on, returning the values before `at`
    /// as a block starting at `start`.
    fn split_front(&mut self, at: usize) -> Self {
        let rest = self.old_values.split_off(at.min(self.old_values.len()));
        let front = mem::replace(&mut self.old_values, rest);
        let block = Self {
            kind: self.kind,
            start: self.start,
            len: at,
            old_values: front,
            new_values: Vec::new(),
        };
        self.len -= at;
        block
    }
}

fn non_empty<T>(blocks: impl IntoIterator<Item = ListChangeBlock<T>>) -> Vec<ListChangeBlock<T>> {
    blocks.into_iter().filter(|b| !b.is_empty()).collect()
}

/// Rewrites `first` followed by `second`, where `second` does not lie after
/// `first`, as an equivalent sequence in index order.
fn reorder<T>(first: ListChangeBlock<T>, second: ListChangeBlock<T>) -> Vec<ListChangeBlock<T>> {
    use ChangeKind::*;

    let (mut x, mut y) = (first, second);
    let (xs, xe) = (x.start, x.start + x.len);
    let (ys, ye) = (y.start, y.start + y.len);

    match (x.kind, y.kind) {
        (Insert, Insert) | (Delete, Insert) => {
            x.start += y.len;
            vec![y, x]
        }
        (Delete, Delete) => {
            x.start -= y.len;
            vec![y, x]
        }
        (Update, Update) => vec![y, x],
        (Insert, Delete) => {
            let (lo, hi) = (xs.max(ys), xe.min(ye));
            if lo >= hi {
                x.start -= y.len;
                return vec![y, x];
            }
            // Deleting freshly inserted elements cancels both.
            let cancelled = hi - lo;
            y.old_values.drain(lo - ys..hi - ys);
            y.len -= cancelled;
            x.len -= cancelled;
            if ys < xs {
                x.start = ys;
                non_empty([y, x])
            } else {
                y.start = xs + x.len;
                non_empty([x, y])
            }
        }
        (Insert, Update) | (Delete, Update) => {
            // Split the update around the first block. Updates of freshly
            // inserted elements are already covered by the insert.
            let before = xs.saturating_sub(ys).min(y.len);
            let front = y.split_front(before);
            let skip = match x.kind {
                Insert => (xe.min(ye)).saturating_sub(xs.max(ys)),
                _ => 0,
            };
            let absorbed = y.split_front(skip);
            drop(absorbed);
            y.start = x.post_end();
            non_empty([front, x, y])
        }
        (Update, Insert) => {
            if ys <= xs {
                x.start += y.len;
                return vec![y, x];
            }
            let front = x.split_front(ys - xs);
            x.start = ye;
            vec![front, y, x]
        }
        (Update, Delete) => {
            if ye <= xs {
                x.start -= y.len;
                return vec![y, x];
            }
            let front = x.split_front(ys.saturating_sub(xs));
            // Deleted elements report their value from before the update.
            let (lo, hi) = (xs.max(ys), xe.min(ye));
            let overlap = hi.saturating_sub(lo);
            let mut updated = x.split_front(overlap);
            for (slot, old) in y.old_values[lo - ys..lo - ys + overlap]
                .iter_mut()
                .zip(updated.old_values.drain(..))
            {
                *slot = old;
            }
            x.start = ys;
            non_empty([front, y, x])
        }
    }
}

/// Sorts the blocks of one atomic change into index order, merging runs that
/// become contiguous. Gnome-sort style: an out-of-order pair is rewritten and
/// the scan steps back to recheck it against its predecessor.
pub(crate) fn sort_blocks<T>(blocks: &mut Vec<ListChangeBlock<T>>) {
    blocks.retain(|b| !b.is_empty());
    let mut k = 0;
    while k + 1 < blocks.len() {
        let next = blocks.remove(k + 1);
        let next = match blocks[k].merge(next) {
            Ok(()) => {
                trace!(index = k, "merged adjacent change blocks");
                k = k.saturating_sub(1);
                continue;
            }
            Err(next) => next,
        };
        if blocks[k].precedes(&next) {
            blocks.insert(k + 1, next);
            k += 1;
            continue;
        }
        let first = blocks.remove(k);
        trace!(
            index = k,
            first = ?first.kind,
            second = ?next.kind,
            "reordering change blocks"
        );
        let replacement = reorder(first, next);
        blocks.splice(k..k, replacement);
        k = k.saturating_sub(1);
    }
    blocks.retain(|b| !b.is_empty());

    assert!(
        blocks.windows(2).all(|w| w[0].precedes(&w[1])),
        "change blocks overlap after sorting"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape<T>(blocks: &[ListChangeBlock<T>]) -> Vec<(ChangeKind, usize, usize)> {
        blocks.iter().map(|b| (b.kind, b.start, b.len)).collect()
    }

    fn del(start: usize, old: &[char]) -> ListChangeBlock<char> {
        ListChangeBlock::with_old_values(ChangeKind::Delete, start, old.to_vec())
    }

    fn upd(start: usize, old: &[char]) -> ListChangeBlock<char> {
        ListChangeBlock::with_old_values(ChangeKind::Update, start, old.to_vec())
    }

    #[test]
    fn inserts_merge_inside_and_after() {
        let mut block = ListChangeBlock::<char>::insert(3, 1);
        block.merge(ListChangeBlock::insert(4, 1)).unwrap();
        block.merge(ListChangeBlock::insert(3, 2)).unwrap();
        assert_eq!((block.start(), block.end()), (3, 6));
        assert!(block.merge(ListChangeBlock::insert(8, 1)).is_err());
    }

    #[test]
    fn deletes_merge_forward_and_backward() {
        let mut block = del(5, &['f']);
        block.merge(del(5, &['g'])).unwrap();
        block.merge(del(4, &['e'])).unwrap();
        assert_eq!((block.start(), block.len()), (4, 3));
        assert_eq!(block.old_values(), &['e', 'f', 'g']);
    }

    #[test]
    fn overlapping_updates_keep_oldest_value() {
        let mut block = upd(2, &['c', 'd']);
        block.merge(upd(3, &['X', 'e'])).unwrap();
        block.merge(upd(1, &['b'])).unwrap();
        assert_eq!(block.old_values(), &['b', 'c', 'd', 'e']);
        assert_eq!(block.start(), 1);
    }

    #[test]
    fn delete_then_lower_insert_is_swapped() {
        let mut blocks = vec![del(5, &['f']), ListChangeBlock::insert(2, 1)];
        sort_blocks(&mut blocks);
        assert_eq!(
            shape(&blocks),
            vec![(ChangeKind::Insert, 2, 1), (ChangeKind::Delete, 6, 1)]
        );
    }

    #[test]
    fn insert_then_delete_cancels() {
        let mut blocks = vec![ListChangeBlock::insert(2, 3), del(3, &['x'])];
        sort_blocks(&mut blocks);
        assert_eq!(shape(&blocks), vec![(ChangeKind::Insert, 2, 2)]);

        let mut blocks = vec![ListChangeBlock::insert(2, 1), del(1, &['b', 'x', 'c'])];
        sort_blocks(&mut blocks);
        assert_eq!(shape(&blocks), vec![(ChangeKind::Delete, 1, 2)]);
        assert_eq!(blocks[0].old_values(), &['b', 'c']);
    }

    #[test]
    fn update_of_inserted_element_is_absorbed() {
        let mut blocks = vec![ListChangeBlock::insert(2, 2), upd(1, &['b', 'x', 'y', 'd'])];
        sort_blocks(&mut blocks);
        assert_eq!(
            shape(&blocks),
            vec![
                (ChangeKind::Update, 1, 1),
                (ChangeKind::Insert, 2, 2),
                (ChangeKind::Update, 4, 1)
            ]
        );
        assert_eq!(blocks[2].old_values(), &['d']);
    }

    #[test]
    fn update_split_around_insert() {
        let mut blocks = vec![upd(1, &['b', 'c', 'd']), ListChangeBlock::insert(2, 1)];
        sort_blocks(&mut blocks);
        assert_eq!(
            shape(&blocks),
            vec![
                (ChangeKind::Update, 1, 1),
                (ChangeKind::Insert, 2, 1),
                (ChangeKind::Update, 3, 2)
            ]
        );
        assert_eq!(blocks[2].old_values(), &['c', 'd']);
    }

    #[test]
    fn deleted_element_reports_pre_update_value() {
        let mut blocks = vec![upd(1, &['b', 'c']), del(2, &['C'])];
        sort_blocks(&mut blocks);
        assert_eq!(
            shape(&blocks),
            vec![(ChangeKind::Update, 1, 1), (ChangeKind::Delete, 2, 1)]
        );
        assert_eq!(blocks[1].old_values(), &['c']);
    }
}
