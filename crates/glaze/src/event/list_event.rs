use super::block::{ChangeKind, ListChangeBlock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Before,
    At { block: usize, offset: usize },
    After,
}

/// Cursor over committed atomic changes of a list.
///
/// A push listener receives one atomic change; a pull cursor may receive
/// several, walked with [`next_atomic_change`](Self::next_atomic_change).
/// Within an atomic change, [`next`](Self::next) visits single-element
/// changes in increasing index order and [`next_block`](Self::next_block)
/// visits whole blocks.
///
/// Accessors for the current change panic when the cursor is not positioned
/// on a change.
pub struct ListEvent<'a, T> {
    changes: &'a [Vec<ListChangeBlock<T>>],
    source: &'a [T],
    atomic: usize,
    position: Position,
}

impl<'a, T> ListEvent<'a, T> {
    pub(crate) fn new(changes: &'a [Vec<ListChangeBlock<T>>], source: &'a [T]) -> Self {
        Self {
            changes,
            source,
            atomic: 0,
            position: Position::Before,
        }
    }

    /// Current contents of the list that emitted the event.
    pub fn source(&self) -> &'a [T] {
        self.source
    }

    /// Blocks of the current atomic change, in index order.
    pub fn blocks(&self) -> &'a [ListChangeBlock<T>] {
        self.changes
            .get(self.atomic)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn atomic_change_count(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks().is_empty()
    }

    /// Moves to the next atomic change and rewinds to its start.
    pub fn next_atomic_change(&mut self) -> bool {
        if self.atomic + 1 >= self.changes.len() {
            return false;
        }
        self.atomic += 1;
        self.position = Position::Before;
        true
    }

    /// Rewinds to the start of the current atomic change.
    pub fn reset(&mut self) {
        self.position = Position::Before;
    }

    /// Advances to the next single-element change.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        let blocks = self.blocks();
        self.position = match self.position {
            Position::Before if !blocks.is_empty() => Position::At {
                block: 0,
                offset: 0,
            },
            Position::At { block, offset } if offset + 1 < blocks[block].len() => Position::At {
                block,
                offset: offset + 1,
            },
            Position::At { block, .. } if block + 1 < blocks.len() => Position::At {
                block: block + 1,
                offset: 0,
            },
            _ => Position::After,
        };
        self.position != Position::After
    }

    /// Advances to the start of the next block.
    pub fn next_block(&mut self) -> bool {
        let blocks = self.blocks();
        let block = match self.position {
            Position::Before => 0,
            Position::At { block, .. } => block + 1,
            Position::After => blocks.len(),
        };
        self.position = if block < blocks.len() {
            Position::At { block, offset: 0 }
        } else {
            Position::After
        };
        self.position != Position::After
    }

    fn current(&self) -> (&'a ListChangeBlock<T>, usize) {
        match self.position {
            Position::At { block, offset } => (&self.blocks()[block], offset),
            _ => panic!("list event cursor is not on a change"),
        }
    }

    fn index_at(block: &ListChangeBlock<T>, offset: usize) -> usize {
        match block.kind() {
            ChangeKind::Delete => block.start(),
            ChangeKind::Insert | ChangeKind::Update => block.start() + offset,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        self.current().0.kind()
    }

    /// Index of the current change, against the list with every earlier
    /// change of this atomic change applied.
    pub fn index(&self) -> usize {
        let (block, offset) = self.current();
        Self::index_at(block, offset)
    }

    pub fn block_start(&self) -> usize {
        self.current().0.start()
    }

    pub fn block_end(&self) -> usize {
        self.current().0.end()
    }

    /// Index of the change [`next`](Self::next) would move to, if any.
    pub fn peek_index(&self) -> Option<usize> {
        let blocks = self.blocks();
        let (block, offset) = match self.position {
            Position::Before => (0, 0),
            Position::At { block, offset } if offset + 1 < blocks[block].len() => {
                (block, offset + 1)
            }
            Position::At { block, .. } => (block + 1, 0),
            Position::After => return None,
        };
        blocks.get(block).map(|b| Self::index_at(b, offset))
    }

    /// Value of a deleted or updated element before the atomic change.
    pub fn old_value(&self) -> Option<&'a T> {
        let (block, offset) = self.current();
        block.old_values().get(offset)
    }

    /// Value of an inserted or updated element right after the atomic
    /// change, which for a cursor behind by several changes can differ from
    /// [`ListEvent::source`].
    pub fn new_value(&self) -> Option<&'a T> {
        let (block, offset) = self.current();
        block.new_values().get(offset)
    }

    /// `(index, kind)` of every remaining change, consuming the cursor up to
    /// the end of the current atomic change.
    pub fn drain_changes(&mut self) -> Vec<(usize, ChangeKind)> {
        let mut out = Vec::new();
        while self.next() {
            out.push((self.index(), self.kind()));
        }
        out
    }
}
