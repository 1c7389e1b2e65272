use std::cell::RefCell;
use std::collections::BTreeMap;
use std::mem;
use std::rc::Rc;

use tracing::debug;

use super::block::{sort_blocks, ChangeKind, ListChangeBlock};
use super::list_event::ListEvent;
use crate::error::EventError;

pub type ListenerId = u64;

/// Receives every atomic change committed on an assembler it is registered
/// with.
pub trait ListEventListener<T> {
    fn list_changed(&mut self, event: &mut ListEvent<'_, T>);
}

impl<T, F> ListEventListener<T> for F
where
    F: FnMut(&mut ListEvent<'_, T>),
{
    fn list_changed(&mut self, event: &mut ListEvent<'_, T>) {
        self(event)
    }
}

pub type SharedListener<T> = Rc<RefCell<dyn ListEventListener<T>>>;

/// Blocks kept for reuse across atomic changes.
const POOL_LIMIT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Open,
    Committing,
}

/// Collects the changes of one atomic change and delivers them on commit.
///
/// Changes are added in the order they are applied, against the list as it
/// is at that moment. On commit the blocks are sorted into index order,
/// delivered to a snapshot of the registered listeners, and kept in the
/// history until every pull cursor has read them.
pub struct ListEventAssembler<T> {
    state: State,
    pending: Vec<ListChangeBlock<T>>,
    history: Vec<Vec<ListChangeBlock<T>>>,
    /// Atomic change number of `history[0]`.
    base: u64,
    listeners: BTreeMap<ListenerId, SharedListener<T>>,
    /// Next atomic change number each cursor will read.
    cursors: BTreeMap<ListenerId, u64>,
    next_listener_id: ListenerId,
    pool: Vec<Vec<ListChangeBlock<T>>>,
}

impl<T> Default for ListEventAssembler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListEventAssembler<T> {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            pending: Vec::new(),
            history: Vec::new(),
            base: 0,
            listeners: BTreeMap::new(),
            cursors: BTreeMap::new(),
            next_listener_id: 1,
            pool: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == State::Open
    }

    /// Number of atomic changes committed so far.
    pub fn atomic_change_count(&self) -> u64 {
        self.base + self.history.len() as u64
    }

    /// Atomic changes still held for unread cursors.
    pub fn retained_changes(&self) -> usize {
        self.history.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len() + self.cursors.len()
    }

    pub fn begin_event(&mut self) -> Result<(), EventError> {
        if self.state != State::Idle {
            return Err(EventError::TransactionOpen);
        }
        self.state = State::Open;
        self.pending = self.pool.pop().unwrap_or_default();
        Ok(())
    }

    fn add_block(&mut self, block: ListChangeBlock<T>) -> Result<(), EventError> {
        if self.state != State::Open {
            return Err(EventError::NoTransaction);
        }
        if block.is_empty() {
            return Ok(());
        }
        let block = match self.pending.last_mut() {
            Some(last) => match last.merge(block) {
                Ok(()) => return Ok(()),
                Err(block) => block,
            },
            None => block,
        };
        self.pending.push(block);
        Ok(())
    }

    /// Records `len` elements inserted at `start`.
    pub fn insert_range(&mut self, start: usize, len: usize) -> Result<(), EventError> {
        self.add_block(ListChangeBlock::insert(start, len))
    }

    /// Records the deletion of `old_values.len()` elements at `start`.
    pub fn delete_range(&mut self, start: usize, old_values: Vec<T>) -> Result<(), EventError> {
        self.add_block(ListChangeBlock::with_old_values(
            ChangeKind::Delete,
            start,
            old_values,
        ))
    }

    /// Records updates of `old_values.len()` elements from `start` on.
    pub fn update_range(&mut self, start: usize, old_values: Vec<T>) -> Result<(), EventError> {
        self.add_block(ListChangeBlock::with_old_values(
            ChangeKind::Update,
            start,
            old_values,
        ))
    }

    pub fn element_inserted(&mut self, index: usize) -> Result<(), EventError> {
        self.insert_range(index, 1)
    }

    pub fn element_deleted(&mut self, index: usize, old_value: T) -> Result<(), EventError> {
        self.delete_range(index, vec![old_value])
    }

    pub fn element_updated(&mut self, index: usize, old_value: T) -> Result<(), EventError> {
        self.update_range(index, vec![old_value])
    }

    /// Sorts the open atomic change and delivers it to every listener
    /// registered at this moment. `source` is the list after the change.
    ///
    /// An atomic change whose changes cancel out is dropped without being
    /// delivered.
    pub fn commit_event(&mut self, source: &[T]) -> Result<(), EventError>
    where
        T: Clone,
    {
        if self.state != State::Open {
            return Err(EventError::NoTransaction);
        }
        self.state = State::Committing;

        let mut blocks = mem::take(&mut self.pending);
        sort_blocks(&mut blocks);
        if blocks.is_empty() {
            debug!("atomic change cancelled out, nothing to deliver");
            self.release(blocks);
            self.state = State::Idle;
            return Ok(());
        }

        for block in &mut blocks {
            block.capture_new_values(source);
        }
        self.history.push(blocks);
        let listeners: Vec<SharedListener<T>> = self.listeners.values().cloned().collect();
        let latest = &self.history[self.history.len() - 1..];
        debug!(
            atomic_change = self.base + self.history.len() as u64 - 1,
            blocks = latest[0].len(),
            listeners = listeners.len(),
            "committing atomic change"
        );
        for listener in &listeners {
            let mut event = ListEvent::new(latest, source);
            listener.borrow_mut().list_changed(&mut event);
        }

        self.recycle();
        self.state = State::Idle;
        Ok(())
    }

    fn release(&mut self, mut blocks: Vec<ListChangeBlock<T>>) {
        if self.pool.len() < POOL_LIMIT {
            blocks.clear();
            self.pool.push(blocks);
        }
    }

    /// Drops history every cursor has read.
    fn recycle(&mut self) {
        let end = self.atomic_change_count();
        let low_water = self.cursors.values().copied().min().unwrap_or(end);
        let count = (low_water - self.base) as usize;
        if count == 0 {
            return;
        }
        let recycled: Vec<_> = self.history.drain(..count).collect();
        for blocks in recycled {
            self.release(blocks);
        }
        self.base = low_water;
        debug!(low_water, recycled = count, "recycled atomic changes");
    }

    pub fn add_listener(&mut self, listener: SharedListener<T>) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id = self.next_listener_id.saturating_add(1);
        self.listeners.insert(id, listener);
        id
    }

    pub fn add_listener_fn<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&mut ListEvent<'_, T>) + 'static,
    {
        self.add_listener(Rc::new(RefCell::new(listener)))
    }

    /// Registers a pull cursor. It sees every atomic change committed from
    /// now on until it is removed.
    ///
    /// Changes are retained until every cursor has read them, so a cursor that
    /// is never read keeps the whole history alive.
    pub fn add_cursor(&mut self) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id = self.next_listener_id.saturating_add(1);
        self.cursors.insert(id, self.atomic_change_count());
        id
    }

    /// Unregisters a listener or cursor.
    pub fn remove_listener(&mut self, id: ListenerId) -> Result<(), EventError> {
        if self.listeners.remove(&id).is_some() {
            return Ok(());
        }
        if self.cursors.remove(&id).is_some() {
            if self.state == State::Idle {
                self.recycle();
            }
            return Ok(());
        }
        Err(EventError::UnknownListener(id))
    }

    /// Atomic changes committed since the cursor last read, marking them
    /// read. `source` is the current list.
    pub fn events_for<'a>(
        &'a mut self,
        id: ListenerId,
        source: &'a [T],
    ) -> Result<ListEvent<'a, T>, EventError> {
        let end = self.atomic_change_count();
        let cursor = self
            .cursors
            .get_mut(&id)
            .ok_or(EventError::UnknownListener(id))?;
        let from = mem::replace(cursor, end);
        let start = (from - self.base) as usize;
        Ok(ListEvent::new(&self.history[start..], source))
    }
}
