//! A list of booleans backed by a [`Barcode`].
//!
//! `true` is stored as [`Colour::Black`] and `false` as [`Colour::White`], so
//! long stretches of either value cost one tree node at most.

use crate::barcode::{Barcode, Colour};
use crate::error::ForestError;

fn colour(value: bool) -> Colour {
    if value {
        Colour::Black
    } else {
        Colour::White
    }
}

#[derive(Debug, Clone, Default)]
pub struct BooleanList {
    barcode: Barcode,
}

impl BooleanList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.barcode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barcode.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<bool, ForestError> {
        Ok(self.barcode.get(index)? == Colour::Black)
    }

    pub fn insert(&mut self, index: usize, value: bool) -> Result<(), ForestError> {
        self.barcode.add(index, colour(value), 1)
    }

    pub fn push(&mut self, value: bool) {
        self.barcode.push(colour(value), 1);
    }

    pub fn set(&mut self, index: usize, value: bool) -> Result<bool, ForestError> {
        let old = self.get(index)?;
        if old != value {
            self.barcode.set(index, colour(value), 1)?;
        }
        Ok(old)
    }

    pub fn remove(&mut self, index: usize) -> Result<bool, ForestError> {
        let old = self.get(index)?;
        self.barcode.remove(index, 1)?;
        Ok(old)
    }

    pub fn count(&self, value: bool) -> usize {
        self.barcode.colour_count(colour(value))
    }

    /// Number of `value` entries before `index`.
    pub fn count_before(&self, index: usize, value: bool) -> usize {
        self.barcode.colour_count_before(index, colour(value))
    }

    /// Index of the `nth` entry equal to `value`.
    pub fn nth_index(&self, nth: usize, value: bool) -> Option<usize> {
        self.barcode.get_index(nth, colour(value)).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.barcode.iter().map(|c| c == Colour::Black)
    }

    pub fn as_barcode(&self) -> &Barcode {
        &self.barcode
    }
}

impl FromIterator<bool> for BooleanList {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut list = BooleanList::new();
        for value in iter {
            list.push(value);
        }
        list
    }
}
