//! Structural operations on growable one-dimensional arrays.
//!
//! Everything here is **local**. No broadcast happens and no rank looks at any other rank.
//! Ranks stay identical only if each one calls the same operations with the same arguments
//! in the same order. This guarantee is deliberately weaker than the one [`set`] gives:
//!
//! | Operation | Root passes | Others pass | Afterwards |
//! |-----------|-------------|-------------|------------|
//! | `set([2], v)` | `10` | `99` | every rank holds `10` |
//! | `push(v)`     | `7`  | `999` | each rank holds what *it* pushed |
//!
//! Call [`resync`] afterwards to make root's contents authoritative again.
//!
//! [`set`]: super::DistributedArray::set
//! [`resync`]: super::DistributedArray::resync

use super::DistributedArray;
use crate::distributed::backend::CollectiveBackend;
use crate::store::{Element, GrowableStore, Result};
use std::ops::Range;

impl<T, B, S> DistributedArray<T, 1, B, S>
where
    T: Element,
    B: CollectiveBackend,
    S: GrowableStore<T>,
{
    /// Appends `value` to the local store.
    pub fn push(&mut self, value: T) {
        self.store.push(value);
    }

    /// Inserts `value` at `position`, shifting later elements right.
    ///
    /// # Errors
    ///
    /// Returns `ArrayError::IndexOutOfBounds` if `position > len`.
    pub fn insert(&mut self, position: usize, value: T) -> Result<()> {
        self.store.insert(position, value)
    }

    /// Removes and returns the element at `position`.
    pub fn remove(&mut self, position: usize) -> Result<T> {
        self.store.remove(position)
    }

    /// Removes and returns the elements in `range`.
    pub fn remove_range(&mut self, range: Range<usize>) -> Result<Vec<T>> {
        self.store.remove_range(range)
    }

    /// Removes and returns the last element, if any.
    pub fn pop(&mut self) -> Option<T> {
        self.store.pop()
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    pub fn truncate(&mut self, len: usize) {
        self.store.truncate(len);
    }

    /// Grows or shrinks to `len`, filling new slots with `value`.
    pub fn resize(&mut self, len: usize, value: T) {
        self.store.resize(len, value);
    }

    pub fn reserve(&mut self, additional: usize) {
        self.store.reserve(additional);
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }
}
