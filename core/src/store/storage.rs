//! Capability traits for backing stores.
//!
//! # The `BackingStore` Trait
//!
//! A distributed array never cares *which* container holds its local elements, only that the
//! container can:
//! - report its shape,
//! - map a cartesian index to a row-major position (with bounds checking),
//! - expose its elements as a slice for reads and for the broadcaster's writes.
//!
//! Only the one-dimensional `Vec<T>` store can change shape; that capability lives in the
//! separate [`GrowableStore`] trait so shape-fixed stores cannot be grown by accident.

use crate::store::{ArrayError, Element, Result};
use std::fmt::Debug;
use std::ops::Range;

/// A local container that can back a distributed array.
///
/// - `T`: The element type.
/// - `RANK`: The number of dimensions.
pub trait BackingStore<T, const RANK: usize>: Clone + Debug + Send + Sync {
    /// Allocates a store of `shape` with every slot set to `value`.
    fn filled(value: T, shape: [usize; RANK]) -> Self;

    /// Builds a store from row-major `data`.
    ///
    /// # Errors
    ///
    /// Returns `ArrayError::ShapeMismatch` if `data` does not fill `shape` exactly.
    fn from_vec(data: Vec<T>, shape: [usize; RANK]) -> Result<Self>;

    /// Returns the extent of each dimension.
    fn shape(&self) -> [usize; RANK];

    /// Returns the elements in row-major order.
    fn as_slice(&self) -> &[T];

    /// Returns the elements in row-major order, mutably.
    fn as_mut_slice(&mut self) -> &mut [T];

    /// Maps a cartesian index to its position in [`as_slice`](Self::as_slice).
    ///
    /// # Errors
    ///
    /// Returns `ArrayError::IndexOutOfBounds` if any component exceeds its dimension.
    fn offset(&self, index: [usize; RANK]) -> Result<usize> {
        let shape = self.shape();
        let mut offset = 0;
        for (&i, &extent) in index.iter().zip(shape.iter()) {
            if i >= extent {
                return Err(ArrayError::IndexOutOfBounds {
                    index: index.to_vec(),
                    shape: shape.to_vec(),
                });
            }
            offset = offset * extent + i;
        }
        Ok(offset)
    }

    /// Returns the element at `index`.
    ///
    /// A store whose slice is shorter than its shape claims reports the missing slots as
    /// out of bounds rather than panicking.
    fn get(&self, index: [usize; RANK]) -> Result<&T> {
        let offset = self.offset(index)?;
        let shape = self.shape();
        self.as_slice()
            .get(offset)
            .ok_or_else(|| ArrayError::IndexOutOfBounds {
                index: index.to_vec(),
                shape: shape.to_vec(),
            })
    }

    fn get_mut(&mut self, index: [usize; RANK]) -> Result<&mut T> {
        let offset = self.offset(index)?;
        let shape = self.shape();
        self.as_mut_slice()
            .get_mut(offset)
            .ok_or_else(|| ArrayError::IndexOutOfBounds {
                index: index.to_vec(),
                shape: shape.to_vec(),
            })
    }

    /// Returns the number of elements in the store.
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns `true` if the store contains no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A one-dimensional store whose length can change.
///
/// Every operation applies to the local store only.
pub trait GrowableStore<T>: BackingStore<T, 1> {
    fn push(&mut self, value: T);

    /// Inserts `value` at `position`, shifting later elements right.
    ///
    /// # Errors
    ///
    /// Returns `ArrayError::IndexOutOfBounds` if `position > len`.
    fn insert(&mut self, position: usize, value: T) -> Result<()>;

    /// Removes and returns the element at `position`, shifting later elements left.
    fn remove(&mut self, position: usize) -> Result<T>;

    /// Removes and returns the elements in `range`.
    fn remove_range(&mut self, range: Range<usize>) -> Result<Vec<T>>;

    fn pop(&mut self) -> Option<T>;

    fn clear(&mut self);

    /// Shortens the store to `len`; no effect if it is already shorter.
    fn truncate(&mut self, len: usize);

    /// Grows or shrinks the store to `len`, filling new slots with `value`.
    fn resize(&mut self, len: usize, value: T);

    fn reserve(&mut self, additional: usize);

    fn capacity(&self) -> usize;
}

/// Implementation of BackingStore for `Vec<T>`.
///
/// This is the standard store for one-dimensional arrays and the only growable one.
impl<T: Element> BackingStore<T, 1> for Vec<T> {
    fn filled(value: T, shape: [usize; 1]) -> Self {
        vec![value; shape[0]]
    }

    fn from_vec(data: Vec<T>, shape: [usize; 1]) -> Result<Self> {
        if data.len() != shape[0] {
            return Err(ArrayError::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(data)
    }

    fn shape(&self) -> [usize; 1] {
        [Vec::len(self)]
    }

    fn as_slice(&self) -> &[T] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<T: Element> GrowableStore<T> for Vec<T> {
    fn push(&mut self, value: T) {
        Vec::push(self, value);
    }

    fn insert(&mut self, position: usize, value: T) -> Result<()> {
        if position > Vec::len(self) {
            return Err(ArrayError::IndexOutOfBounds {
                index: vec![position],
                shape: vec![Vec::len(self)],
            });
        }
        Vec::insert(self, position, value);
        Ok(())
    }

    fn remove(&mut self, position: usize) -> Result<T> {
        if position >= Vec::len(self) {
            return Err(ArrayError::IndexOutOfBounds {
                index: vec![position],
                shape: vec![Vec::len(self)],
            });
        }
        Ok(Vec::remove(self, position))
    }

    fn remove_range(&mut self, range: Range<usize>) -> Result<Vec<T>> {
        if range.start > range.end || range.end > Vec::len(self) {
            return Err(ArrayError::IndexOutOfBounds {
                index: vec![range.start, range.end],
                shape: vec![Vec::len(self)],
            });
        }
        Ok(self.drain(range).collect())
    }

    fn pop(&mut self) -> Option<T> {
        Vec::pop(self)
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn truncate(&mut self, len: usize) {
        Vec::truncate(self, len);
    }

    fn resize(&mut self, len: usize, value: T) {
        Vec::resize(self, len, value);
    }

    fn reserve(&mut self, additional: usize) {
        Vec::reserve(self, additional);
    }

    fn capacity(&self) -> usize {
        Vec::capacity(self)
    }
}
