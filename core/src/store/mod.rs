//! Local backing stores.
//!
//! # What is a Backing Store?
//!
//! Every participant of a process group holds its **own private copy** of an array's elements.
//! Nothing is physically shared: "sharing" is the logical result of every participant applying
//! the same root-authoritative writes (see [`crate::distributed`]). The container holding that
//! private copy is the **backing store**.
//!
//! In `rootcast`, a backing store is defined by:
//! 1. **Data**: A flat vector of elements.
//! 2. **Shape**: An array of dimension extents (e.g., `[2, 3]`), fixed at construction.
//! 3. **Strides**: How to step through the flat data to traverse dimensions.
//!
//! ## Example: Creating and Inspecting a Store
//!
//! ```rust
//! use rootcast::store::{BackingStore, Dense};
//!
//! let store = Dense::<i32, 2>::new(vec![1, 2, 3, 4, 5, 6], [2, 3]).unwrap();
//!
//! assert_eq!(store.shape(), [2, 3]);
//! assert_eq!(store.get([1, 0]).unwrap(), &4);
//! assert!(store.get([2, 0]).is_err());
//! ```
//!
//! > [!TIP]
//! > Stores use **Row-Major** (C-style) layout: the last dimension changes the fastest
//! > in memory, so `iter()` on an array visits `[0, 0], [0, 1], ..., [1, 0], ...`.

use crate::distributed::payload::Payload;
use std::fmt::Debug;
use thiserror::Error;

pub mod storage;

pub use storage::{BackingStore, GrowableStore};

/// Error type for array and group operations.
#[derive(Error, Debug)]
pub enum ArrayError {
    /// The shape of the data does not match the expected shape.
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    /// An index is out of bounds for the given shape.
    #[error("Index out of bounds: index {index:?} for shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },
    /// The collective transport failed (peer gone, group mismatch, protocol violation).
    #[error("Communication failure: {0}")]
    Communication(String),
    /// A broadcast payload could not be encoded or decoded.
    #[error("Payload codec failure: {0}")]
    Codec(#[from] bincode::Error),
    /// A group configuration was rejected.
    #[error("Invalid group configuration: {0}")]
    InvalidConfig(String),
}

impl ArrayError {
    /// Returns `true` if the failure was detected locally, before or without any
    /// communication, so the caller may correct its arguments and retry.
    ///
    /// Group-level failures (`Communication`, `Codec`) leave the group in an undefined
    /// state for the failed call. Retrying them on one rank would desynchronize the
    /// collective call sequence of the others.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ArrayError::ShapeMismatch { .. }
                | ArrayError::IndexOutOfBounds { .. }
                | ArrayError::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ArrayError>;

/// Trait bound for elements that can be stored in a distributed array.
///
/// # Requirements
/// - `Clone`: `copy()` deep-duplicates the store.
/// - `Payload`: a point write ships the element from root to every rank.
/// - `Send + Sync`: each rank typically runs on its own thread or process.
pub trait Element: Clone + Debug + Send + Sync + Payload {}

impl<T> Element for T where T: Clone + Debug + Send + Sync + Payload {}

/// How generic algorithms should traverse an array.
///
/// One-dimensional arrays are addressed with a single linear position;
/// everything else with a full cartesian index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStyle {
    Linear,
    Cartesian,
}

impl IndexStyle {
    pub const fn for_rank(rank: usize) -> Self {
        if rank == 1 {
            IndexStyle::Linear
        } else {
            IndexStyle::Cartesian
        }
    }
}

/// A dense, shape-fixed, row-major store.
///
/// # Generics
///
/// - `T`: The element type.
/// - `RANK`: The number of dimensions (const generic).
///
/// The shape is only known at runtime, so index mismatches are reported as
/// [`ArrayError::IndexOutOfBounds`] rather than rejected by the compiler.
#[derive(Clone, PartialEq)]
pub struct Dense<T, const RANK: usize> {
    shape: [usize; RANK],
    strides: [usize; RANK],
    data: Vec<T>,
}

impl<T, const RANK: usize> Dense<T, RANK> {
    /// Creates a new store from a vector of data and a shape.
    ///
    /// # Errors
    ///
    /// Returns `ArrayError::ShapeMismatch` if the length of `data` does not match the product of `shape`.
    pub fn new(data: Vec<T>, shape: [usize; RANK]) -> Result<Self> {
        let size: usize = shape.iter().product();
        if data.len() != size {
            return Err(ArrayError::ShapeMismatch {
                expected: vec![size],
                got: vec![data.len()],
            });
        }

        Ok(Self {
            shape,
            strides: compute_strides(&shape),
            data,
        })
    }

    /// Creates a new store with every slot set to `value`.
    pub fn filled(value: T, shape: [usize; RANK]) -> Self
    where
        T: Clone,
    {
        let size: usize = shape.iter().product();
        Self {
            shape,
            strides: compute_strides(&shape),
            data: vec![value; size],
        }
    }

    /// Returns the strides of the store.
    pub const fn strides(&self) -> &[usize; RANK] {
        &self.strides
    }

    /// Returns the total number of elements.
    pub const fn size(&self) -> usize {
        let mut size = 1;
        let mut i = 0;
        while i < RANK {
            size *= self.shape[i];
            i += 1;
        }
        size
    }

    /// Consumes the store, returning its row-major data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T, const RANK: usize> Debug for Dense<T, RANK> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dense")
            .field("shape", &self.shape)
            .field("element", &std::any::type_name::<T>())
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl<T: Element, const RANK: usize> BackingStore<T, RANK> for Dense<T, RANK> {
    fn filled(value: T, shape: [usize; RANK]) -> Self {
        Dense::filled(value, shape)
    }

    fn from_vec(data: Vec<T>, shape: [usize; RANK]) -> Result<Self> {
        Dense::new(data, shape)
    }

    fn shape(&self) -> [usize; RANK] {
        self.shape
    }

    fn as_slice(&self) -> &[T] {
        &self.data
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    fn offset(&self, index: [usize; RANK]) -> Result<usize> {
        let mut offset = 0;
        for d in 0..RANK {
            if index[d] >= self.shape[d] {
                return Err(ArrayError::IndexOutOfBounds {
                    index: index.to_vec(),
                    shape: self.shape.to_vec(),
                });
            }
            offset += index[d] * self.strides[d];
        }
        Ok(offset)
    }
}

/// Computes row-major strides for a given shape.
///
/// The stride of a dimension is the number of elements to skip in the flat data
/// to move one step along that dimension.
pub(crate) const fn compute_strides<const RANK: usize>(shape: &[usize; RANK]) -> [usize; RANK] {
    let mut strides = [0; RANK];
    let mut stride = 1;
    let mut i = RANK;
    while i > 0 {
        i -= 1;
        strides[i] = stride;
        stride *= shape[i];
    }
    strides
}
