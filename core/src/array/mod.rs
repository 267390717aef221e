//! The distributed array facade.
//!
//! A [`DistributedArray`] wraps exactly one local [`BackingStore`] and a handle to its rank's
//! [`CollectiveBackend`]. It behaves like any other Rust container for reads, which never
//! communicate, and routes every point write through a [`Broadcaster`] so that, after the
//! write returns, every rank holds root's value in that slot.
//!
//! ## Example: Single Process
//!
//! ```rust
//! use rootcast::array::DistributedMatrix;
//! use rootcast::distributed::backend::SingleProcess;
//!
//! let mut m = DistributedMatrix::<i32, _>::from_vec(vec![1, 2, 3, 4], [2, 2], SingleProcess).unwrap();
//! m.set([0, 1], 42).unwrap();
//! assert_eq!(m[[0, 1]], 42);
//! assert_eq!(m.iter().copied().collect::<Vec<_>>(), vec![1, 42, 3, 4]);
//! ```
//!
//! ## Caller Contract
//!
//! *   Every rank must issue the same point writes, in the same order. Values may differ;
//!     only root's survive.
//! *   [`build`](DistributedArray::build), [`similar`](DistributedArray::similar) and the growth
//!     operations in [`growth`] are **local**. They keep ranks identical only if every rank
//!     passes identical arguments. [`resync`](DistributedArray::resync) restores root
//!     authority explicitly.

use crate::distributed::backend::CollectiveBackend;
use crate::distributed::broadcaster::Broadcaster;
use crate::distributed::payload::Payload;
use crate::store::{ArrayError, BackingStore, Dense, Element, IndexStyle, Result};
use num_traits::{One, Zero};
use std::marker::PhantomData;
use std::ops::{Index, Range};
use tracing::debug;

pub mod growth;

/// An array kept consistent across a process group by root-authoritative writes.
///
/// # Generics
///
/// - `T`: The element type. May itself be a `DistributedArray`.
/// - `RANK`: The number of dimensions (const generic).
/// - `B`: The collective backend of the local rank.
/// - `S`: The local backing store (defaults to [`Dense`]).
#[derive(Clone, Debug)]
pub struct DistributedArray<T, const RANK: usize, B, S = Dense<T, RANK>> {
    store: S,
    broadcaster: Broadcaster<B>,
    _element: PhantomData<T>,
}

/// A growable one-dimensional array backed by a `Vec<T>`.
pub type DistributedVector<T, B> = DistributedArray<T, 1, B, Vec<T>>;

/// A dense two-dimensional array.
pub type DistributedMatrix<T, B> = DistributedArray<T, 2, B>;

impl<T, const RANK: usize, B, S> DistributedArray<T, RANK, B, S>
where
    T: Element,
    B: CollectiveBackend,
    S: BackingStore<T, RANK>,
{
    /// Wraps an existing store. Local only.
    pub fn wrap(store: S, backend: B) -> Self {
        Self {
            store,
            broadcaster: Broadcaster::new(backend),
            _element: PhantomData,
        }
    }

    /// Allocates a store of `shape` with every slot set to `default`.
    ///
    /// This is **not** a broadcast: ranks passing different defaults diverge immediately.
    pub fn build(default: T, shape: [usize; RANK], backend: B) -> Self {
        Self::wrap(S::filled(default, shape), backend)
    }

    /// Builds an array from row-major `data`. Local only.
    ///
    /// # Errors
    ///
    /// Returns `ArrayError::ShapeMismatch` if `data` does not fill `shape`.
    pub fn from_vec(data: Vec<T>, shape: [usize; RANK], backend: B) -> Result<Self> {
        Ok(Self::wrap(S::from_vec(data, shape)?, backend))
    }

    pub fn zeros(shape: [usize; RANK], backend: B) -> Self
    where
        T: Zero,
    {
        Self::build(T::zero(), shape, backend)
    }

    pub fn ones(shape: [usize; RANK], backend: B) -> Self
    where
        T: One,
    {
        Self::build(T::one(), shape, backend)
    }

    /// Returns the extent of each dimension.
    pub fn shape(&self) -> [usize; RANK] {
        self.store.shape()
    }

    /// Returns the valid index range of each dimension.
    pub fn axes(&self) -> [Range<usize>; RANK] {
        let shape = self.shape();
        std::array::from_fn(|d| 0..shape[d])
    }

    /// Returns the name of the element type.
    pub fn element_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns [`IndexStyle::Linear`] for one-dimensional arrays, [`IndexStyle::Cartesian`] otherwise.
    pub fn index_style(&self) -> IndexStyle {
        IndexStyle::for_rank(RANK)
    }

    /// Reads the local value at `index`. Never communicates.
    ///
    /// # Errors
    ///
    /// Returns `ArrayError::IndexOutOfBounds` if `index` is outside the shape.
    pub fn get(&self, index: [usize; RANK]) -> Result<&T> {
        self.store.get(index)
    }

    /// Iterates over the local elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.store.as_slice().iter()
    }

    /// Iterates over every valid index in row-major order.
    pub fn indices(&self) -> CartesianIndices<RANK> {
        CartesianIndices::new(self.shape())
    }

    pub fn as_slice(&self) -> &[T] {
        self.store.as_slice()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn backend(&self) -> &B {
        self.broadcaster.backend()
    }

    /// Deep-copies the local store. Local only: the source is already group-consistent.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// A new array of the same shape, element type and store, filled with `T::default()`.
    ///
    /// Not broadcast-consistent beyond what identical calls on every rank produce.
    pub fn similar(&self) -> Self
    where
        T: Default,
    {
        Self::build(T::default(), self.shape(), self.backend().clone())
    }

    /// Like [`similar`](Self::similar), with a different element type in a dense store.
    pub fn similar_as<U>(&self) -> DistributedArray<U, RANK, B>
    where
        U: Element + Default,
    {
        DistributedArray::build(U::default(), self.shape(), self.backend().clone())
    }

    /// Like [`similar`](Self::similar), with a different element type and shape in a dense store.
    pub fn similar_shaped<U, const R2: usize>(&self, shape: [usize; R2]) -> DistributedArray<U, R2, B>
    where
        U: Element + Default,
    {
        DistributedArray::build(U::default(), shape, self.backend().clone())
    }

    /// Writes `value` at `index` under root authority.
    ///
    /// With an active context, every rank must call this for the same `index` in the same
    /// position of its call sequence. On return every rank holds root's `value`; the values
    /// other ranks passed are dropped.
    ///
    /// # Errors
    ///
    /// - `ArrayError::IndexOutOfBounds`: detected locally, before any communication.
    /// - `ArrayError::Communication` / `ArrayError::Codec`: the broadcast failed; the group
    ///   state for this write is undefined and it must not be retried alone.
    pub fn set(&mut self, index: [usize; RANK], value: T) -> Result<()> {
        let slot = self.store.get_mut(index)?;
        self.broadcaster.write(slot, value)
    }

    /// Replaces every rank's store with root's, shape included.
    ///
    /// A collective: every rank must call it. Use it to re-establish root authority after
    /// growth operations or `similar()`. No effect without an active context.
    ///
    /// # Errors
    ///
    /// Besides transport failures, returns `ArrayError::Communication` on a rank that must
    /// create slots but holds no element to seed them from, when `T` can only be decoded
    /// into an existing value (nested arrays).
    pub fn resync(&mut self) -> Result<()> {
        if !self.backend().is_active() {
            return Ok(());
        }

        let store = &self.store;
        let frame = self
            .broadcaster
            .share(|| encode_store(&store.shape(), store.as_slice()))?;
        self.replace_from_frame(&frame)?;

        debug!(
            rank = self.backend().rank(),
            shape = ?self.shape(),
            "store resynchronized from root"
        );
        Ok(())
    }
}

/// Frames a store as its shape plus one frame per element.
///
/// Elements are framed individually so nested arrays can decode into their existing slots.
fn encode_store<T: Payload>(shape: &[usize], elements: &[T]) -> Result<Vec<u8>> {
    let frames = elements
        .iter()
        .map(Payload::encode)
        .collect::<Result<Vec<_>>>()?;
    Ok(bincode::serialize(&(shape, frames))?)
}

fn decode_store<const RANK: usize>(frame: &[u8]) -> Result<([usize; RANK], Vec<Vec<u8>>)> {
    let (shape, frames): (Vec<usize>, Vec<Vec<u8>>) = bincode::deserialize(frame)?;
    let dims = <[usize; RANK]>::try_from(shape.as_slice()).map_err(|_| {
        ArrayError::ShapeMismatch {
            expected: vec![RANK],
            got: vec![shape.len()],
        }
    })?;
    Ok((dims, frames))
}

/// Rebuilds elements from received frames.
///
/// Slot `i` starts from local element `i`, or a clone of the last local element when the
/// store grows, and is then overwritten with its frame. Nested arrays therefore keep the
/// local backend handle. Only with no local element at all is a value decoded from scratch.
fn elements_from_frames<T: Element>(local: &[T], frames: &[Vec<u8>]) -> Result<Vec<T>> {
    let mut data = Vec::with_capacity(frames.len());
    for (i, frame) in frames.iter().enumerate() {
        let slot = match local.get(i).or(local.last()).cloned() {
            Some(mut slot) => {
                slot.assign_encoded(frame)?;
                slot
            }
            None => T::decode_owned(frame)?.ok_or_else(|| {
                ArrayError::Communication(format!(
                    "no local element to rebuild received slot {i} from"
                ))
            })?,
        };
        data.push(slot);
    }
    Ok(data)
}

impl<T, const RANK: usize, B, S> DistributedArray<T, RANK, B, S>
where
    T: Element,
    B: CollectiveBackend,
    S: BackingStore<T, RANK>,
{
    /// Makes the local store an exact copy of the store framed in `frame`.
    ///
    /// A matching shape is decoded element by element in place; any other shape rebuilds
    /// the store.
    fn replace_from_frame(&mut self, frame: &[u8]) -> Result<()> {
        let (dims, frames) = decode_store::<RANK>(frame)?;
        if dims == self.shape() && frames.len() == self.len() {
            for (slot, frame) in self.store.as_mut_slice().iter_mut().zip(&frames) {
                slot.assign_encoded(frame)?;
            }
        } else {
            let data = elements_from_frames(self.store.as_slice(), &frames)?;
            self.store = S::from_vec(data, dims)?;
        }
        Ok(())
    }
}

/// Nested arrays travel as their shape plus per-element frames.
///
/// Decoding writes into the existing elements, so each nested array keeps its own
/// backend handle. A received shape that differs from the local one reshapes the local
/// store to match.
impl<T, const RANK: usize, B, S> Payload for DistributedArray<T, RANK, B, S>
where
    T: Element,
    B: CollectiveBackend,
    S: BackingStore<T, RANK>,
{
    fn encode(&self) -> Result<Vec<u8>> {
        encode_store(&self.shape(), self.store.as_slice())
    }

    fn assign_encoded(&mut self, frame: &[u8]) -> Result<()> {
        self.replace_from_frame(frame)
    }
}

impl<T, const RANK: usize, B, S> Index<[usize; RANK]> for DistributedArray<T, RANK, B, S>
where
    T: Element,
    B: CollectiveBackend,
    S: BackingStore<T, RANK>,
{
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index` is out of bounds. Use [`get`](DistributedArray::get) to handle it.
    fn index(&self, index: [usize; RANK]) -> &T {
        match self.store.get(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T, B, S> Index<usize> for DistributedArray<T, 1, B, S>
where
    T: Element,
    B: CollectiveBackend,
    S: BackingStore<T, 1>,
{
    type Output = T;

    fn index(&self, position: usize) -> &T {
        &self[[position]]
    }
}

impl<'a, T, const RANK: usize, B, S> IntoIterator for &'a DistributedArray<T, RANK, B, S>
where
    T: Element,
    B: CollectiveBackend,
    S: BackingStore<T, RANK>,
{
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Row-major iterator over every index of a shape.
#[derive(Debug, Clone)]
pub struct CartesianIndices<const RANK: usize> {
    shape: [usize; RANK],
    next: Option<[usize; RANK]>,
}

impl<const RANK: usize> CartesianIndices<RANK> {
    pub fn new(shape: [usize; RANK]) -> Self {
        let next = if shape.iter().all(|&extent| extent > 0) {
            Some([0; RANK])
        } else {
            None
        };
        Self { shape, next }
    }
}

impl<const RANK: usize> Iterator for CartesianIndices<RANK> {
    type Item = [usize; RANK];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        // Odometer step: bump the last dimension, carry leftwards.
        let mut following = current;
        let mut d = RANK;
        self.next = loop {
            if d == 0 {
                break None;
            }
            d -= 1;
            following[d] += 1;
            if following[d] < self.shape[d] {
                break Some(following);
            }
            following[d] = 0;
        };

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed::backend::{ProcessContext, SingleProcess};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// An active single-rank context that counts broadcasts.
    #[derive(Debug, Clone, Default)]
    struct Counting {
        broadcasts: Arc<AtomicUsize>,
    }

    impl ProcessContext for Counting {
        fn is_active(&self) -> bool {
            true
        }
        fn rank(&self) -> usize {
            0
        }
        fn world_size(&self) -> usize {
            1
        }
    }

    impl CollectiveBackend for Counting {
        fn broadcast_bytes(&self, frame: Vec<u8>, _root: usize) -> Result<Vec<u8>> {
            self.broadcasts.fetch_add(1, Ordering::SeqCst);
            Ok(frame)
        }
    }

    #[test]
    fn test_single_process_equivalence() {
        let mut a = DistributedArray::<i64, 2, _>::zeros([2, 3], SingleProcess);
        for (n, index) in a.indices().collect::<Vec<_>>().into_iter().enumerate() {
            a.set(index, n as i64).unwrap();
            assert_eq!(a[index], n as i64);
        }
        assert_eq!(a.as_slice(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_build_and_shape_queries() {
        let a = DistributedArray::<f32, 3, _>::build(1.5, [2, 1, 4], SingleProcess);
        assert_eq!(a.shape(), [2, 1, 4]);
        assert_eq!(a.axes(), [0..2, 0..1, 0..4]);
        assert_eq!(a.len(), 8);
        assert_eq!(a.element_type(), "f32");
        assert!(a.iter().all(|&v| v == 1.5));
    }

    #[test]
    fn test_from_vec_shape_mismatch() {
        let err = DistributedMatrix::<i32, _>::from_vec(vec![1, 2, 3], [2, 2], SingleProcess);
        assert!(matches!(err, Err(ArrayError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_bounds_error() {
        let mut a = DistributedVector::<u8, _>::zeros([4], SingleProcess);
        assert!(matches!(
            a.get([4]),
            Err(ArrayError::IndexOutOfBounds { .. })
        ));
        let err = a.set([9], 1).unwrap_err();
        assert!(err.is_local());
        assert_eq!(a.as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "Index out of bounds")]
    fn test_index_panics_out_of_bounds() {
        let a = DistributedMatrix::<i32, _>::zeros([2, 2], SingleProcess);
        let _ = a[[2, 0]];
    }

    #[test]
    fn test_reads_never_broadcast() {
        let ctx = Counting::default();
        let mut a = DistributedMatrix::<i32, _>::from_vec(vec![1, 2, 3, 4], [2, 2], ctx.clone())
            .unwrap();

        for _ in 0..10 {
            let _ = a.get([1, 1]).unwrap();
            let _ = a[[0, 0]];
            let _: i32 = a.iter().sum();
            let _ = a.shape();
            let _ = a.copy();
        }
        assert_eq!(ctx.broadcasts.load(Ordering::SeqCst), 0);

        a.set([0, 1], 42).unwrap();
        assert_eq!(ctx.broadcasts.load(Ordering::SeqCst), 1);
        assert_eq!(a[[0, 1]], 42);
    }

    #[test]
    fn test_index_style() {
        let v = DistributedVector::<i32, _>::zeros([3], SingleProcess);
        let m = DistributedMatrix::<i32, _>::zeros([3, 3], SingleProcess);
        assert_eq!(v.index_style(), IndexStyle::Linear);
        assert_eq!(m.index_style(), IndexStyle::Cartesian);
        assert_eq!(v[2], 0);
    }

    #[test]
    fn test_cartesian_indices() {
        let idx: Vec<_> = CartesianIndices::new([2, 3]).collect();
        assert_eq!(
            idx,
            vec![[0, 0], [0, 1], [0, 2], [1, 0], [1, 1], [1, 2]]
        );
        assert_eq!(CartesianIndices::new([3, 0]).count(), 0);
        assert_eq!(CartesianIndices::<0>::new([]).count(), 1);
    }

    #[test]
    fn test_copy_is_deep() {
        let mut a = DistributedVector::<String, _>::build("a".into(), [2], SingleProcess);
        let b = a.copy();
        a.set([0], "changed".into()).unwrap();
        assert_eq!(b[0], "a");
        assert_eq!(a[0], "changed");
    }

    #[test]
    fn test_similar() {
        let a = DistributedMatrix::<i32, _>::ones([2, 3], SingleProcess);
        let same = a.similar();
        assert_eq!(same.shape(), [2, 3]);
        assert!(same.iter().all(|&v| v == 0));

        let floats = a.similar_as::<f64>();
        assert_eq!(floats.shape(), [2, 3]);
        assert_eq!(floats.element_type(), "f64");

        let cube = a.similar_shaped::<u8, 3>([1, 2, 2]);
        assert_eq!(cube.shape(), [1, 2, 2]);
        assert_eq!(cube.len(), 4);
    }

    #[test]
    fn test_nested_payload() {
        let inner = DistributedVector::<i32, _>::from_vec(vec![1, 2, 3], [3], SingleProcess)
            .unwrap();
        let mut other =
            DistributedVector::<i32, _>::zeros([3], SingleProcess);
        other.assign_encoded(&inner.encode().unwrap()).unwrap();
        assert_eq!(other.as_slice(), &[1, 2, 3]);

        let mut shorter = DistributedVector::<i32, _>::zeros([2], SingleProcess);
        shorter.assign_encoded(&inner.encode().unwrap()).unwrap();
        assert_eq!(shorter.shape(), [3]);
        assert_eq!(shorter.as_slice(), &[1, 2, 3]);

        let mut empty = DistributedVector::<i32, _>::wrap(Vec::new(), SingleProcess);
        empty.assign_encoded(&inner.encode().unwrap()).unwrap();
        assert_eq!(empty.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_nested_payload_reshapes_dense_store() {
        let source =
            DistributedMatrix::<i32, _>::from_vec(vec![1, 2, 3, 4, 5, 6], [3, 2], SingleProcess)
                .unwrap();
        let mut slot = DistributedMatrix::<i32, _>::zeros([1, 1], SingleProcess);
        slot.assign_encoded(&source.encode().unwrap()).unwrap();
        assert_eq!(slot.shape(), [3, 2]);
        assert_eq!(slot[[2, 1]], 6);
    }

    #[test]
    fn test_nested_grid_rebuilds_inner_rows() {
        let wide = DistributedVector::<i32, _>::from_vec(vec![7, 8, 9], [3], SingleProcess)
            .unwrap();
        let source = DistributedVector::build(wide, [3], SingleProcess);

        let narrow = DistributedVector::<i32, _>::zeros([2], SingleProcess);
        let mut slot = DistributedVector::build(narrow, [1], SingleProcess);
        slot.assign_encoded(&source.encode().unwrap()).unwrap();

        assert_eq!(slot.len(), 3);
        assert!(slot.iter().all(|row| row.as_slice() == [7, 8, 9]));
    }

    #[test]
    fn test_nested_grid_without_seed_fails_as_group_error() {
        let row = DistributedVector::<i32, _>::zeros([2], SingleProcess);
        let source = DistributedVector::build(row, [1], SingleProcess);

        let mut empty: DistributedVector<DistributedVector<i32, SingleProcess>, _> =
            DistributedVector::wrap(Vec::new(), SingleProcess);
        let err = empty.assign_encoded(&source.encode().unwrap()).unwrap_err();
        assert!(matches!(err, ArrayError::Communication(_)));
        assert!(!err.is_local());
    }

    #[test]
    fn test_array_of_arrays_single_process() {
        let row = DistributedVector::<i32, _>::zeros([2], SingleProcess);
        let mut grid = DistributedVector::build(row.clone(), [2], SingleProcess);
        let mut replacement = row.copy();
        replacement.set([1], 5).unwrap();
        grid.set([1], replacement).unwrap();

        assert_eq!(grid[0].as_slice(), &[0, 0]);
        assert_eq!(grid[1].as_slice(), &[0, 5]);
    }

    #[test]
    fn test_resync_without_group_is_noop() {
        let mut a = DistributedVector::<i32, _>::from_vec(vec![1, 2], [2], SingleProcess)
            .unwrap();
        a.resync().unwrap();
        assert_eq!(a.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_resync_with_active_single_rank() {
        let ctx = Counting::default();
        let mut a = DistributedVector::<i32, _>::from_vec(vec![1, 2], [2], ctx.clone()).unwrap();
        a.resync().unwrap();
        assert_eq!(a.as_slice(), &[1, 2]);
        assert_eq!(ctx.broadcasts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_into_iterator() {
        let a = DistributedMatrix::<i32, _>::from_vec(vec![1, 2, 3, 4], [2, 2], SingleProcess)
            .unwrap();
        let mut total = 0;
        for v in &a {
            total += v;
        }
        assert_eq!(total, 10);
    }
}
