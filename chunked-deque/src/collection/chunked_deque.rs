// # Illustration
//
// Outer index with a real capacity of 4 slots and chunks of 4 elements.
//
//   slot 0     slot 1          slot 2          slot 3
// |  None  | | . . A B | --> | C D E F | --> | G . . . | --> None
//                ^                                ^
//                |--> begin (global slot 6)       |--> end (global slot 13, exclusive)
//
// A global slot `g` lives in the chunk of slot `g / C` at offset `g % C`. Only slots inside
// `[begin / C, ceil(end / C))` own a chunk and only elements inside `[begin, end)` are
// initialized.
//
// Chunks are allocated right before the first element that needs them and are freed as soon
// as a pop takes their last element. The outer index is only rebuilt when a push would address a
// slot outside of it, see the `growth` module.

mod chunk;
mod growth;
mod iter;
#[cfg(kani)]
mod kani;
mod outer_index;
mod staging;

use crate::{
  collection::{AllocPropagation, Cursor},
  misc::{_unlikely_elem, _unlikely_unreachable},
};
use allocator_api2::alloc::{Allocator, Global};
use core::{
  alloc::Layout,
  fmt::{Debug, Formatter},
  hash::{Hash, Hasher},
  mem,
  ops::{Index, IndexMut},
  ptr,
};
pub use iter::{IntoIter, Iter, IterMut};
use outer_index::OuterIndex;
use staging::Staging;

/// Errors of [`ChunkedDeque`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChunkedDequeError {
  #[doc = doc_alloc_failure!()]
  AllocationFailure {
    /// Requested layout
    layout: Layout,
  },
  /// The number of elements or slots can not be represented.
  CapacityOverflow,
  /// Index does not point to an element.
  OutOfRange {
    /// Requested index
    idx: usize,
    /// Number of elements at the moment of the request
    len: usize,
  },
}

impl core::fmt::Display for ChunkedDequeError {
  #[inline]
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    <Self as Debug>::fmt(self, f)
  }
}

impl core::error::Error for ChunkedDequeError {}

#[derive(Clone, Copy, Debug)]
enum End {
  Back,
  Front,
}

/// Double-ended queue whose elements are stored in fixed-capacity chunks of `C` elements.
///
/// Chunks never move, so growing the instance only copies the handles of the outer index.
/// Every fallible operation either completes or leaves the instance exactly as it was.
///
/// ```rust
/// use chunked_deque::collection::ChunkedDeque;
///
/// let mut deque = ChunkedDeque::<i32, 4>::new();
/// deque.push_back(1).unwrap();
/// deque.push_front(2).unwrap();
/// deque.push_back(3).unwrap();
/// assert_eq!(deque, [2, 1, 3]);
/// ```
pub struct ChunkedDeque<T, const C: usize = 8, A = Global>
where
  A: Allocator,
{
  alloc: A,
  begin: usize,
  end: usize,
  index: OuterIndex<T, C>,
}

impl<T, const C: usize> ChunkedDeque<T, C, Global> {
  /// Creates a new empty instance that doesn't allocate anything.
  #[inline]
  pub const fn new() -> Self {
    Self::new_in(Global)
  }

  /// Constructs an instance with `len` elements produced by `Default`.
  ///
  /// ```rust
  /// let deque = chunked_deque::collection::ChunkedDeque::<u8, 2>::with_len(3).unwrap();
  /// assert_eq!(deque, [0, 0, 0]);
  /// ```
  #[inline]
  pub fn with_len(len: usize) -> crate::Result<Self>
  where
    T: Default,
  {
    Self::with_len_in(len, Global)
  }

  /// Constructs an instance with `len` clones of `value`.
  ///
  /// ```rust
  /// let deque = chunked_deque::collection::ChunkedDeque::<u8, 2>::from_elem(3, &7).unwrap();
  /// assert_eq!(deque, [7, 7, 7]);
  /// ```
  #[inline]
  pub fn from_elem(len: usize, value: &T) -> crate::Result<Self>
  where
    T: Clone,
  {
    Self::from_elem_in(len, value, Global)
  }

  /// Constructs an instance with the elements of `iter` in the same order.
  ///
  /// ```rust
  /// let deque = chunked_deque::collection::ChunkedDeque::<u8, 2>::try_from_iter([1, 2, 3]).unwrap();
  /// assert_eq!(deque, [1, 2, 3]);
  /// ```
  #[inline]
  pub fn try_from_iter(iter: impl IntoIterator<Item = T>) -> crate::Result<Self> {
    Self::try_from_iter_in(iter, Global)
  }
}

impl<T, const C: usize, A> ChunkedDeque<T, C, A>
where
  A: Allocator,
{
  /// Number of elements of each chunk.
  pub const CHUNK_CAPACITY: usize = C;

  /// Creates a new empty instance backed by `alloc` that doesn't allocate anything.
  #[inline]
  pub const fn new_in(alloc: A) -> Self {
    const {
      assert!(C > 0, "Chunks must be able to hold at least one element");
    }
    Self { alloc, begin: 0, end: 0, index: OuterIndex::empty() }
  }

  /// Constructs an instance with `len` elements where the element of index `idx` is produced by
  /// `cb(idx)`.
  ///
  /// If `cb` returns an error or panics, all elements produced so far are dropped and all memory
  /// acquired so far is given back to `alloc` before the error is returned.
  ///
  /// ```rust
  /// use chunked_deque::collection::ChunkedDeque;
  /// use allocator_api2::alloc::Global;
  ///
  /// let deque = ChunkedDeque::<usize, 2>::try_from_fn_in(3, Global, |idx| {
  ///   Ok::<_, chunked_deque::Error>(idx * 2)
  /// });
  /// assert_eq!(deque.unwrap(), [0, 2, 4]);
  ///
  /// let deque = ChunkedDeque::<usize, 2>::try_from_fn_in(3, Global, |idx| {
  ///   if idx == 1 { Err(()) } else { Ok(idx) }
  /// });
  /// assert!(deque.is_err());
  /// ```
  #[inline]
  pub fn try_from_fn_in<E>(
    len: usize,
    alloc: A,
    mut cb: impl FnMut(usize) -> Result<T, E>,
  ) -> Result<Self, E>
  where
    E: From<crate::Error>,
  {
    let mut this = Self::new_in(alloc);
    if len == 0 {
      return Ok(this);
    }
    this.index = OuterIndex::allocate(&this.alloc, len.div_ceil(C))?;
    for idx in 0..len {
      this.try_push_back_with(|| cb(idx))?;
    }
    Ok(this)
  }

  /// See [`Self::with_len`].
  #[inline]
  pub fn with_len_in(len: usize, alloc: A) -> crate::Result<Self>
  where
    T: Default,
  {
    Self::try_from_fn_in(len, alloc, |_| Ok(T::default()))
  }

  /// See [`Self::from_elem`].
  #[inline]
  pub fn from_elem_in(len: usize, value: &T, alloc: A) -> crate::Result<Self>
  where
    T: Clone,
  {
    Self::try_from_fn_in(len, alloc, |_| Ok(value.clone()))
  }

  /// See [`Self::try_from_iter`].
  #[inline]
  pub fn try_from_iter_in(iter: impl IntoIterator<Item = T>, alloc: A) -> crate::Result<Self> {
    let mut this = Self::new_in(alloc);
    this.extend_back_from_iter(iter)?;
    Ok(this)
  }

  /// Deep copy where the allocator of the copy is a clone of the allocator of `self`.
  #[inline]
  pub fn try_clone(&self) -> crate::Result<Self>
  where
    A: Clone,
    T: Clone,
  {
    self.try_clone_in(self.alloc.clone())
  }

  /// Deep copy backed by `alloc`.
  ///
  /// ```rust
  /// use chunked_deque::collection::ChunkedDeque;
  /// use allocator_api2::alloc::Global;
  ///
  /// let deque = ChunkedDeque::<u8, 2>::try_from_iter([1, 2, 3]).unwrap();
  /// let mut copy = deque.try_clone_in(Global).unwrap();
  /// *copy.at_mut(0).unwrap() = 9;
  /// assert_eq!(deque, [1, 2, 3]);
  /// assert_eq!(copy, [9, 2, 3]);
  /// ```
  #[inline]
  pub fn try_clone_in<B>(&self, alloc: B) -> crate::Result<ChunkedDeque<T, C, B>>
  where
    B: Allocator,
    T: Clone,
  {
    let len = self.len();
    ChunkedDeque::try_from_fn_in(len, alloc, |idx| {
      self.get(idx).cloned().ok_or_else(|| ChunkedDequeError::OutOfRange { idx, len }.into())
    })
  }

  /// Replaces the contents of `self` with a deep copy of `src`.
  ///
  /// `propagation` decides which allocator backs the copy. The previous contents are only
  /// released after the copy succeeded.
  ///
  /// ```rust
  /// use chunked_deque::collection::{AllocPropagation, ChunkedDeque};
  ///
  /// let src = ChunkedDeque::<u8, 2>::try_from_iter([1, 2, 3]).unwrap();
  /// let mut dst = ChunkedDeque::<u8, 2>::try_from_iter([4]).unwrap();
  /// dst.try_assign(&src, AllocPropagation::Propagate).unwrap();
  /// assert_eq!(dst, [1, 2, 3]);
  /// ```
  #[inline]
  pub fn try_assign(&mut self, src: &Self, propagation: AllocPropagation) -> crate::Result<()>
  where
    A: Clone,
    T: Clone,
  {
    let alloc = propagation.select(&self.alloc, &src.alloc).clone();
    *self = src.try_clone_in(alloc)?;
    Ok(())
  }

  /// Moves all elements and the allocator out, leaving an empty instance with a default
  /// allocator behind.
  ///
  /// ```rust
  /// use chunked_deque::collection::ChunkedDeque;
  ///
  /// let mut src = ChunkedDeque::<u8, 2>::try_from_iter([1, 2, 3]).unwrap();
  /// let dst = src.take();
  /// assert!(src.is_empty());
  /// assert_eq!(dst, [1, 2, 3]);
  /// ```
  #[inline]
  pub fn take(&mut self) -> Self
  where
    A: Default,
  {
    mem::replace(self, Self::new_in(A::default()))
  }

  /// Underlying allocator.
  #[inline]
  pub fn allocator(&self) -> &A {
    &self.alloc
  }

  /// Checked version of [`Self::get`].
  ///
  #[doc = doc_out_of_range!()]
  ///
  /// ```rust
  /// use chunked_deque::collection::{ChunkedDeque, ChunkedDequeError};
  ///
  /// let deque = ChunkedDeque::<u8>::try_from_iter([1]).unwrap();
  /// assert_eq!(deque.at(0).unwrap(), &1);
  /// assert!(matches!(
  ///   deque.at(1),
  ///   Err(chunked_deque::Error::ChunkedDequeError(ChunkedDequeError::OutOfRange { idx: 1, len: 1 }))
  /// ));
  /// ```
  #[inline]
  pub fn at(&self, idx: usize) -> crate::Result<&T> {
    let len = self.len();
    match self.get(idx) {
      Some(elem) => Ok(elem),
      None => _unlikely_elem(Err(ChunkedDequeError::OutOfRange { idx, len }.into())),
    }
  }

  /// Mutable version of [`Self::at`].
  #[inline]
  pub fn at_mut(&mut self, idx: usize) -> crate::Result<&mut T> {
    let len = self.len();
    match self.get_mut(idx) {
      Some(elem) => Ok(elem),
      None => _unlikely_elem(Err(ChunkedDequeError::OutOfRange { idx, len }.into())),
    }
  }

  /// Last element.
  #[inline]
  pub fn back(&self) -> Option<&T> {
    self.get(self.len().checked_sub(1)?)
  }

  /// Mutable version of [`Self::back`].
  #[inline]
  pub fn back_mut(&mut self) -> Option<&mut T> {
    self.get_mut(self.len().checked_sub(1)?)
  }

  /// Position of the first element.
  #[inline]
  pub fn begin(&self) -> Cursor<C> {
    Cursor::from_global(self.begin)
  }

  /// Number of chunks currently owned by the instance.
  #[inline]
  pub fn chunks_len(&self) -> usize {
    self.index.slots().iter().filter(|el| el.is_some()).count()
  }

  /// Removes all elements. The outer index is kept.
  #[inline]
  pub fn clear(&mut self) {
    self.truncate_back(0);
  }

  /// Position of the element at `idx`, or the position right after the last element if `idx`
  /// is equal to the length.
  #[inline]
  pub fn cursor(&self, idx: usize) -> Option<Cursor<C>> {
    if idx > self.len() {
      return None;
    }
    Some(Cursor::from_global(self.begin.wrapping_add(idx)))
  }

  /// Position right after the last element.
  #[inline]
  pub fn end(&self) -> Cursor<C> {
    Cursor::from_global(self.end)
  }

  /// Removes and returns the element at `idx`. Elements between `idx` and the nearest end are
  /// shifted by one position.
  ///
  #[doc = doc_out_of_range!()]
  ///
  /// ```rust
  /// use chunked_deque::collection::ChunkedDeque;
  ///
  /// let mut deque = ChunkedDeque::<u8, 2>::try_from_iter([1, 2, 3, 4]).unwrap();
  /// assert_eq!(deque.erase(2).unwrap(), 3);
  /// assert_eq!(deque, [1, 2, 4]);
  /// ```
  #[inline]
  pub fn erase(&mut self, idx: usize) -> crate::Result<T> {
    let len = self.len();
    if idx >= len {
      return _unlikely_elem(Err(ChunkedDequeError::OutOfRange { idx, len }.into()));
    }
    let rslt = if idx < len / 2 {
      for local_idx in (0..idx).rev() {
        self.swap(local_idx, local_idx.wrapping_add(1));
      }
      self.pop_front()
    } else {
      for local_idx in idx..len.wrapping_sub(1) {
        self.swap(local_idx, local_idx.wrapping_add(1));
      }
      self.pop_back()
    };
    match rslt {
      Some(elem) => Ok(elem),
      None => _unlikely_unreachable(),
    }
  }

  /// Appends all elements of the iterator.
  ///
  /// Stops at the first error. Elements appended before the error are kept.
  ///
  /// ```rust
  /// let mut deque = chunked_deque::collection::ChunkedDeque::<u8, 2>::new();
  /// deque.extend_back_from_iter([1, 2, 3]).unwrap();
  /// assert_eq!(deque, [1, 2, 3]);
  /// ```
  #[inline]
  pub fn extend_back_from_iter(&mut self, ii: impl IntoIterator<Item = T>) -> crate::Result<()> {
    for elem in ii {
      self.push_back(elem)?;
    }
    Ok(())
  }

  /// Prepends all elements of the iterator, one at a time.
  ///
  /// Stops at the first error. Elements prepended before the error are kept.
  ///
  /// ```rust
  /// let mut deque = chunked_deque::collection::ChunkedDeque::<u8, 2>::new();
  /// deque.extend_front_from_iter([1, 2, 3]).unwrap();
  /// assert_eq!(deque, [3, 2, 1]);
  /// ```
  #[inline]
  pub fn extend_front_from_iter(&mut self, ii: impl IntoIterator<Item = T>) -> crate::Result<()> {
    for elem in ii {
      self.push_front(elem)?;
    }
    Ok(())
  }

  /// First element.
  #[inline]
  pub fn front(&self) -> Option<&T> {
    self.get(0)
  }

  /// Mutable version of [`Self::front`].
  #[inline]
  pub fn front_mut(&mut self) -> Option<&mut T> {
    self.get_mut(0)
  }

  /// Provides a reference to the element at the given index.
  ///
  /// ```rust
  /// let deque = chunked_deque::collection::ChunkedDeque::<u8, 2>::try_from_iter([1, 3]).unwrap();
  /// assert_eq!(deque.get(1), Some(&3));
  /// assert_eq!(deque.get(2), None);
  /// ```
  #[inline]
  pub fn get(&self, idx: usize) -> Option<&T> {
    let ptr = self.elem_ptr(idx)?;
    // SAFETY: `elem_ptr` only returns pointers to initialized elements
    Some(unsafe { &*ptr })
  }

  /// Mutable version of [`Self::get`].
  #[inline]
  pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
    let ptr = self.elem_ptr(idx)?;
    // SAFETY: `elem_ptr` only returns pointers to initialized elements
    Some(unsafe { &mut *ptr })
  }

  /// Element located at `cursor`, if `cursor` is within the current window.
  ///
  /// ```rust
  /// let deque = chunked_deque::collection::ChunkedDeque::<u8, 2>::try_from_iter([1, 3]).unwrap();
  /// let cursor = deque.begin().forward().unwrap();
  /// assert_eq!(deque.get_at(cursor), Some(&3));
  /// assert_eq!(deque.get_at(deque.end()), None);
  /// ```
  #[inline]
  pub fn get_at(&self, cursor: Cursor<C>) -> Option<&T> {
    self.get(self.idx_of(cursor)?)
  }

  /// Mutable version of [`Self::get_at`].
  #[inline]
  pub fn get_at_mut(&mut self, cursor: Cursor<C>) -> Option<&mut T> {
    self.get_mut(self.idx_of(cursor)?)
  }

  /// Unchecked version of [`Self::get`].
  ///
  /// # Safety
  ///
  /// `idx` must be less than [`Self::len`].
  #[inline]
  pub unsafe fn get_unchecked(&self, idx: usize) -> &T {
    match self.get(idx) {
      Some(elem) => elem,
      // SAFETY: the caller guarantees that `idx` is within bounds
      None => unsafe { core::hint::unreachable_unchecked() },
    }
  }

  /// Unchecked version of [`Self::get_mut`].
  ///
  /// # Safety
  ///
  /// `idx` must be less than [`Self::len`].
  #[inline]
  pub unsafe fn get_unchecked_mut(&mut self, idx: usize) -> &mut T {
    match self.get_mut(idx) {
      Some(elem) => elem,
      // SAFETY: the caller guarantees that `idx` is within bounds
      None => unsafe { core::hint::unreachable_unchecked() },
    }
  }

  /// Index of the element located at `cursor`, or the length if `cursor` is equal to
  /// [`Self::end`].
  #[inline]
  pub fn idx_of(&self, cursor: Cursor<C>) -> Option<usize> {
    if cursor < self.begin() || cursor > self.end() {
      return None;
    }
    Some(cursor.global().wrapping_sub(self.begin))
  }

  /// Inserts `value` before the element at `idx`. Elements between `idx` and the nearest end
  /// are shifted by one position.
  ///
  /// `idx` can be equal to the length, which appends `value`.
  ///
  #[doc = doc_out_of_range!()]
  ///
  /// ```rust
  /// use chunked_deque::collection::ChunkedDeque;
  ///
  /// let mut deque = ChunkedDeque::<u8, 2>::try_from_iter([1, 2, 4]).unwrap();
  /// deque.insert(2, 3).unwrap();
  /// assert_eq!(deque, [1, 2, 3, 4]);
  /// ```
  #[inline]
  pub fn insert(&mut self, idx: usize, value: T) -> crate::Result<()> {
    self.try_insert_with(idx, || Ok(value))
  }

  /// Indicates whether the instance has no elements.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.begin == self.end
  }

  /// Returns a front-to-back iterator.
  ///
  /// ```rust
  /// let deque = chunked_deque::collection::ChunkedDeque::<u8, 2>::try_from_iter([1, 2, 3]).unwrap();
  /// assert!(deque.iter().rev().eq([3, 2, 1].iter()));
  /// ```
  #[inline]
  pub fn iter(&self) -> Iter<'_, T, C> {
    Iter::new(self.index.slots(), self.begin, self.end)
  }

  /// Mutable version of [`Self::iter`].
  #[inline]
  pub fn iter_mut(&mut self) -> IterMut<'_, T, C> {
    IterMut::new(self.index.slots(), self.begin, self.end)
  }

  /// Number of elements.
  #[inline]
  pub fn len(&self) -> usize {
    self.end.wrapping_sub(self.begin)
  }

  /// Number of slots of the outer index, also known as the real capacity.
  #[inline]
  pub fn outer_capacity(&self) -> usize {
    self.index.len()
  }

  /// Removes the last element and returns it, or `None` if the instance is empty.
  ///
  /// The chunk of the removed element is released if it has no other element.
  #[inline]
  pub fn pop_back(&mut self) -> Option<T> {
    if self.is_empty() {
      return None;
    }
    let new_end = self.end.wrapping_sub(1);
    let cursor = Cursor::<C>::from_global(new_end);
    let chunk = *self.index.slots().get(cursor.slot())?.as_ref()?;
    self.end = new_end;
    // SAFETY: `new_end` was the last initialized element
    let elem = unsafe { chunk.read(cursor.offset()) };
    if cursor.offset() == 0 {
      self.release_chunk(cursor.slot());
    }
    Some(elem)
  }

  /// Removes the first element and returns it, or `None` if the instance is empty.
  ///
  /// The chunk of the removed element is released if it has no other element.
  #[inline]
  pub fn pop_front(&mut self) -> Option<T> {
    if self.is_empty() {
      return None;
    }
    let cursor = Cursor::<C>::from_global(self.begin);
    let chunk = *self.index.slots().get(cursor.slot())?.as_ref()?;
    self.begin = self.begin.wrapping_add(1);
    // SAFETY: `begin` was the first initialized element
    let elem = unsafe { chunk.read(cursor.offset()) };
    if cursor.offset() == C.wrapping_sub(1) {
      self.release_chunk(cursor.slot());
    }
    Some(elem)
  }

  /// Appends an element to the back of the instance.
  ///
  /// ```rust
  /// let mut deque = chunked_deque::collection::ChunkedDeque::<u8, 2>::new();
  /// deque.push_back(1).unwrap();
  /// deque.push_back(3).unwrap();
  /// assert_eq!(deque, [1, 3]);
  /// ```
  #[inline]
  pub fn push_back(&mut self, value: T) -> crate::Result<()> {
    self.try_push_back_with(|| Ok(value))
  }

  /// Prepends an element to the front of the instance.
  ///
  /// ```rust
  /// let mut deque = chunked_deque::collection::ChunkedDeque::<u8, 2>::new();
  /// deque.push_front(1).unwrap();
  /// deque.push_front(3).unwrap();
  /// assert_eq!(deque, [3, 1]);
  /// ```
  #[inline]
  pub fn push_front(&mut self, value: T) -> crate::Result<()> {
    self.try_push_front_with(|| Ok(value))
  }

  /// Swaps the elements at `a` and `b`. Does nothing if one of the indices is out of bounds.
  #[inline]
  pub fn swap(&mut self, a: usize, b: usize) {
    let (Some(lhs), Some(rhs)) = (self.elem_ptr(a), self.elem_ptr(b)) else {
      return;
    };
    // SAFETY: both pointers point to initialized elements, `ptr::swap` allows overlapping
    unsafe {
      ptr::swap(lhs, rhs);
    }
  }

  /// Shortens the instance, keeping the first `new_len` elements.
  ///
  /// ```rust
  /// let mut deque = chunked_deque::collection::ChunkedDeque::<u8, 2>::try_from_iter([1, 2, 3]).unwrap();
  /// deque.truncate_back(1);
  /// assert_eq!(deque, [1]);
  /// ```
  #[inline]
  pub fn truncate_back(&mut self, new_len: usize) {
    while self.len() > new_len {
      drop(self.pop_back());
    }
  }

  /// Shortens the instance, keeping the last `new_len` elements.
  ///
  /// ```rust
  /// let mut deque = chunked_deque::collection::ChunkedDeque::<u8, 2>::try_from_iter([1, 2, 3]).unwrap();
  /// deque.truncate_front(1);
  /// assert_eq!(deque, [3]);
  /// ```
  #[inline]
  pub fn truncate_front(&mut self, new_len: usize) {
    while self.len() > new_len {
      drop(self.pop_front());
    }
  }

  /// Fallible version of [`Self::insert`] where the element is produced by `cb` after all
  /// memory required by the insertion was acquired.
  #[inline]
  pub fn try_insert_with<E>(&mut self, idx: usize, cb: impl FnOnce() -> Result<T, E>) -> Result<(), E>
  where
    E: From<crate::Error>,
  {
    let len = self.len();
    if idx > len {
      return _unlikely_elem(Err(crate::Error::from(ChunkedDequeError::OutOfRange { idx, len }).into()));
    }
    if idx < len / 2 {
      self.try_push_front_with(cb)?;
      for local_idx in 0..idx {
        self.swap(local_idx, local_idx.wrapping_add(1));
      }
    } else {
      self.try_push_back_with(cb)?;
      for local_idx in (idx..len).rev() {
        self.swap(local_idx, local_idx.wrapping_add(1));
      }
    }
    Ok(())
  }

  /// Fallible version of [`Self::push_back`] where the element is produced by `cb` after all
  /// memory required by the insertion was acquired.
  ///
  /// If `cb` fails, the instance is left untouched.
  #[inline]
  pub fn try_push_back_with<E>(&mut self, cb: impl FnOnce() -> Result<T, E>) -> Result<(), E>
  where
    E: From<crate::Error>,
  {
    self.push_with(End::Back, cb)
  }

  /// Fallible version of [`Self::push_front`] where the element is produced by `cb` after all
  /// memory required by the insertion was acquired.
  ///
  /// If `cb` fails, the instance is left untouched.
  #[inline]
  pub fn try_push_front_with<E>(&mut self, cb: impl FnOnce() -> Result<T, E>) -> Result<(), E>
  where
    E: From<crate::Error>,
  {
    self.push_with(End::Front, cb)
  }

  fn elem_ptr(&self, idx: usize) -> Option<*mut T> {
    if idx >= self.len() {
      return None;
    }
    let cursor = Cursor::<C>::from_global(self.begin.wrapping_add(idx));
    let chunk = self.index.slots().get(cursor.slot())?.as_ref()?;
    // SAFETY: `Cursor` guarantees that the offset is within the chunk
    Some(unsafe { chunk.elem_ptr(cursor.offset()) })
  }

  fn push_with<E>(&mut self, mut at: End, cb: impl FnOnce() -> Result<T, E>) -> Result<(), E>
  where
    E: From<crate::Error>,
  {
    let Self { alloc, begin, end, index } = self;
    let alloc = &*alloc;
    if index.len() == 0 {
      at = End::Back;
    }
    let mut staging = Staging::new(alloc);
    let (mut new_begin, mut new_end) = (*begin, *end);
    let must_grow = match at {
      End::Back => *end / C >= index.len(),
      End::Front => *begin == 0,
    };
    if must_grow {
      (new_begin, new_end) = staging.stage_index(index, *begin, *end)?;
    }
    let target = match at {
      End::Back => new_end,
      End::Front => new_begin.wrapping_sub(1),
    };
    let must_allocate = match at {
      End::Back => new_end % C == 0,
      End::Front => new_begin % C == 0,
    };
    if must_allocate {
      staging.stage_chunk()?;
    }
    let elem = cb()?;
    let (staged_chunk, staged_index) = staging.commit();
    if let Some(new_index) = staged_index {
      _trace!(from = index.len(), to = new_index.len(), "Replacing outer index");
      let mut old_index = mem::replace(index, new_index);
      // SAFETY: chunk handles were copied into the new index
      unsafe {
        old_index.deallocate(alloc);
      }
    }
    let cursor = Cursor::<C>::from_global(target);
    let Some(slot) = index.slots_mut().get_mut(cursor.slot()) else {
      _unlikely_unreachable();
    };
    if let Some(chunk) = staged_chunk {
      *slot = Some(chunk);
    }
    let Some(chunk) = slot else {
      _unlikely_unreachable();
    };
    // SAFETY: `target` is outside of the window but inside an allocated chunk
    unsafe {
      chunk.write(cursor.offset(), elem);
    }
    match at {
      End::Back => {
        *begin = new_begin;
        *end = new_end.wrapping_add(1);
      }
      End::Front => {
        *begin = target;
        *end = new_end;
      }
    }
    Ok(())
  }

  fn release_chunk(&mut self, slot: usize) {
    let Some(chunk) = self.index.slots_mut().get_mut(slot).and_then(Option::take) else {
      return;
    };
    // SAFETY: the last element of the chunk was just moved out
    unsafe {
      chunk.deallocate(&self.alloc);
    }
  }
}

impl<T, const C: usize, A> Clone for ChunkedDeque<T, C, A>
where
  A: Allocator + Clone,
  T: Clone,
{
  #[inline]
  fn clone(&self) -> Self {
    match self.try_clone() {
      Ok(elem) => elem,
      Err(err) => err._diverge(),
    }
  }

  #[inline]
  fn clone_from(&mut self, source: &Self) {
    if let Err(err) = self.try_assign(source, AllocPropagation::Retain) {
      err._diverge();
    }
  }
}

impl<T, const C: usize, A> Debug for ChunkedDeque<T, C, A>
where
  A: Allocator,
  T: Debug,
{
  #[inline]
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

impl<T, const C: usize, A> Default for ChunkedDeque<T, C, A>
where
  A: Allocator + Default,
{
  #[inline]
  fn default() -> Self {
    Self::new_in(A::default())
  }
}

impl<T, const C: usize, A> Drop for ChunkedDeque<T, C, A>
where
  A: Allocator,
{
  #[inline]
  fn drop(&mut self) {
    struct Guard<'any, T, const C: usize, A>(&'any mut ChunkedDeque<T, C, A>)
    where
      A: Allocator;
    impl<T, const C: usize, A> Drop for Guard<'_, T, C, A>
    where
      A: Allocator,
    {
      fn drop(&mut self) {
        while let Some(elem) = self.0.pop_back() {
          drop(elem);
        }
        let ChunkedDeque { alloc, index, .. } = &mut *self.0;
        let alloc = &*alloc;
        for slot in index.slots_mut() {
          if let Some(chunk) = slot.take() {
            // SAFETY: all elements were dropped
            unsafe {
              chunk.deallocate(alloc);
            }
          }
        }
        // SAFETY: allocated with the same allocator
        unsafe {
          index.deallocate(alloc);
        }
      }
    }

    let mut guard = Guard(self);
    while let Some(elem) = guard.0.pop_front() {
      drop(elem);
    }
  }
}

impl<T, const C: usize, A> Eq for ChunkedDeque<T, C, A>
where
  A: Allocator,
  T: Eq,
{
}

impl<T, const C: usize, A> Hash for ChunkedDeque<T, C, A>
where
  A: Allocator,
  T: Hash,
{
  #[inline]
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_usize(self.len());
    for elem in self {
      elem.hash(state);
    }
  }
}

impl<T, const C: usize, A> Index<usize> for ChunkedDeque<T, C, A>
where
  A: Allocator,
{
  type Output = T;

  #[allow(clippy::panic, reason = "indexing out of bounds is a programming error")]
  #[inline]
  #[track_caller]
  fn index(&self, idx: usize) -> &Self::Output {
    match self.get(idx) {
      Some(elem) => elem,
      None => panic!("index {idx} is out of bounds of a deque with {} elements", self.len()),
    }
  }
}

impl<T, const C: usize, A> IndexMut<usize> for ChunkedDeque<T, C, A>
where
  A: Allocator,
{
  #[allow(clippy::panic, reason = "indexing out of bounds is a programming error")]
  #[inline]
  #[track_caller]
  fn index_mut(&mut self, idx: usize) -> &mut Self::Output {
    let len = self.len();
    match self.get_mut(idx) {
      Some(elem) => elem,
      None => panic!("index {idx} is out of bounds of a deque with {len} elements"),
    }
  }
}

impl<T, const C: usize, A> IntoIterator for ChunkedDeque<T, C, A>
where
  A: Allocator,
{
  type IntoIter = IntoIter<T, C, A>;
  type Item = T;

  #[inline]
  fn into_iter(self) -> Self::IntoIter {
    IntoIter::new(self)
  }
}

impl<'any, T, const C: usize, A> IntoIterator for &'any ChunkedDeque<T, C, A>
where
  A: Allocator,
{
  type IntoIter = Iter<'any, T, C>;
  type Item = &'any T;

  #[inline]
  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<'any, T, const C: usize, A> IntoIterator for &'any mut ChunkedDeque<T, C, A>
where
  A: Allocator,
{
  type IntoIter = IterMut<'any, T, C>;
  type Item = &'any mut T;

  #[inline]
  fn into_iter(self) -> Self::IntoIter {
    self.iter_mut()
  }
}

impl<T, U, const C: usize, const D: usize, A, B> PartialEq<ChunkedDeque<U, D, B>>
  for ChunkedDeque<T, C, A>
where
  A: Allocator,
  B: Allocator,
  T: PartialEq<U>,
{
  #[inline]
  fn eq(&self, other: &ChunkedDeque<U, D, B>) -> bool {
    self.len() == other.len() && self.iter().zip(other).all(|(lhs, rhs)| lhs == rhs)
  }
}

impl<T, U, const C: usize, const N: usize, A> PartialEq<[U; N]> for ChunkedDeque<T, C, A>
where
  A: Allocator,
  T: PartialEq<U>,
{
  #[inline]
  fn eq(&self, other: &[U; N]) -> bool {
    *self == other[..]
  }
}

impl<T, U, const C: usize, A> PartialEq<[U]> for ChunkedDeque<T, C, A>
where
  A: Allocator,
  T: PartialEq<U>,
{
  #[inline]
  fn eq(&self, other: &[U]) -> bool {
    self.len() == other.len() && self.iter().zip(other).all(|(lhs, rhs)| lhs == rhs)
  }
}

// SAFETY: elements and the allocator are owned by the instance
unsafe impl<T, const C: usize, A> Send for ChunkedDeque<T, C, A>
where
  A: Allocator + Send,
  T: Send,
{
}

// SAFETY: shared access only hands out shared references
unsafe impl<T, const C: usize, A> Sync for ChunkedDeque<T, C, A>
where
  A: Allocator + Sync,
  T: Sync,
{
}

#[cfg(feature = "_proptest")]
#[cfg(test)]
mod _proptest {
  use crate::collection::ChunkedDeque;
  use alloc::{collections::VecDeque, vec::Vec};

  #[test_strategy::proptest]
  fn deque(ops: Vec<(u8, u16)>) {
    let mut deque = ChunkedDeque::<u16, 3>::new();
    let mut vec_deque = VecDeque::new();

    for (op, value) in ops {
      let idx = usize::from(value) % vec_deque.len().wrapping_add(1);
      match op % 6 {
        0 => {
          deque.push_back(value).unwrap();
          vec_deque.push_back(value);
        }
        1 => {
          deque.push_front(value).unwrap();
          vec_deque.push_front(value);
        }
        2 => assert_eq!(deque.pop_back(), vec_deque.pop_back()),
        3 => assert_eq!(deque.pop_front(), vec_deque.pop_front()),
        4 => {
          deque.insert(idx, value).unwrap();
          vec_deque.insert(idx, value);
        }
        _ => assert_eq!(deque.erase(idx).ok(), vec_deque.remove(idx)),
      }
      assert_eq!(deque.len(), vec_deque.len());
      assert_eq!(deque.get(idx), vec_deque.get(idx));
      assert!(deque.iter().eq(vec_deque.iter()));
      assert!(deque.iter().rev().eq(vec_deque.iter().rev()));
    }
    let copy = deque.try_clone().unwrap();
    assert!(copy.into_iter().eq(vec_deque.into_iter()));
  }
}
