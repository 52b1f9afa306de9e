use crate::collection::{ChunkedDeque, Cursor, chunked_deque::chunk::Chunk};
use allocator_api2::alloc::Allocator;
use core::{
  fmt::{Debug, Formatter},
  iter::FusedIterator,
  marker::PhantomData,
};

macro_rules! iter_impl {
  ($ty:ident, $elem:ty, $deref:ident) => {
    impl<'any, T, const C: usize> $ty<'any, T, C> {
      /// Position of the next element returned by [`Iterator::next`].
      #[inline]
      pub fn front_cursor(&self) -> Cursor<C> {
        Cursor::from_global(self.front)
      }

      /// Position right after the next element returned by [`DoubleEndedIterator::next_back`].
      #[inline]
      pub fn back_cursor(&self) -> Cursor<C> {
        Cursor::from_global(self.back)
      }
    }

    impl<'any, T, const C: usize> DoubleEndedIterator for $ty<'any, T, C> {
      #[inline]
      fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
          return None;
        }
        self.back = self.back.wrapping_sub(1);
        let ptr = elem_ptr(self.slots, self.back)?;
        // SAFETY: positions inside the window point to initialized elements and each one is
        // yielded only once
        Some(unsafe { $deref(ptr) })
      }

      #[inline]
      fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        self.back = self.back.saturating_sub(n).max(self.front);
        self.next_back()
      }
    }

    impl<'any, T, const C: usize> ExactSizeIterator for $ty<'any, T, C> {}

    impl<'any, T, const C: usize> FusedIterator for $ty<'any, T, C> {}

    impl<'any, T, const C: usize> Iterator for $ty<'any, T, C> {
      type Item = $elem;

      #[inline]
      fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
          return None;
        }
        let ptr = elem_ptr(self.slots, self.front)?;
        self.front = self.front.wrapping_add(1);
        // SAFETY: positions inside the window point to initialized elements and each one is
        // yielded only once
        Some(unsafe { $deref(ptr) })
      }

      #[inline]
      fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
      }

      #[inline]
      fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back.wrapping_sub(self.front);
        (len, Some(len))
      }
    }
  };
}

/// Immutable front-to-back iterator of a [`ChunkedDeque`].
pub struct Iter<'any, T, const C: usize> {
  back: usize,
  front: usize,
  slots: &'any [Option<Chunk<T, C>>],
}

impl<'any, T, const C: usize> Iter<'any, T, C> {
  pub(crate) fn new(slots: &'any [Option<Chunk<T, C>>], front: usize, back: usize) -> Self {
    Self { back, front, slots }
  }
}

impl<T, const C: usize> Clone for Iter<'_, T, C> {
  #[inline]
  fn clone(&self) -> Self {
    Self { back: self.back, front: self.front, slots: self.slots }
  }
}

impl<T, const C: usize> Debug for Iter<'_, T, C>
where
  T: Debug,
{
  #[inline]
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.debug_list().entries(self.clone()).finish()
  }
}

impl<'any, T, const C: usize> From<IterMut<'any, T, C>> for Iter<'any, T, C> {
  #[inline]
  fn from(from: IterMut<'any, T, C>) -> Self {
    Self { back: from.back, front: from.front, slots: from.slots }
  }
}

// SAFETY: only shared references are handed out
unsafe impl<T, const C: usize> Send for Iter<'_, T, C> where T: Sync {}
// SAFETY: only shared references are handed out
unsafe impl<T, const C: usize> Sync for Iter<'_, T, C> where T: Sync {}

iter_impl!(Iter, &'any T, deref);

/// Mutable front-to-back iterator of a [`ChunkedDeque`].
pub struct IterMut<'any, T, const C: usize> {
  back: usize,
  front: usize,
  phantom: PhantomData<&'any mut T>,
  slots: &'any [Option<Chunk<T, C>>],
}

impl<'any, T, const C: usize> IterMut<'any, T, C> {
  pub(crate) fn new(slots: &'any [Option<Chunk<T, C>>], front: usize, back: usize) -> Self {
    Self { back, front, phantom: PhantomData, slots }
  }
}

impl<T, const C: usize> Debug for IterMut<'_, T, C>
where
  T: Debug,
{
  #[inline]
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.debug_list().entries(Iter::new(self.slots, self.front, self.back)).finish()
  }
}

// SAFETY: each element is exclusively handed out only once
unsafe impl<T, const C: usize> Send for IterMut<'_, T, C> where T: Send {}
// SAFETY: each element is exclusively handed out only once
unsafe impl<T, const C: usize> Sync for IterMut<'_, T, C> where T: Sync {}

iter_impl!(IterMut, &'any mut T, deref_mut);

/// Owning front-to-back iterator of a [`ChunkedDeque`].
pub struct IntoIter<T, const C: usize, A>
where
  A: Allocator,
{
  deque: ChunkedDeque<T, C, A>,
}

impl<T, const C: usize, A> IntoIter<T, C, A>
where
  A: Allocator,
{
  pub(crate) const fn new(deque: ChunkedDeque<T, C, A>) -> Self {
    Self { deque }
  }
}

impl<T, const C: usize, A> Debug for IntoIter<T, C, A>
where
  A: Allocator,
  T: Debug,
{
  #[inline]
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.debug_tuple("IntoIter").field(&self.deque).finish()
  }
}

impl<T, const C: usize, A> DoubleEndedIterator for IntoIter<T, C, A>
where
  A: Allocator,
{
  #[inline]
  fn next_back(&mut self) -> Option<Self::Item> {
    self.deque.pop_back()
  }
}

impl<T, const C: usize, A> ExactSizeIterator for IntoIter<T, C, A> where A: Allocator {}

impl<T, const C: usize, A> FusedIterator for IntoIter<T, C, A> where A: Allocator {}

impl<T, const C: usize, A> Iterator for IntoIter<T, C, A>
where
  A: Allocator,
{
  type Item = T;

  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    self.deque.pop_front()
  }

  #[inline]
  fn size_hint(&self) -> (usize, Option<usize>) {
    let len = self.deque.len();
    (len, Some(len))
  }
}

unsafe fn deref<'any, T>(ptr: *mut T) -> &'any T {
  // SAFETY: up to the caller
  unsafe { &*ptr }
}

unsafe fn deref_mut<'any, T>(ptr: *mut T) -> &'any mut T {
  // SAFETY: up to the caller
  unsafe { &mut *ptr }
}

fn elem_ptr<T, const C: usize>(slots: &[Option<Chunk<T, C>>], global: usize) -> Option<*mut T> {
  let cursor = Cursor::<C>::from_global(global);
  let chunk = slots.get(cursor.slot())?.as_ref()?;
  // SAFETY: `Cursor` guarantees that the offset is within the chunk
  Some(unsafe { chunk.elem_ptr(cursor.offset()) })
}
