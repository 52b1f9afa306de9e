use crate::collection::{ChunkedDequeError, chunked_deque::chunk::Chunk};
use allocator_api2::alloc::Allocator;
use core::{alloc::Layout, marker::PhantomData, ptr::NonNull, slice};

/// Resizable array of slots where each slot either owns a chunk or is vacant.
///
/// Only the memory of the array itself is managed here. Chunks referenced by the slots are
/// released by the owner of the index.
pub(crate) struct OuterIndex<T, const C: usize> {
  len: usize,
  ptr: NonNull<Option<Chunk<T, C>>>,
  phantom: PhantomData<T>,
}

impl<T, const C: usize> OuterIndex<T, C> {
  pub(crate) const fn empty() -> Self {
    Self { len: 0, ptr: NonNull::dangling(), phantom: PhantomData }
  }

  /// Allocates `len` vacant slots.
  pub(crate) fn allocate<A>(alloc: &A, len: usize) -> crate::Result<Self>
  where
    A: Allocator,
  {
    if len == 0 {
      return Ok(Self::empty());
    }
    let layout = Self::layout(len)?;
    let ptr = alloc
      .allocate(layout)
      .map_err(|_err| ChunkedDequeError::AllocationFailure { layout })?
      .cast::<Option<Chunk<T, C>>>();
    for idx in 0..len {
      // SAFETY: `idx` is within the allocated array
      unsafe {
        ptr.as_ptr().add(idx).write(None);
      }
    }
    Ok(Self { len, ptr, phantom: PhantomData })
  }

  /// Releases the array, not the chunks, and leaves an empty instance behind.
  ///
  /// # Safety
  ///
  /// The array must have been allocated by [`Self::allocate`] with an equivalent allocator.
  pub(crate) unsafe fn deallocate<A>(&mut self, alloc: &A)
  where
    A: Allocator,
  {
    let this = core::mem::replace(self, Self::empty());
    if this.len == 0 {
      return;
    }
    let Ok(layout) = Self::layout(this.len) else {
      return;
    };
    // SAFETY: same pointer and layout of the allocation
    unsafe {
      alloc.deallocate(this.ptr.cast(), layout);
    }
  }

  pub(crate) const fn len(&self) -> usize {
    self.len
  }

  pub(crate) fn slots(&self) -> &[Option<Chunk<T, C>>] {
    // SAFETY: `ptr` is either dangling with a zero length or points to `len` initialized slots
    unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
  }

  pub(crate) fn slots_mut(&mut self) -> &mut [Option<Chunk<T, C>>] {
    // SAFETY: `ptr` is either dangling with a zero length or points to `len` initialized slots
    unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
  }

  fn layout(len: usize) -> crate::Result<Layout> {
    Ok(Layout::array::<Option<Chunk<T, C>>>(len).map_err(|_err| ChunkedDequeError::CapacityOverflow)?)
  }
}

#[cfg(test)]
mod tests {
  use crate::collection::chunked_deque::{chunk::Chunk, outer_index::OuterIndex};
  use allocator_api2::alloc::Global;

  #[test]
  fn allocated_slots_are_vacant() {
    let mut index = OuterIndex::<u8, 4>::allocate(&Global, 5).unwrap();
    assert_eq!(index.len(), 5);
    assert!(index.slots().iter().all(Option::is_none));
    // SAFETY: allocated with the same allocator
    unsafe { index.deallocate(&Global) };
    assert_eq!(index.len(), 0);
  }

  #[test]
  fn empty_index_has_no_slots() {
    let mut index = OuterIndex::<u8, 4>::allocate(&Global, 0).unwrap();
    assert!(index.slots().is_empty());
    assert!(index.slots_mut().is_empty());
  }

  #[test]
  fn slots_hold_chunks() {
    let mut index = OuterIndex::<u8, 4>::allocate(&Global, 2).unwrap();
    let chunk = Chunk::allocate(&Global).unwrap();
    index.slots_mut()[1] = Some(chunk);
    assert!(index.slots()[0].is_none());
    assert!(index.slots()[1].is_some());
    if let Some(el) = index.slots_mut()[1].take() {
      // SAFETY: nothing was written
      unsafe { el.deallocate(&Global) };
    }
    // SAFETY: allocated with the same allocator
    unsafe { index.deallocate(&Global) };
  }
}
