use crate::collection::ChunkedDequeError;
use allocator_api2::alloc::Allocator;
use core::{alloc::Layout, ptr, ptr::NonNull};

/// Fixed-capacity block of `C` uninitialized elements.
///
/// Ownership is tracked by the outer index. Copying a handle does not copy the underlying
/// memory, which is why every method that touches elements is `unsafe`.
#[repr(transparent)]
pub(crate) struct Chunk<T, const C: usize> {
  ptr: NonNull<T>,
}

impl<T, const C: usize> Chunk<T, C> {
  pub(crate) fn allocate<A>(alloc: &A) -> crate::Result<Self>
  where
    A: Allocator,
  {
    let layout = Self::layout()?;
    if layout.size() == 0 {
      return Ok(Self { ptr: NonNull::dangling() });
    }
    let ptr = alloc.allocate(layout).map_err(|_err| ChunkedDequeError::AllocationFailure { layout })?;
    Ok(Self { ptr: ptr.cast() })
  }

  /// # Safety
  ///
  /// `self` must have been created by [`Self::allocate`] with an equivalent allocator and all
  /// of its elements must have been dropped or moved out.
  pub(crate) unsafe fn deallocate<A>(self, alloc: &A)
  where
    A: Allocator,
  {
    let Ok(layout) = Self::layout() else {
      return;
    };
    if layout.size() == 0 {
      return;
    }
    // SAFETY: the layout is the same one used for allocation
    unsafe {
      alloc.deallocate(self.ptr.cast(), layout);
    }
  }

  /// # Safety
  ///
  /// `offset` must be less than `C`.
  pub(crate) unsafe fn elem_ptr(&self, offset: usize) -> *mut T {
    // SAFETY: the caller guarantees that `offset` is within the block
    unsafe { self.ptr.as_ptr().add(offset) }
  }

  /// # Safety
  ///
  /// `offset` must be less than `C` and must not hold an initialized element.
  pub(crate) unsafe fn write(&self, offset: usize, value: T) {
    // SAFETY: the caller guarantees bounds and vacancy
    unsafe {
      ptr::write(self.elem_ptr(offset), value);
    }
  }

  /// # Safety
  ///
  /// `offset` must be less than `C` and must hold an initialized element that is treated as
  /// vacant afterwards.
  pub(crate) unsafe fn read(&self, offset: usize) -> T {
    // SAFETY: the caller guarantees bounds and initialization
    unsafe { ptr::read(self.elem_ptr(offset)) }
  }

  fn layout() -> crate::Result<Layout> {
    Ok(Layout::array::<T>(C).map_err(|_err| ChunkedDequeError::CapacityOverflow)?)
  }
}

impl<T, const C: usize> Clone for Chunk<T, C> {
  #[inline]
  fn clone(&self) -> Self {
    *self
  }
}

impl<T, const C: usize> Copy for Chunk<T, C> {}

#[cfg(test)]
mod tests {
  use crate::collection::chunked_deque::chunk::Chunk;
  use allocator_api2::alloc::Global;

  #[test]
  fn writes_and_reads_every_offset() {
    let chunk = Chunk::<u16, 4>::allocate(&Global).unwrap();
    for offset in 0..4 {
      // SAFETY: offsets are within the block
      unsafe { chunk.write(offset, u16::try_from(offset).unwrap() * 10) };
    }
    for offset in 0..4 {
      // SAFETY: offsets were initialized above
      assert_eq!(unsafe { chunk.read(offset) }, u16::try_from(offset).unwrap() * 10);
    }
    // SAFETY: everything was moved out
    unsafe { chunk.deallocate(&Global) };
  }

  #[test]
  fn zero_sized_elements_do_not_allocate() {
    let chunk = Chunk::<(), 16>::allocate(&Global).unwrap();
    // SAFETY: zero sized writes are always valid on a dangling pointer
    unsafe { chunk.write(15, ()) };
    // SAFETY: the element was written above
    unsafe { chunk.read(15) };
    // SAFETY: nothing was allocated
    unsafe { chunk.deallocate(&Global) };
  }
}
