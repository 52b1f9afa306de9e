use crate::collection::chunked_deque::{chunk::Chunk, growth, outer_index::OuterIndex};
use allocator_api2::alloc::Allocator;

/// Resources acquired ahead of an insertion.
///
/// Everything held here is released when the instance is dropped, which is what happens when
/// the element producer fails. [`Self::commit`] hands the resources over instead.
pub(crate) struct Staging<'alloc, T, A, const C: usize>
where
  A: Allocator,
{
  alloc: &'alloc A,
  chunk: Option<Chunk<T, C>>,
  index: Option<OuterIndex<T, C>>,
}

impl<'alloc, T, A, const C: usize> Staging<'alloc, T, A, C>
where
  A: Allocator,
{
  pub(crate) const fn new(alloc: &'alloc A) -> Self {
    Self { alloc, chunk: None, index: None }
  }

  pub(crate) fn stage_chunk(&mut self) -> crate::Result<()> {
    self.chunk = Some(Chunk::allocate(self.alloc)?);
    Ok(())
  }

  /// Builds the replacement of `index` and copies the handles of the chunks that back the
  /// window `[begin, end)`. Returns the window translated to the replacement.
  pub(crate) fn stage_index(
    &mut self,
    index: &OuterIndex<T, C>,
    begin: usize,
    end: usize,
  ) -> crate::Result<(usize, usize)> {
    let plan = growth::plan::<C>(index.len())?;
    let mut new_index = OuterIndex::allocate(self.alloc, plan.new_capacity)?;
    let live = index.slots().get(begin / C..end.div_ceil(C)).unwrap_or_default();
    let last_slot = plan.first_slot.wrapping_add(live.len());
    if let Some(dst) = new_index.slots_mut().get_mut(plan.first_slot..last_slot) {
      dst.copy_from_slice(live);
    }
    self.index = Some(new_index);
    let new_begin = plan.first_slot.wrapping_mul(C).wrapping_add(begin % C);
    Ok((new_begin, new_begin.wrapping_add(end.wrapping_sub(begin))))
  }

  /// Disarms the instance and returns the staged resources.
  pub(crate) fn commit(mut self) -> (Option<Chunk<T, C>>, Option<OuterIndex<T, C>>) {
    (self.chunk.take(), self.index.take())
  }
}

impl<T, A, const C: usize> Drop for Staging<'_, T, A, C>
where
  A: Allocator,
{
  #[inline]
  fn drop(&mut self) {
    if let Some(chunk) = self.chunk.take() {
      // SAFETY: the chunk was never populated
      unsafe {
        chunk.deallocate(self.alloc);
      }
    }
    if let Some(mut index) = self.index.take() {
      // SAFETY: the copied handles are still owned by the current index
      unsafe {
        index.deallocate(self.alloc);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::collection::chunked_deque::{outer_index::OuterIndex, staging::Staging};
  use allocator_api2::alloc::Global;

  #[test]
  fn translates_window() {
    let mut staging = Staging::<u8, Global, 4>::new(&Global);
    let mut index = OuterIndex::<u8, 4>::allocate(&Global, 2).unwrap();
    staging.stage_chunk().unwrap();
    let (chunk, _) = staging.commit();
    index.slots_mut()[1] = chunk;

    let mut staging = Staging::<u8, Global, 4>::new(&Global);
    // Window [5, 7) lives in the second slot
    assert_eq!(staging.stage_index(&index, 5, 7).unwrap(), (13, 15));
    let (_, new_index) = staging.commit();
    let mut new_index = new_index.unwrap();
    assert_eq!(new_index.len(), 8);
    assert!(new_index.slots()[3].is_some());
    assert_eq!(new_index.slots().iter().filter(|el| el.is_some()).count(), 1);

    if let Some(el) = index.slots_mut()[1].take() {
      // SAFETY: nothing was written
      unsafe { el.deallocate(&Global) };
    }
    // SAFETY: allocated with the same allocator
    unsafe {
      index.deallocate(&Global);
      new_index.deallocate(&Global);
    }
  }
}
