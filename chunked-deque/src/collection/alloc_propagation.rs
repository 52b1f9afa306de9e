/// Tells which allocator a destination instance should hold after a copy assignment.
///
/// ```rust
/// use chunked_deque::collection::{AllocPropagation, ChunkedDeque};
///
/// let src = ChunkedDeque::<u8>::try_from_iter([1, 2, 3]).unwrap();
/// let mut dst = ChunkedDeque::<u8>::new();
/// dst.try_assign(&src, AllocPropagation::Retain).unwrap();
/// assert_eq!(dst, [1, 2, 3]);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum AllocPropagation {
  /// The destination adopts a clone of the allocator of the source.
  Propagate,
  /// The destination keeps its own allocator.
  #[default]
  Retain,
}

impl AllocPropagation {
  /// Picks the allocator that will back the copied elements.
  #[inline]
  pub fn select<'any, A>(self, dst: &'any A, src: &'any A) -> &'any A {
    match self {
      Self::Propagate => src,
      Self::Retain => dst,
    }
  }
}
