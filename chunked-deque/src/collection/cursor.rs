/// Position inside the two-level address space of a [`crate::collection::ChunkedDeque`].
///
/// A cursor is a plain `(slot, offset)` pair where `offset` is always less than `C`. It holds no
/// reference to the instance that created it, which is why accessors such as
/// [`crate::collection::ChunkedDeque::get_at`] validate it against the current window.
///
/// Positions are ordered lexicographically.
///
/// ```rust
/// use chunked_deque::collection::Cursor;
///
/// let cursor = Cursor::<4>::new(1, 3).unwrap();
/// assert_eq!(cursor.forward(), Cursor::new(2, 0));
/// assert_eq!(cursor.backward(), Cursor::new(1, 2));
/// assert_eq!(cursor.advance(-7), Cursor::new(0, 0));
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Cursor<const C: usize> {
  slot: usize,
  offset: usize,
}

impl<const C: usize> Cursor<C> {
  /// Creates a new instance if `offset` is less than `C`.
  #[inline]
  pub const fn new(slot: usize, offset: usize) -> Option<Self> {
    if offset >= C {
      return None;
    }
    Some(Self { slot, offset })
  }

  /// Converts a global slot into a position.
  #[inline]
  pub const fn from_global(global: usize) -> Self {
    Self { slot: global / C, offset: global % C }
  }

  /// Global slot, which is `slot * C + offset`.
  #[inline]
  pub const fn global(self) -> usize {
    self.slot.wrapping_mul(C).wrapping_add(self.offset)
  }

  /// Offset inside the chunk.
  #[inline]
  pub const fn offset(self) -> usize {
    self.offset
  }

  /// Index of the chunk inside the outer index.
  #[inline]
  pub const fn slot(self) -> usize {
    self.slot
  }

  /// Moves `n` positions, backwards if `n` is negative.
  ///
  /// Returns `None` if the resulting position can not be represented.
  #[inline]
  pub fn advance(self, n: isize) -> Option<Self> {
    let chunk_capacity = isize::try_from(C).ok()?;
    let offset = isize::try_from(self.offset).ok()?.checked_add(n)?;
    let slot = self.slot.checked_add_signed(offset.div_euclid(chunk_capacity))?;
    let offset = usize::try_from(offset.rem_euclid(chunk_capacity)).ok()?;
    Some(Self { slot, offset })
  }

  /// Previous position or `None` at the very first position.
  #[inline]
  pub const fn backward(self) -> Option<Self> {
    if let Some(offset) = self.offset.checked_sub(1) {
      return Some(Self { slot: self.slot, offset });
    }
    let Some(slot) = self.slot.checked_sub(1) else {
      return None;
    };
    Some(Self { slot, offset: C.wrapping_sub(1) })
  }

  /// Next position or `None` at the very last representable position.
  #[inline]
  pub const fn forward(self) -> Option<Self> {
    let offset = self.offset.wrapping_add(1);
    if offset < C {
      return Some(Self { slot: self.slot, offset });
    }
    let Some(slot) = self.slot.checked_add(1) else {
      return None;
    };
    Some(Self { slot, offset: 0 })
  }

  /// Signed number of positions from `origin` to `self`, that is,
  /// `(self.slot - origin.slot) * C + (self.offset - origin.offset)`.
  ///
  /// ```rust
  /// use chunked_deque::collection::Cursor;
  ///
  /// let begin = Cursor::<4>::new(0, 3).unwrap();
  /// let end = Cursor::<4>::new(2, 1).unwrap();
  /// assert_eq!(end.offset_from(begin), 6);
  /// assert_eq!(begin.offset_from(end), -6);
  /// ```
  #[inline]
  pub const fn offset_from(self, origin: Self) -> isize {
    self.global().cast_signed().wrapping_sub(origin.global().cast_signed())
  }
}

#[cfg(test)]
mod tests {
  use crate::collection::Cursor;

  #[test]
  fn advance_crosses_chunks_in_both_directions() {
    let cursor = Cursor::<3>::new(2, 1).unwrap();
    assert_eq!(cursor.advance(0), Some(cursor));
    assert_eq!(cursor.advance(2), Cursor::new(3, 0));
    assert_eq!(cursor.advance(5), Cursor::new(4, 0));
    assert_eq!(cursor.advance(-1), Cursor::new(2, 0));
    assert_eq!(cursor.advance(-2), Cursor::new(1, 2));
    assert_eq!(cursor.advance(-7), Cursor::new(0, 0));
    assert_eq!(cursor.advance(-8), None);
  }

  #[test]
  fn backward_and_forward_are_inverses() {
    let mut cursor = Cursor::<2>::new(0, 0).unwrap();
    assert_eq!(cursor.backward(), None);
    for _ in 0..7 {
      let next = cursor.forward().unwrap();
      assert_eq!(next.backward(), Some(cursor));
      assert!(next > cursor);
      cursor = next;
    }
    assert_eq!(cursor, Cursor::new(3, 1).unwrap());
  }

  #[test]
  fn forward_stops_at_the_last_position() {
    let cursor = Cursor::<2>::new(usize::MAX, 1).unwrap();
    assert_eq!(cursor.forward(), None);
    assert_eq!(cursor.advance(1), None);
  }

  #[test]
  fn global_round_trips() {
    for global in 0..20 {
      assert_eq!(Cursor::<6>::from_global(global).global(), global);
    }
  }

  #[test]
  fn new_rejects_offsets_outside_the_chunk() {
    assert_eq!(Cursor::<4>::new(0, 4), None);
    assert!(Cursor::<4>::new(0, 3).is_some());
  }

  #[test]
  fn offset_from_is_signed() {
    let lhs = Cursor::<8>::new(1, 2).unwrap();
    let rhs = Cursor::<8>::new(3, 0).unwrap();
    assert_eq!(rhs.offset_from(lhs), 14);
    assert_eq!(lhs.offset_from(rhs), -14);
    assert_eq!(lhs.offset_from(lhs), 0);
  }

  #[test]
  fn ordering_is_lexicographic() {
    let lhs = Cursor::<8>::new(1, 7).unwrap();
    let rhs = Cursor::<8>::new(2, 0).unwrap();
    assert!(lhs < rhs);
    assert_ne!(lhs, rhs);
    assert_eq!(lhs, Cursor::<8>::new(1, 7).unwrap());
  }
}
