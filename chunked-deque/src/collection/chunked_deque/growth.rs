// Growth of the outer index
//
// Given a real capacity `R` and `H = ceil(R / 2)`, the replacement index has `R + 6H` slots and
// the live chunks are placed starting at slot `3H`.
//
// R = 2, H = 1, live chunks A and B
//
// | A | B |
// ---------------------------------
// |   |   |   | A | B |   |   |   |
//
// Both ends receive at least `3H` vacant slots regardless of which end triggered the growth,
// so alternating front and back insertions do not rebuild the index at every call.

use crate::collection::ChunkedDequeError;

/// Outcome of a growth decision.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct GrowthPlan {
  /// Slot of the replacement index that receives the first live chunk.
  pub(crate) first_slot: usize,
  /// Number of slots of the replacement index.
  pub(crate) new_capacity: usize,
}

/// Computes the replacement index of an outer index with `real_capacity` slots.
///
/// An empty index bootstraps into a single slot.
pub(crate) fn plan<const C: usize>(real_capacity: usize) -> crate::Result<GrowthPlan> {
  let rslt = if real_capacity == 0 {
    GrowthPlan { first_slot: 0, new_capacity: 1 }
  } else {
    let half = real_capacity.div_ceil(2);
    let first_slot = half.checked_mul(3).ok_or(ChunkedDequeError::CapacityOverflow)?;
    let new_capacity = half
      .checked_mul(6)
      .and_then(|el| el.checked_add(real_capacity))
      .ok_or(ChunkedDequeError::CapacityOverflow)?;
    GrowthPlan { first_slot, new_capacity }
  };
  let _ = rslt.new_capacity.checked_mul(C).ok_or(ChunkedDequeError::CapacityOverflow)?;
  _debug!(
    first_slot = rslt.first_slot,
    new_capacity = rslt.new_capacity,
    real_capacity,
    "Growing outer index"
  );
  Ok(rslt)
}
