use crate::collection::ChunkedDequeError;
use core::fmt::{Debug, Display, Formatter};

/// Grouped individual errors
#[derive(Debug)]
pub enum Error {
  // Internal
  //
  /// See [`ChunkedDequeError`].
  ChunkedDequeError(ChunkedDequeError),
}

impl Error {
  /// Diverges with the same behavior of the standard collections when infallible interfaces
  /// can not fulfill a request.
  #[allow(clippy::panic, reason = "infallible interfaces have no other way to report the error")]
  #[cold]
  #[inline(never)]
  #[track_caller]
  pub(crate) fn _diverge(self) -> ! {
    match self {
      Self::ChunkedDequeError(ChunkedDequeError::AllocationFailure { layout }) => {
        alloc::alloc::handle_alloc_error(layout)
      }
      Self::ChunkedDequeError(err) => panic!("{err}"),
    }
  }
}

impl Display for Error {
  #[inline]
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    <Self as Debug>::fmt(self, f)
  }
}

impl core::error::Error for Error {}

impl From<Error> for () {
  #[inline]
  fn from(_: Error) -> Self {}
}

impl From<ChunkedDequeError> for Error {
  #[inline]
  fn from(from: ChunkedDequeError) -> Self {
    Self::ChunkedDequeError(from)
  }
}
