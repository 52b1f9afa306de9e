macro_rules! _debug {
  ($($tt:tt)+) => {
    #[cfg(feature = "tracing")]
    tracing::debug!($($tt)+);
  };
}

macro_rules! _trace {
  ($($tt:tt)+) => {
    #[cfg(feature = "tracing")]
    tracing::trace!($($tt)+);
  };
}

macro_rules! doc_alloc_failure {
  () => {
    "The allocator could not provide the requested memory. The instance is left untouched."
  };
}

macro_rules! doc_out_of_range {
  () => {
    "Returns [`crate::collection::ChunkedDequeError::OutOfRange`] if `idx` does not point to an \
     element of the instance."
  };
}
