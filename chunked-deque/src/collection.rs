//! Collection types

mod alloc_propagation;
mod chunked_deque;
mod cursor;

pub use alloc_propagation::AllocPropagation;
pub use chunked_deque::{ChunkedDeque, ChunkedDequeError, IntoIter, Iter, IterMut};
pub use cursor::Cursor;
