//! Miscellaneous

pub(crate) mod hints;

pub(crate) use hints::{_unlikely_elem, _unlikely_unreachable};
