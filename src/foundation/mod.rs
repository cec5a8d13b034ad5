//! Shared primitives: time keys, normalized points, colors, errors and rounding helpers.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
