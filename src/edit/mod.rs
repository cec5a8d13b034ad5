//! Pointer input turned into annotation edits.

/// Pen and point tools feeding the keyframe store.
pub mod stroke;
