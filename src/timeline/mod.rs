//! Timeline state: keyframe index, loop range and step-play timing.

/// Temporal index of annotation keyframes.
pub mod keyframes;
/// Loop range validation, clamping and enforcement.
pub mod looping;
/// Cooperative step-play scheduler.
pub mod step;
