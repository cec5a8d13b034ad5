//! Playback backends: the clock/transport contract the engine polls, plus concrete sources.

/// `PlaybackSource` trait and shared helpers.
pub mod playback;
/// YouTube-style remote video references.
pub mod remote;
/// Manually clocked in-memory source.
pub mod simulated;
