//! The engine context hosts drive once per frame.

/// `Engine`: owns the session state and runs `tick(now)`.
pub mod engine;
