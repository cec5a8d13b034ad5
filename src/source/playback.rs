use crate::foundation::math::known_duration;

pub use crate::foundation::math::clamp_seek_target;

/// Which kind of backend drives the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A locally loaded media element.
    LocalMedia,
    /// An embedded remote player.
    RemotePlayer,
}

/// Clock and transport of a media backend.
///
/// Time is polled, never pushed: the engine reads [`PlaybackSource::current_time`] once per tick
/// and treats the value as a snapshot. Implementations may update their clock asynchronously
/// between calls.
pub trait PlaybackSource {
    /// Backend kind.
    fn kind(&self) -> SourceKind;
    /// `true` once the backend accepts transport commands and reports a clock.
    fn is_ready(&self) -> bool;
    /// Playhead in seconds.
    fn current_time(&self) -> f64;
    /// Media duration in seconds, when known.
    fn duration(&self) -> Option<f64>;
    /// Move the playhead. Implementations clamp into `[0, duration]` (see [`clamp_seek_target`]).
    fn seek(&mut self, t: f64);
    /// Set the playback rate multiplier.
    fn set_rate(&mut self, rate: f64);
    /// Start native playback.
    fn play(&mut self);
    /// Pause native playback.
    fn pause(&mut self);
    /// `true` while native playback is running.
    fn is_playing(&self) -> bool;
    /// Drop backend resources. Called once when the engine unloads or switches away.
    fn release(&mut self) {}
}

/// A source is playable once it is ready and reports a positive, finite duration.
pub fn is_playable(source: &dyn PlaybackSource) -> bool {
    source.is_ready() && known_duration(source.duration()).is_some_and(|d| d > 0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/source/playback.rs"]
mod tests;
