use crate::foundation::math::known_duration;
use crate::source::playback::{PlaybackSource, SourceKind, clamp_seek_target};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
struct SimState {
    kind: SourceKind,
    ready: bool,
    time: f64,
    duration: Option<f64>,
    rate: f64,
    playing: bool,
    released: bool,
    seeks: Vec<f64>,
}

/// In-memory [`PlaybackSource`] driven by a manual clock.
///
/// The engine owns the source; the paired [`SimulatedHandle`] stays with the host (or a test) to
/// advance time, flip readiness and inspect the transport commands the engine issued.
#[derive(Debug)]
pub struct SimulatedSource {
    state: Rc<RefCell<SimState>>,
}

/// Host-side view of a [`SimulatedSource`].
#[derive(Debug, Clone)]
pub struct SimulatedHandle {
    state: Rc<RefCell<SimState>>,
}

impl SimulatedSource {
    /// A ready local source with the given duration.
    pub fn new(kind: SourceKind, duration: Option<f64>) -> (Self, SimulatedHandle) {
        let state = Rc::new(RefCell::new(SimState {
            kind,
            ready: true,
            time: 0.0,
            duration,
            rate: 1.0,
            playing: false,
            released: false,
            seeks: Vec::new(),
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            SimulatedHandle { state },
        )
    }

    /// Same as [`SimulatedSource::new`], but the source starts not ready.
    pub fn pending(kind: SourceKind, duration: Option<f64>) -> (Self, SimulatedHandle) {
        let (src, handle) = Self::new(kind, duration);
        handle.set_ready(false);
        (src, handle)
    }
}

impl PlaybackSource for SimulatedSource {
    fn kind(&self) -> SourceKind {
        self.state.borrow().kind
    }

    fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().time
    }

    fn duration(&self) -> Option<f64> {
        known_duration(self.state.borrow().duration)
    }

    fn seek(&mut self, t: f64) {
        let mut s = self.state.borrow_mut();
        let target = clamp_seek_target(t, s.duration);
        s.time = target;
        s.seeks.push(target);
    }

    fn set_rate(&mut self, rate: f64) {
        self.state.borrow_mut().rate = rate;
    }

    fn play(&mut self) {
        self.state.borrow_mut().playing = true;
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    fn release(&mut self) {
        let mut s = self.state.borrow_mut();
        s.playing = false;
        s.released = true;
    }
}

impl SimulatedHandle {
    /// Advance the clock by `secs` of wall time while playing, scaled by the rate.
    ///
    /// Playback stops at the end of the media when the duration is known.
    pub fn advance(&self, secs: f64) {
        let mut s = self.state.borrow_mut();
        if !s.playing {
            return;
        }
        let next = s.time + secs * s.rate;
        match known_duration(s.duration) {
            Some(d) if next >= d => {
                s.time = d;
                s.playing = false;
            }
            _ => s.time = next.max(0.0),
        }
    }

    /// Move the clock without recording a seek, as an external actor would.
    pub fn set_time(&self, t: f64) {
        self.state.borrow_mut().time = t;
    }

    /// Flip readiness.
    pub fn set_ready(&self, ready: bool) {
        self.state.borrow_mut().ready = ready;
    }

    /// Change the reported duration.
    pub fn set_duration(&self, duration: Option<f64>) {
        self.state.borrow_mut().duration = duration;
    }

    /// Current clock value.
    pub fn time(&self) -> f64 {
        self.state.borrow().time
    }

    /// Last rate applied by the engine.
    pub fn rate(&self) -> f64 {
        self.state.borrow().rate
    }

    /// `true` while native playback is running.
    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    /// `true` after the engine released the source.
    pub fn is_released(&self) -> bool {
        self.state.borrow().released
    }

    /// Every seek target the source received, in order.
    pub fn seeks(&self) -> Vec<f64> {
        self.state.borrow().seeks.clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/simulated.rs"]
mod tests;
