use crate::config::engine::{EngineConfig, OnionConfig};
use crate::edit::stroke::{StrokeEditor, Tool};
use crate::foundation::core::{Canvas, NormPoint, TimeKey};
use crate::foundation::error::{OnionError, OnionResult};
use crate::foundation::math::{clamp01, known_duration};
use crate::render::onion::{OnionCompositor, OverlayPlan};
use crate::source::playback::{PlaybackSource, SourceKind, clamp_seek_target, is_playable};
use crate::source::remote::RemoteVideoId;
use crate::timeline::keyframes::{KeyPolicy, KeyframeStore, Undone};
use crate::timeline::looping::{LOOP_ENFORCE_EPS, LoopController, LoopRange, LoopStatus};
use crate::timeline::step::{StepScheduler, StepTicket, interval_for};
use std::time::Duration;

/// Distance from a loop bound within which a manual step wraps instead of moving.
pub const STEP_WRAP_EPS: f64 = 0.002;
/// Drift tolerated by hold before the remote player is re-frozen.
pub const HOLD_DRIFT_TOLERANCE: f64 = 0.02;

/// Observable playback state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackMode {
    /// No playable source.
    Idle,
    /// Source loaded and paused.
    NativePaused,
    /// Backend is playing natively.
    NativePlaying,
    /// The step scheduler is hopping the playhead.
    StepPlaying,
}

impl PlaybackMode {
    /// `true` for either playing state.
    pub fn is_playing(self) -> bool {
        matches!(self, Self::NativePlaying | Self::StepPlaying)
    }
}

/// Loop bar handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopHandle {
    /// Loop start.
    In,
    /// Loop end.
    Out,
}

/// Loop bar positions as fractions of the media duration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopBar {
    /// Loop start.
    pub in_fraction: f64,
    /// Loop end.
    pub out_fraction: f64,
    /// Playhead.
    pub playhead_fraction: f64,
}

/// Result of one [`Engine::tick`].
#[derive(Clone, Debug)]
pub struct TickOutput {
    /// Time snapshot the tick worked with, after step advance, loop wrap and hold.
    pub time: f64,
    /// Playback state after the tick.
    pub mode: PlaybackMode,
    /// Overlay to display for `time`.
    pub plan: OverlayPlan,
}

/// Annotation session bound to at most one playback source.
///
/// The engine owns every piece of mutable state: the keyframe store, loop range, step-play timer,
/// in-progress stroke, hold and drawing flags. Hosts forward user actions to its methods and call
/// [`Engine::tick`] once per display frame with a monotonic timestamp.
///
/// Playback and drawing operations never fail; without a playable source they do nothing.
pub struct Engine {
    config: EngineConfig,
    canvas: Canvas,
    source: Option<Box<dyn PlaybackSource>>,
    adopted: bool,
    store: KeyframeStore,
    looping: LoopController,
    scheduler: StepScheduler,
    step_ticket: Option<StepTicket>,
    step_armed: bool,
    hold: Option<f64>,
    editor: StrokeEditor,
    compositor: OnionCompositor,
    draw_enabled: bool,
    interact: bool,
    clock: Duration,
}

impl Engine {
    /// Build an engine from a validated config.
    pub fn new(config: EngineConfig, canvas: Canvas) -> OnionResult<Self> {
        config.validate()?;
        Ok(Self {
            canvas,
            source: None,
            adopted: false,
            store: KeyframeStore::new(config.key_policy),
            looping: LoopController::new(config.video_step_seconds),
            scheduler: StepScheduler::new(),
            step_ticket: None,
            step_armed: false,
            hold: None,
            editor: StrokeEditor::new(config.pen_width, config.min_motion_sq),
            compositor: OnionCompositor::new(config.onion.clone(), config.point_radius),
            draw_enabled: true,
            interact: false,
            clock: Duration::ZERO,
            config,
        })
    }

    /// Active settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Keyframes of the current session.
    pub fn store(&self) -> &KeyframeStore {
        &self.store
    }

    /// Overlay surface size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Resize the overlay surface. Stored annotations are resolution independent.
    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }

    /// Switch to `source`, discarding every annotation and loop setting of the previous one.
    ///
    /// A source that is already playable is adopted immediately; otherwise adoption happens on the
    /// first tick that sees it ready.
    #[tracing::instrument(skip_all, fields(kind = ?source.kind()))]
    pub fn load_source(&mut self, source: Box<dyn PlaybackSource>) {
        self.reset_session();
        self.source = Some(source);
        if self.source.as_deref().is_some_and(|s| is_playable(s)) {
            self.adopt();
        }
        tracing::info!(ready = self.adopted, "source loaded");
    }

    /// Parse a remote video reference and load the source `connect` builds for it.
    ///
    /// A reference that fails to parse (or a failing `connect`) leaves the session untouched.
    pub fn load_remote<F>(&mut self, input: &str, connect: F) -> OnionResult<RemoteVideoId>
    where
        F: FnOnce(&RemoteVideoId) -> OnionResult<Box<dyn PlaybackSource>>,
    {
        let id = RemoteVideoId::parse(input).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected remote video reference");
        })?;
        let source = connect(&id)?;
        if source.kind() != SourceKind::RemotePlayer {
            return Err(OnionError::source(format!(
                "connector for '{id}' returned a non-remote source"
            )));
        }
        self.load_source(source);
        Ok(id)
    }

    /// Release the current source and clear the session.
    pub fn unload(&mut self) {
        let had_source = self.source.is_some();
        self.reset_session();
        if had_source {
            tracing::info!("source unloaded");
        }
    }

    /// Kind of the loaded source.
    pub fn source_kind(&self) -> Option<SourceKind> {
        self.source.as_deref().map(|s| s.kind())
    }

    /// `true` once a loaded source is ready, has a duration and went through adoption.
    pub fn is_playable(&self) -> bool {
        self.adopted && self.source.as_deref().is_some_and(|s| is_playable(s))
    }

    /// Polled playhead, `0` without a source.
    pub fn current_time(&self) -> f64 {
        self.source.as_deref().map_or(0.0, |s| s.current_time())
    }

    /// Known media duration.
    pub fn duration(&self) -> Option<f64> {
        known_duration(self.source.as_deref().and_then(|s| s.duration()))
    }

    /// Current playback state.
    pub fn mode(&self) -> PlaybackMode {
        if !self.is_playable() {
            return PlaybackMode::Idle;
        }
        if self.scheduler.is_running() {
            PlaybackMode::StepPlaying
        } else if self.source.as_deref().is_some_and(|s| s.is_playing()) {
            PlaybackMode::NativePlaying
        } else {
            PlaybackMode::NativePaused
        }
    }

    /// Advance the session to host time `now` and build the overlay.
    ///
    /// One clock read per tick; a step advance or loop wrap replaces that snapshot with its seek
    /// target.
    pub fn tick(&mut self, now: Duration) -> TickOutput {
        self.clock = now;

        if !self.adopted && self.source.as_deref().is_some_and(|s| is_playable(s)) {
            self.adopt();
        }
        if !self.is_playable() {
            return TickOutput {
                time: self.current_time(),
                mode: PlaybackMode::Idle,
                plan: OverlayPlan::empty(self.canvas),
            };
        }

        let mut t = self.current_time();

        let due = self.scheduler.poll(now);
        if due && self.step_ticket.is_some_and(|tk| self.scheduler.is_current(tk)) {
            t = self.advance_from(t, self.config.video_step_seconds);
        }

        if let Some(src) = self.source.as_deref_mut()
            && let Some(wrapped) = self.looping.enforce(t, src)
        {
            t = wrapped;
            if self.hold.is_some() {
                self.hold = Some(wrapped);
            }
        }

        if let Some(h) = self.hold
            && (t - h).abs() > HOLD_DRIFT_TOLERANCE
            && let Some(src) = self.source.as_deref_mut()
        {
            tracing::debug!(drift = t - h, hold = h, "re-freezing held frame");
            src.pause();
            src.seek(h);
            t = h;
        }

        TickOutput {
            time: t,
            mode: self.mode(),
            plan: self.compose_at(t),
        }
    }

    /// Overlay for the current playhead, without advancing anything.
    pub fn overlay(&self) -> OverlayPlan {
        if !self.is_playable() {
            return OverlayPlan::empty(self.canvas);
        }
        self.compose_at(self.current_time())
    }

    /// Time readout: `t=1.234s · slot=1.000s`.
    pub fn readout(&self) -> String {
        let t = self.current_time();
        let slot = self.store.policy().normalize(t);
        format!("t={t:.3}s · slot={slot:.3}s")
    }

    /// Start playback: step-play when armed, otherwise native playback.
    pub fn play(&mut self) {
        if !self.is_playable() {
            return;
        }
        if self.step_armed {
            self.start_step_play();
            return;
        }
        self.stop_step_play();
        self.set_hold(false);
        if let Some(src) = self.source.as_deref_mut() {
            src.play();
        }
        tracing::debug!("native play");
    }

    /// Stop both kinds of playback. Step-play stays armed.
    pub fn pause(&mut self) {
        self.stop_step_play();
        if !self.is_playable() {
            return;
        }
        if let Some(src) = self.source.as_deref_mut() {
            src.pause();
        }
    }

    /// Pause when playing (either kind), play otherwise.
    pub fn toggle_play(&mut self) {
        if !self.is_playable() {
            return;
        }
        if self.mode().is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Arm or disarm step-play. Arming starts it right away.
    pub fn toggle_step_play(&mut self) {
        self.step_armed = !self.step_armed;
        if self.step_armed {
            self.start_step_play();
        } else {
            self.stop_step_play();
        }
    }

    /// `true` while step-play is armed.
    pub fn step_play_armed(&self) -> bool {
        self.step_armed
    }

    /// Manual step: stop playback, then move once by `delta` seconds.
    pub fn step_by(&mut self, delta: f64) {
        if !self.is_playable() {
            return;
        }
        self.pause();
        self.step_advance(delta);
    }

    /// Move the playhead by `delta` seconds without touching playback, wrapping inside an active
    /// loop. Returns the new playhead.
    pub fn step_advance(&mut self, delta: f64) -> Option<f64> {
        if !self.is_playable() || !delta.is_finite() {
            return None;
        }
        let t = self.current_time();
        Some(self.advance_from(t, delta))
    }

    /// Set the playback rate. Restarts a running step-play timer with the derived interval.
    pub fn set_rate(&mut self, rate: f64) {
        if !rate.is_finite() || rate <= 0.0 {
            tracing::warn!(rate, "ignoring non-positive playback rate");
            return;
        }
        self.config.rate = rate;
        if self.is_playable()
            && let Some(src) = self.source.as_deref_mut()
        {
            src.set_rate(rate);
        }
        self.restart_step_timer();
    }

    /// Set the step size used by manual steps and step-play.
    pub fn set_video_step(&mut self, step_seconds: f64) {
        if !step_seconds.is_finite() || step_seconds <= 0.0 {
            tracing::warn!(step_seconds, "ignoring non-positive video step");
            return;
        }
        self.config.video_step_seconds = step_seconds;
        self.looping.set_step_seconds(step_seconds);
        self.restart_step_timer();
    }

    /// Change how future annotations are keyed. Existing keys stay where they are.
    pub fn set_key_policy(&mut self, policy: KeyPolicy) -> OnionResult<()> {
        let mut next = self.config.clone();
        next.key_policy = policy;
        next.validate()?;
        self.config = next;
        self.store.set_policy(policy);
        Ok(())
    }

    /// Replace the onion-skin settings.
    pub fn set_onion(&mut self, onion: OnionConfig) -> OnionResult<()> {
        onion.validate()?;
        self.compositor.set_config(onion.clone());
        self.config.onion = onion;
        Ok(())
    }

    /// Pause at the current time's slot (clamped into an active loop).
    pub fn snap_to_slot(&mut self) {
        if !self.is_playable() {
            return;
        }
        self.pause();
        let slot = self.store.policy().normalize(self.current_time());
        let target = self.looping.clamp(slot);
        self.seek_to(target);
    }

    /// Freeze a remote player on the current frame.
    ///
    /// Only remote sources can hold; the request is ignored otherwise.
    pub fn set_hold(&mut self, on: bool) {
        let allowed = self.is_playable() && self.source_kind() == Some(SourceKind::RemotePlayer);
        if !on || !allowed {
            self.hold = None;
            return;
        }
        let t = self.looping.clamp(self.current_time());
        self.hold = Some(t);
        if let Some(src) = self.source.as_deref_mut() {
            src.pause();
            src.seek(t);
        }
        tracing::debug!(hold = t, "hold on");
    }

    /// Held time, when hold is on.
    pub fn hold_time(&self) -> Option<f64> {
        self.hold
    }

    /// Loop range.
    pub fn loop_range(&self) -> LoopRange {
        self.looping.range()
    }

    /// Loop state for display.
    pub fn loop_status(&self) -> LoopStatus {
        self.looping.status()
    }

    /// Enable or disable the loop; enabling pulls the playhead inside.
    pub fn set_loop_enabled(&mut self, enabled: bool) {
        self.looping.set_enabled(enabled);
        if let Some(d) = self.duration().filter(|d| *d > 0.0) {
            self.looping.clamp_to_duration(d);
        }
        if self.looping.is_active() && self.is_playable() {
            let t = self.looping.clamp(self.current_time());
            self.seek_to(t);
        }
        tracing::debug!(status = %self.looping.status(), "loop toggled");
    }

    /// Set the loop start.
    pub fn set_loop_in(&mut self, t: f64) {
        self.looping.set_in(t);
        self.clamp_loop_to_duration();
    }

    /// Set the loop end.
    pub fn set_loop_out(&mut self, t: f64) {
        self.looping.set_out(t);
        self.clamp_loop_to_duration();
    }

    /// Set the loop start to the current time.
    pub fn set_loop_in_at_current(&mut self) {
        if self.is_playable() {
            self.set_loop_in(self.current_time());
        }
    }

    /// Set the loop end to the current time.
    pub fn set_loop_out_at_current(&mut self) {
        if self.is_playable() {
            self.set_loop_out(self.current_time());
        }
    }

    /// Pause at the loop start.
    pub fn jump_to_loop_in(&mut self) {
        if !self.is_playable() {
            return;
        }
        self.pause();
        self.seek_to(self.looping.range().start);
    }

    /// Pause just inside the loop end.
    pub fn jump_to_loop_out(&mut self) {
        if !self.is_playable() {
            return;
        }
        self.pause();
        self.seek_to(self.looping.safe_out());
    }

    /// Seek to `fraction` of the duration (clamped into an active loop).
    pub fn seek_to_fraction(&mut self, fraction: f64) {
        if !self.is_playable() {
            return;
        }
        let Some(d) = self.duration() else {
            return;
        };
        let target = self.looping.clamp(clamp01(fraction) * d);
        self.seek_to(target);
    }

    /// Move a loop bound to `fraction` of the duration, keeping the playhead inside an active loop.
    pub fn drag_loop_handle(&mut self, handle: LoopHandle, fraction: f64) {
        let Some(d) = self.duration().filter(|d| *d > 0.0) else {
            return;
        };
        let t = clamp01(fraction) * d;
        match handle {
            LoopHandle::In => self.looping.set_in(t),
            LoopHandle::Out => self.looping.set_out(t),
        }
        if self.looping.is_active() && self.is_playable() {
            let ct = self.looping.clamp(self.current_time());
            self.seek_to(ct);
        }
    }

    /// Loop bar positions, once the duration is known.
    pub fn loop_bar(&self) -> Option<LoopBar> {
        let d = self.duration().filter(|d| *d > 0.0)?;
        let frac = |t: f64| clamp01(t / d);
        let range = self.looping.range();
        Some(LoopBar {
            in_fraction: frac(range.start),
            out_fraction: frac(range.end),
            playhead_fraction: frac(self.current_time()),
        })
    }

    /// Select a drawing tool.
    pub fn set_tool(&mut self, tool: Tool) {
        self.editor.set_tool(tool);
    }

    /// Selected drawing tool.
    pub fn tool(&self) -> Tool {
        self.editor.tool()
    }

    /// Width recorded on new pen strokes.
    pub fn set_pen_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.config.pen_width = width;
            self.editor.set_pen_width(width);
        }
    }

    /// Radius of point markers in pixels.
    pub fn set_point_radius(&mut self, radius: f64) {
        if radius.is_finite() && radius > 0.0 {
            self.config.point_radius = radius;
            self.compositor.set_point_radius(radius);
        }
    }

    /// Enable or disable drawing.
    pub fn set_draw_enabled(&mut self, on: bool) {
        self.draw_enabled = on;
    }

    /// Interact mode passes pointer input through to the player and suspends drawing.
    pub fn set_interact(&mut self, on: bool) {
        self.interact = on;
    }

    /// `true` when pointer input draws.
    pub fn draw_active(&self) -> bool {
        self.draw_enabled && !self.interact
    }

    /// Pointer pressed. Returns the key a point landed on.
    pub fn pointer_down(&mut self, p: NormPoint) -> Option<TimeKey> {
        if !self.draw_active() || !self.is_playable() {
            return None;
        }
        let t = self.current_time();
        self.editor.begin(p, t, &mut self.store)
    }

    /// Pointer moved. Returns `true` when the sample extended the stroke.
    pub fn pointer_move(&mut self, p: NormPoint) -> bool {
        if !self.draw_active() || !self.is_playable() {
            return false;
        }
        self.editor.extend(p)
    }

    /// Pointer released. Returns the key a stroke was committed to.
    pub fn pointer_up(&mut self) -> Option<TimeKey> {
        self.editor.end(&mut self.store)
    }

    /// Pointer cancelled by the host.
    pub fn pointer_cancel(&mut self) -> Option<TimeKey> {
        self.editor.cancel(&mut self.store)
    }

    /// Remove the most recent stroke (else point) of the active keyframe.
    pub fn undo(&mut self) -> Option<Undone> {
        if !self.is_playable() {
            return None;
        }
        let key = self.store.active_key(self.current_time())?;
        self.store.undo_at(key)
    }

    /// Delete the active keyframe. Returns `true` when something was removed.
    pub fn clear_current(&mut self) -> bool {
        if !self.is_playable() {
            return false;
        }
        self.store
            .active_key(self.current_time())
            .and_then(|key| self.store.delete(key))
            .is_some()
    }

    /// Delete every keyframe.
    pub fn clear_all(&mut self) {
        self.store.clear();
    }

    fn adopt(&mut self) {
        let rate = self.config.rate;
        let Some(src) = self.source.as_deref_mut() else {
            return;
        };
        src.set_rate(rate);
        let duration = known_duration(src.duration()).unwrap_or(0.0);
        src.seek(0.0);
        src.pause();
        self.looping.reset(duration);
        self.adopted = true;
        tracing::info!(kind = ?src.kind(), duration, "source ready");
    }

    fn reset_session(&mut self) {
        self.step_armed = false;
        self.stop_step_play();
        self.hold = None;
        self.editor.abort();
        self.store.clear();
        self.looping.reset(0.0);
        self.adopted = false;
        if let Some(mut old) = self.source.take() {
            old.pause();
            old.release();
        }
    }

    fn start_step_play(&mut self) {
        if !self.is_playable() {
            return;
        }
        if let Some(src) = self.source.as_deref_mut() {
            src.pause();
        }
        self.set_hold(false);
        let interval = interval_for(self.config.video_step_seconds, self.config.rate);
        self.step_ticket = Some(self.scheduler.restart(self.clock, interval));
        tracing::debug!(interval_ms = interval.as_millis() as u64, "step play started");
    }

    fn stop_step_play(&mut self) {
        if self.scheduler.is_running() {
            tracing::debug!("step play stopped");
        }
        self.scheduler.stop();
        self.step_ticket = None;
    }

    fn restart_step_timer(&mut self) {
        if self.step_armed && self.scheduler.is_running() {
            self.start_step_play();
        }
    }

    fn clamp_loop_to_duration(&mut self) {
        if let Some(d) = self.duration().filter(|d| *d > 0.0) {
            self.looping.clamp_to_duration(d);
        }
    }

    /// Step target from `t`, seeked and returned.
    fn advance_from(&mut self, t: f64, delta: f64) -> f64 {
        let range = self.looping.range();
        let target = if self.looping.is_active() {
            if delta < 0.0 && t <= range.start + STEP_WRAP_EPS {
                self.looping.safe_out()
            } else if delta > 0.0 && t >= range.end - STEP_WRAP_EPS {
                range.start
            } else {
                let mut nt = t + delta;
                if nt < range.start {
                    nt = self.looping.safe_out();
                }
                if nt > range.end {
                    nt = range.start;
                }
                if (nt - range.end).abs() < LOOP_ENFORCE_EPS {
                    nt = self.looping.safe_out();
                }
                nt
            }
        } else {
            clamp_seek_target(t + delta, self.duration())
        };
        self.seek_to(target)
    }

    /// Seek (clamped to the duration); a held remote player is re-frozen at the new time.
    fn seek_to(&mut self, t: f64) -> f64 {
        let duration = self.duration();
        let Some(src) = self.source.as_deref_mut() else {
            return t;
        };
        let target = clamp_seek_target(t, duration);
        if self.hold.is_some() {
            self.hold = Some(target);
            src.pause();
        }
        src.seek(target);
        target
    }

    fn compose_at(&self, t: f64) -> OverlayPlan {
        self.compositor
            .compose(&self.store, t, self.editor.in_progress(), self.canvas)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("source", &self.source_kind())
            .field("adopted", &self.adopted)
            .field("keyframes", &self.store.len())
            .field("loop", &self.looping.range())
            .field("step_armed", &self.step_armed)
            .field("hold", &self.hold)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/engine.rs"]
mod tests;
