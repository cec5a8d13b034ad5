use crate::source::playback::PlaybackSource;

/// Minimum loop length; shorter ranges are flagged invalid.
pub const LOOP_MIN_LEN: f64 = 0.001;
/// Distance before `out` at which enforcement wraps back to `in`.
pub const LOOP_ENFORCE_EPS: f64 = 0.0005;
/// Bounds of the inward offset used by [`LoopController::safe_out`].
pub const SAFE_OUT_MIN: f64 = 0.002;
/// See [`SAFE_OUT_MIN`].
pub const SAFE_OUT_MAX: f64 = 0.02;

/// A `[in, out)` playback range in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoopRange {
    /// Loop start in seconds.
    pub start: f64,
    /// Loop end in seconds (exclusive).
    pub end: f64,
    /// Whether the loop is requested.
    pub enabled: bool,
}

impl LoopRange {
    /// `true` when `end > start + LOOP_MIN_LEN`.
    pub fn is_valid(&self) -> bool {
        self.end > self.start + LOOP_MIN_LEN
    }
}

/// Observable loop state. Enabled-but-invalid is distinct from disabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopStatus {
    /// Loop not requested.
    Disabled,
    /// Loop requested but `out <= in`.
    Invalid,
    /// Loop enforced over `[start, end)`.
    Active {
        /// Loop start in seconds.
        start: f64,
        /// Loop end in seconds.
        end: f64,
    },
}

impl std::fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => f.write_str("Loop inactive."),
            Self::Invalid => f.write_str("Loop ON but invalid (Out must be > In)."),
            Self::Active { start, end } => write!(f, "Looping: {start:.2}s → {end:.2}s"),
        }
    }
}

/// Validates, clamps and enforces the loop range against a polled playhead.
#[derive(Debug, Clone)]
pub struct LoopController {
    range: LoopRange,
    step_seconds: f64,
}

impl LoopController {
    /// Disabled `[0, 0)` loop; `step_seconds` drives the safe-out margin.
    pub fn new(step_seconds: f64) -> Self {
        Self {
            range: LoopRange::default(),
            step_seconds,
        }
    }

    /// Current range.
    pub fn range(&self) -> LoopRange {
        self.range
    }

    /// `out > in + 0.001`.
    pub fn validate(&self) -> bool {
        self.range.is_valid()
    }

    /// `true` when the loop is enabled and valid.
    pub fn is_active(&self) -> bool {
        self.range.enabled && self.validate()
    }

    /// Observable state.
    pub fn status(&self) -> LoopStatus {
        if !self.range.enabled {
            LoopStatus::Disabled
        } else if !self.validate() {
            LoopStatus::Invalid
        } else {
            LoopStatus::Active {
                start: self.range.start,
                end: self.range.end,
            }
        }
    }

    /// Update the step size the safe-out margin derives from.
    pub fn set_step_seconds(&mut self, step_seconds: f64) {
        self.step_seconds = step_seconds;
    }

    /// Set the loop start; negative and NaN inputs become `0`.
    pub fn set_in(&mut self, t: f64) {
        self.range.start = non_negative(t);
    }

    /// Set the loop end; negative and NaN inputs become `0`.
    pub fn set_out(&mut self, t: f64) {
        self.range.end = non_negative(t);
    }

    /// Enable or disable enforcement.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.range.enabled = enabled;
    }

    /// Reset to `{0, duration, disabled}`.
    pub fn reset(&mut self, duration: f64) {
        self.range = LoopRange {
            start: 0.0,
            end: non_negative(duration),
            enabled: false,
        };
    }

    /// Clamp both bounds into `[0, duration]`.
    pub fn clamp_to_duration(&mut self, duration: f64) {
        let d = non_negative(duration);
        self.range.start = self.range.start.clamp(0.0, d);
        self.range.end = self.range.end.clamp(0.0, d);
    }

    /// Inward margin applied to `out`: `clamp(step * 0.05, 0.002, 0.02)`.
    pub fn safe_margin(&self) -> f64 {
        (self.step_seconds * 0.05).clamp(SAFE_OUT_MIN, SAFE_OUT_MAX)
    }

    /// A time strictly inside the loop just before `out`; `out` itself when invalid.
    pub fn safe_out(&self) -> f64 {
        if !self.validate() {
            return self.range.end;
        }
        self.range.start.max(self.range.end - self.safe_margin())
    }

    /// Pull `t` into `[in, out)`. Identity when the loop is disabled or invalid.
    pub fn clamp(&self, t: f64) -> f64 {
        if !self.is_active() {
            return t;
        }
        if t < self.range.start {
            return self.range.start;
        }
        if t >= self.range.end - LOOP_ENFORCE_EPS {
            return self.safe_out();
        }
        t
    }

    /// Wrap to `in` when the polled time `t` reached `out`. Returns the new playhead on a wrap.
    pub fn enforce(&self, t: f64, source: &mut dyn PlaybackSource) -> Option<f64> {
        if !self.is_active() || t < self.range.end - LOOP_ENFORCE_EPS {
            return None;
        }
        tracing::debug!(
            from = t,
            to = self.range.start,
            "loop out reached, wrapping to in"
        );
        source.seek(self.range.start);
        Some(self.range.start)
    }
}

fn non_negative(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.max(0.0) }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/looping.rs"]
mod tests;
