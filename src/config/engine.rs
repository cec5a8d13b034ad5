use crate::config::color::ColorDef;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{OnionError, OnionResult};
use crate::timeline::keyframes::KeyPolicy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Smallest grid slot accepted; below it 3-decimal rounding can break quantization idempotence.
pub const MIN_SLOT_SECONDS: f64 = 0.01;

/// Engine-wide settings.
///
/// Every field has a default, so a JSON document only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// How committed annotations are keyed on the timeline.
    pub key_policy: KeyPolicy,
    /// Seconds moved by one manual step or one step-play tick.
    pub video_step_seconds: f64,
    /// Playback rate applied to sources and to the step-play interval.
    pub rate: f64,
    /// Width in pixels recorded on new pen strokes.
    pub pen_width: f64,
    /// Radius in pixels of rendered annotation points.
    pub point_radius: f64,
    /// Minimum squared normalized motion before a pen sample is appended.
    pub min_motion_sq: f64,
    /// Onion-skin appearance.
    pub onion: OnionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_policy: KeyPolicy::default(),
            video_step_seconds: 0.1,
            rate: 1.0,
            pen_width: 4.0,
            point_radius: 6.0,
            min_motion_sq: 0.00002,
            onion: OnionConfig::default(),
        }
    }
}

/// Onion-skin neighbor window and falloff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OnionConfig {
    /// Number of earlier keyframes drawn as ghosts.
    pub prev_count: u32,
    /// Number of later keyframes drawn as ghosts.
    pub next_count: u32,
    /// Ghost color for earlier keyframes.
    pub prev_color: ColorDef,
    /// Ghost color for later keyframes.
    pub next_color: ColorDef,
    /// Color of the active keyframe and the in-progress stroke.
    pub active_color: ColorDef,
    /// Per-step alpha multiplier, `alpha(d) = ghost_max * falloff^(d-1)`.
    pub falloff: f32,
    /// Alpha of the nearest ghost.
    pub ghost_max: f32,
}

impl Default for OnionConfig {
    fn default() -> Self {
        Self {
            prev_count: 2,
            next_count: 1,
            prev_color: ColorDef(Rgba8::rgb(0xff, 0x4d, 0x4d)),
            next_color: ColorDef(Rgba8::rgb(0x4d, 0xa6, 0xff)),
            active_color: ColorDef(Rgba8::WHITE),
            falloff: 0.6,
            ghost_max: 0.5,
        }
    }
}

/// Upper bound on either onion window; keeps per-tick work bounded.
pub const MAX_ONION_COUNT: u32 = 64;

impl EngineConfig {
    /// Parse a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> OnionResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| OnionError::serde(format!("parse engine config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from a JSON string.
    pub fn from_json_str(s: &str) -> OnionResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> OnionResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            OnionError::validation(format!("open engine config '{}': {e}", path.display()))
        })?;
        let cfg = Self::from_reader(BufReader::new(f))?;
        tracing::debug!(path = %path.display(), "engine config loaded");
        Ok(cfg)
    }

    /// Check ranges of every numeric setting.
    pub fn validate(&self) -> OnionResult<()> {
        match self.key_policy {
            KeyPolicy::Grid { slot_seconds } => {
                if !slot_seconds.is_finite() || slot_seconds < MIN_SLOT_SECONDS {
                    return Err(OnionError::validation(format!(
                        "key_policy.slot_seconds must be >= {MIN_SLOT_SECONDS}"
                    )));
                }
            }
            KeyPolicy::FreeTimestamp { .. } => {}
        }
        if !self.video_step_seconds.is_finite() || self.video_step_seconds <= 0.0 {
            return Err(OnionError::validation("video_step_seconds must be > 0"));
        }
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(OnionError::validation("rate must be > 0"));
        }
        if !self.pen_width.is_finite() || self.pen_width <= 0.0 {
            return Err(OnionError::validation("pen_width must be > 0"));
        }
        if !self.point_radius.is_finite() || self.point_radius <= 0.0 {
            return Err(OnionError::validation("point_radius must be > 0"));
        }
        if !self.min_motion_sq.is_finite() || self.min_motion_sq < 0.0 {
            return Err(OnionError::validation("min_motion_sq must be >= 0"));
        }
        self.onion.validate()
    }
}

impl OnionConfig {
    /// Check window sizes and alpha parameters.
    pub fn validate(&self) -> OnionResult<()> {
        if self.prev_count > MAX_ONION_COUNT || self.next_count > MAX_ONION_COUNT {
            return Err(OnionError::validation(format!(
                "onion counts must be <= {MAX_ONION_COUNT}"
            )));
        }
        if !(0.0..=1.0).contains(&self.falloff) {
            return Err(OnionError::validation("onion.falloff must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.ghost_max) {
            return Err(OnionError::validation("onion.ghost_max must be in [0, 1]"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/engine.rs"]
mod tests;
