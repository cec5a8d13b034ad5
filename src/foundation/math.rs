/// Clamp into `[0,1]`; NaN maps to `0`.
pub(crate) fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// Round seconds to 3 decimals.
pub(crate) fn round3(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// Snap `t` to the nearest multiple of `slot_seconds`, at 3-decimal precision.
///
/// Negative times snap as `0`. A non-positive slot size disables snapping (only rounding applies).
pub fn quantize(t: f64, slot_seconds: f64) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.max(0.0) };
    if slot_seconds.is_nan() || slot_seconds <= 0.0 {
        return round3(t);
    }
    round3((t / slot_seconds).round() * slot_seconds)
}

/// Finite, non-negative duration or `None`.
pub(crate) fn known_duration(d: Option<f64>) -> Option<f64> {
    d.filter(|d| d.is_finite() && *d >= 0.0)
}

/// Clamp a seek target to `[0, duration]`. Unknown duration only clamps the lower bound.
pub fn clamp_seek_target(t: f64, duration: Option<f64>) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.max(0.0) };
    match known_duration(duration) {
        Some(d) if d > 0.0 => t.min(d),
        _ => t,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
