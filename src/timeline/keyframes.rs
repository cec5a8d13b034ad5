use crate::foundation::core::{NormPoint, TimeKey};
use crate::foundation::math::{quantize, round3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default merge window of the free-timestamp policy.
pub const DEFAULT_MERGE_EPSILON_MS: u64 = 10;

/// How a video time maps to a keyframe key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Every time snaps to the nearest multiple of `slot_seconds`.
    Grid {
        /// Slot size in seconds.
        slot_seconds: f64,
    },
    /// Keys are raw times at millisecond precision; new input within `merge_epsilon_ms` of an
    /// existing key folds into it.
    FreeTimestamp {
        /// Merge window in milliseconds.
        #[serde(default = "default_merge_epsilon_ms")]
        merge_epsilon_ms: u64,
    },
}

fn default_merge_epsilon_ms() -> u64 {
    DEFAULT_MERGE_EPSILON_MS
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self::Grid { slot_seconds: 0.1 }
    }
}

impl KeyPolicy {
    /// Map a playhead time onto this policy's key space (grid snap or millisecond rounding).
    pub fn normalize(self, t: f64) -> f64 {
        match self {
            Self::Grid { slot_seconds } => quantize(t, slot_seconds),
            Self::FreeTimestamp { .. } => {
                if t.is_nan() {
                    0.0
                } else {
                    round3(t.max(0.0))
                }
            }
        }
    }

    /// Slot size for grid policies.
    pub fn slot_seconds(self) -> Option<f64> {
        match self {
            Self::Grid { slot_seconds } => Some(slot_seconds),
            Self::FreeTimestamp { .. } => None,
        }
    }
}

/// An ordered polyline drawn with the pen tool.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Pen width in pixels.
    pub width: f64,
    /// Samples in drawing order.
    pub points: Vec<NormPoint>,
}

impl Stroke {
    /// Minimum number of samples for a stroke to be committed.
    pub const MIN_POINTS: usize = 2;

    /// Start a stroke at `first`.
    pub fn new(width: f64, first: NormPoint) -> Self {
        Self {
            width,
            points: vec![first],
        }
    }

    /// `true` once the stroke has enough samples to be stored.
    pub fn is_committable(&self) -> bool {
        self.points.len() >= Self::MIN_POINTS
    }
}

/// Annotations attached to one time key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keyframe {
    points: Vec<NormPoint>,
    strokes: Vec<Stroke>,
}

/// What an undo removed.
#[derive(Debug, Clone, PartialEq)]
pub enum Undone {
    /// The most recent stroke.
    Stroke(Stroke),
    /// The most recent point (only when no strokes remained).
    Point(NormPoint),
}

impl Keyframe {
    /// Points in commit order.
    pub fn points(&self) -> &[NormPoint] {
        &self.points
    }

    /// Strokes in commit order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// `true` when the keyframe holds no annotation.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.strokes.is_empty()
    }

    fn undo_last(&mut self) -> Option<Undone> {
        if let Some(s) = self.strokes.pop() {
            return Some(Undone::Stroke(s));
        }
        self.points.pop().map(Undone::Point)
    }
}

/// Temporal index of annotation keyframes.
///
/// Keyframes live in a map; a sorted key vector is rebuilt whenever a key is added or removed and
/// serves every ordered lookup by binary search.
#[derive(Debug, Clone)]
pub struct KeyframeStore {
    policy: KeyPolicy,
    frames: HashMap<TimeKey, Keyframe>,
    index: Vec<TimeKey>,
}

impl KeyframeStore {
    /// Create an empty store keyed by `policy`.
    pub fn new(policy: KeyPolicy) -> Self {
        Self {
            policy,
            frames: HashMap::new(),
            index: Vec::new(),
        }
    }

    /// Active keying policy.
    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    /// Switch policy for future resolutions. Existing keys are kept unchanged.
    pub fn set_policy(&mut self, policy: KeyPolicy) {
        self.policy = policy;
    }

    /// Number of keyframes.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// `true` when no keyframe exists.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All keys, ascending.
    pub fn keys(&self) -> &[TimeKey] {
        &self.index
    }

    /// Key at `idx` in ascending order.
    pub fn key_at(&self, idx: usize) -> Option<TimeKey> {
        self.index.get(idx).copied()
    }

    /// Position of `key` in ascending order.
    pub fn index_of(&self, key: TimeKey) -> Option<usize> {
        self.index.binary_search(&key).ok()
    }

    /// Borrow the keyframe stored at `key`.
    pub fn get(&self, key: TimeKey) -> Option<&Keyframe> {
        self.frames.get(&key)
    }

    /// `true` when `key` is present.
    pub fn contains(&self, key: TimeKey) -> bool {
        self.frames.contains_key(&key)
    }

    /// Key that `ensure(t)` would use, without creating anything.
    pub fn resolve(&self, t: f64) -> TimeKey {
        match self.policy {
            KeyPolicy::Grid { .. } => TimeKey::from_secs(self.policy.normalize(t)),
            KeyPolicy::FreeTimestamp { merge_epsilon_ms } => {
                let key = TimeKey::from_secs(t);
                if self.contains(key) {
                    return key;
                }
                match self.nearest_key(key.as_secs()) {
                    Some(near) if near.distance_ms(key) <= merge_epsilon_ms => near,
                    _ => key,
                }
            }
        }
    }

    /// Resolve or create the keyframe for time `t`.
    ///
    /// The returned entry removes the keyframe again if it is dropped while still empty.
    pub fn ensure(&mut self, t: f64) -> KeyframeMut<'_> {
        let key = self.resolve(t);
        self.ensure_key(key)
    }

    /// Resolve or create the keyframe for an already resolved `key`.
    pub fn ensure_key(&mut self, key: TimeKey) -> KeyframeMut<'_> {
        if !self.frames.contains_key(&key) {
            self.frames.insert(key, Keyframe::default());
            self.rebuild_index();
        }
        KeyframeMut { store: self, key }
    }

    /// Closest existing key to `t`; ties prefer the earlier key.
    pub fn nearest_key(&self, t: f64) -> Option<TimeKey> {
        let split = self.index.partition_point(|k| k.as_secs() < t);
        let after = self.index.get(split).copied();
        let before = split.checked_sub(1).and_then(|i| self.index.get(i)).copied();
        match (before, after) {
            (Some(b), Some(a)) => {
                if (t - b.as_secs()) <= (a.as_secs() - t) {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (b, a) => b.or(a),
        }
    }

    /// Greatest key `<= t`.
    pub fn active_key_at_or_before(&self, t: f64) -> Option<TimeKey> {
        let split = self.index.partition_point(|k| k.as_secs() <= t);
        split.checked_sub(1).map(|i| self.index[i])
    }

    /// Keyframe in effect at playhead `t` (playhead normalized by the policy first).
    ///
    /// Under the free policy an existing key that input at `t` would merge into wins, even when it
    /// lies slightly after the playhead.
    pub fn active_key(&self, t: f64) -> Option<TimeKey> {
        if let KeyPolicy::FreeTimestamp { .. } = self.policy {
            let merged = self.resolve(self.policy.normalize(t));
            if self.contains(merged) {
                return Some(merged);
            }
        }
        self.active_key_at_or_before(self.policy.normalize(t))
    }

    /// Remove a keyframe.
    pub fn delete(&mut self, key: TimeKey) -> Option<Keyframe> {
        let removed = self.frames.remove(&key)?;
        self.rebuild_index();
        Some(removed)
    }

    /// Remove every keyframe.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.index.clear();
    }

    /// Remove the most recent stroke (else point) at `key`; drop the keyframe once empty.
    pub fn undo_at(&mut self, key: TimeKey) -> Option<Undone> {
        let frame = self.frames.get_mut(&key)?;
        let undone = frame.undo_last();
        if frame.is_empty() {
            self.delete(key);
        }
        undone
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        self.index.extend(self.frames.keys().copied());
        self.index.sort_unstable();
    }
}

/// Mutable entry for one keyframe, returned by [`KeyframeStore::ensure`].
pub struct KeyframeMut<'a> {
    store: &'a mut KeyframeStore,
    key: TimeKey,
}

impl KeyframeMut<'_> {
    /// Key of this entry.
    pub fn key(&self) -> TimeKey {
        self.key
    }

    /// Current contents.
    pub fn keyframe(&self) -> &Keyframe {
        &self.store.frames[&self.key]
    }

    /// Append a point.
    pub fn push_point(&mut self, p: NormPoint) {
        self.frame_mut().points.push(p);
    }

    /// Append a stroke. Strokes with fewer than two samples are rejected.
    pub fn push_stroke(&mut self, stroke: Stroke) -> bool {
        if !stroke.is_committable() {
            return false;
        }
        self.frame_mut().strokes.push(stroke);
        true
    }

    fn frame_mut(&mut self) -> &mut Keyframe {
        self.store.frames.entry(self.key).or_default()
    }
}

impl Drop for KeyframeMut<'_> {
    fn drop(&mut self) {
        if self
            .store
            .frames
            .get(&self.key)
            .is_some_and(Keyframe::is_empty)
        {
            self.store.delete(self.key);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/keyframes.rs"]
mod tests;
