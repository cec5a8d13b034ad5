use crate::config::engine::OnionConfig;
use crate::foundation::core::{BezPath, Canvas, Point, Rgba8, TimeKey};
use crate::foundation::math::round3;
use crate::timeline::keyframes::{KeyPolicy, Keyframe, KeyframeStore, Stroke};

/// Layers at or below this opacity are not emitted.
pub const MIN_LAYER_OPACITY: f32 = 0.001;

/// Role of a layer in the overlay stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    /// Earlier keyframe, `distance` steps before the active one.
    Previous {
        /// Neighbor distance, starting at 1.
        distance: u32,
    },
    /// Later keyframe, `distance` steps after the active one.
    Next {
        /// Neighbor distance, starting at 1.
        distance: u32,
    },
    /// The keyframe in effect at the playhead.
    Active,
    /// The stroke currently being drawn.
    InProgress,
}

/// A polyline in pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeOp {
    /// Open path through every sample.
    pub path: BezPath,
    /// Pen width in pixels.
    pub width: f64,
}

/// A point marker in pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointOp {
    /// Marker center.
    pub center: Point,
    /// Marker radius in pixels.
    pub radius: f64,
}

/// One keyframe's (or the in-progress stroke's) geometry at a uniform color and opacity.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLayer {
    /// Role in the stack.
    pub kind: LayerKind,
    /// Source keyframe; `None` for the in-progress stroke.
    pub key: Option<TimeKey>,
    /// Straight color of every op in the layer.
    pub color: Rgba8,
    /// Layer opacity in `[0,1]`.
    pub opacity: f32,
    /// Strokes in commit order, drawn before points.
    pub strokes: Vec<StrokeOp>,
    /// Points in commit order.
    pub points: Vec<PointOp>,
}

/// Everything to draw for one tick, bottom layer first.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayPlan {
    /// Target surface size.
    pub canvas: Canvas,
    /// Layers in paint order.
    pub layers: Vec<OverlayLayer>,
}

impl OverlayPlan {
    /// Plan with nothing to draw.
    pub fn empty(canvas: Canvas) -> Self {
        Self {
            canvas,
            layers: Vec::new(),
        }
    }

    /// `true` when no layer is present.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// First layer of the given kind.
    pub fn layer(&self, kind: LayerKind) -> Option<&OverlayLayer> {
        self.layers.iter().find(|l| l.kind == kind)
    }
}

/// Builds overlay plans from the keyframe store around a playhead.
///
/// Ghost order is previous neighbors from farthest to nearest, then next neighbors from nearest to
/// farthest, then the active keyframe, then the in-progress stroke.
#[derive(Clone, Debug)]
pub struct OnionCompositor {
    cfg: OnionConfig,
    point_radius: f64,
}

impl OnionCompositor {
    /// Compositor with the given window and point marker radius.
    pub fn new(cfg: OnionConfig, point_radius: f64) -> Self {
        Self { cfg, point_radius }
    }

    /// Replace the onion settings.
    pub fn set_config(&mut self, cfg: OnionConfig) {
        self.cfg = cfg;
    }

    /// Replace the point marker radius.
    pub fn set_point_radius(&mut self, radius: f64) {
        self.point_radius = radius;
    }

    /// Ghost opacity at neighbor distance `d >= 1`: `clamp(ghost_max * falloff^(d-1), 0, 1)`.
    pub fn alpha(&self, d: u32) -> f32 {
        let exp = d.saturating_sub(1).min(i32::MAX as u32) as i32;
        (self.cfg.ghost_max * self.cfg.falloff.powi(exp)).clamp(0.0, 1.0)
    }

    /// Build the plan for playhead `t`.
    pub fn compose(
        &self,
        store: &KeyframeStore,
        t: f64,
        in_progress: Option<&Stroke>,
        canvas: Canvas,
    ) -> OverlayPlan {
        let mut plan = OverlayPlan::empty(canvas);
        let active = store.active_key(t);
        let prev_color = self.cfg.prev_color.rgba8();
        let next_color = self.cfg.next_color.rgba8();

        for d in (1..=self.cfg.prev_count).rev() {
            if let Some(key) = neighbor(store, t, active, -i64::from(d)) {
                let kind = LayerKind::Previous { distance: d };
                self.push_keyframe(&mut plan, store, key, kind, prev_color, self.alpha(d));
            }
        }
        for d in 1..=self.cfg.next_count {
            if let Some(key) = neighbor(store, t, active, i64::from(d)) {
                let kind = LayerKind::Next { distance: d };
                self.push_keyframe(&mut plan, store, key, kind, next_color, self.alpha(d));
            }
        }

        let active_color = self.cfg.active_color.rgba8();
        if let Some(key) = active {
            self.push_keyframe(&mut plan, store, key, LayerKind::Active, active_color, 1.0);
        }
        if let Some(stroke) = in_progress.filter(|s| s.is_committable()) {
            plan.layers.push(OverlayLayer {
                kind: LayerKind::InProgress,
                key: None,
                color: active_color,
                opacity: 1.0,
                strokes: vec![stroke_op(stroke, canvas)],
                points: Vec::new(),
            });
        }
        plan
    }

    fn push_keyframe(
        &self,
        plan: &mut OverlayPlan,
        store: &KeyframeStore,
        key: TimeKey,
        kind: LayerKind,
        color: Rgba8,
        opacity: f32,
    ) {
        if opacity <= MIN_LAYER_OPACITY {
            return;
        }
        let Some(frame) = store.get(key) else {
            return;
        };
        let layer = self.layer_for(frame, key, kind, color, opacity, plan.canvas);
        plan.layers.push(layer);
    }

    fn layer_for(
        &self,
        frame: &Keyframe,
        key: TimeKey,
        kind: LayerKind,
        color: Rgba8,
        opacity: f32,
        canvas: Canvas,
    ) -> OverlayLayer {
        OverlayLayer {
            kind,
            key: Some(key),
            color,
            opacity,
            strokes: frame
                .strokes()
                .iter()
                .filter(|s| s.is_committable())
                .map(|s| stroke_op(s, canvas))
                .collect(),
            points: frame
                .points()
                .iter()
                .map(|p| PointOp {
                    center: p.to_pixels(canvas),
                    radius: self.point_radius,
                })
                .collect(),
        }
    }
}

/// Neighbor `offset` steps away from the active keyframe.
///
/// Grid stores step in slot-sized time increments from the playhead's slot and never return the
/// active key itself; free stores step through the sorted index.
fn neighbor(
    store: &KeyframeStore,
    t: f64,
    active: Option<TimeKey>,
    offset: i64,
) -> Option<TimeKey> {
    match store.policy() {
        KeyPolicy::Grid { slot_seconds } => {
            let base = store.policy().normalize(t);
            let at = round3(base + offset as f64 * slot_seconds);
            if at < 0.0 {
                return None;
            }
            let key = TimeKey::from_secs(at);
            (store.contains(key) && Some(key) != active).then_some(key)
        }
        KeyPolicy::FreeTimestamp { .. } => {
            let idx = match active.and_then(|k| store.index_of(k)) {
                Some(i) => i64::try_from(i).ok()? + offset,
                // Nothing active: "next" neighbors start at the first key.
                None if offset > 0 => offset - 1,
                None => return None,
            };
            store.key_at(usize::try_from(idx).ok()?)
        }
    }
}

fn stroke_op(stroke: &Stroke, canvas: Canvas) -> StrokeOp {
    let mut path = BezPath::new();
    let mut pts = stroke.points.iter().map(|p| p.to_pixels(canvas));
    if let Some(first) = pts.next() {
        path.move_to(first);
        for p in pts {
            path.line_to(p);
        }
    }
    StrokeOp {
        path,
        width: stroke.width,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/onion.rs"]
mod tests;
