use crate::foundation::core::{NormPoint, TimeKey};
use crate::timeline::keyframes::{KeyframeStore, Stroke};

/// Default squared normalized distance a pen sample must move before it is recorded.
pub const DEFAULT_MIN_MOTION_SQ: f64 = 0.00002;

/// Active drawing tool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tool {
    /// Freehand strokes.
    #[default]
    Pen,
    /// Single points committed on press.
    Point,
}

/// Editor state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditState {
    /// No stroke in progress.
    Idle,
    /// A pen stroke is being buffered.
    Drawing,
}

#[derive(Debug, Clone)]
struct Pending {
    anchor: TimeKey,
    stroke: Stroke,
}

/// Converts pointer input into committed points and strokes.
///
/// A pen stroke resolves its key once, on press, and commits into that key on release even if
/// the playhead moved in between.
#[derive(Debug, Clone)]
pub struct StrokeEditor {
    tool: Tool,
    pen_width: f64,
    min_motion_sq: f64,
    pending: Option<Pending>,
}

impl StrokeEditor {
    /// Idle editor with the pen tool selected.
    pub fn new(pen_width: f64, min_motion_sq: f64) -> Self {
        Self {
            tool: Tool::Pen,
            pen_width,
            min_motion_sq,
            pending: None,
        }
    }

    /// Selected tool.
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Select a tool. Does not affect a stroke already in progress.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Width recorded on future strokes.
    pub fn set_pen_width(&mut self, width: f64) {
        self.pen_width = width;
    }

    /// Current state.
    pub fn state(&self) -> EditState {
        if self.pending.is_some() {
            EditState::Drawing
        } else {
            EditState::Idle
        }
    }

    /// Buffered stroke, if one is in progress.
    pub fn in_progress(&self) -> Option<&Stroke> {
        self.pending.as_ref().map(|p| &p.stroke)
    }

    /// Key the in-progress stroke will be committed to.
    pub fn anchor(&self) -> Option<TimeKey> {
        self.pending.as_ref().map(|p| p.anchor)
    }

    /// Pointer pressed at `p` while the playhead is at `t`.
    ///
    /// The point tool commits immediately and returns the key it landed on. The pen tool starts
    /// buffering; a stroke still in progress is committed first.
    pub fn begin(&mut self, p: NormPoint, t: f64, store: &mut KeyframeStore) -> Option<TimeKey> {
        match self.tool {
            Tool::Point => {
                let mut entry = store.ensure(t);
                entry.push_point(p);
                Some(entry.key())
            }
            Tool::Pen => {
                let committed = self.end(store);
                self.pending = Some(Pending {
                    anchor: store.resolve(t),
                    stroke: Stroke::new(self.pen_width, p),
                });
                committed
            }
        }
    }

    /// Pointer moved to `p`. Returns `true` when the sample was appended.
    pub fn extend(&mut self, p: NormPoint) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        let moved = pending
            .stroke
            .points
            .last()
            .is_none_or(|last| last.distance_sq(p) > self.min_motion_sq);
        if moved {
            pending.stroke.points.push(p);
        }
        moved
    }

    /// Pointer released. Commits the buffered stroke when it has at least two samples.
    pub fn end(&mut self, store: &mut KeyframeStore) -> Option<TimeKey> {
        let Pending { anchor, stroke } = self.pending.take()?;
        if !stroke.is_committable() {
            tracing::debug!(anchor = %anchor, "discarding single-sample stroke");
            return None;
        }
        let mut entry = store.ensure_key(anchor);
        entry.push_stroke(stroke).then_some(anchor)
    }

    /// Pointer cancelled by the host. Behaves like [`StrokeEditor::end`].
    pub fn cancel(&mut self, store: &mut KeyframeStore) -> Option<TimeKey> {
        self.end(store)
    }

    /// Drop the buffered stroke without committing it.
    pub fn abort(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/stroke.rs"]
mod tests;
