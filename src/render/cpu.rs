use crate::foundation::core::{BezPath, Point, Rgba8};
use crate::foundation::error::{OnionError, OnionResult};
use crate::render::backend::{FrameRGBA, OverlayBackend, OverlaySettings};
use crate::render::onion::{OverlayLayer, OverlayPlan, PointOp, StrokeOp};
use vello_cpu::kurbo::Shape;

/// Width of the dark outline around point markers.
const POINT_OUTLINE_WIDTH: f64 = 2.0;
const CIRCLE_TOLERANCE: f64 = 0.1;

/// Overlay rasterizer on top of `vello_cpu`.
///
/// Strokes get a colored body and a dark core one pixel narrower; points get a colored disc with a
/// dark outline. Layer opacity is applied as an opacity layer around the whole layer.
pub struct CpuOverlayBackend {
    settings: OverlaySettings,
}

impl CpuOverlayBackend {
    /// Backend with the given settings.
    pub fn new(settings: OverlaySettings) -> Self {
        Self { settings }
    }
}

impl OverlayBackend for CpuOverlayBackend {
    fn render_plan(&mut self, plan: &OverlayPlan) -> OnionResult<FrameRGBA> {
        let width: u16 = plan
            .canvas
            .width
            .try_into()
            .map_err(|_| OnionError::render("overlay width exceeds u16"))?;
        let height: u16 = plan
            .canvas
            .height
            .try_into()
            .map_err(|_| OnionError::render("overlay height exceeds u16"))?;

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        if let Some(c) = self.settings.clear {
            clear_pixmap(&mut pixmap, premul_rgba8(c));
        }

        let mut ctx = vello_cpu::RenderContext::new(width, height);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        for layer in &plan.layers {
            draw_layer(&mut ctx, layer);
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn draw_layer(ctx: &mut vello_cpu::RenderContext, layer: &OverlayLayer) {
    let opacity = layer.opacity.clamp(0.0, 1.0);
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    for stroke in &layer.strokes {
        draw_stroke(ctx, stroke, layer.color);
    }
    for point in &layer.points {
        draw_point(ctx, point, layer.color);
    }
    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn draw_stroke(ctx: &mut vello_cpu::RenderContext, op: &StrokeOp, color: Rgba8) {
    if op.path.elements().len() < 2 {
        return;
    }
    let path = bezpath_to_cpu(&op.path);

    ctx.set_paint(color_to_cpu(color));
    ctx.set_stroke(round_stroke(op.width));
    ctx.stroke_path(&path);

    ctx.set_paint(color_to_cpu(Rgba8::BLACK));
    ctx.set_stroke(round_stroke((op.width - 1.0).max(1.0)));
    ctx.stroke_path(&path);
}

fn draw_point(ctx: &mut vello_cpu::RenderContext, op: &PointOp, color: Rgba8) {
    let circle = vello_cpu::kurbo::Circle::new(point_to_cpu(op.center), op.radius.max(0.0));
    let path = circle.to_path(CIRCLE_TOLERANCE);

    ctx.set_paint(color_to_cpu(color));
    ctx.fill_path(&path);

    ctx.set_paint(color_to_cpu(Rgba8::BLACK));
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(POINT_OUTLINE_WIDTH));
    ctx.stroke_path(&path);
}

fn round_stroke(width: f64) -> vello_cpu::kurbo::Stroke {
    vello_cpu::kurbo::Stroke::new(width)
        .with_caps(vello_cpu::kurbo::Cap::Round)
        .with_join(vello_cpu::kurbo::Join::Round)
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn premul_rgba8(c: Rgba8) -> [u8; 4] {
    let af = u16::from(c.a) + 1;
    let premul = |v: u8| -> u8 { ((u16::from(v) * af) >> 8) as u8 };
    [premul(c.r), premul(c.g), premul(c.b), c.a]
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
