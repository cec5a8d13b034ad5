use crate::foundation::core::Rgba8;
use crate::foundation::error::OnionResult;
use crate::render::onion::OverlayPlan;

/// A rendered overlay as RGBA8 pixels.
///
/// Overlay frames are **premultiplied alpha**; the `premultiplied` flag makes this explicit at API
/// boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// RGBA bytes of the pixel at `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// A rasterizer that executes an [`OverlayPlan`] into a [`FrameRGBA`].
pub trait OverlayBackend {
    /// Draw every layer of `plan` onto a fresh surface of `plan.canvas` size.
    fn render_plan(&mut self, plan: &OverlayPlan) -> OnionResult<FrameRGBA>;
}

/// Available backend kinds.
#[derive(Clone, Copy, Debug)]
pub enum BackendKind {
    /// CPU raster backend powered by `vello_cpu`.
    Cpu,
}

/// Backend-agnostic settings.
#[derive(Clone, Debug, Default)]
pub struct OverlaySettings {
    /// If set, backends clear the target to this straight color before drawing.
    pub clear: Option<Rgba8>,
}

/// Create an overlay backend.
pub fn create_backend(kind: BackendKind, settings: &OverlaySettings) -> Box<dyn OverlayBackend> {
    match kind {
        BackendKind::Cpu => Box::new(crate::render::cpu::CpuOverlayBackend::new(
            settings.clone(),
        )),
    }
}
