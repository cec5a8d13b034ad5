//! Onionskin is a time-synchronized annotation engine for video.
//!
//! Strokes and points drawn over a playing video are keyed to video time, and every frame the
//! engine composes an onion-skin overlay from the neighboring keyframes. The public API is
//! engine-oriented:
//!
//! - Build an [`Engine`] from an [`EngineConfig`]
//! - Load a [`PlaybackSource`] (or a remote reference through [`Engine::load_remote`])
//! - Forward pointer and transport actions, and call [`Engine::tick`] once per display frame
//! - Optionally rasterize the returned [`OverlayPlan`] with an [`OverlayBackend`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Engine configuration documents.
pub mod config;
/// Pointer input and drawing tools.
pub mod edit;
/// Overlay planning and rasterization.
pub mod render;
/// The engine context.
pub mod session;
/// Playback backends.
pub mod source;
/// Keyframes, loop range and step-play timing.
pub mod timeline;

pub use config::color::ColorDef;
pub use config::engine::{EngineConfig, OnionConfig};
pub use edit::stroke::{EditState, StrokeEditor, Tool};
pub use foundation::core::{BezPath, Canvas, NormPoint, Point, Rgba8, TimeKey};
pub use foundation::error::{OnionError, OnionResult};
pub use foundation::math::{clamp_seek_target, quantize};
pub use render::backend::{
    BackendKind, FrameRGBA, OverlayBackend, OverlaySettings, create_backend,
};
pub use render::cpu::CpuOverlayBackend;
pub use render::onion::{
    LayerKind, OnionCompositor, OverlayLayer, OverlayPlan, PointOp, StrokeOp,
};
pub use session::engine::{Engine, LoopBar, LoopHandle, PlaybackMode, TickOutput};
pub use source::playback::{PlaybackSource, SourceKind, is_playable};
pub use source::remote::RemoteVideoId;
pub use source::simulated::{SimulatedHandle, SimulatedSource};
pub use timeline::keyframes::{KeyPolicy, Keyframe, KeyframeStore, Stroke, Undone};
pub use timeline::looping::{LoopController, LoopRange, LoopStatus};
pub use timeline::step::{StepScheduler, StepTicket, interval_for};
