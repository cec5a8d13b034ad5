//! Overlay composition and rasterization.

/// Backend contract and frame type.
pub mod backend;
/// CPU raster backend (vello_cpu).
pub mod cpu;
/// Onion-skin overlay planning.
pub mod onion;
