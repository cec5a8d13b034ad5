//! Engine configuration: serde-loaded settings with validation.

/// Color values accepted in config documents.
pub mod color;
/// `EngineConfig` and its onion-skin section.
pub mod engine;
