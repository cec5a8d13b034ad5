/// Convenience result type used across onionskin.
pub type OnionResult<T> = Result<T, OnionError>;

/// Top-level error taxonomy for the fallible edges of the engine.
///
/// Playback, drawing and loop operations never fail: out-of-range inputs clamp and missing
/// targets are no-ops. Errors only surface from configuration, source identification and
/// rasterization.
#[derive(thiserror::Error, Debug)]
pub enum OnionError {
    /// Invalid user-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// A media source reference could not be resolved.
    #[error("source error: {0}")]
    Source(String),

    /// Errors while rasterizing an overlay plan.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OnionError {
    /// Build a [`OnionError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`OnionError::Source`] value.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Build a [`OnionError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`OnionError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
