/// Convenience result type used across lifcast.
pub type LifResult<T> = Result<T, LifError>;

/// Top-level error taxonomy used by loader and renderer APIs.
///
/// Kernel-internal failures never surface here: degenerate rays, out-of-bounds hits and
/// stereo disagreement all resolve to background pixels.
#[derive(thiserror::Error, Debug)]
pub enum LifError {
    /// Invalid manifest, camera or settings data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A source image or depth map could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Backend failure while preparing or executing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LifError {
    /// Build a [`LifError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LifError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`LifError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`LifError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
