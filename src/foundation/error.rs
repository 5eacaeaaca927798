/// Convenience result type used across slidecast.
pub type SlidecastResult<T> = Result<T, SlidecastError>;

/// Top-level error taxonomy used by the render and export APIs.
///
/// Every variant is terminal for the operation that raised it; nothing in the pipeline retries.
#[derive(thiserror::Error, Debug)]
pub enum SlidecastError {
    /// The script produced no slides, so there is nothing to render or export.
    #[error("empty script: there are no slides to render")]
    EmptyScript,

    /// A drawing surface could not be acquired for the requested geometry.
    #[error("surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// An encoded still failed to decode back into pixels.
    #[error("image decode error: {0}")]
    ImageDecode(String),

    /// The capture session failed (process spawn, stream write, or finalize).
    #[error("capture error: {0}")]
    Capture(String),

    /// The transcode engine failed or could not be initialized.
    #[error("transcode error: {0}")]
    Transcode(String),

    /// The export was cancelled by the caller.
    #[error("export cancelled")]
    Cancelled,

    /// Invalid user-provided data or settings.
    #[error("validation error: {0}")]
    Validation(String),

    /// A font could not be located or loaded.
    #[error("font error: {0}")]
    Font(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlidecastError {
    /// Build a [`SlidecastError::SurfaceUnavailable`] value.
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::SurfaceUnavailable(msg.into())
    }

    /// Build a [`SlidecastError::ImageDecode`] value.
    pub fn image_decode(msg: impl Into<String>) -> Self {
        Self::ImageDecode(msg.into())
    }

    /// Build a [`SlidecastError::Capture`] value.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`SlidecastError::Transcode`] value.
    pub fn transcode(msg: impl Into<String>) -> Self {
        Self::Transcode(msg.into())
    }

    /// Build a [`SlidecastError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SlidecastError::Font`] value.
    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    /// Return `true` when this error is the cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
