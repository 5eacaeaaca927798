use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{SlidecastError, SlidecastResult};

/// x264 presets accepted by [`TranscodeOpts::preset`].
pub const X264_PRESETS: [&str; 10] = [
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
    "placebo",
];

/// Delivery encode settings.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TranscodeOpts {
    /// Constant rate factor, `0..=51`; lower is higher quality.
    pub crf: u8,
    /// x264 speed/size preset.
    pub preset: String,
    /// Move the MP4 index to the front of the file.
    pub faststart: bool,
}

impl Default for TranscodeOpts {
    fn default() -> Self {
        Self {
            crf: 23,
            preset: "veryfast".to_string(),
            faststart: true,
        }
    }
}

impl TranscodeOpts {
    pub fn validate(&self) -> SlidecastResult<()> {
        if self.crf > 51 {
            return Err(SlidecastError::validation(format!(
                "crf must be in 0..=51, got {}",
                self.crf
            )));
        }
        if !X264_PRESETS.contains(&self.preset.as_str()) {
            return Err(SlidecastError::validation(format!(
                "unknown x264 preset '{}' (expected one of {})",
                self.preset,
                X264_PRESETS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Converts a captured intermediate stream into the delivery format.
pub trait TranscodeEngine: Send {
    /// Transcode `input` into MP4 bytes.
    ///
    /// `on_log` receives every diagnostic line the engine emits. Implementations poll `cancel`
    /// while waiting and return [`SlidecastError::Cancelled`] once it is set.
    fn transcode(
        &mut self,
        input: &[u8],
        opts: &TranscodeOpts,
        cancel: &CancelToken,
        on_log: &mut dyn FnMut(&str),
    ) -> SlidecastResult<Vec<u8>>;

    /// Release engine resources. Called by [`TranscoderHandle::reset`].
    fn shutdown(&mut self) {}
}

type EngineInit<E> = Box<dyn Fn() -> SlidecastResult<E> + Send + Sync>;

/// Explicitly owned, lazily constructed transcode engine.
///
/// The engine is built on first use and kept until [`TranscoderHandle::reset`].
pub struct TranscoderHandle<E> {
    init: EngineInit<E>,
    engine: Option<E>,
}

impl<E: TranscodeEngine> TranscoderHandle<E> {
    pub fn new(init: impl Fn() -> SlidecastResult<E> + Send + Sync + 'static) -> Self {
        Self {
            init: Box::new(init),
            engine: None,
        }
    }

    /// Borrow the engine, constructing it on first call.
    pub fn engine(&mut self) -> SlidecastResult<&mut E> {
        if self.engine.is_none() {
            tracing::info!("initializing transcoder");
            self.engine = Some((self.init)()?);
        }
        self.engine
            .as_mut()
            .ok_or_else(|| SlidecastError::transcode("transcoder failed to initialize"))
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// Shut down and drop the engine; the next [`TranscoderHandle::engine`] call rebuilds it.
    pub fn reset(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.shutdown();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/transcode.rs"]
mod tests;
