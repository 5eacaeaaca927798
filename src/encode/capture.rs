use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::cache::Frame;
use crate::render::cpu::decode_png;
use crate::render::surface::FrameRGBA;
use crate::timeline::sequencer::Timeline;

/// Stream parameters handed to a [`CaptureSession`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
}

/// Output of one finished capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureResult {
    /// Encoded intermediate stream.
    pub bytes: Vec<u8>,
    pub frames_captured: u64,
    /// Container/format name of `bytes`, e.g. `matroska`.
    pub format: &'static str,
}

/// Records frames into an intermediate stream.
///
/// Ordering contract: `push_frame` is called with strictly increasing indices between `begin` and
/// either `finish` or `abort`.
pub trait CaptureSession: Send {
    fn begin(&mut self, cfg: CaptureConfig) -> SlidecastResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SlidecastResult<()>;
    /// Finalize the stream and hand back its bytes.
    fn finish(&mut self) -> SlidecastResult<CaptureResult>;
    /// Discard everything recorded so far. Must be safe to call in any state.
    fn abort(&mut self);
}

/// How frames are fed to the capture session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    /// Frame `n` is pushed no earlier than `n / fps` seconds after capture starts.
    #[default]
    #[serde(alias = "real-time")]
    RealTime,
    /// Push frames as fast as they can be produced.
    Unpaced,
}

/// In-memory capture for tests and debugging.
///
/// `finish` yields the concatenated raw RGBA frames with format `rawvideo`.
#[derive(Debug, Default)]
pub struct InMemoryCapture {
    cfg: Option<CaptureConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    begins: usize,
    aborts: usize,
    last_idx: Option<FrameIndex>,
}

impl InMemoryCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<CaptureConfig> {
        self.cfg
    }

    /// Frames pushed since the last `begin`.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Number of times a session was begun.
    pub fn begin_count(&self) -> usize {
        self.begins
    }

    pub fn abort_count(&self) -> usize {
        self.aborts
    }
}

impl CaptureSession for InMemoryCapture {
    fn begin(&mut self, cfg: CaptureConfig) -> SlidecastResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.begins += 1;
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SlidecastResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| SlidecastError::capture("capture session not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(SlidecastError::capture(
                "capture session received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(SlidecastError::capture(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn finish(&mut self) -> SlidecastResult<CaptureResult> {
        if self.cfg.take().is_none() {
            return Err(SlidecastError::capture("capture session not started"));
        }
        let bytes = self
            .frames
            .iter()
            .flat_map(|(_, f)| f.data.iter().copied())
            .collect();
        Ok(CaptureResult {
            bytes,
            frames_captured: self.frames.len() as u64,
            format: "rawvideo",
        })
    }

    fn abort(&mut self) {
        self.aborts += 1;
        self.cfg = None;
        self.frames.clear();
    }
}

/// Play `timeline` into `session` and return the finalized stream.
///
/// Each distinct still is decoded once and reused while consecutive handles point at it. With
/// [`Pacing::RealTime`] the target frame is `⌊elapsed / interval⌋ + 1`; frames are pushed only
/// while capture is behind that target and the loop sleeps until the next deadline otherwise.
/// Every frame is always pushed, so slow machines produce the same stream, just later.
///
/// On any error (including cancellation) the session is aborted and nothing is returned.
#[tracing::instrument(skip_all, fields(frames = timeline.len_frames(), ?pacing))]
pub fn run_capture<C: CaptureSession + ?Sized>(
    timeline: &Timeline,
    session: &mut C,
    pacing: Pacing,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(f64),
) -> SlidecastResult<CaptureResult> {
    let canvas = timeline.canvas();
    session.begin(CaptureConfig {
        width: canvas.width,
        height: canvas.height,
        fps: timeline.fps(),
    })?;

    match push_all(timeline, session, pacing, cancel, progress) {
        Ok(()) => {
            let result = session.finish();
            if result.is_err() {
                session.abort();
            }
            result
        }
        Err(e) => {
            tracing::info!(error = %e, "capture stopped; aborting session");
            session.abort();
            Err(e)
        }
    }
}

fn push_all<C: CaptureSession + ?Sized>(
    timeline: &Timeline,
    session: &mut C,
    pacing: Pacing,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(f64),
) -> SlidecastResult<()> {
    let total = timeline.len_frames();
    let interval = timeline.fps().frame_duration_secs();
    let handles = timeline.handles();
    let start = Instant::now();

    let mut current: Option<(Arc<Frame>, FrameRGBA)> = None;
    let mut next = 0usize;

    while next < total {
        cancel.check()?;

        let target = match pacing {
            Pacing::Unpaced => total,
            Pacing::RealTime => {
                let elapsed = start.elapsed().as_secs_f64();
                (((elapsed / interval).floor() as usize) + 1).min(total)
            }
        };

        if next >= target {
            let deadline = start + Duration::from_secs_f64(target as f64 * interval);
            if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
            continue;
        }

        while next < target {
            cancel.check()?;
            let handle = &handles[next];
            let reuse = current
                .as_ref()
                .is_some_and(|(frame, _)| Arc::ptr_eq(frame, handle));
            if !reuse {
                let rgba = decode_png(&handle.png)?;
                current = Some((handle.clone(), rgba));
            }
            if let Some((_, rgba)) = current.as_ref() {
                session.push_frame(FrameIndex(next as u64), rgba)?;
            }
            next += 1;
            progress(next as f64 / total as f64 * 100.0);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/capture.rs"]
mod tests;
