use crate::encode::capture::{CaptureSession, Pacing, run_capture};
use crate::encode::progress::{ExportStage, ProgressTracker, parse_ffmpeg_time, percent_of};
use crate::encode::transcode::{TranscodeEngine, TranscodeOpts, TranscoderHandle};
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::timeline::sequencer::Timeline;

/// Options for one [`Exporter`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportOpts {
    pub pacing: Pacing,
    pub transcode: TranscodeOpts,
}

/// Runs the capture → transcode pipeline for a timeline.
///
/// One export at a time: `export` takes `&mut self`. The capture stage completes before the
/// transcoder starts.
pub struct Exporter<C, E> {
    capture: C,
    transcoder: TranscoderHandle<E>,
    opts: ExportOpts,
    cancel: CancelToken,
}

impl<C: CaptureSession, E: TranscodeEngine> Exporter<C, E> {
    pub fn new(capture: C, transcoder: TranscoderHandle<E>, opts: ExportOpts) -> Self {
        Self {
            capture,
            transcoder,
            opts,
            cancel: CancelToken::new(),
        }
    }

    /// Token that cancels the in-flight (or next) export.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Replace a fired cancel token so the exporter can run again.
    pub fn rearm(&mut self) {
        if self.cancel.is_cancelled() {
            self.cancel = CancelToken::new();
        }
    }

    pub fn opts(&self) -> &ExportOpts {
        &self.opts
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn transcoder_mut(&mut self) -> &mut TranscoderHandle<E> {
        &mut self.transcoder
    }

    /// Capture `timeline`, transcode it, and return the final MP4 bytes.
    ///
    /// `on_progress` receives `(stage, percent)` pairs; per stage the values are clamped to
    /// `[0, 100]` and strictly increasing. An empty timeline fails with
    /// [`SlidecastError::EmptyScript`] before any capture session is begun.
    #[tracing::instrument(skip_all, fields(frames = timeline.len_frames(), secs = timeline.total_duration_secs()))]
    pub fn export(
        &mut self,
        timeline: &Timeline,
        on_progress: &mut dyn FnMut(ExportStage, f64),
    ) -> SlidecastResult<Vec<u8>> {
        if timeline.is_empty() {
            return Err(SlidecastError::EmptyScript);
        }
        self.opts.transcode.validate()?;
        self.cancel.check()?;

        let mut tracker = ProgressTracker::new(|stage, p| on_progress(stage, p));
        let cancel = self.cancel.clone();

        tracing::info!(stage = %ExportStage::Capture, "export stage started");
        tracker.report(ExportStage::Capture, 0.0);
        let captured = run_capture(
            timeline,
            &mut self.capture,
            self.opts.pacing,
            &cancel,
            &mut |p| {
                tracker.report(ExportStage::Capture, p);
            },
        )?;
        tracing::info!(
            frames = captured.frames_captured,
            bytes = captured.bytes.len(),
            format = captured.format,
            "capture complete"
        );
        cancel.check()?;

        tracing::info!(stage = %ExportStage::Transcode, "export stage started");
        tracker.report(ExportStage::Transcode, 0.0);
        let total_secs = timeline.total_duration_secs();
        let engine = self.transcoder.engine()?;
        let mp4 = engine.transcode(
            &captured.bytes,
            &self.opts.transcode,
            &cancel,
            &mut |line| {
                tracing::trace!(line, "ffmpeg");
                if let Some(secs) = parse_ffmpeg_time(line) {
                    tracker.report(ExportStage::Transcode, percent_of(secs, total_secs));
                }
            },
        )?;
        drop(captured);
        tracker.report(ExportStage::Transcode, 100.0);

        tracing::info!(bytes = mp4.len(), "export complete");
        Ok(mp4)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/export.rs"]
mod tests;
