use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context;

use crate::encode::capture::{CaptureConfig, CaptureResult, CaptureSession};
use crate::encode::transcode::{TranscodeEngine, TranscodeOpts};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::surface::FrameRGBA;

/// How often the transcoder wakes to check for cancellation while ffmpeg is quiet.
const CANCEL_POLL: Duration = Duration::from_millis(50);
/// Trailing stderr lines kept for error messages.
const STDERR_TAIL_LINES: usize = 20;

type Drain = JoinHandle<std::io::Result<Vec<u8>>>;

/// [`CaptureSession`] that streams raw RGBA frames into `ffmpeg` and collects a lossless
/// Matroska/H.264 intermediate from its stdout.
#[derive(Default)]
pub struct FfmpegCapture {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<Drain>,
    stderr_drain: Option<Drain>,
    cfg: Option<CaptureConfig>,
    last_idx: Option<FrameIndex>,
    frames: u64,
}

impl FfmpegCapture {
    pub fn new() -> Self {
        Self::default()
    }

    fn teardown(&mut self) -> (Option<Vec<u8>>, Vec<u8>) {
        drop(self.stdin.take());
        let stdout = join_drain(self.stdout_drain.take());
        let stderr = join_drain(self.stderr_drain.take()).unwrap_or_default();
        (stdout, stderr)
    }
}

impl CaptureSession for FfmpegCapture {
    fn begin(&mut self, cfg: CaptureConfig) -> SlidecastResult<()> {
        if self.child.is_some() {
            return Err(SlidecastError::capture("capture session already started"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(SlidecastError::capture(
                "capture width/height must be non-zero",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(SlidecastError::capture(
                "ffmpeg is required for capture, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
            // Lossless intermediate; the delivery encode happens in the transcoder.
            "-an",
            "-c:v",
            "libx264",
            "-preset",
            "ultrafast",
            "-qp",
            "0",
            "-pix_fmt",
            "yuv444p",
            "-f",
            "matroska",
            "pipe:1",
        ]);

        let mut child = cmd.spawn().map_err(|e| {
            SlidecastError::capture(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SlidecastError::capture("failed to open ffmpeg stdin (unexpected)"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SlidecastError::capture("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SlidecastError::capture("failed to open ffmpeg stderr (unexpected)"))?;

        tracing::debug!(width = cfg.width, height = cfg.height, "spawned capture ffmpeg");
        self.stdout_drain = Some(spawn_drain(stdout));
        self.stderr_drain = Some(spawn_drain(stderr));
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.frames = 0;
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
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(SlidecastError::capture("capture session is already finalized"));
        };
        stdin.write_all(&frame.data).map_err(|e| {
            SlidecastError::capture(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.last_idx = Some(idx);
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> SlidecastResult<CaptureResult> {
        let mut child = self
            .child
            .take()
            .ok_or_else(|| SlidecastError::capture("capture session not started"))?;
        let (stdout, stderr) = self.teardown();
        let status = child
            .wait()
            .map_err(|e| SlidecastError::capture(format!("failed to wait for ffmpeg: {e}")))?;
        self.cfg = None;

        if !status.success() {
            return Err(SlidecastError::capture(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        let bytes = stdout.ok_or_else(|| SlidecastError::capture("ffmpeg stdout read failed"))?;
        tracing::info!(frames = self.frames, bytes = bytes.len(), "capture finalized");
        Ok(CaptureResult {
            bytes,
            frames_captured: self.frames,
            format: "matroska",
        })
    }

    fn abort(&mut self) {
        self.cfg = None;
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Err(e) = child.kill() {
            tracing::warn!(error = %e, "failed to kill capture ffmpeg");
        }
        let _ = self.teardown();
        if let Err(e) = child.wait() {
            tracing::warn!(error = %e, "failed to reap capture ffmpeg");
        }
    }
}

impl Drop for FfmpegCapture {
    fn drop(&mut self) {
        self.abort();
    }
}

/// [`TranscodeEngine`] running the system `ffmpeg` on a scratch directory.
///
/// The scratch directory lives for one `transcode` call and is removed on every exit path.
#[derive(Clone, Debug, Default)]
pub struct FfmpegTranscoder {
    temp_root: Option<PathBuf>,
}

impl FfmpegTranscoder {
    /// Check that `ffmpeg` is available and build the engine.
    pub fn new() -> SlidecastResult<Self> {
        if !is_ffmpeg_on_path() {
            return Err(SlidecastError::transcode(
                "ffmpeg is required for transcoding, but was not found on PATH",
            ));
        }
        Ok(Self::default())
    }

    /// Create scratch directories under `root` instead of the system temp dir.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    fn scratch_dir(&self) -> SlidecastResult<tempfile::TempDir> {
        let mut b = tempfile::Builder::new();
        b.prefix("slidecast-");
        let dir = match &self.temp_root {
            Some(root) => b.tempdir_in(root),
            None => b.tempdir(),
        };
        Ok(dir.context("create transcode scratch dir")?)
    }
}

impl TranscodeEngine for FfmpegTranscoder {
    #[tracing::instrument(skip_all, fields(input_bytes = input.len(), crf = opts.crf, preset = %opts.preset))]
    fn transcode(
        &mut self,
        input: &[u8],
        opts: &TranscodeOpts,
        cancel: &CancelToken,
        on_log: &mut dyn FnMut(&str),
    ) -> SlidecastResult<Vec<u8>> {
        opts.validate()?;
        let dir = self.scratch_dir()?;
        let in_path = dir.path().join("capture.mkv");
        let out_path = dir.path().join("output.mp4");
        std::fs::write(&in_path, input)
            .with_context(|| format!("write intermediate '{}'", in_path.display()))?;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args(["-hide_banner", "-nostdin", "-y", "-i"])
            .arg(&in_path)
            .args([
                "-an",
                "-c:v",
                "libx264",
                "-preset",
                opts.preset.as_str(),
                "-crf",
                &opts.crf.to_string(),
                "-pix_fmt",
                "yuv420p",
            ]);
        if opts.faststart {
            cmd.args(["-movflags", "+faststart"]);
        }
        cmd.arg(&out_path);

        let mut child = cmd.spawn().map_err(|e| {
            SlidecastError::transcode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            SlidecastError::transcode("failed to open ffmpeg stderr (unexpected)")
        })?;

        let (tx, rx) = mpsc::channel::<String>();
        let reader = std::thread::spawn(move || forward_lines(stderr, &tx));

        let mut tail = std::collections::VecDeque::with_capacity(STDERR_TAIL_LINES);
        loop {
            if cancel.is_cancelled() {
                if let Err(e) = child.kill() {
                    tracing::warn!(error = %e, "failed to kill transcode ffmpeg");
                }
                let _ = child.wait();
                let _ = reader.join();
                return Err(SlidecastError::Cancelled);
            }
            match rx.recv_timeout(CANCEL_POLL) {
                Ok(line) => {
                    on_log(&line);
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = child
            .wait()
            .map_err(|e| SlidecastError::transcode(format!("failed to wait for ffmpeg: {e}")))?;
        if reader.join().is_err() {
            tracing::warn!("ffmpeg stderr reader panicked");
        }
        if !status.success() {
            let tail: Vec<String> = tail.into_iter().collect();
            return Err(SlidecastError::transcode(format!(
                "ffmpeg exited with status {status}: {}",
                tail.join("\n")
            )));
        }

        let bytes = std::fs::read(&out_path)
            .with_context(|| format!("read transcoded output '{}'", out_path.display()))?;
        tracing::info!(bytes = bytes.len(), "transcode finished");
        Ok(bytes)
    }
}

fn spawn_drain<R: Read + Send + 'static>(mut r: R) -> Drain {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        r.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_drain(handle: Option<Drain>) -> Option<Vec<u8>> {
    match handle?.join() {
        Ok(Ok(bytes)) => Some(bytes),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "ffmpeg pipe read failed");
            None
        }
        Err(_) => {
            tracing::warn!("ffmpeg pipe drain thread panicked");
            None
        }
    }
}

// ffmpeg rewrites its status line with `\r`, so both `\r` and `\n` end a line.
fn forward_lines<R: Read>(mut r: R, tx: &mpsc::Sender<String>) {
    let mut splitter = LineSplitter::default();
    let mut buf = [0u8; 4096];
    loop {
        let n = match r.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        for line in splitter.push(&buf[..n]) {
            if tx.send(line).is_err() {
                return;
            }
        }
    }
    if let Some(line) = splitter.finish() {
        let _ = tx.send(line);
    }
}

/// Incremental splitter for ffmpeg's `\r`/`\n` separated stderr.
#[derive(Debug, Default)]
pub(crate) struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    /// Feed bytes; returns the non-empty lines completed by them.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        for &b in bytes {
            if b == b'\r' || b == b'\n' {
                self.take_line(&mut out);
            } else {
                self.pending.push(b);
            }
        }
        out
    }

    pub(crate) fn finish(mut self) -> Option<String> {
        let mut out = Vec::new();
        self.take_line(&mut out);
        out.pop()
    }

    fn take_line(&mut self, out: &mut Vec<String>) {
        let line = String::from_utf8_lossy(&self.pending).trim().to_string();
        self.pending.clear();
        if !line.is_empty() {
            out.push(line);
        }
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
