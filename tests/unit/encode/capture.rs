use super::*;
use crate::foundation::core::Canvas;
use crate::layout::text::{BlockFont, ShaperFactory};
use crate::render::cache::{FrameCache, RenderParams, RenderThreading, render_frames};
use crate::script::parse::parse_script;
use crate::timeline::sequencer::build_timeline;

fn timeline(script: &str, fps: u32) -> Timeline {
    let slides = parse_script(script).unwrap();
    let params = RenderParams {
        canvas: Canvas {
            width: 160,
            height: 90,
        },
        font: BlockFont::default().identity().clone(),
    };
    let mut cache = FrameCache::new();
    let frames = render_frames(
        &slides,
        &params,
        &mut cache,
        &BlockFont::default(),
        RenderThreading::default(),
    )
    .unwrap();
    let entries: Vec<_> = frames
        .into_iter()
        .zip(&slides)
        .map(|(f, s)| (f, s.duration_secs))
        .collect();
    build_timeline(&entries, Fps::new(fps, 1).unwrap(), params.canvas).unwrap()
}

#[test]
fn unpaced_capture_pushes_every_frame_in_order() {
    let t = timeline("a -- duration 2\nbbbb -- duration 1 -- color red", 4);
    let mut session = InMemoryCapture::new();
    let mut progress = Vec::new();
    let result = run_capture(
        &t,
        &mut session,
        Pacing::Unpaced,
        &CancelToken::new(),
        &mut |p| progress.push(p),
    )
    .unwrap();

    assert_eq!(result.frames_captured, 12);
    assert_eq!(result.format, "rawvideo");
    assert_eq!(result.bytes.len(), 12 * 160 * 90 * 4);
    assert_eq!(session.begin_count(), 1);
    assert_eq!(session.abort_count(), 0);
    assert_eq!(
        session.config(),
        None,
        "finish consumes the session config"
    );

    let idx: Vec<u64> = session.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, (0..12).collect::<Vec<_>>());
    assert_eq!(session.frames()[0].1, session.frames()[7].1);
    assert_ne!(session.frames()[7].1, session.frames()[8].1);

    assert_eq!(progress.len(), 12);
    assert!(progress.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(progress.last(), Some(&100.0));
}

#[test]
fn realtime_capture_takes_the_timeline_duration() {
    let t = timeline("a -- duration 1", 10);
    let mut session = InMemoryCapture::new();
    let started = Instant::now();
    let result = run_capture(
        &t,
        &mut session,
        Pacing::RealTime,
        &CancelToken::new(),
        &mut |_| {},
    )
    .unwrap();
    assert_eq!(result.frames_captured, 10);
    // The last frame is due at 0.9s.
    assert!(started.elapsed() >= Duration::from_millis(850));
}

#[test]
fn cancellation_aborts_the_session() {
    let t = timeline("a -- duration 2", 10);
    let cancel = CancelToken::new();
    let mut session = InMemoryCapture::new();
    let c = cancel.clone();
    let err = run_capture(&t, &mut session, Pacing::Unpaced, &cancel, &mut |p| {
        if p >= 50.0 {
            c.cancel();
        }
    })
    .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(session.abort_count(), 1);
    assert!(session.frames().is_empty());
}

struct FailingSession {
    fail_at: u64,
    aborted: bool,
}

impl CaptureSession for FailingSession {
    fn begin(&mut self, _cfg: CaptureConfig) -> SlidecastResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &FrameRGBA) -> SlidecastResult<()> {
        if idx.0 == self.fail_at {
            return Err(SlidecastError::capture("disk full"));
        }
        Ok(())
    }

    fn finish(&mut self) -> SlidecastResult<CaptureResult> {
        Err(SlidecastError::capture("finish should not run"))
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[test]
fn push_failure_aborts_without_finishing() {
    let t = timeline("a", 2);
    let mut session = FailingSession {
        fail_at: 3,
        aborted: false,
    };
    let err = run_capture(
        &t,
        &mut session,
        Pacing::Unpaced,
        &CancelToken::new(),
        &mut |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, SlidecastError::Capture(ref m) if m == "disk full"));
    assert!(session.aborted);
}

#[test]
fn in_memory_capture_enforces_ordering_and_size() {
    let mut s = InMemoryCapture::new();
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![0; 8],
    };
    assert!(s.push_frame(FrameIndex(0), &frame).is_err());

    s.begin(CaptureConfig {
        width: 2,
        height: 1,
        fps: Fps::DEFAULT,
    })
    .unwrap();
    s.push_frame(FrameIndex(0), &frame).unwrap();
    assert!(s.push_frame(FrameIndex(0), &frame).is_err());
    let wrong = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![0; 4],
    };
    assert!(s.push_frame(FrameIndex(1), &wrong).is_err());
    assert_eq!(s.finish().unwrap().frames_captured, 1);
    assert!(s.finish().is_err());
}

#[test]
fn pacing_serde_names() {
    assert_eq!(serde_json::to_string(&Pacing::RealTime).unwrap(), "\"realtime\"");
    let p: Pacing = serde_json::from_str("\"unpaced\"").unwrap();
    assert_eq!(p, Pacing::Unpaced);
    assert_eq!(Pacing::default(), Pacing::RealTime);
}
