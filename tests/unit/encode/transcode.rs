use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

#[derive(Default)]
struct Echo {
    shutdowns: Arc<AtomicUsize>,
}

impl TranscodeEngine for Echo {
    fn transcode(
        &mut self,
        input: &[u8],
        _opts: &TranscodeOpts,
        cancel: &CancelToken,
        on_log: &mut dyn FnMut(&str),
    ) -> SlidecastResult<Vec<u8>> {
        cancel.check()?;
        on_log("time=00:00:01.00");
        Ok(input.to_vec())
    }

    fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn default_opts_are_valid() {
    let o = TranscodeOpts::default();
    assert_eq!(o.crf, 23);
    assert_eq!(o.preset, "veryfast");
    assert!(o.faststart);
    o.validate().unwrap();
}

#[test]
fn invalid_opts_are_rejected() {
    let crf = TranscodeOpts {
        crf: 52,
        ..TranscodeOpts::default()
    };
    assert!(matches!(crf.validate(), Err(SlidecastError::Validation(_))));

    let preset = TranscodeOpts {
        preset: "warp".into(),
        ..TranscodeOpts::default()
    };
    let err = preset.validate().unwrap_err();
    assert!(err.to_string().contains("warp"));
}

#[test]
fn opts_deserialize_with_defaults() {
    let o: TranscodeOpts = serde_json::from_str(r#"{"crf": 18}"#).unwrap();
    assert_eq!(o.crf, 18);
    assert_eq!(o.preset, "veryfast");
}

#[test]
fn handle_builds_engine_lazily_once() {
    let inits = Arc::new(AtomicUsize::new(0));
    let shutdowns = Arc::new(AtomicUsize::new(0));
    let (i, s) = (inits.clone(), shutdowns.clone());
    let mut h = TranscoderHandle::new(move || {
        i.fetch_add(1, Ordering::SeqCst);
        Ok(Echo {
            shutdowns: s.clone(),
        })
    });
    assert!(!h.is_initialized());
    assert_eq!(inits.load(Ordering::SeqCst), 0);

    let mut lines = Vec::new();
    let out = h
        .engine()
        .unwrap()
        .transcode(
            b"abc",
            &TranscodeOpts::default(),
            &CancelToken::new(),
            &mut |l| lines.push(l.to_string()),
        )
        .unwrap();
    assert_eq!(out, b"abc");
    assert_eq!(lines, vec!["time=00:00:01.00"]);
    h.engine().unwrap();
    assert!(h.is_initialized());
    assert_eq!(inits.load(Ordering::SeqCst), 1);

    h.reset();
    assert!(!h.is_initialized());
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    h.engine().unwrap();
    assert_eq!(inits.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_init_leaves_handle_uninitialized() {
    let mut h: TranscoderHandle<Echo> =
        TranscoderHandle::new(|| Err(SlidecastError::transcode("no encoder")));
    assert!(matches!(h.engine(), Err(SlidecastError::Transcode(_))));
    assert!(!h.is_initialized());
}
