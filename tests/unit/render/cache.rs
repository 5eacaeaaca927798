use super::*;
use crate::layout::text::BlockFont;
use crate::script::parse::parse_line;

fn params() -> RenderParams {
    RenderParams {
        canvas: Canvas {
            width: 160,
            height: 90,
        },
        font: BlockFont::default().identity().clone(),
    }
}

fn slides(lines: &[&str]) -> Vec<Slide> {
    lines
        .iter()
        .enumerate()
        .map(|(i, l)| parse_line(l, i))
        .collect()
}

#[test]
fn every_key_field_changes_the_key() {
    let base_slide = parse_line("Hello", 0);
    let p = params();
    let base = FrameKey::for_slide(&base_slide, &p);

    let variants = [
        FrameKey::for_slide(&parse_line("Hello!", 0), &p),
        FrameKey::for_slide(&parse_line("Hello -- duration 4", 0), &p),
        FrameKey::for_slide(&parse_line("Hello -- color red", 0), &p),
        FrameKey::for_slide(&parse_line("Hello -- textlg", 0), &p),
        FrameKey::for_slide(&parse_line("Hello -- uppercase", 0), &p),
        FrameKey::for_slide(
            &base_slide,
            &RenderParams {
                canvas: Canvas {
                    width: 90,
                    height: 160,
                },
                ..p.clone()
            },
        ),
        FrameKey::for_slide(
            &base_slide,
            &RenderParams {
                font: BlockFont::new("Other").identity().clone(),
                ..p.clone()
            },
        ),
        FrameKey::for_slide(
            &base_slide,
            &RenderParams {
                font: FontIdentity {
                    family: p.font.family.clone(),
                    class: "changed".into(),
                },
                ..p.clone()
            },
        ),
    ];
    for v in &variants {
        assert_ne!(v, &base);
        assert_ne!(v.fingerprint(), base.fingerprint());
    }
}

#[test]
fn key_text_is_uppercased_text() {
    let key = FrameKey::for_slide(&parse_line("<b>hi</b> -- caps", 0), &params());
    assert_eq!(key.text, "<B>HI</B>");
    assert!(key.uppercase);
}

#[test]
fn rendering_twice_reuses_cached_frames() {
    let mut cache = FrameCache::new();
    let s = slides(&["One", "Two"]);
    let a = render_frames(&s, &params(), &mut cache, &BlockFont::default(), RenderThreading::default())
        .unwrap();
    let b = render_frames(&s, &params(), &mut cache, &BlockFont::default(), RenderThreading::default())
        .unwrap();

    assert_eq!(cache.len(), 2);
    assert!(Arc::ptr_eq(&a[0], &b[0]));
    assert!(Arc::ptr_eq(&a[1], &b[1]));
    assert_eq!(
        cache.stats(),
        CacheStats {
            hits: 2,
            misses: 2
        }
    );
}

#[test]
fn duplicate_slides_render_once_and_share_a_frame() {
    let mut cache = FrameCache::new();
    let s = slides(&["Same", "Same", "Other", "Same"]);
    let frames =
        render_frames(&s, &params(), &mut cache, &BlockFont::default(), RenderThreading::default())
            .unwrap();
    assert_eq!(frames.len(), 4);
    assert_eq!(cache.len(), 2);
    assert!(Arc::ptr_eq(&frames[0], &frames[1]));
    assert!(Arc::ptr_eq(&frames[0], &frames[3]));
    assert!(!Arc::ptr_eq(&frames[0], &frames[2]));
}

#[test]
fn changed_slide_never_reuses_a_stale_frame() {
    let mut cache = FrameCache::new();
    let before = render_frames(
        &slides(&["Hello"]),
        &params(),
        &mut cache,
        &BlockFont::default(),
        RenderThreading::default(),
    )
    .unwrap();
    let after = render_frames(
        &slides(&["Hello -- color #00ff00"]),
        &params(),
        &mut cache,
        &BlockFont::default(),
        RenderThreading::default(),
    )
    .unwrap();
    assert_ne!(before[0].png, after[0].png);
    assert_eq!(after[0].key.color, Rgb8::new(0, 255, 0));
}

#[test]
fn parallel_rendering_matches_sequential() {
    let s = slides(&["a", "b <b>c</b>", "<i>d</i>", "a"]);
    let mut seq_cache = FrameCache::new();
    let mut par_cache = FrameCache::new();
    let seq = render_frames(
        &s,
        &params(),
        &mut seq_cache,
        &BlockFont::default(),
        RenderThreading::default(),
    )
    .unwrap();
    let par = render_frames(
        &s,
        &params(),
        &mut par_cache,
        &BlockFont::default(),
        RenderThreading {
            parallel: true,
            threads: Some(2),
        },
    )
    .unwrap();
    assert_eq!(par_cache.len(), 3);
    for (a, b) in seq.iter().zip(&par) {
        assert_eq!(a.as_ref(), b.as_ref());
    }
}

#[test]
fn zero_threads_is_rejected() {
    let mut cache = FrameCache::new();
    let err = render_frames(
        &slides(&["a", "b"]),
        &params(),
        &mut cache,
        &BlockFont::default(),
        RenderThreading {
            parallel: true,
            threads: Some(0),
        },
    )
    .unwrap_err();
    assert!(matches!(err, SlidecastError::Validation(_)));
}

#[test]
fn clear_drops_frames_but_keeps_counters() {
    let mut cache = FrameCache::new();
    render_frames(
        &slides(&["x"]),
        &params(),
        &mut cache,
        &BlockFont::default(),
        RenderThreading::default(),
    )
    .unwrap();
    assert!(!cache.is_empty());
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn insert_keeps_first_frame_for_a_key() {
    let key = FrameKey::for_slide(&parse_line("k", 0), &params());
    let mut cache = FrameCache::new();
    let first = cache.insert(Frame {
        png: vec![1],
        key: key.clone(),
    });
    let second = cache.insert(Frame {
        png: vec![2],
        key: key.clone(),
    });
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.png, vec![1]);
    assert!(cache.contains(&key));
}
