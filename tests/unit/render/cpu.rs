use super::*;
use crate::layout::text::BlockShaper;
use crate::script::parse::parse_line;

const CANVAS: Canvas = Canvas {
    width: 320,
    height: 180,
};

fn lit(frame: &FrameRGBA) -> usize {
    frame.data.chunks_exact(4).filter(|p| p[..3] != [0, 0, 0]).count()
}

fn count_color(frame: &FrameRGBA, rgb: [u8; 3]) -> usize {
    frame
        .data
        .chunks_exact(4)
        .filter(|p| p[..3] == rgb)
        .count()
}

#[test]
fn empty_text_renders_background_only() {
    let mut r = FrameRenderer::new(BlockShaper);
    let frame = r.render_slide(&parse_line("<b></b>", 0), CANVAS).unwrap();
    assert_eq!(frame.data.len(), 320 * 180 * 4);
    assert_eq!(count_color(&frame, [0, 0, 0]), 320 * 180);
}

#[test]
fn text_is_drawn_in_slide_color_around_center() {
    let mut r = FrameRenderer::new(BlockShaper);
    let frame = r
        .render_slide(&parse_line("HI -- color #ff0000", 0), CANVAS)
        .unwrap();
    assert!(count_color(&frame, [255, 0, 0]) > 0);
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(frame.pixel(157, 89), Some([255, 0, 0, 255]));
}

#[test]
fn underline_adds_a_stroke_below_the_baseline() {
    let mut r = FrameRenderer::new(BlockShaper);
    let plain = r.render_slide(&parse_line("ab", 0), CANVAS).unwrap();
    let underlined = r.render_slide(&parse_line("<u>ab</u>", 0), CANVAS).unwrap();
    assert!(lit(&underlined) > lit(&plain));

    // Font size 9: baseline at 93.15, stroke covers y 94.05..95.05.
    assert!(underlined.pixel(160, 94).is_some_and(|p| p[0] > 128));
    assert_eq!(plain.pixel(160, 94), Some([0, 0, 0, 255]));
}

#[test]
fn layout_slide_applies_size_class_and_uppercase() {
    let mut r = FrameRenderer::new(BlockShaper);
    let lines = r
        .layout_slide(&parse_line("ab -- textxl -- uppercase", 0), CANVAS)
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].runs[0].text, "AB");
    // 180 * 0.05 * 2 = 18px, 0.6em per char.
    assert!((lines[0].total_width - 21.6).abs() < 1e-3);
}

#[test]
fn renderer_reuses_surface_across_canvases() {
    let mut r = FrameRenderer::new(BlockShaper);
    let slide = parse_line("x", 0);
    let a = r.render_slide(&slide, CANVAS).unwrap();
    let b = r
        .render_slide(
            &slide,
            Canvas {
                width: 64,
                height: 64,
            },
        )
        .unwrap();
    let c = r.render_slide(&slide, CANVAS).unwrap();
    assert_eq!((b.width, b.height), (64, 64));
    assert_eq!(a, c);
}

#[test]
fn png_round_trip_preserves_pixels() {
    let mut r = FrameRenderer::new(BlockShaper);
    let frame = r.render_slide(&parse_line("<i>Hi</i>", 0), CANVAS).unwrap();
    let png = encode_png(&frame).unwrap();
    assert_eq!(&png[..4], b"\x89PNG");
    assert_eq!(decode_png(&png).unwrap(), frame);
}

#[test]
fn decode_png_rejects_non_png_bytes() {
    let err = decode_png(b"definitely not a png").unwrap_err();
    assert!(matches!(err, SlidecastError::ImageDecode(_)));
}
