use super::*;
use crate::foundation::core::{Canvas, Rgb8};

const DEJAVU_DIR: &str = "/usr/share/fonts/truetype/dejavu";

fn dejavu(name: &str) -> Option<FaceData> {
    std::fs::read(format!("{DEJAVU_DIR}/{name}"))
        .ok()
        .map(FaceData::new)
}

fn run(text: &str, bold: bool, italic: bool) -> StyledRun {
    StyledRun {
        text: text.into(),
        bold,
        italic,
        ..StyledRun::default()
    }
}

fn lit_pixels(frame: &crate::render::surface::FrameRGBA) -> usize {
    frame
        .data
        .chunks_exact(4)
        .filter(|p| p[0] > 0 || p[1] > 0 || p[2] > 0)
        .count()
}

#[test]
fn block_shaper_measures_per_char() {
    let mut s = BlockShaper;
    assert_eq!(s.measure(&run("abcd", false, false), 10.0).unwrap(), 24.0);
    assert!((s.measure(&run("abcd", true, false), 10.0).unwrap() - 26.4).abs() < 1e-4);
    assert_eq!(s.measure(&run(" ", false, false), 10.0).unwrap(), 6.0);
}

#[test]
fn block_shaper_draws_blocks_in_fill_color() {
    let mut surface = Surface::new(Canvas {
        width: 64,
        height: 32,
    })
    .unwrap();
    surface.begin(Rgb8::BLACK);
    let style = DrawStyle {
        fill: Rgb8::new(0, 255, 0),
        font_size: 20.0,
        bold: false,
        italic: false,
        underline: false,
    };
    let drawn = BlockShaper
        .draw(&mut surface, &run("a b", false, false), Point::new(2.0, 16.0), &style)
        .unwrap();
    assert_eq!(drawn.advance, 36.0);
    assert_eq!(drawn.baseline_y, 23.0);

    let frame = surface.finish();
    assert_eq!(frame.pixel(6, 15), Some([0, 255, 0, 255]));
    // The space column stays empty.
    assert_eq!(frame.pixel(20, 15), Some([0, 0, 0, 255]));
}

#[test]
fn block_font_identity_is_stable() {
    let f = BlockFont::new("Preview");
    assert_eq!(f.identity().family, "Preview");
    assert_eq!(f.identity().class, "Preview-blocks");
    assert!(f.make_shaper().is_ok());
}

#[test]
fn parley_shaper_rejects_garbage_font_bytes() {
    let faces = FontFaces::regular_only(vec![0u8; 64]);
    assert!(matches!(ParleyShaper::new(&faces), Err(SlidecastError::Font(_))));
}

#[test]
fn parley_shaper_measures_and_draws_real_text() {
    let Some(regular) = dejavu("DejaVuSans.ttf") else {
        return;
    };
    let faces = FontFaces {
        regular,
        bold: dejavu("DejaVuSans-Bold.ttf"),
        italic: dejavu("DejaVuSans-Oblique.ttf"),
        bold_italic: dejavu("DejaVuSans-BoldOblique.ttf"),
    };
    let mut shaper = ParleyShaper::new(&faces).unwrap();

    let w = shaper.measure(&run("Hello", false, false), 32.0).unwrap();
    let w2 = shaper.measure(&run("Hello", false, false), 64.0).unwrap();
    assert!(w > 0.0);
    assert!((w2 / w - 2.0).abs() < 0.05);
    assert!(shaper.measure(&run(" ", false, false), 32.0).unwrap() > 0.0);

    let mut surface = Surface::new(Canvas {
        width: 200,
        height: 80,
    })
    .unwrap();
    surface.begin(Rgb8::BLACK);
    let style = DrawStyle {
        fill: Rgb8::WHITE,
        font_size: 32.0,
        bold: false,
        italic: false,
        underline: false,
    };
    let drawn = shaper
        .draw(&mut surface, &run("Hello", false, false), Point::new(10.0, 40.0), &style)
        .unwrap();
    assert!((drawn.advance - w).abs() < 1e-3);
    assert!(drawn.baseline_y > 40.0 && drawn.baseline_y < 60.0);
    assert!(lit_pixels(&surface.finish()) > 50);
}

#[test]
fn parley_shaper_synthesizes_missing_bold() {
    let Some(regular) = dejavu("DejaVuSans.ttf") else {
        return;
    };
    let mut shaper = ParleyShaper::new(&FontFaces {
        regular,
        bold: None,
        italic: None,
        bold_italic: None,
    })
    .unwrap();
    let plain = shaper.measure(&run("Hi", false, false), 24.0).unwrap();
    let bold = shaper.measure(&run("Hi", true, false), 24.0).unwrap();
    let italic = shaper.measure(&run("Hi", false, true), 24.0).unwrap();
    assert!((bold - plain - faux_bold_offset(24.0)).abs() < 1e-3);
    assert_eq!(italic, plain);
}

#[test]
fn parley_shaper_rejects_non_positive_sizes() {
    let Some(regular) = dejavu("DejaVuSans.ttf") else {
        return;
    };
    let mut shaper =
        ParleyShaper::new(&FontFaces::regular_only(regular.bytes.as_ref().clone())).unwrap();
    assert!(matches!(
        shaper.measure(&run("x", false, false), 0.0),
        Err(SlidecastError::Validation(_))
    ));
}
