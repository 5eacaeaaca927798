use anyhow::Context;
use image::ImageEncoder;

use crate::foundation::core::{Affine, Canvas, Point, Rect, Rgb8};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::layout::text::TextShaper;
use crate::layout::wrap::{LayoutLine, LayoutParams, layout_lines};
use crate::markup::runs::tokenize;
use crate::render::surface::{DrawStyle, FrameRGBA, Surface};
use crate::script::parse::Slide;

/// Fixed slide background.
pub const BACKGROUND: Rgb8 = Rgb8::BLACK;

/// Underline offset below the baseline and stroke thickness, in em.
const UNDERLINE_OFFSET_EM: f32 = 0.1;
const UNDERLINE_THICKNESS_EM: f32 = 0.06;

/// Renders slides into RGBA frames with one reusable surface.
pub struct FrameRenderer<S> {
    shaper: S,
    surface: Option<Surface>,
}

impl<S: TextShaper> FrameRenderer<S> {
    pub fn new(shaper: S) -> Self {
        Self {
            shaper,
            surface: None,
        }
    }

    pub fn shaper_mut(&mut self) -> &mut S {
        &mut self.shaper
    }

    /// Wrap and center a slide's text for `canvas` without drawing it.
    pub fn layout_slide(
        &mut self,
        slide: &Slide,
        canvas: Canvas,
    ) -> SlidecastResult<Vec<LayoutLine>> {
        let runs = tokenize(&slide.raw_text, slide.uppercase);
        let params = LayoutParams::for_canvas(canvas, slide.size_class);
        let shaper = &mut self.shaper;
        layout_lines(&runs, &params, |run| shaper.measure(run, params.font_size))
    }

    /// Render one slide: background, then every laid-out run in the slide's color.
    #[tracing::instrument(skip(self, slide), fields(line = slide.source_line))]
    pub fn render_slide(&mut self, slide: &Slide, canvas: Canvas) -> SlidecastResult<FrameRGBA> {
        let lines = self.layout_slide(slide, canvas)?;
        let font_size = LayoutParams::for_canvas(canvas, slide.size_class).font_size;

        let mut surface = match self.surface.take() {
            Some(s) if s.canvas() == canvas => s,
            _ => Surface::new(canvas)?,
        };
        surface.begin(BACKGROUND);

        let out = self.draw_lines(&mut surface, &lines, slide.color, font_size);
        let frame = out.map(|()| surface.finish());
        self.surface = Some(surface);
        frame
    }

    fn draw_lines(
        &mut self,
        surface: &mut Surface,
        lines: &[LayoutLine],
        fill: Rgb8,
        font_size: f32,
    ) -> SlidecastResult<()> {
        for line in lines {
            for (run, x, width) in line.placed_runs() {
                let style = DrawStyle::for_run(run, fill, font_size);
                let origin = Point::new(f64::from(x), f64::from(line.y_offset));
                let drawn = self.shaper.draw(surface, run, origin, &style)?;

                if style.underline {
                    let top = drawn.baseline_y + font_size * UNDERLINE_OFFSET_EM;
                    let thickness = (font_size * UNDERLINE_THICKNESS_EM).max(1.0);
                    let stroke = Rect::new(
                        f64::from(x),
                        f64::from(top),
                        f64::from(x + width),
                        f64::from(top + thickness),
                    );
                    surface.fill_rect(stroke, Affine::IDENTITY, style.fill);
                }
            }
        }
        Ok(())
    }
}

/// Encode a frame as PNG.
pub fn encode_png(frame: &FrameRGBA) -> SlidecastResult<Vec<u8>> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            &frame.data,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgba8,
        )
        .context("encode png")?;
    Ok(buf)
}

/// Decode PNG bytes into RGBA8 pixels.
pub fn decode_png(bytes: &[u8]) -> SlidecastResult<FrameRGBA> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| SlidecastError::image_decode(format!("decode png: {e}")))?
        .into_rgba8();
    let (width, height) = img.dimensions();
    Ok(FrameRGBA {
        width,
        height,
        data: img.into_raw(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
