use crate::foundation::core::{Affine, Canvas, Rect, Rgb8};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::markup::runs::StyledRun;

/// A rendered frame as tightly packed, row-major RGBA8 pixels.
///
/// Slides are drawn over an opaque background, so every pixel has alpha 255 and premultiplied
/// and straight alpha coincide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// RGBA of the pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data.get(i..i + 4).and_then(|p| p.try_into().ok())
    }
}

/// Style for one draw call.
///
/// Every fill receives its style explicitly; the surface keeps no paint or font state between
/// calls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawStyle {
    pub fill: Rgb8,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl DrawStyle {
    pub fn for_run(run: &StyledRun, fill: Rgb8, font_size: f32) -> Self {
        Self {
            fill,
            font_size,
            bold: run.bold,
            italic: run.italic,
            underline: run.underline,
        }
    }
}

/// A CPU raster target of fixed size.
pub struct Surface {
    canvas: Canvas,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl Surface {
    /// Allocate a surface; fails when the canvas is empty or exceeds the rasterizer's limits.
    pub fn new(canvas: Canvas) -> SlidecastResult<Self> {
        let (w, h) = surface_dims(canvas)?;
        Ok(Self {
            canvas,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Start a new frame filled with `background`.
    pub fn begin(&mut self, background: Rgb8) {
        self.ctx.reset();
        let full = Rect::new(
            0.0,
            0.0,
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        );
        self.fill_rect(full, Affine::IDENTITY, background);
    }

    pub fn fill_rect(&mut self, rect: Rect, transform: Affine, fill: Rgb8) {
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(fill.to_paint());
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            rect.x0, rect.y0, rect.x1, rect.y1,
        ));
    }

    /// Fill positioned glyphs of `font`; glyph coordinates are in the space of `transform`.
    pub fn fill_glyphs(
        &mut self,
        font: &vello_cpu::peniko::FontData,
        font_size: f32,
        transform: Affine,
        fill: Rgb8,
        glyphs: impl Iterator<Item = vello_cpu::Glyph>,
    ) {
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(fill.to_paint());
        self.ctx.glyph_run(font).font_size(font_size).fill_glyphs(glyphs);
    }

    /// Rasterize everything drawn since [`Surface::begin`].
    pub fn finish(&mut self) -> FrameRGBA {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
        }
    }
}

fn surface_dims(canvas: Canvas) -> SlidecastResult<(u16, u16)> {
    if canvas.width == 0 || canvas.height == 0 {
        return Err(SlidecastError::surface(format!(
            "canvas must be non-empty, got {}x{}",
            canvas.width, canvas.height
        )));
    }
    let w = u16::try_from(canvas.width)
        .map_err(|_| SlidecastError::surface("canvas width exceeds u16::MAX"))?;
    let h = u16::try_from(canvas.height)
        .map_err(|_| SlidecastError::surface("canvas height exceeds u16::MAX"))?;
    Ok((w, h))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
