use std::borrow::Cow;

use crate::assets::fonts::{FaceData, FontFaces, FontIdentity, LoadedFont};
use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::markup::runs::StyledRun;
use crate::render::surface::{DrawStyle, Surface};

/// Horizontal shear applied for synthesized italics.
const FAUX_ITALIC_SKEW: f64 = -0.2;

/// Where a run landed after drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawnRun {
    /// Baseline y in canvas space.
    pub baseline_y: f32,
    /// Horizontal advance of the run.
    pub advance: f32,
}

/// Font-dependent measurement and drawing of single styled runs.
pub trait TextShaper {
    /// Advance width of `run` at `font_size`.
    fn measure(&mut self, run: &StyledRun, font_size: f32) -> SlidecastResult<f32>;

    /// Draw `run` with its left edge at `origin.x`, vertically centered on `origin.y`.
    fn draw(
        &mut self,
        surface: &mut Surface,
        run: &StyledRun,
        origin: Point,
        style: &DrawStyle,
    ) -> SlidecastResult<DrawnRun>;
}

/// Builds shapers for render workers; each worker owns one shaper.
pub trait ShaperFactory: Send + Sync {
    type Shaper: TextShaper;

    /// Family and font class that frames rendered by this factory's shapers depend on.
    fn identity(&self) -> &FontIdentity;

    fn make_shaper(&self) -> SlidecastResult<Self::Shaper>;
}

impl ShaperFactory for LoadedFont {
    type Shaper = ParleyShaper;

    fn identity(&self) -> &FontIdentity {
        &self.identity
    }

    fn make_shaper(&self) -> SlidecastResult<ParleyShaper> {
        ParleyShaper::new(&self.faces)
    }
}

struct Face {
    font_ctx: parley::FontContext,
    family: String,
    data: vello_cpu::peniko::FontData,
}

impl Face {
    fn new(face: &FaceData) -> SlidecastResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(face.bytes.as_ref().clone()), None);
        // In a collection, the family that owns the requested face index.
        let family_id = families
            .iter()
            .find(|(_, fonts)| fonts.iter().any(|f| f.index() == face.index))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| SlidecastError::font("no font families registered from font bytes"))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| SlidecastError::font("registered font family has no name"))?
            .to_string();

        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(face.bytes.as_ref().clone()),
            face.index,
        );
        Ok(Self {
            font_ctx,
            family,
            data,
        })
    }
}

#[derive(Clone, Copy, Default)]
struct Synth {
    bold: bool,
    italic: bool,
}

struct FaceSet {
    regular: Face,
    bold: Option<Face>,
    italic: Option<Face>,
    bold_italic: Option<Face>,
}

impl FaceSet {
    // Closest real face for the requested style, plus what still has to be synthesized.
    fn pick(&mut self, bold: bool, italic: bool) -> (&mut Face, Synth) {
        match (bold, italic) {
            (false, false) => (&mut self.regular, Synth::default()),
            (true, false) => match self.bold.as_mut() {
                Some(f) => (f, Synth::default()),
                None => (
                    &mut self.regular,
                    Synth {
                        bold: true,
                        italic: false,
                    },
                ),
            },
            (false, true) => match self.italic.as_mut() {
                Some(f) => (f, Synth::default()),
                None => (
                    &mut self.regular,
                    Synth {
                        bold: false,
                        italic: true,
                    },
                ),
            },
            (true, true) => {
                if let Some(f) = self.bold_italic.as_mut() {
                    (f, Synth::default())
                } else if let Some(f) = self.bold.as_mut() {
                    (
                        f,
                        Synth {
                            bold: false,
                            italic: true,
                        },
                    )
                } else if let Some(f) = self.italic.as_mut() {
                    (
                        f,
                        Synth {
                            bold: true,
                            italic: false,
                        },
                    )
                } else {
                    (
                        &mut self.regular,
                        Synth {
                            bold: true,
                            italic: true,
                        },
                    )
                }
            }
        }
    }
}

/// [`TextShaper`] backed by parley shaping and vello_cpu glyph rasterization.
///
/// Each face is registered in its own `FontContext`, so glyph lookup for a bold run can never
/// resolve to the regular face (or the other way around).
pub struct ParleyShaper {
    layout_ctx: parley::LayoutContext<()>,
    faces: FaceSet,
}

impl ParleyShaper {
    pub fn new(faces: &FontFaces) -> SlidecastResult<Self> {
        let opt = |f: &Option<FaceData>| f.as_ref().map(Face::new).transpose();
        Ok(Self {
            layout_ctx: parley::LayoutContext::new(),
            faces: FaceSet {
                regular: Face::new(&faces.regular)?,
                bold: opt(&faces.bold)?,
                italic: opt(&faces.italic)?,
                bold_italic: opt(&faces.bold_italic)?,
            },
        })
    }

    fn shape(
        layout_ctx: &mut parley::LayoutContext<()>,
        face: &mut Face,
        text: &str,
        font_size: f32,
    ) -> SlidecastResult<parley::Layout<()>> {
        if !font_size.is_finite() || font_size <= 0.0 {
            return Err(SlidecastError::validation(
                "font_size must be finite and > 0",
            ));
        }
        let mut builder = layout_ctx.ranged_builder(&mut face.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(face.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font_size));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

fn faux_bold_offset(font_size: f32) -> f32 {
    (font_size / 24.0).max(1.0)
}

impl TextShaper for ParleyShaper {
    fn measure(&mut self, run: &StyledRun, font_size: f32) -> SlidecastResult<f32> {
        let (face, synth) = self.faces.pick(run.bold, run.italic);
        let layout = Self::shape(&mut self.layout_ctx, face, &run.text, font_size)?;
        let advance = layout
            .lines()
            .map(|l| l.metrics().advance)
            .fold(0.0f32, f32::max);
        Ok(if synth.bold && !run.is_whitespace() {
            advance + faux_bold_offset(font_size)
        } else {
            advance
        })
    }

    fn draw(
        &mut self,
        surface: &mut Surface,
        run: &StyledRun,
        origin: Point,
        style: &DrawStyle,
    ) -> SlidecastResult<DrawnRun> {
        let (face, synth) = self.faces.pick(style.bold, style.italic);
        let layout = Self::shape(&mut self.layout_ctx, face, &run.text, style.font_size)?;

        let Some(line) = layout.lines().next() else {
            return Ok(DrawnRun {
                baseline_y: origin.y as f32,
                advance: 0.0,
            });
        };
        let m = line.metrics();
        let baseline_y = origin.y as f32 - m.line_height / 2.0 + m.baseline;

        // Glyphs are placed relative to the baseline so the italic shear pivots on it.
        let mut transform = Affine::translate((origin.x, f64::from(baseline_y)));
        if synth.italic {
            transform *= Affine::skew(FAUX_ITALIC_SKEW, 0.0);
        }
        let passes: &[f32] = if synth.bold {
            &[0.0, faux_bold_offset(style.font_size)]
        } else {
            &[0.0]
        };

        for &dx in passes {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let font_size = glyph_run.run().font_size();
                let glyphs = glyph_run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x + dx,
                    y: g.y - m.baseline,
                });
                surface.fill_glyphs(&face.data, font_size, transform, style.fill, glyphs);
            }
        }

        let advance = m.advance
            + if synth.bold {
                faux_bold_offset(style.font_size)
            } else {
                0.0
            };
        Ok(DrawnRun {
            baseline_y,
            advance,
        })
    }
}

/// Font-free shaper that draws every non-space character as a solid block.
///
/// Each character advances `0.6 em` (`0.66 em` when bold). Useful for previews without installed
/// fonts and for deterministic layout tests.
#[derive(Clone, Debug, Default)]
pub struct BlockShaper;

impl BlockShaper {
    pub const ADVANCE_EM: f32 = 0.6;
    pub const BOLD_ADVANCE_EM: f32 = 0.66;

    fn char_advance(bold: bool, font_size: f32) -> f32 {
        font_size
            * if bold {
                Self::BOLD_ADVANCE_EM
            } else {
                Self::ADVANCE_EM
            }
    }
}

impl TextShaper for BlockShaper {
    fn measure(&mut self, run: &StyledRun, font_size: f32) -> SlidecastResult<f32> {
        Ok(run.text.chars().count() as f32 * Self::char_advance(run.bold, font_size))
    }

    fn draw(
        &mut self,
        surface: &mut Surface,
        run: &StyledRun,
        origin: Point,
        style: &DrawStyle,
    ) -> SlidecastResult<DrawnRun> {
        let fs = f64::from(style.font_size);
        let step = f64::from(Self::char_advance(style.bold, style.font_size));
        let baseline_y = origin.y + fs * 0.35;

        let mut transform = Affine::translate((origin.x, baseline_y));
        if style.italic {
            transform *= Affine::skew(FAUX_ITALIC_SKEW, 0.0);
        }
        let mut x = 0.0;
        for c in run.text.chars() {
            if !c.is_whitespace() {
                let block = Rect::new(x + step * 0.1, -fs * 0.7, x + step * 0.9, 0.0);
                surface.fill_rect(block, transform, style.fill);
            }
            x += step;
        }
        Ok(DrawnRun {
            baseline_y: baseline_y as f32,
            advance: x as f32,
        })
    }
}

/// [`ShaperFactory`] for [`BlockShaper`].
#[derive(Clone, Debug)]
pub struct BlockFont {
    identity: FontIdentity,
}

impl BlockFont {
    pub fn new(family: impl Into<String>) -> Self {
        let family = family.into();
        Self {
            identity: FontIdentity {
                class: format!("{family}-blocks"),
                family,
            },
        }
    }
}

impl Default for BlockFont {
    fn default() -> Self {
        Self::new("blocks")
    }
}

impl ShaperFactory for BlockFont {
    type Shaper = BlockShaper;

    fn identity(&self) -> &FontIdentity {
        &self.identity
    }

    fn make_shaper(&self) -> SlidecastResult<BlockShaper> {
        Ok(BlockShaper)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/text.rs"]
mod tests;
