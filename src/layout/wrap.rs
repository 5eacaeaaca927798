use crate::foundation::core::Canvas;
use crate::foundation::error::SlidecastResult;
use crate::markup::runs::StyledRun;
use crate::script::parse::SizeClass;

/// Fraction of the canvas' shorter side used as the `base` font size.
pub const BASE_FONT_FRACTION: f32 = 0.05;
/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;
/// Usable line width as a fraction of the canvas width.
pub const MAX_WIDTH_FRACTION: f32 = 0.8;

/// Geometry inputs for [`layout_lines`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
    /// Font size in pixels the runs are measured at.
    pub font_size: f32,
    /// Maximum line width in pixels.
    pub max_width: f32,
    /// Vertical distance between consecutive line centers.
    pub line_height: f32,
    /// Horizontal center of every line.
    pub center_x: f32,
    /// Vertical center of the whole line block.
    pub center_y: f32,
}

impl LayoutParams {
    /// Derive layout parameters for a canvas and size class.
    pub fn for_canvas(canvas: Canvas, size_class: SizeClass) -> Self {
        let font_size = canvas.min_side() as f32 * BASE_FONT_FRACTION * size_class.multiplier();
        Self {
            font_size,
            max_width: canvas.width as f32 * MAX_WIDTH_FRACTION,
            line_height: font_size * LINE_HEIGHT_FACTOR,
            center_x: canvas.width as f32 / 2.0,
            center_y: canvas.height as f32 / 2.0,
        }
    }
}

/// One wrapped, horizontally centered line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutLine {
    /// Runs in reading order; leading and trailing whitespace removed.
    pub runs: Vec<StyledRun>,
    /// Measured width of each entry in `runs`.
    pub widths: Vec<f32>,
    /// Sum of `widths`.
    pub total_width: f32,
    /// Left edge of the line.
    pub x_start: f32,
    /// Vertical center of the line.
    pub y_offset: f32,
}

impl LayoutLine {
    /// Iterate `(run, left_x, width)` in reading order.
    pub fn placed_runs(&self) -> impl Iterator<Item = (&StyledRun, f32, f32)> + '_ {
        let mut x = self.x_start;
        self.runs.iter().zip(&self.widths).map(move |(run, &w)| {
            let at = x;
            x += w;
            (run, at, w)
        })
    }
}

/// Greedy word wrap of `runs` into centered lines.
///
/// `measure` returns the advance width of a run at `params.font_size`. A run that alone exceeds
/// `max_width` is placed on its own line and never split.
pub fn layout_lines<F>(
    runs: &[StyledRun],
    params: &LayoutParams,
    mut measure: F,
) -> SlidecastResult<Vec<LayoutLine>>
where
    F: FnMut(&StyledRun) -> SlidecastResult<f32>,
{
    let mut lines = Vec::<LayoutLine>::new();
    let mut cur = LayoutLine::default();

    for run in runs {
        if run.is_line_break {
            close_line(&mut lines, &mut cur, params);
            continue;
        }
        if run.text.is_empty() || (run.is_whitespace() && cur.runs.is_empty()) {
            continue;
        }

        let w = measure(run)?;
        if !cur.runs.is_empty() && cur.total_width + w > params.max_width {
            close_line(&mut lines, &mut cur, params);
            if run.is_whitespace() {
                continue;
            }
        }
        cur.runs.push(run.clone());
        cur.widths.push(w);
        cur.total_width += w;
    }
    if !cur.runs.is_empty() {
        close_line(&mut lines, &mut cur, params);
    }

    if lines.len() > 1 {
        let shift = (lines.len() - 1) as f32 * params.line_height / 2.0;
        for line in &mut lines {
            line.y_offset -= shift;
        }
    }
    Ok(lines)
}

fn close_line(lines: &mut Vec<LayoutLine>, cur: &mut LayoutLine, params: &LayoutParams) {
    let mut line = std::mem::take(cur);
    while line.runs.last().is_some_and(StyledRun::is_whitespace) {
        line.runs.pop();
        if let Some(w) = line.widths.pop() {
            line.total_width -= w;
        }
    }
    line.total_width = line.total_width.max(0.0);
    line.x_start = params.center_x - line.total_width / 2.0;
    line.y_offset = params.center_y + lines.len() as f32 * params.line_height;
    lines.push(line);
}

#[cfg(test)]
#[path = "../../tests/unit/layout/wrap.rs"]
mod tests;
