use crate::markup::parser::{Node, parse_markup};

/// A maximal span of text sharing one bold/italic/underline combination.
///
/// Runs are split at whitespace boundaries: every word and every (collapsed) space is its own run,
/// so the layout engine can measure and wrap them independently.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StyledRun {
    /// Run text; empty for line breaks.
    pub text: String,
    /// Bold face.
    pub bold: bool,
    /// Italic face.
    pub italic: bool,
    /// Draw an underline stroke.
    pub underline: bool,
    /// Explicit `<br>`.
    pub is_line_break: bool,
}

impl StyledRun {
    /// A styled word or space.
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
            is_line_break: false,
        }
    }

    /// An explicit line break.
    pub fn line_break() -> Self {
        Self {
            is_line_break: true,
            ..Self::default()
        }
    }

    /// Style flags of this run.
    pub fn style(&self) -> RunStyle {
        RunStyle {
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }

    /// `true` for a whitespace-only run (never for line breaks).
    pub fn is_whitespace(&self) -> bool {
        !self.is_line_break && !self.text.is_empty() && self.text.chars().all(char::is_whitespace)
    }
}

/// Inherited style flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RunStyle {
    /// Bold face.
    pub bold: bool,
    /// Italic face.
    pub italic: bool,
    /// Underline stroke.
    pub underline: bool,
}

/// Tokenize slide markup into styled runs in reading order.
///
/// With `uppercase` set, decoded text (entities included) is upper-cased before it is split into
/// runs, so every later measurement sees the final rendered glyphs.
pub fn tokenize(markup: &str, uppercase: bool) -> Vec<StyledRun> {
    let nodes = parse_markup(markup);

    let mut b = RunBuilder {
        uppercase,
        ..RunBuilder::default()
    };
    b.walk(&nodes, RunStyle::default());
    b.finish()
}

#[derive(Default)]
struct RunBuilder {
    out: Vec<StyledRun>,
    pending: String,
    pending_style: RunStyle,
    uppercase: bool,
}

impl RunBuilder {
    fn walk(&mut self, nodes: &[Node], style: RunStyle) {
        for node in nodes {
            match node {
                Node::Text(s) => self.text(s, style),
                Node::Bold(children) => self.walk(children, RunStyle { bold: true, ..style }),
                Node::Italic(children) => self.walk(
                    children,
                    RunStyle {
                        italic: true,
                        ..style
                    },
                ),
                Node::Underline(children) => self.walk(
                    children,
                    RunStyle {
                        underline: true,
                        ..style
                    },
                ),
                Node::Break => {
                    self.flush();
                    self.out.push(StyledRun::line_break());
                }
            }
        }
    }

    fn text(&mut self, s: &str, style: RunStyle) {
        if s.is_empty() {
            return;
        }
        if style != self.pending_style {
            self.flush();
            self.pending_style = style;
        }
        if self.uppercase {
            self.pending.push_str(&s.to_uppercase());
        } else {
            self.pending.push_str(s);
        }
    }

    // Emit the pending maximal run as alternating word / single-space runs.
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        let style = self.pending_style;

        let mut word = String::new();
        for c in pending.chars() {
            // Non-breaking spaces stay inside words.
            if c.is_whitespace() && c != '\u{a0}' {
                if !word.is_empty() {
                    self.out.push(StyledRun::new(std::mem::take(&mut word), style));
                }
                self.push_space(style);
            } else {
                word.push(c);
            }
        }
        if !word.is_empty() {
            self.out.push(StyledRun::new(word, style));
        }
    }

    fn push_space(&mut self, style: RunStyle) {
        if self.out.last().is_some_and(StyledRun::is_whitespace) {
            return;
        }
        self.out.push(StyledRun::new(" ", style));
    }

    fn finish(mut self) -> Vec<StyledRun> {
        self.flush();
        self.out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/markup/runs.rs"]
mod tests;
