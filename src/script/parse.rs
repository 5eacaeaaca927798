use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::foundation::core::Rgb8;
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::script::color::parse_color;

/// Literal token separating a slide's markup from its options.
///
/// Only counts as a separator when it stands alone: preceded by whitespace (or the start of
/// the line) and followed by whitespace (or the end of the line).
pub const OPTION_SEPARATOR: &str = "--";

/// Duration used when a slide has no valid `duration` option.
pub const DEFAULT_DURATION_SECS: u32 = 3;

/// Longest accepted `duration` option. Larger values are treated as malformed.
pub const MAX_DURATION_SECS: u32 = 3600;

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)--(?:\s|$)").expect("valid regex"));

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^duration\s+(\d+)\s*s?$").expect("valid regex"));
static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^colou?r\s+(\S+)$").expect("valid regex"));
static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^text\s*-?\s*(xs|sm|base|lg|xl)$").expect("valid regex"));
static UPPERCASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(uppercase|upper|caps)$").expect("valid regex"));

/// Relative text size of a slide.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    /// 0.5x.
    Xs,
    /// 0.75x.
    Sm,
    /// 1x.
    #[default]
    Base,
    /// 1.5x.
    Lg,
    /// 2x.
    Xl,
}

impl SizeClass {
    /// Multiplier applied to the canvas base font size.
    pub fn multiplier(self) -> f32 {
        match self {
            Self::Xs => 0.5,
            Self::Sm => 0.75,
            Self::Base => 1.0,
            Self::Lg => 1.5,
            Self::Xl => 2.0,
        }
    }

    /// Short option name (`xs`, `sm`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xs => "xs",
            Self::Sm => "sm",
            Self::Base => "base",
            Self::Lg => "lg",
            Self::Xl => "xl",
        }
    }

    fn from_token(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xs" => Some(Self::Xs),
            "sm" => Some(Self::Sm),
            "base" => Some(Self::Base),
            "lg" => Some(Self::Lg),
            "xl" => Some(Self::Xl),
            _ => None,
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed script line: markup text plus resolved display options.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Slide {
    /// Markup text with options stripped.
    pub raw_text: String,
    /// Whole seconds on screen, always >= 1.
    pub duration_secs: u32,
    /// Text fill color.
    pub color: Rgb8,
    /// Relative text size.
    pub size_class: SizeClass,
    /// Render the text upper-cased.
    pub uppercase: bool,
    /// 0-based line number in the source script.
    pub source_line: usize,
}

impl Slide {
    /// Markup text as it will be measured and drawn (upper-cased when requested).
    pub fn display_text(&self) -> Cow<'_, str> {
        if self.uppercase {
            Cow::Owned(self.raw_text.to_uppercase())
        } else {
            Cow::Borrowed(&self.raw_text)
        }
    }
}

/// Parse a whole script, one slide per non-blank line.
///
/// A script without any slide is an error; individual lines never fail.
#[tracing::instrument(skip(script), fields(bytes = script.len()))]
pub fn parse_script(script: &str) -> SlidecastResult<Vec<Slide>> {
    let slides: Vec<Slide> = script
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_line(line, i))
        .collect();
    if slides.is_empty() {
        return Err(SlidecastError::EmptyScript);
    }
    tracing::debug!(slides = slides.len(), "parsed script");
    Ok(slides)
}

/// Parse one script line. Malformed or unknown options fall back to defaults.
pub fn parse_line(line: &str, source_line: usize) -> Slide {
    let mut parts = SEPARATOR_RE.split(line);
    let raw_text = parts.next().unwrap_or_default().trim().to_string();

    let mut slide = Slide {
        raw_text,
        duration_secs: DEFAULT_DURATION_SECS,
        color: Rgb8::WHITE,
        size_class: SizeClass::Base,
        uppercase: false,
        source_line,
    };

    for opt in parts {
        let opt = opt.trim();
        if let Some(c) = DURATION_RE.captures(opt) {
            if let Some(secs) = c[1]
                .parse::<u32>()
                .ok()
                .filter(|s| (1..=MAX_DURATION_SECS).contains(s))
            {
                slide.duration_secs = secs;
            }
        } else if let Some(c) = COLOR_RE.captures(opt) {
            if let Some(color) = parse_color(&c[1]) {
                slide.color = color;
            }
        } else if let Some(c) = SIZE_RE.captures(opt) {
            if let Some(size) = SizeClass::from_token(&c[1]) {
                slide.size_class = size;
            }
        } else if UPPERCASE_RE.is_match(opt) {
            slide.uppercase = true;
        } else if !opt.is_empty() {
            tracing::debug!(line = source_line, option = opt, "ignoring unknown slide option");
        }
    }

    slide
}

#[cfg(test)]
#[path = "../../tests/unit/script/parse.rs"]
mod tests;
