use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{SlidecastError, SlidecastResult};

pub use kurbo::{Affine, Point, Rect};

/// Absolute 0-based frame index in timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Default output frame rate.
    pub const DEFAULT: Fps = Fps { num: 30, den: 1 };

    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> SlidecastResult<Self> {
        if den == 0 {
            return Err(SlidecastError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(SlidecastError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Whole frames per second, when the rate is integral.
    pub fn as_integer(self) -> Option<u32> {
        (self.den == 1).then_some(self.num)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Length of the shorter side, which drives the base font size.
    pub fn min_side(self) -> u32 {
        self.width.min(self.height)
    }
}

/// The fixed set of supported output resolutions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    /// 1024x1024.
    Square,
    /// 1080x1920.
    Portrait,
    /// 1920x1080.
    #[default]
    Landscape,
}

impl Resolution {
    /// All supported resolutions, in menu order.
    pub const ALL: [Resolution; 3] = [Self::Square, Self::Portrait, Self::Landscape];

    /// Canvas dimensions for this resolution.
    pub fn canvas(self) -> Canvas {
        match self {
            Self::Square => Canvas {
                width: 1024,
                height: 1024,
            },
            Self::Portrait => Canvas {
                width: 1080,
                height: 1920,
            },
            Self::Landscape => Canvas {
                width: 1920,
                height: 1080,
            },
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.canvas();
        write!(f, "{}x{}", c.width, c.height)
    }
}

impl FromStr for Resolution {
    type Err = SlidecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace('×', "x");
        Self::ALL
            .into_iter()
            .find(|r| r.to_string() == norm)
            .ok_or_else(|| {
                SlidecastError::validation(format!(
                    "unsupported resolution '{s}' (expected one of 1024x1024, 1080x1920, 1920x1080)"
                ))
            })
    }
}

impl TryFrom<String> for Resolution {
    type Error = SlidecastError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

/// Straight (non-premultiplied) opaque RGB8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Opaque white, the default text color.
    pub const WHITE: Rgb8 = Rgb8::new(255, 255, 255);
    /// Opaque black, the fixed frame background.
    pub const BLACK: Rgb8 = Rgb8::new(0, 0, 0);

    /// Construct a color from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert to a fully opaque `vello_cpu` paint color.
    pub(crate) fn to_paint(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, 255)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
