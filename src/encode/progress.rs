use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Pipeline stage a progress value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStage {
    Capture,
    Transcode,
}

impl ExportStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Transcode => "transcode",
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Capture => 0,
            Self::Transcode => 1,
        }
    }
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static FFMPEG_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"time=\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("valid regex")
});

/// Parse the `time=HH:MM:SS(.ff)` field of an ffmpeg status line into seconds.
///
/// Lines without a time field, or with `time=N/A` or a negative time, yield `None`.
pub fn parse_ffmpeg_time(line: &str) -> Option<f64> {
    let caps = FFMPEG_TIME_RE.captures(line)?;
    let h: f64 = caps.get(1)?.as_str().parse().ok()?;
    let m: f64 = caps.get(2)?.as_str().parse().ok()?;
    let s: f64 = caps.get(3)?.as_str().parse().ok()?;
    Some(h * 3600.0 + m * 60.0 + s)
}

/// Percentage of `total_secs` covered by `secs`, clamped to `[0, 100]`.
pub fn percent_of(secs: f64, total_secs: f64) -> f64 {
    if !(total_secs > 0.0) || !secs.is_finite() {
        return 0.0;
    }
    (secs / total_secs * 100.0).clamp(0.0, 100.0)
}

/// Forwards progress to a callback, clamped to `[0, 100]` and strictly increasing per stage.
pub struct ProgressTracker<F> {
    sink: F,
    last: [Option<f64>; 2],
}

impl<F: FnMut(ExportStage, f64)> ProgressTracker<F> {
    pub fn new(sink: F) -> Self {
        Self {
            sink,
            last: [None; 2],
        }
    }

    /// Report `percent` for `stage`; returns `true` when the value was forwarded.
    pub fn report(&mut self, stage: ExportStage, percent: f64) -> bool {
        if percent.is_nan() {
            return false;
        }
        let p = percent.clamp(0.0, 100.0);
        let slot = &mut self.last[stage.slot()];
        if slot.is_some_and(|prev| p <= prev) {
            return false;
        }
        *slot = Some(p);
        (self.sink)(stage, p);
        true
    }

    /// Last value forwarded for `stage`.
    pub fn last(&self, stage: ExportStage) -> Option<f64> {
        self.last[stage.slot()]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/progress.rs"]
mod tests;
