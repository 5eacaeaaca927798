use std::collections::HashSet;
use std::sync::Arc;

use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::cache::Frame;

/// Timed sequence of frame handles for a whole deck.
///
/// Slide `i` occupies `duration_i × fps` consecutive handles, all pointing at the same [`Frame`].
/// The timeline is rebuilt wholesale whenever the deck changes.
#[derive(Clone, Debug)]
pub struct Timeline {
    handles: Vec<Arc<Frame>>,
    markers: Vec<f64>,
    slide_starts: Vec<usize>,
    total_duration_secs: f64,
    canvas: Canvas,
    fps: Fps,
}

/// JSON-friendly summary of a [`Timeline`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TimelineSummary {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub slides: usize,
    pub frames: usize,
    pub distinct_frames: usize,
    pub total_duration_secs: f64,
    pub markers: Vec<f64>,
    pub slide_starts: Vec<usize>,
}

impl Timeline {
    pub fn len_frames(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn slide_count(&self) -> usize {
        self.slide_starts.len()
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.total_duration_secs
    }

    /// Cumulative end time in seconds of each slide.
    pub fn markers(&self) -> &[f64] {
        &self.markers
    }

    pub fn handles(&self) -> &[Arc<Frame>] {
        &self.handles
    }

    pub fn frame(&self, idx: FrameIndex) -> Option<&Arc<Frame>> {
        usize::try_from(idx.0)
            .ok()
            .and_then(|i| self.handles.get(i))
    }

    /// First frame of slide `slide`.
    pub fn slide_start(&self, slide: usize) -> Option<FrameIndex> {
        self.slide_starts
            .get(slide)
            .map(|&s| FrameIndex(s as u64))
    }

    /// Slide shown at `idx`.
    pub fn slide_at(&self, idx: FrameIndex) -> Option<usize> {
        let i = usize::try_from(idx.0).ok()?;
        if i >= self.handles.len() {
            return None;
        }
        Some(self.slide_starts.partition_point(|&s| s <= i) - 1)
    }

    /// Frame shown at `secs` seconds; `None` outside `[0, total_duration_secs)`.
    pub fn frame_at_secs(&self, secs: f64) -> Option<FrameIndex> {
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        let idx = (secs * self.fps.as_f64()).floor() as u64;
        ((idx as usize) < self.handles.len()).then_some(FrameIndex(idx))
    }

    /// Number of distinct frames referenced by the handles.
    pub fn distinct_frames(&self) -> usize {
        self.handles
            .iter()
            .map(Arc::as_ptr)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn summary(&self) -> TimelineSummary {
        TimelineSummary {
            width: self.canvas.width,
            height: self.canvas.height,
            fps: self.fps.num,
            slides: self.slide_count(),
            frames: self.len_frames(),
            distinct_frames: self.distinct_frames(),
            total_duration_secs: self.total_duration_secs,
            markers: self.markers.clone(),
            slide_starts: self.slide_starts.clone(),
        }
    }
}

/// Upper bound on the frame handles of one timeline (four hours at 120 fps).
pub const MAX_TIMELINE_FRAMES: u64 = 4 * 3600 * 120;

/// Expand per-slide frames into a timeline.
///
/// `entries` pairs each slide's frame with its duration in whole seconds. `fps` must be an
/// integer rate so that every slide covers a whole number of frames.
#[tracing::instrument(skip(entries), fields(slides = entries.len()))]
pub fn build_timeline(
    entries: &[(Arc<Frame>, u32)],
    fps: Fps,
    canvas: Canvas,
) -> SlidecastResult<Timeline> {
    let per_sec = fps.as_integer().ok_or_else(|| {
        SlidecastError::validation(format!(
            "timeline fps must be an integer rate, got {}/{}",
            fps.num, fps.den
        ))
    })?;

    let total_frames = entries
        .iter()
        .map(|(_, d)| u64::from(*d) * u64::from(per_sec))
        .sum::<u64>();
    if total_frames > MAX_TIMELINE_FRAMES {
        return Err(SlidecastError::validation(format!(
            "timeline of {total_frames} frames exceeds the limit of {MAX_TIMELINE_FRAMES}"
        )));
    }
    let total_frames = total_frames as usize;
    let mut handles = Vec::with_capacity(total_frames);
    let mut markers = Vec::with_capacity(entries.len());
    let mut slide_starts = Vec::with_capacity(entries.len());
    let mut elapsed = 0u64;

    for (i, (frame, duration_secs)) in entries.iter().enumerate() {
        if *duration_secs == 0 {
            return Err(SlidecastError::validation(format!(
                "slide {i} has a zero duration"
            )));
        }
        slide_starts.push(handles.len());
        let count = (*duration_secs as usize) * (per_sec as usize);
        handles.extend(std::iter::repeat_n(frame, count).cloned());
        elapsed += u64::from(*duration_secs);
        markers.push(elapsed as f64);
    }

    tracing::debug!(frames = handles.len(), total_secs = elapsed, "built timeline");
    Ok(Timeline {
        handles,
        markers,
        slide_starts,
        total_duration_secs: elapsed as f64,
        canvas,
        fps,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/sequencer.rs"]
mod tests;
