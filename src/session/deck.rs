use std::sync::Arc;

use crate::foundation::core::{Canvas, Fps, FrameIndex, Resolution};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::layout::text::ShaperFactory;
use crate::render::cache::{
    CacheStats, Frame, FrameCache, RenderParams, RenderThreading, render_frames,
};
use crate::script::parse::{Slide, parse_script};
use crate::timeline::sequencer::{Timeline, build_timeline};

/// Deck-wide settings that every frame depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeckSettings {
    pub resolution: Resolution,
    pub fps: Fps,
    pub threading: RenderThreading,
}

impl Default for DeckSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            fps: Fps::DEFAULT,
            threading: RenderThreading::default(),
        }
    }
}

/// Editable deck: script, resolution and font, plus the frame cache they feed.
///
/// Any change rebuilds the [`Timeline`] from scratch on the next [`DeckSession::timeline`] call;
/// frames whose full key is unchanged come from the cache.
pub struct DeckSession<F> {
    script: String,
    slides: Vec<Slide>,
    settings: DeckSettings,
    font: F,
    cache: FrameCache,
}

impl<F: ShaperFactory> DeckSession<F> {
    pub fn new(script: &str, settings: DeckSettings, font: F) -> SlidecastResult<Self> {
        let mut deck = Self {
            script: String::new(),
            slides: Vec::new(),
            settings,
            font,
            cache: FrameCache::new(),
        };
        deck.set_script(script)?;
        Ok(deck)
    }

    /// Replace the script. A script with no slides is accepted here; exporting it fails.
    pub fn set_script(&mut self, script: &str) -> SlidecastResult<()> {
        self.slides = match parse_script(script) {
            Ok(slides) => slides,
            Err(SlidecastError::EmptyScript) => Vec::new(),
            Err(e) => return Err(e),
        };
        self.script = script.to_string();
        Ok(())
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.settings.resolution = resolution;
    }

    /// Swap the font. Returns `true` when the font class changed and the cache was cleared.
    pub fn set_font(&mut self, font: F) -> bool {
        let changed = font.identity().class != self.font.identity().class;
        self.font = font;
        if changed {
            tracing::info!(
                family = %self.font.identity().family,
                class = %self.font.identity().class,
                "font changed; clearing frame cache"
            );
            self.cache.clear();
        }
        changed
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn settings(&self) -> DeckSettings {
        self.settings
    }

    pub fn font(&self) -> &F {
        &self.font
    }

    pub fn canvas(&self) -> Canvas {
        self.settings.resolution.canvas()
    }

    pub fn render_params(&self) -> RenderParams {
        RenderParams {
            canvas: self.canvas(),
            font: self.font.identity().clone(),
        }
    }

    /// Render (or fetch) every slide and sequence the result.
    pub fn timeline(&mut self) -> SlidecastResult<Timeline> {
        let params = self.render_params();
        let frames = render_frames(
            &self.slides,
            &params,
            &mut self.cache,
            &self.font,
            self.settings.threading,
        )?;
        let entries: Vec<(Arc<Frame>, u32)> = frames
            .into_iter()
            .zip(&self.slides)
            .map(|(f, s)| (f, s.duration_secs))
            .collect();
        build_timeline(&entries, self.settings.fps, params.canvas)
    }

    /// Render (or fetch) the frame of slide `index`.
    pub fn render_slide(&mut self, index: usize) -> SlidecastResult<Arc<Frame>> {
        let slide = self.slides.get(index).ok_or_else(|| {
            SlidecastError::validation(format!(
                "slide {index} out of range (deck has {} slides)",
                self.slides.len()
            ))
        })?;
        let params = self.render_params();
        let mut frames = render_frames(
            std::slice::from_ref(slide),
            &params,
            &mut self.cache,
            &self.font,
            RenderThreading::default(),
        )?;
        frames
            .pop()
            .ok_or_else(|| SlidecastError::validation("slide produced no frame"))
    }

    /// PNG bytes of slide `index`.
    pub fn render_slide_png(&mut self, index: usize) -> SlidecastResult<Vec<u8>> {
        Ok(self.render_slide(index)?.png.clone())
    }

    /// First frame of the slide at (or last slide before) script line `line`.
    ///
    /// Blank lines map to the preceding slide; lines before the first slide map to frame 0.
    /// `None` when the deck is empty or the frame rate is fractional.
    pub fn seek_to_line(&self, line: usize) -> Option<FrameIndex> {
        if self.slides.is_empty() {
            return None;
        }
        let per_sec = u64::from(self.settings.fps.as_integer()?);
        let upto = self.slides.partition_point(|s| s.source_line <= line);
        let slide = upto.saturating_sub(1);
        let secs: u64 = self.slides[..slide]
            .iter()
            .map(|s| u64::from(s.duration_secs))
            .sum();
        Some(FrameIndex(secs * per_sec))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cached_frames(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/deck.rs"]
mod tests;
