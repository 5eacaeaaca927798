use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::fonts::FontIdentity;
use crate::foundation::core::{Canvas, Rgb8};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::layout::text::{ShaperFactory, TextShaper};
use crate::render::cpu::{FrameRenderer, encode_png};
use crate::render::fingerprint::{FrameFingerprint, fingerprint_key};
use crate::script::parse::{SizeClass, Slide};

/// Everything besides the slide that a rendered frame depends on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderParams {
    pub canvas: Canvas,
    pub font: FontIdentity,
}

/// Full cache key of one rendered still.
///
/// Two slides share a frame only when every field matches.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct FrameKey {
    /// Slide text after upper-casing.
    pub text: String,
    pub duration_secs: u32,
    pub color: Rgb8,
    pub size_class: SizeClass,
    pub uppercase: bool,
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub font_class: String,
}

impl FrameKey {
    pub fn for_slide(slide: &Slide, params: &RenderParams) -> Self {
        Self {
            text: slide.display_text().into_owned(),
            duration_secs: slide.duration_secs,
            color: slide.color,
            size_class: slide.size_class,
            uppercase: slide.uppercase,
            width: params.canvas.width,
            height: params.canvas.height,
            font_family: params.font.family.clone(),
            font_class: params.font.class.clone(),
        }
    }

    pub fn fingerprint(&self) -> FrameFingerprint {
        fingerprint_key(self)
    }
}

/// An immutable rendered still.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// PNG-encoded pixels.
    pub png: Vec<u8>,
    pub key: FrameKey,
}

/// Cache hit/miss counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memo table from [`FrameKey`] to rendered [`Frame`]s.
///
/// Entries are never evicted; [`FrameCache::clear`] is the only invalidation.
#[derive(Debug, Default)]
pub struct FrameCache {
    frames: HashMap<FrameKey, Arc<Frame>>,
    stats: CacheStats,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a frame, counting the hit or miss.
    pub fn get(&mut self, key: &FrameKey) -> Option<Arc<Frame>> {
        let found = self.frames.get(key).cloned();
        if found.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    pub fn contains(&self, key: &FrameKey) -> bool {
        self.frames.contains_key(key)
    }

    /// Insert a frame; an existing entry for the same key is kept and returned.
    pub fn insert(&mut self, frame: Frame) -> Arc<Frame> {
        self.frames
            .entry(frame.key.clone())
            .or_insert_with(|| Arc::new(frame))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop every cached frame. Counters are kept.
    pub fn clear(&mut self) {
        tracing::debug!(frames = self.frames.len(), "clearing frame cache");
        self.frames.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// Frame-level parallelism for [`render_frames`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderThreading {
    /// Render cache misses on a dedicated rayon pool.
    pub parallel: bool,
    /// Override the number of worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

/// Resolve every slide to a frame, rendering only keys the cache does not hold yet.
///
/// Misses are deduplicated before rendering, so each distinct key is rendered at most once per
/// call. Results are in slide order.
#[tracing::instrument(skip_all, fields(slides = slides.len(), canvas = ?params.canvas))]
pub fn render_frames<F: ShaperFactory>(
    slides: &[Slide],
    params: &RenderParams,
    cache: &mut FrameCache,
    factory: &F,
    threading: RenderThreading,
) -> SlidecastResult<Vec<Arc<Frame>>> {
    let keys: Vec<FrameKey> = slides
        .iter()
        .map(|s| FrameKey::for_slide(s, params))
        .collect();

    let mut seen = HashSet::<&FrameKey>::new();
    let mut misses = Vec::<(&FrameKey, &Slide)>::new();
    for (key, slide) in keys.iter().zip(slides) {
        if cache.get(key).is_some() {
            tracing::debug!(fingerprint = %key.fingerprint(), "frame cache hit");
            continue;
        }
        if seen.insert(key) {
            misses.push((key, slide));
        }
    }
    tracing::debug!(misses = misses.len(), "rendering frame cache misses");

    let rendered = if threading.parallel && misses.len() > 1 {
        render_parallel(&misses, params.canvas, factory, threading.threads)?
    } else {
        let mut renderer = FrameRenderer::new(factory.make_shaper()?);
        misses
            .iter()
            .map(|&(key, slide)| render_one(&mut renderer, key, slide, params.canvas))
            .collect::<SlidecastResult<Vec<_>>>()?
    };

    for frame in rendered {
        cache.insert(frame);
    }

    keys.iter()
        .map(|key| {
            cache.frames.get(key).cloned().ok_or_else(|| {
                SlidecastError::Other(anyhow::anyhow!(
                    "frame {} missing from cache after render",
                    key.fingerprint()
                ))
            })
        })
        .collect()
}

fn render_one<S: TextShaper>(
    renderer: &mut FrameRenderer<S>,
    key: &FrameKey,
    slide: &Slide,
    canvas: Canvas,
) -> SlidecastResult<Frame> {
    let rgba = renderer.render_slide(slide, canvas)?;
    let png = encode_png(&rgba)?;
    tracing::debug!(fingerprint = %key.fingerprint(), bytes = png.len(), "rendered frame");
    Ok(Frame {
        png,
        key: key.clone(),
    })
}

fn render_parallel<F: ShaperFactory>(
    misses: &[(&FrameKey, &Slide)],
    canvas: Canvas,
    factory: &F,
    threads: Option<usize>,
) -> SlidecastResult<Vec<Frame>> {
    let pool = build_thread_pool(threads)?;
    pool.install(|| {
        misses
            .par_iter()
            .map_init(
                || factory.make_shaper().map(FrameRenderer::new),
                |renderer, &(key, slide)| -> SlidecastResult<Frame> {
                    let renderer = renderer
                        .as_mut()
                        .map_err(|e| SlidecastError::font(e.to_string()))?;
                    render_one(renderer, key, slide, canvas)
                },
            )
            .collect()
    })
}

fn build_thread_pool(threads: Option<usize>) -> SlidecastResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(SlidecastError::validation(
            "render 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| SlidecastError::Other(anyhow::anyhow!("build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cache.rs"]
mod tests;
