//! Slidecast turns a line-per-slide text script into rendered frames and an MP4 video.
//!
//! The pipeline runs strictly forward:
//!
//! - parse the script into [`Slide`]s ([`parse_script`])
//! - tokenize inline markup into [`StyledRun`]s and wrap them into centered [`LayoutLine`]s
//! - rasterize each slide once into a cached PNG [`Frame`] ([`render_frames`])
//! - expand the frames into a [`Timeline`] ([`build_timeline`])
//! - capture the timeline and transcode it to MP4 ([`Exporter`])
//!
//! [`DeckSession`] ties the render half together for interactive use.
#![forbid(unsafe_code)]

mod assets;
mod config;
mod encode;
mod foundation;
mod layout;
mod markup;
mod render;
mod script;
mod session;
mod timeline;

pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, Point, Rect, Resolution, Rgb8};
pub use crate::foundation::error::{SlidecastError, SlidecastResult};

pub use crate::script::color::parse_color;
pub use crate::script::parse::{
    DEFAULT_DURATION_SECS, MAX_DURATION_SECS, OPTION_SEPARATOR, SizeClass, Slide, parse_line,
    parse_script,
};

pub use crate::markup::parser::{Node, parse_markup};
pub use crate::markup::runs::{RunStyle, StyledRun, tokenize};

pub use crate::layout::text::{
    BlockFont, BlockShaper, DrawnRun, ParleyShaper, ShaperFactory, TextShaper,
};
pub use crate::layout::wrap::{LayoutLine, LayoutParams, layout_lines};

pub use crate::assets::fonts::{
    FaceData, FontDir, FontFaces, FontIdentity, FontProvider, LoadedFont,
};

pub use crate::render::cache::{
    CacheStats, Frame, FrameCache, FrameKey, RenderParams, RenderThreading, render_frames,
};
pub use crate::render::cpu::{BACKGROUND, FrameRenderer, decode_png, encode_png};
pub use crate::render::fingerprint::FrameFingerprint;
pub use crate::render::surface::{DrawStyle, FrameRGBA, Surface};

pub use crate::timeline::sequencer::{Timeline, TimelineSummary, build_timeline};

pub use crate::encode::capture::{
    CaptureConfig, CaptureResult, CaptureSession, InMemoryCapture, Pacing, run_capture,
};
pub use crate::encode::ffmpeg::{FfmpegCapture, FfmpegTranscoder, is_ffmpeg_on_path};
pub use crate::encode::progress::{ExportStage, ProgressTracker, parse_ffmpeg_time, percent_of};
pub use crate::encode::transcode::{
    TranscodeEngine, TranscodeOpts, TranscoderHandle, X264_PRESETS,
};

pub use crate::session::deck::{DeckSession, DeckSettings};
pub use crate::session::export::{ExportOpts, Exporter};

pub use crate::config::ProjectConfig;
