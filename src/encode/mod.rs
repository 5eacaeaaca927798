//! Capture, transcode, and progress reporting for video export.

pub(crate) mod capture;
pub(crate) mod ffmpeg;
pub(crate) mod progress;
pub(crate) mod transcode;
