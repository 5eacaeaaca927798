use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::encode::capture::Pacing;
use crate::encode::transcode::TranscodeOpts;
use crate::foundation::core::{Fps, Resolution};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::cache::RenderThreading;
use crate::session::deck::DeckSettings;
use crate::session::export::ExportOpts;

/// Highest frame rate accepted in a project file.
pub const MAX_FPS: u32 = 120;

/// Project settings loaded from a JSON file.
///
/// Every field is optional in the file; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub resolution: Resolution,
    /// Font family name; `None` uses the built-in default family.
    pub font: Option<String>,
    /// Extra directories searched for fonts before the system ones.
    pub font_dirs: Vec<PathBuf>,
    /// Integer frames per second.
    pub fps: u32,
    pub transcode: TranscodeOpts,
    pub pacing: Pacing,
    /// Render slides on a rayon pool.
    pub parallel: bool,
    pub threads: Option<usize>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            font: None,
            font_dirs: Vec::new(),
            fps: Fps::DEFAULT.num,
            transcode: TranscodeOpts::default(),
            pacing: Pacing::default(),
            parallel: false,
            threads: None,
        }
    }
}

impl ProjectConfig {
    /// Read, parse and validate a JSON project file.
    pub fn load(path: &Path) -> SlidecastResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> SlidecastResult<()> {
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(SlidecastError::validation(format!(
                "fps must be in 1..={MAX_FPS}, got {}",
                self.fps
            )));
        }
        if self.threads == Some(0) {
            return Err(SlidecastError::validation("threads must be >= 1 when set"));
        }
        if let Some(font) = &self.font
            && font.trim().is_empty()
        {
            return Err(SlidecastError::validation("font must be non-empty when set"));
        }
        self.transcode.validate()
    }

    pub fn deck_settings(&self) -> SlidecastResult<DeckSettings> {
        Ok(DeckSettings {
            resolution: self.resolution,
            fps: Fps::new(self.fps, 1)?,
            threading: RenderThreading {
                parallel: self.parallel,
                threads: self.threads,
            },
        })
    }

    pub fn export_opts(&self) -> ExportOpts {
        ExportOpts {
            pacing: self.pacing,
            transcode: self.transcode.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
