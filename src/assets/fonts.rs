use std::path::Path;
use std::sync::Arc;

use usvg::fontdb;
use xxhash_rust::xxh3::Xxh3;

use crate::foundation::error::{SlidecastError, SlidecastResult};

const FONT_CLASS_SEED: u64 = 0x5d1c_a57f_0e7b_3c29;

/// Family name plus a content-derived readiness tag.
///
/// `class` changes whenever any face's bytes change, so it is safe to use as part of a frame
/// cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct FontIdentity {
    pub family: String,
    pub class: String,
}

/// Bytes of a font file plus the face index inside it (non-zero only for collections).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceData {
    pub bytes: Arc<Vec<u8>>,
    pub index: u32,
}

impl FaceData {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self::with_index(bytes, 0)
    }

    pub fn with_index(bytes: Vec<u8>, index: u32) -> Self {
        Self {
            bytes: Arc::new(bytes),
            index,
        }
    }
}

/// Faces for each style of one family.
#[derive(Clone, Debug)]
pub struct FontFaces {
    pub regular: FaceData,
    pub bold: Option<FaceData>,
    pub italic: Option<FaceData>,
    pub bold_italic: Option<FaceData>,
}

impl FontFaces {
    /// Faces with only a regular style; bold and italic are synthesized at draw time.
    pub fn regular_only(bytes: Vec<u8>) -> Self {
        Self {
            regular: FaceData::new(bytes),
            bold: None,
            italic: None,
            bold_italic: None,
        }
    }

    fn iter(&self) -> impl Iterator<Item = Option<&FaceData>> {
        [
            Some(&self.regular),
            self.bold.as_ref(),
            self.italic.as_ref(),
            self.bold_italic.as_ref(),
        ]
        .into_iter()
    }
}

/// A font family that is ready for shaping.
#[derive(Clone, Debug)]
pub struct LoadedFont {
    pub identity: FontIdentity,
    pub faces: FontFaces,
}

impl LoadedFont {
    /// Wrap already-read face bytes and compute the font class.
    pub fn from_faces(family: impl Into<String>, faces: FontFaces) -> SlidecastResult<Self> {
        let family = family.into();
        if family.trim().is_empty() {
            return Err(SlidecastError::font("font family name must be non-empty"));
        }
        if faces.regular.bytes.is_empty() {
            return Err(SlidecastError::font(format!(
                "font '{family}' has an empty regular face"
            )));
        }

        let mut h = Xxh3::with_seed(FONT_CLASS_SEED);
        for face in faces.iter() {
            match face {
                Some(face) => {
                    h.update(&[1]);
                    h.update(&face.index.to_le_bytes());
                    h.update(&(face.bytes.len() as u64).to_le_bytes());
                    h.update(&face.bytes);
                }
                None => h.update(&[0]),
            }
        }
        let class = format!("{family}-{:016x}", h.digest());

        Ok(Self {
            identity: FontIdentity { family, class },
            faces,
        })
    }

    pub fn family(&self) -> &str {
        &self.identity.family
    }

    pub fn class(&self) -> &str {
        &self.identity.class
    }
}

/// Source of fonts by family name.
pub trait FontProvider {
    /// Load every available face of `family`.
    fn load(&self, family: &str) -> SlidecastResult<LoadedFont>;
}

/// Font database resolving families by their real (name table) family name.
///
/// Families are matched case-insensitively; files that do not parse as fonts are skipped.
#[derive(Clone, Default)]
pub struct FontDir {
    db: fontdb::Database,
}

impl FontDir {
    /// An empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// A database holding only the fonts installed on this machine.
    pub fn system() -> Self {
        let mut fonts = Self::new();
        fonts.load_system_fonts();
        fonts
    }

    pub fn load_system_fonts(&mut self) {
        self.db.load_system_fonts();
    }

    /// Add every font file below `dir` (recursively, `.ttc` collections included).
    pub fn load_dir(&mut self, dir: &Path) {
        let before = self.db.len();
        self.db.load_fonts_dir(dir);
        tracing::debug!(dir = %dir.display(), faces = self.db.len() - before, "loaded font dir");
    }

    /// Add one font file or collection from memory.
    pub fn load_data(&mut self, bytes: Vec<u8>) {
        self.db.load_font_data(bytes);
    }

    /// Number of faces known to the database.
    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// The family name as spelled in the font, matched case-insensitively.
    fn canonical_family(&self, family: &str) -> Option<String> {
        let want = family.trim().to_lowercase();
        self.db.faces().find_map(|face| {
            face.families
                .iter()
                .find(|(name, _)| name.to_lowercase() == want)
                .map(|(name, _)| name.clone())
        })
    }

    fn query(
        &self,
        family: &str,
        weight: fontdb::Weight,
        style: fontdb::Style,
    ) -> Option<fontdb::ID> {
        self.db.query(&fontdb::Query {
            families: &[fontdb::Family::Name(family)],
            weight,
            stretch: fontdb::Stretch::Normal,
            style,
        })
    }

    // The query falls back to the nearest face; a styled slot only takes a real match.
    fn styled(&self, family: &str, bold: bool, italic: bool) -> Option<FaceData> {
        let weight = if bold {
            fontdb::Weight::BOLD
        } else {
            fontdb::Weight::NORMAL
        };
        let style = if italic {
            fontdb::Style::Italic
        } else {
            fontdb::Style::Normal
        };
        let id = self.query(family, weight, style)?;
        let info = self.db.face(id)?;
        let is_bold = info.weight.0 >= fontdb::Weight::SEMIBOLD.0;
        let is_italic = info.style != fontdb::Style::Normal;
        if is_bold != bold || is_italic != italic {
            return None;
        }
        self.face_data(id)
    }

    fn face_data(&self, id: fontdb::ID) -> Option<FaceData> {
        self.db
            .with_face_data(id, |data, index| FaceData::with_index(data.to_vec(), index))
    }
}

impl std::fmt::Debug for FontDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontDir").field("faces", &self.db.len()).finish()
    }
}

impl FontProvider for FontDir {
    #[tracing::instrument(skip(self))]
    fn load(&self, family: &str) -> SlidecastResult<LoadedFont> {
        let Some(name) = self.canonical_family(family) else {
            return Err(SlidecastError::font(format!(
                "font family '{family}' not found among {} font faces",
                self.db.len()
            )));
        };

        let regular = self
            .query(&name, fontdb::Weight::NORMAL, fontdb::Style::Normal)
            .and_then(|id| self.face_data(id))
            .ok_or_else(|| {
                SlidecastError::font(format!("font family '{name}' has no usable face"))
            })?;
        let faces = FontFaces {
            regular,
            bold: self.styled(&name, true, false),
            italic: self.styled(&name, false, true),
            bold_italic: self.styled(&name, true, true),
        };

        tracing::debug!(
            family = %name,
            bold = faces.bold.is_some(),
            italic = faces.italic.is_some(),
            bold_italic = faces.bold_italic.is_some(),
            "resolved font faces"
        );
        LoadedFont::from_faces(name, faces)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
