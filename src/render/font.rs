use crate::config::RenderConfig;
use crate::error::{ConvertError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use ttf_parser::Face;

#[cfg(feature = "bundled-font")]
const BUNDLED_FONT: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/fonts/DejaVuSansMono.ttf"
));

#[cfg(feature = "bundled-font")]
const BUNDLED_FONT_NAME: &str = "DejaVu Sans Mono (bundled)";

/// Searched in order when no font is configured and none is bundled.
const FALLBACK_FONT_PATHS: &[&str] = &[
    "DejaVuSansMono.ttf",
    "DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/Library/Fonts/DejaVuSansMono.ttf",
    "C:\\Windows\\Fonts\\DejaVuSansMono.ttf",
];

const PT_TO_MM: f32 = 25.4 / 72.0;

/// A validated TrueType font, shared by every document of a run.
#[derive(Clone)]
pub struct FontResource {
    name: String,
    data: Arc<[u8]>,
}

impl std::fmt::Debug for FontResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontResource")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl FontResource {
    pub fn from_bytes<S: Into<String>>(name: S, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        Face::parse(&data, 0).map_err(|e| ConvertError::FontInvalid {
            name: name.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            name,
            data: data.into(),
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConvertError::FontNotFound {
                path: path.to_path_buf(),
            },
            _ => ConvertError::FontInvalid {
                name: path.display().to_string(),
                message: e.to_string(),
            },
        })?;

        Self::from_bytes(path.display().to_string(), data)
    }

    #[cfg(feature = "bundled-font")]
    pub fn bundled() -> Result<Self> {
        Self::from_bytes(BUNDLED_FONT_NAME, BUNDLED_FONT.to_vec())
    }

    /// Resolves the font for a run: the configured file, else the bundled
    /// font, else the first DejaVu font found on the system.
    pub fn load(config: &RenderConfig) -> Result<Self> {
        if let Some(ref path) = config.font_path {
            debug!(font = %path.display(), "Loading configured font");
            return Self::from_path(path);
        }

        #[cfg(feature = "bundled-font")]
        {
            Self::bundled()
        }

        #[cfg(not(feature = "bundled-font"))]
        {
            Self::from_system()
        }
    }

    #[cfg_attr(feature = "bundled-font", allow(dead_code))]
    fn from_system() -> Result<Self> {
        for candidate in FALLBACK_FONT_PATHS {
            let path = Path::new(candidate);
            if path.is_file() {
                debug!(font = %path.display(), "Using system font");
                return Self::from_path(path);
            }
        }

        Err(ConvertError::FontNotFound {
            path: PathBuf::from(FALLBACK_FONT_PATHS[0]),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn metrics(&self, font_size_pt: f32) -> Result<FontMetrics<'_>> {
        let face = Face::parse(&self.data, 0).map_err(|e| ConvertError::FontInvalid {
            name: self.name.clone(),
            message: e.to_string(),
        })?;

        Ok(FontMetrics { face, font_size_pt })
    }

    /// True when every non-control character of `text` has a glyph.
    pub fn covers(&self, text: &str) -> bool {
        match self.metrics(1.0) {
            Ok(metrics) => text
                .chars()
                .filter(|c| !c.is_control())
                .all(|c| metrics.has_glyph(c)),
            Err(_) => false,
        }
    }
}

/// Glyph lookups against a parsed face at a fixed font size.
pub struct FontMetrics<'a> {
    face: Face<'a>,
    font_size_pt: f32,
}

impl FontMetrics<'_> {
    pub fn has_glyph(&self, ch: char) -> bool {
        self.face.glyph_index(ch).is_some()
    }

    /// Horizontal advance of `ch` in millimetres; zero when the font has no glyph.
    pub fn advance_mm(&self, ch: char) -> f32 {
        let units_per_em = f32::from(self.face.units_per_em().max(1));
        let advance = self
            .face
            .glyph_index(ch)
            .and_then(|glyph| self.face.glyph_hor_advance(glyph))
            .map(f32::from)
            .unwrap_or(0.0);

        advance / units_per_em * self.font_size_pt * PT_TO_MM
    }

    pub fn text_width_mm(&self, text: &str) -> f32 {
        text.chars().map(|ch| self.advance_mm(ch)).sum()
    }
}
