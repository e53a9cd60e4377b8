//! Font discovery, loading and the `ab_glyph` backed measuring/drawing
//! backend.

use crate::{
    Error, Result,
    canvas::TextBackend,
    layout::{GlyphBox, GlyphMeasurer},
};
use ab_glyph::{Font, FontVec, GlyphId, PxScale, ScaleFont, point};
use derive_setters::Setters;
use image::{Rgba, RgbaImage};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use walkdir::WalkDir;

#[cfg(target_os = "windows")]
const WELL_KNOWN_FONTS: &[&str] = &[
    "C:\\Windows\\Fonts\\Arial.ttf",
    "C:\\Windows\\Fonts\\Arial Bold.ttf",
    "C:\\Windows\\Fonts\\Calibri.ttf",
    "C:\\Windows\\Fonts\\Segoe UI Bold.ttf",
];

#[cfg(target_os = "macos")]
const WELL_KNOWN_FONTS: &[&str] = &[
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/SFCompact-Bold.otf",
    "/Library/Fonts/Arial.ttf",
    "/Library/Fonts/Arial Bold.ttf",
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const WELL_KNOWN_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/ubuntu/Ubuntu-Bold.ttf",
    "/usr/share/fonts/TTF/Arial.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
];

/// Font selection: `None` fields are resolved by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Setters)]
#[setters(prefix = "with_", strip_option)]
#[non_exhaustive]
pub struct FontSpec {
    /// TrueType/OpenType file; the system default is used when unset
    pub path: Option<PathBuf>,
    /// Pixel size; derived from the canvas when unset
    pub size: Option<u32>,
}

impl FontSpec {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Find a usable system font.
///
/// Well-known font files are tried first, then the platform font directories
/// are walked for the first `.ttf`/`.otf` file.
pub fn find_system_font() -> Result<PathBuf> {
    if let Some(path) = WELL_KNOWN_FONTS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
    {
        return Ok(path);
    }

    for dir in font_dirs() {
        if !dir.is_dir() {
            continue;
        }

        let found = WalkDir::new(&dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .find(|path| is_font_file(path));

        if let Some(path) = found {
            log::debug!("using font found under {}: {}", dir.display(), path.display());
            return Ok(path);
        }
    }

    Err(Error::FontLoad {
        path: PathBuf::new(),
        reason: "could not find any usable system font, please specify a font path".to_string(),
    })
}

fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
    ];

    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(Path::new(&home).join(".fonts"));
        dirs.push(Path::new(&home).join(".local/share/fonts"));
    }

    dirs.extend(
        ["C:\\Windows\\Fonts", "/Library/Fonts", "/System/Library/Fonts"]
            .into_iter()
            .map(PathBuf::from),
    );
    dirs
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"))
}

/// A parsed font, cheap to clone and safe to share between worker threads.
#[derive(Clone)]
pub struct LoadedFont {
    path: PathBuf,
    font: Arc<FontVec>,
}

impl fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedFont")
            .field("path", &self.path)
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl LoadedFont {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::FontLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_bytes(path, data)
    }

    pub fn from_bytes(path: impl Into<PathBuf>, data: Vec<u8>) -> Result<Self> {
        let path = path.into();
        let font = FontVec::try_from_vec(data).map_err(|e| Error::FontLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        log::debug!("loaded font {} ({} glyphs)", path.display(), font.glyph_count());

        Ok(Self {
            path,
            font: Arc::new(font),
        })
    }

    /// Load the font named by `spec`, falling back to [`find_system_font`]
    /// only when no path is given.
    pub fn from_spec(spec: &FontSpec) -> Result<Self> {
        match &spec.path {
            Some(path) => Self::load(path),
            None => Self::load(find_system_font()?),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Walk the outlined glyphs of `text` the way `imageproc` places them:
    /// caret advancing from x=0, each glyph positioned on the ascent line.
    /// The callback receives each glyph's pixel bounds relative to the anchor.
    fn for_each_glyph_bounds(&self, text: &str, font_size: u32, mut f: impl FnMut(ab_glyph::Rect)) {
        let scale = PxScale::from(font_size as f32);
        let scaled = self.font.as_scaled(scale);
        let mut caret = 0.0f32;
        let mut last: Option<GlyphId> = None;

        for c in text.chars() {
            let id = self.font.glyph_id(c);
            let glyph = id.with_scale_and_position(scale, point(caret, scaled.ascent()));
            caret += scaled.h_advance(id);

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                if let Some(last) = last {
                    caret += scaled.kern(id, last);
                }
                last = Some(id);
                f(outlined.px_bounds());
            }
        }
    }
}

impl GlyphMeasurer for LoadedFont {
    fn measure(&self, text: &str, font_size: u32) -> GlyphBox {
        let mut bounds: Option<ab_glyph::Rect> = None;

        self.for_each_glyph_bounds(text, font_size, |bb| {
            bounds = Some(match bounds {
                None => bb,
                Some(acc) => ab_glyph::Rect {
                    min: point(acc.min.x.min(bb.min.x), acc.min.y.min(bb.min.y)),
                    max: point(acc.max.x.max(bb.max.x), acc.max.y.max(bb.max.y)),
                },
            });
        });

        bounds.map_or_else(GlyphBox::default, |bb| GlyphBox {
            width: bb.width(),
            height: bb.height(),
            left_offset: bb.min.x,
            top_offset: bb.min.y,
        })
    }
}

impl TextBackend for LoadedFont {
    fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        font_size: u32,
        origin: (i32, i32),
        color: Rgba<u8>,
    ) -> Result<()> {
        imageproc::drawing::draw_text_mut(
            canvas,
            color,
            origin.0,
            origin.1,
            PxScale::from(font_size as f32),
            &*self.font,
            text,
        );
        Ok(())
    }
}
