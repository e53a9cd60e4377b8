//! Composition engine for numbered placeholder images.
//!
//! The crate turns an [`ImageSpec`] plus a label into encoded image bytes:
//!
//! - [`layout`] resolves the font size and the draw origin that centers the
//!   label inside the padded canvas.
//! - [`canvas`] allocates the canvas, draws the label and hands the result to
//!   [`encode`].
//! - [`font`] loads fonts and provides the real glyph measurement/drawing
//!   backend.
//!
//! Nothing here touches the filesystem except font loading.

pub mod canvas;
pub mod color;
pub mod encode;
pub mod font;
pub mod layout;

pub use canvas::{ImageSpec, Renderer, TextBackend, render, render_with};
pub use color::Color;
pub use encode::ImageFormat;
pub use font::{FontSpec, LoadedFont, find_system_font};
pub use layout::{
    DrawableArea, GlyphBox, GlyphMeasurer, LayoutConfig, LayoutResult, compute_layout,
    compute_layout_with_font,
};

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Failed to load font {}: {reason}", path.display())]
    FontLoad { path: PathBuf, reason: String },
    #[error("Render error: {0}")]
    Render(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// True for errors caused by the caller's settings rather than by a
    /// single render going wrong.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::FontLoad { .. })
    }
}
