//! Canvas renderer: Allocate -> Layout -> Draw -> Encode.

use crate::{
    Color, Error, Result,
    encode::{self, ImageFormat},
    font::{FontSpec, LoadedFont},
    layout::{self, GlyphMeasurer, LayoutConfig, LayoutResult},
};
use derivative::Derivative;
use derive_setters::Setters;
use image::{Rgba, RgbaImage};

/// Text drawing capability on top of measurement.
///
/// Implementations must draw text so that its visual box lands where
/// [`GlyphMeasurer::measure`] says it will for the same anchor.
pub trait TextBackend: GlyphMeasurer {
    fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        font_size: u32,
        origin: (i32, i32),
        color: Rgba<u8>,
    ) -> Result<()>;
}

impl<T: TextBackend + ?Sized> TextBackend for &T {
    fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        font_size: u32,
        origin: (i32, i32),
        color: Rgba<u8>,
    ) -> Result<()> {
        (**self).draw(canvas, text, font_size, origin, color)
    }
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct ImageSpec {
    #[derivative(Default(value = "800"))]
    pub width: u32,

    #[derivative(Default(value = "600"))]
    pub height: u32,

    #[derivative(Default(value = "Color::rgb(0xcc, 0xcc, 0xcc)"))]
    pub background_color: Color,

    #[derivative(Default(value = "Color::rgb(0x33, 0x33, 0x33)"))]
    pub text_color: Color,

    #[derivative(Default(value = "ImageFormat::Png"))]
    pub format: ImageFormat,

    /// JPEG quality, 1-100. Ignored for PNG.
    #[derivative(Default(value = "90"))]
    pub quality: u8,
}

impl ImageSpec {
    pub fn new(width: u32, height: u32) -> Self {
        Self::default().with_width(width).with_height(height)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Configuration(format!(
                "image size must be positive, got {}x{}",
                self.width, self.height
            )));
        }

        encode::validate_quality(self.quality)
    }
}

/// Renders labels with a backend that stays loaded between calls.
#[derive(Debug, Clone)]
pub struct Renderer<B = LoadedFont> {
    backend: B,
    layout: LayoutConfig,
    font_size: Option<u32>,
}

impl Renderer<LoadedFont> {
    /// Load the font described by `font` once for all later renders.
    pub fn from_font_spec(font: &FontSpec, layout: LayoutConfig) -> Result<Self> {
        layout.validate()?;
        let backend = LoadedFont::from_spec(font)?;
        log::info!("using font {}", backend.path().display());

        Ok(Self {
            backend,
            layout,
            font_size: font.size,
        })
    }
}

impl<B: TextBackend> Renderer<B> {
    pub fn new(backend: B, layout: LayoutConfig, font_size: Option<u32>) -> Self {
        Self {
            backend,
            layout,
            font_size,
        }
    }

    pub fn render(&self, spec: &ImageSpec, text: &str) -> Result<Vec<u8>> {
        render_with(&self.backend, spec, text, self.font_size, &self.layout)
    }

    pub fn compose(&self, spec: &ImageSpec, text: &str) -> Result<(RgbaImage, LayoutResult)> {
        compose(&self.backend, spec, text, self.font_size, &self.layout)
    }
}

/// Render `text` onto a fresh canvas described by `spec` and return the
/// encoded bytes. The font is loaded from `font` for this call only.
pub fn render(
    spec: &ImageSpec,
    text: &str,
    font: &FontSpec,
    layout: &LayoutConfig,
) -> Result<Vec<u8>> {
    spec.validate()?;
    layout.validate()?;

    let backend = LoadedFont::from_spec(font)?;
    render_with(&backend, spec, text, font.size, layout)
}

pub fn render_with(
    backend: &impl TextBackend,
    spec: &ImageSpec,
    text: &str,
    font_size: Option<u32>,
    layout: &LayoutConfig,
) -> Result<Vec<u8>> {
    let (canvas, _) = compose(backend, spec, text, font_size, layout)?;
    encode::encode(&canvas, spec.format, spec.quality, spec.background_color)
}

/// Allocate, lay out and draw, without encoding.
pub fn compose(
    backend: &impl TextBackend,
    spec: &ImageSpec,
    text: &str,
    font_size: Option<u32>,
    layout: &LayoutConfig,
) -> Result<(RgbaImage, LayoutResult)> {
    spec.validate()?;

    let mut canvas = RgbaImage::from_pixel(spec.width, spec.height, spec.background_color.to_rgba());
    let result = layout::compute_layout(spec.width, spec.height, text, font_size, layout, backend)?;

    if !text.is_empty() {
        backend.draw(
            &mut canvas,
            text,
            result.font_size,
            result.origin,
            spec.text_color.to_rgba(),
        )?;
    }

    Ok((canvas, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{GlyphBox, tests::FakeMeasurer};
    use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};

    /// Paints the measured glyph box as a solid block.
    struct BlockBackend;

    impl GlyphMeasurer for BlockBackend {
        fn measure(&self, text: &str, font_size: u32) -> GlyphBox {
            FakeMeasurer.measure(text, font_size)
        }
    }

    impl TextBackend for BlockBackend {
        fn draw(
            &self,
            canvas: &mut RgbaImage,
            text: &str,
            font_size: u32,
            origin: (i32, i32),
            color: Rgba<u8>,
        ) -> Result<()> {
            let glyph = self.measure(text, font_size);
            let rect = Rect::at(
                origin.0 + glyph.left_offset.round() as i32,
                origin.1 + glyph.top_offset.round() as i32,
            )
            .of_size(glyph.width.round() as u32, glyph.height.round() as u32);
            draw_filled_rect_mut(canvas, rect, color);
            Ok(())
        }
    }

    fn spec() -> ImageSpec {
        ImageSpec::new(120, 80)
            .with_background_color(Color::rgb(255, 255, 255))
            .with_text_color(Color::rgb(0, 0, 0))
    }

    #[test]
    fn test_image_spec_defaults() {
        let spec = ImageSpec::default();
        assert_eq!((spec.width, spec.height), (800, 600));
        assert_eq!(spec.background_color, Color::rgb(204, 204, 204));
        assert_eq!(spec.text_color, Color::rgb(51, 51, 51));
        assert_eq!(spec.format, ImageFormat::Png);
        assert_eq!(spec.quality, 90);
    }

    #[test]
    fn test_invalid_spec() {
        let layout = LayoutConfig::new();
        for bad in [
            spec().with_width(0),
            spec().with_height(0),
            spec().with_quality(0),
            spec().with_quality(101),
        ] {
            let err = render_with(&BlockBackend, &bad, "1", None, &layout).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)));
        }
    }

    #[test]
    fn test_compose_draws_inside_padding() {
        let layout = LayoutConfig::new();
        let (canvas, result) = compose(&BlockBackend, &spec(), "42", None, &layout).unwrap();
        let margin = result.drawable.margin;

        let mut inked = 0;
        for (x, y, px) in canvas.enumerate_pixels() {
            if px[0] == 0 {
                inked += 1;
                assert!(x as f32 >= margin - 1.0 && (x as f32) < 120.0 - margin + 1.0);
                assert!(y as f32 >= margin - 2.0 && (y as f32) < 80.0 - margin + 1.0);
            }
        }
        assert!(inked > 0);
    }

    #[test]
    fn test_compose_empty_label() {
        let (canvas, result) =
            compose(&BlockBackend, &spec(), "", None, &LayoutConfig::new()).unwrap();
        assert_eq!(result.origin, (60, 40));
        assert!(canvas.pixels().all(|px| *px == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_png_round_trip() {
        let bytes = render_with(&BlockBackend, &spec(), "7", None, &LayoutConfig::new()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();

        assert_eq!(decoded.dimensions(), (120, 80));
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(decoded.get_pixel(119, 79), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_jpeg_flattens_transparent_background() {
        let spec = spec()
            .with_background_color(Color::rgba(0, 0, 255, 0))
            .with_format(ImageFormat::Jpeg)
            .with_quality(95);
        let bytes = render_with(&BlockBackend, &spec, "1", None, &LayoutConfig::new()).unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        let corner = decoded.get_pixel(2, 2);
        assert!(corner[0] < 16 && corner[1] < 16 && corner[2] > 235, "{corner:?}");
    }

    #[test]
    fn test_renderer_reuses_backend() {
        let renderer = Renderer::new(BlockBackend, LayoutConfig::new(), Some(20));
        let a = renderer.render(&spec(), "1").unwrap();
        let b = renderer.render(&spec(), "1").unwrap();
        assert_eq!(a, b);

        let (_, result) = renderer.compose(&spec(), "123").unwrap();
        assert_eq!(result.font_size, 20);
    }
}
