//! Label layout: font size resolution and baseline-aware centering.
//!
//! The engine never talks to a font backend directly. Measurement is injected
//! through [`GlyphMeasurer`], which keeps the centering math independent of
//! how a particular backend reports bearings and leading.

use crate::{
    Error, Result,
    font::{FontSpec, LoadedFont},
};
use derivative::Derivative;
use derive_setters::Setters;

/// Tight visual bounding box of rendered text, in pixels.
///
/// `left_offset` and `top_offset` are measured from the draw anchor handed to
/// the backend to the first inked column/row. Leading and side bearings are
/// not part of `width`/`height`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphBox {
    pub width: f32,
    pub height: f32,
    pub left_offset: f32,
    pub top_offset: f32,
}

impl GlyphBox {
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn fits(&self, width: f32, height: f32) -> bool {
        self.width <= width && self.height <= height
    }
}

/// Measuring capability used by the layout engine.
pub trait GlyphMeasurer {
    fn measure(&self, text: &str, font_size: u32) -> GlyphBox;
}

impl<T: GlyphMeasurer + ?Sized> GlyphMeasurer for &T {
    fn measure(&self, text: &str, font_size: u32) -> GlyphBox {
        (**self).measure(text, font_size)
    }
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct LayoutConfig {
    /// Fraction of the shorter canvas side kept free on every side, `[0.0, 0.5)`
    #[derivative(Default(value = "0.2"))]
    pub padding: f32,

    /// Upward shift applied after geometric centering, as a fraction of the
    /// glyph height. Geometrically centered text reads as sitting low; this
    /// is a perceptual constant, not a font metric.
    #[derivative(Default(value = "0.03"))]
    pub optical_balance: f32,

    /// Upper bound of the automatic font size relative to the drawable height
    #[derivative(Default(value = "1.0"))]
    pub max_size_ratio: f32,

    /// Smallest font size the automatic search may return
    #[derivative(Default(value = "1"))]
    pub min_font_size: u32,
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.padding.is_finite() || !(0.0..0.5).contains(&self.padding) {
            return Err(Error::Configuration(format!(
                "padding must be in [0.0, 0.5), got {}",
                self.padding
            )));
        }

        if !self.optical_balance.is_finite() || !(-0.5..=0.5).contains(&self.optical_balance) {
            return Err(Error::Configuration(format!(
                "optical balance must be in [-0.5, 0.5], got {}",
                self.optical_balance
            )));
        }

        if !self.max_size_ratio.is_finite() || self.max_size_ratio <= 0.0 {
            return Err(Error::Configuration(format!(
                "max size ratio must be positive, got {}",
                self.max_size_ratio
            )));
        }

        if self.min_font_size == 0 {
            return Err(Error::Configuration(
                "minimum font size must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Canvas region left for the label once the padding margin is removed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawableArea {
    pub margin: f32,
    pub width: f32,
    pub height: f32,
}

impl DrawableArea {
    pub fn new(canvas_width: u32, canvas_height: u32, padding: f32) -> Result<Self> {
        if canvas_width == 0 || canvas_height == 0 {
            return Err(Error::Configuration(format!(
                "canvas size must be positive, got {canvas_width}x{canvas_height}"
            )));
        }

        if !padding.is_finite() || !(0.0..0.5).contains(&padding) {
            return Err(Error::Configuration(format!(
                "padding must be in [0.0, 0.5), got {padding}"
            )));
        }

        let margin = padding * canvas_width.min(canvas_height) as f32;
        let width = canvas_width as f32 - 2.0 * margin;
        let height = canvas_height as f32 - 2.0 * margin;

        if width < 1.0 || height < 1.0 {
            return Err(Error::Configuration(format!(
                "padding {padding} leaves no drawable area on a {canvas_width}x{canvas_height} canvas"
            )));
        }

        Ok(Self {
            margin,
            width,
            height,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutResult {
    pub font_size: u32,
    /// Anchor handed to the text backend
    pub origin: (i32, i32),
    pub glyph_box: GlyphBox,
    pub drawable: DrawableArea,
}

/// Compute font size and draw origin for `text` on a `canvas_width` x
/// `canvas_height` canvas.
///
/// An explicit `font_size` is used verbatim even if the text then overflows
/// the canvas. Without one, the largest size whose glyph box fits the
/// drawable area is chosen.
pub fn compute_layout(
    canvas_width: u32,
    canvas_height: u32,
    text: &str,
    font_size: Option<u32>,
    config: &LayoutConfig,
    measurer: &impl GlyphMeasurer,
) -> Result<LayoutResult> {
    config.validate()?;
    let drawable = DrawableArea::new(canvas_width, canvas_height, config.padding)?;

    let font_size = match font_size {
        Some(0) => {
            return Err(Error::Configuration(
                "font size must be positive".to_string(),
            ));
        }
        Some(size) => size,
        None => fit_font_size(text, &drawable, config, measurer),
    };

    let center_x = canvas_width as f32 / 2.0;
    let center_y = canvas_height as f32 / 2.0;

    if text.is_empty() {
        return Ok(LayoutResult {
            font_size,
            origin: (center_x.round() as i32, center_y.round() as i32),
            glyph_box: GlyphBox::default(),
            drawable,
        });
    }

    let glyph_box = measurer.measure(text, font_size);
    let x = center_x - glyph_box.width / 2.0 - glyph_box.left_offset;
    let y = center_y
        - glyph_box.height / 2.0
        - glyph_box.top_offset
        - config.optical_balance * glyph_box.height;

    log::debug!(
        "layout `{text}` on {canvas_width}x{canvas_height}: size={font_size}, box={:.1}x{:.1}, origin=({x:.1}, {y:.1})",
        glyph_box.width,
        glyph_box.height,
    );

    Ok(LayoutResult {
        font_size,
        origin: (x.round() as i32, y.round() as i32),
        glyph_box,
        drawable,
    })
}

/// Same as [`compute_layout`] but resolves the font from `font`, loading the
/// system default when no path is set.
pub fn compute_layout_with_font(
    canvas_width: u32,
    canvas_height: u32,
    text: &str,
    font: &FontSpec,
    config: &LayoutConfig,
) -> Result<LayoutResult> {
    let loaded = LoadedFont::from_spec(font)?;
    compute_layout(
        canvas_width,
        canvas_height,
        text,
        font.size,
        config,
        &loaded,
    )
}

/// Largest font size in `[min_font_size, ceil(drawable.height * max_size_ratio)]`
/// whose glyph box fits the drawable area.
fn fit_font_size(
    text: &str,
    drawable: &DrawableArea,
    config: &LayoutConfig,
    measurer: &impl GlyphMeasurer,
) -> u32 {
    let min_size = config.min_font_size;
    let max_size = ((drawable.height * config.max_size_ratio).ceil() as u32).max(min_size);

    if text.is_empty() {
        return max_size;
    }

    let fits = |size: u32| {
        measurer
            .measure(text, size)
            .fits(drawable.width, drawable.height)
    };

    if !fits(min_size) {
        log::warn!(
            "`{text}` does not fit {:.1}x{:.1} even at size {min_size}",
            drawable.width,
            drawable.height
        );
        return min_size;
    }

    let (mut low, mut high) = (min_size, max_size);
    while low < high {
        let mid = low + (high - low).div_ceil(2);
        if fits(mid) {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    low
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Deterministic stand-in for a font: every char is 0.6em wide and
    /// 0.7em tall, inked area starting `0.1em` right of and `0.2em` below
    /// the anchor.
    pub(crate) struct FakeMeasurer;

    impl GlyphMeasurer for FakeMeasurer {
        fn measure(&self, text: &str, font_size: u32) -> GlyphBox {
            if text.is_empty() {
                return GlyphBox::default();
            }

            let size = font_size as f32;
            GlyphBox {
                width: text.chars().count() as f32 * size * 0.6,
                height: size * 0.7,
                left_offset: size * 0.1,
                top_offset: size * 0.2,
            }
        }
    }

    /// Tight box anchored exactly at the glyph's top-left.
    struct TightMeasurer;

    impl GlyphMeasurer for TightMeasurer {
        fn measure(&self, text: &str, font_size: u32) -> GlyphBox {
            GlyphBox {
                width: text.chars().count() as f32 * font_size as f32 * 0.5,
                height: font_size as f32 * 0.8,
                left_offset: 0.0,
                top_offset: 0.0,
            }
        }
    }

    #[test]
    fn test_drawable_area() {
        let area = DrawableArea::new(800, 600, 0.2).unwrap();
        assert_eq!(area.margin, 120.0);
        assert_eq!(area.width, 560.0);
        assert_eq!(area.height, 360.0);
    }

    #[test]
    fn test_padding_out_of_range() {
        for padding in [0.5, 0.75, -0.1, f32::NAN] {
            let config = LayoutConfig::new().with_padding(padding);
            let err = compute_layout(100, 100, "1", None, &config, &FakeMeasurer).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "padding {padding}");
        }
    }

    #[test]
    fn test_degenerate_drawable_area() {
        let config = LayoutConfig::new().with_padding(0.499);
        let err = compute_layout(100, 100, "1", None, &config, &FakeMeasurer).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_zero_canvas() {
        let err =
            compute_layout(0, 100, "1", None, &LayoutConfig::new(), &FakeMeasurer).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_zero_font_size() {
        let err = compute_layout(100, 100, "1", Some(0), &LayoutConfig::new(), &FakeMeasurer)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_auto_size_fits_drawable_area() {
        let sizes = [(1, 1), (7, 3), (64, 64), (100, 100), (800, 600), (50, 1000), (1920, 40)];
        let paddings = [0.0, 0.1, 0.2, 0.3, 0.45];
        let labels = ["1", "42", "999", "123456", "1234567890"];

        let mut rejected = 0;
        for (width, height) in sizes {
            for padding in paddings {
                let config = LayoutConfig::new().with_padding(padding);
                let margin = padding * width.min(height) as f32;
                let too_small =
                    width as f32 - 2.0 * margin < 1.0 || height as f32 - 2.0 * margin < 1.0;

                let area = match DrawableArea::new(width, height, padding) {
                    Ok(area) => area,
                    Err(e) => {
                        assert!(too_small, "{width}x{height} p={padding}: {e}");
                        assert!(matches!(e, Error::Configuration(_)));
                        assert!(matches!(
                            compute_layout(width, height, "1", None, &config, &FakeMeasurer),
                            Err(Error::Configuration(_))
                        ));
                        rejected += 1;
                        continue;
                    }
                };
                assert!(!too_small, "{width}x{height} p={padding} accepted");
                assert!(area.width >= 1.0 && area.height >= 1.0);

                for label in labels {
                    let layout =
                        compute_layout(width, height, label, None, &config, &FakeMeasurer)
                            .unwrap();
                    if layout.font_size == config.min_font_size {
                        continue;
                    }
                    assert!(
                        layout.glyph_box.fits(area.width, area.height),
                        "{label} on {width}x{height} p={padding}: {:?}",
                        layout.glyph_box
                    );
                }
            }
        }

        // 1x1 and 7x3 leave less than a pixel once padded.
        assert!(rejected > 0);
    }

    #[test]
    fn test_auto_size_is_largest_fit() {
        let config = LayoutConfig::new();
        let layout = compute_layout(800, 600, "123456", None, &config, &FakeMeasurer).unwrap();
        let area = layout.drawable;

        assert_eq!(layout.font_size, 155);
        assert!(FakeMeasurer.measure("123456", 155).fits(area.width, area.height));
        assert!(!FakeMeasurer.measure("123456", 156).fits(area.width, area.height));
    }

    #[test]
    fn test_auto_size_shrinks_with_digits() {
        let config = LayoutConfig::new();
        let mut previous = u32::MAX;

        for digits in 1..=12 {
            let label = "9".repeat(digits);
            let layout = compute_layout(400, 400, &label, None, &config, &FakeMeasurer).unwrap();
            assert!(layout.font_size <= previous, "{digits} digits grew the font");
            assert!(layout.glyph_box.width <= layout.drawable.width);
            previous = layout.font_size;
        }
    }

    #[test]
    fn test_auto_size_limited_by_ratio() {
        let config = LayoutConfig::new().with_max_size_ratio(0.5);
        let layout = compute_layout(1000, 100, "1", None, &config, &FakeMeasurer).unwrap();
        assert_eq!(layout.font_size, 30);
    }

    #[test]
    fn test_explicit_size_not_shrunk() {
        let config = LayoutConfig::new();
        let layout = compute_layout(50, 50, "12345", Some(400), &config, &FakeMeasurer).unwrap();

        assert_eq!(layout.font_size, 400);
        assert!(layout.glyph_box.width > 50.0);
    }

    #[test]
    fn test_centering_single_char() {
        let config = LayoutConfig::new();
        let layout = compute_layout(200, 200, "7", None, &config, &TightMeasurer).unwrap();
        let glyph = layout.glyph_box;

        let dx = 100.0 - layout.origin.0 as f32;
        assert!((dx - glyph.width / 2.0).abs() <= 0.5);

        let nudge = config.optical_balance * glyph.height;
        let geometric_y = 100.0 - glyph.height / 2.0;
        assert!((geometric_y - layout.origin.1 as f32 - nudge).abs() <= 0.5);
    }

    #[test]
    fn test_centering_corrects_offsets() {
        let config = LayoutConfig::new().with_optical_balance(0.0);
        let layout = compute_layout(300, 300, "5", Some(100), &config, &FakeMeasurer).unwrap();

        // Visual box must land centered once the anchor offsets are applied.
        let visual_left = layout.origin.0 as f32 + layout.glyph_box.left_offset;
        let visual_top = layout.origin.1 as f32 + layout.glyph_box.top_offset;
        assert_eq!(visual_left, 150.0 - 30.0);
        assert_eq!(visual_top, 150.0 - 35.0);
    }

    #[test]
    fn test_optical_balance_moves_up() {
        let plain = LayoutConfig::new().with_optical_balance(0.0);
        let balanced = LayoutConfig::new().with_optical_balance(0.05);

        let a = compute_layout(400, 400, "8", Some(200), &plain, &TightMeasurer).unwrap();
        let b = compute_layout(400, 400, "8", Some(200), &balanced, &TightMeasurer).unwrap();

        assert_eq!(a.origin.0, b.origin.0);
        assert_eq!(a.origin.1 - b.origin.1, 8);
    }

    #[test]
    fn test_empty_label() {
        let layout =
            compute_layout(101, 60, "", None, &LayoutConfig::new(), &FakeMeasurer).unwrap();
        assert_eq!(layout.origin, (51, 30));
        assert_eq!(layout.glyph_box, GlyphBox::default());
    }

    #[test]
    fn test_idempotent() {
        let config = LayoutConfig::new().with_padding(0.15);
        let a = compute_layout(640, 480, "1234", None, &config, &FakeMeasurer).unwrap();
        let b = compute_layout(640, 480, "1234", None, &config, &FakeMeasurer).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_optical_balance() {
        let config = LayoutConfig::new().with_optical_balance(2.0);
        assert!(config.validate().is_err());
    }
}
