use crate::{Color, Error, Result};
use image::{
    ExtendedColorType, ImageEncoder, Rgb, RgbImage, RgbaImage,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType, PngEncoder},
    },
};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn all() -> &'static [ImageFormat] {
        &[ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Webp]
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(Error::Configuration(format!(
                "unsupported image format `{other}`, expected png, jpg or webp"
            ))),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

pub fn validate_quality(quality: u8) -> Result<()> {
    if (1..=100).contains(&quality) {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "quality must be in 1-100, got {quality}"
        )))
    }
}

/// Encode `canvas` to `format`.
///
/// `background` is the color semi-transparent pixels are flattened against
/// for formats without an alpha channel. `quality` applies to JPEG and WebP,
/// PNG is always lossless.
pub fn encode(
    canvas: &RgbaImage,
    format: ImageFormat,
    quality: u8,
    background: Color,
) -> Result<Vec<u8>> {
    validate_quality(quality)?;

    let (width, height) = canvas.dimensions();
    let mut buf = Vec::new();

    match format {
        ImageFormat::Png => {
            PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive)
                .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgba8)?;
        }
        ImageFormat::Jpeg => {
            let flat = flatten(canvas, background);
            JpegEncoder::new_with_quality(&mut buf, quality).write_image(
                flat.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
        ImageFormat::Webp => {
            let encoded = webp::Encoder::from_rgba(canvas.as_raw(), width, height)
                .encode_simple(false, quality as f32)
                .map_err(|e| Error::Render(format!("webp encoding failed: {e:?}")))?;
            buf.extend_from_slice(&encoded);
        }
    }

    if buf.is_empty() {
        return Err(Error::Render(format!("{format} encoder produced no data")));
    }

    log::trace!("encoded {width}x{height} {format}: {} bytes", buf.len());
    Ok(buf)
}

/// Composite `canvas` over an opaque version of `background`.
pub fn flatten(canvas: &RgbaImage, background: Color) -> RgbImage {
    let bg = background.to_rgba();

    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let px = canvas.get_pixel(x, y);
        let alpha = px[3] as u32;
        let blend = |c: u8, b: u8| ((c as u32 * alpha + b as u32 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(px[0], bg[0]), blend(px[1], bg[1]), blend(px[2], bg[2])])
    })
}
