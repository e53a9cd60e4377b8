use crate::{Error, Result};
use derivative::Derivative;
use derive_setters::Setters;
use placeholder_render::{Color, FontSpec, ImageFormat, ImageSpec, LayoutConfig};
use std::path::PathBuf;

/// Everything needed to produce one batch of placeholder images.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct GeneratorConfig {
    /// Directory the images are written to, created when missing
    #[derivative(Default(value = "PathBuf::from(\".\")"))]
    pub output_dir: PathBuf,

    #[derivative(Default(value = "10"))]
    pub count: u64,

    /// First number of the sequence
    #[derivative(Default(value = "1"))]
    pub start_num: u64,

    #[derivative(Default(value = "800"))]
    pub width: u32,

    #[derivative(Default(value = "600"))]
    pub height: u32,

    #[derivative(Default(value = "Color::rgb(0xcc, 0xcc, 0xcc)"))]
    pub bg_color: Color,

    #[derivative(Default(value = "Color::rgb(0x33, 0x33, 0x33)"))]
    pub text_color: Color,

    #[derivative(Default(value = "ImageFormat::Png"))]
    pub format: ImageFormat,

    #[derivative(Default(value = "String::from(\"img_\")"))]
    pub prefix: String,

    /// Zero-pad numbers in file names to this many digits, 0 = plain
    #[derivative(Default(value = "0"))]
    pub pad_width: usize,

    #[setters(strip_option)]
    pub font_path: Option<PathBuf>,

    /// Fixed font size, otherwise fitted to the canvas
    #[setters(strip_option)]
    pub font_size: Option<u32>,

    /// JPEG quality (1-100)
    #[derivative(Default(value = "90"))]
    pub quality: u8,

    #[derivative(Default(value = "false"))]
    pub overwrite: bool,

    /// Margin on each side as a fraction of the shorter side, [0.0, 0.5)
    #[derivative(Default(value = "0.2"))]
    pub padding: f32,

    /// Upward nudge as a fraction of the label height
    #[derivative(Default(value = "0.03"))]
    pub optical_balance: f32,

    /// Worker threads, 0 lets rayon decide
    #[derivative(Default(value = "0"))]
    pub jobs: usize,
}

impl GeneratorConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::default().with_output_dir(output_dir.into())
    }

    pub fn image_spec(&self) -> ImageSpec {
        ImageSpec::new(self.width, self.height)
            .with_background_color(self.bg_color)
            .with_text_color(self.text_color)
            .with_format(self.format)
            .with_quality(self.quality)
    }

    pub fn font_spec(&self) -> FontSpec {
        let mut spec = FontSpec::new();
        spec.path = self.font_path.clone();
        spec.size = self.font_size;
        spec
    }

    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig::new()
            .with_padding(self.padding)
            .with_optical_balance(self.optical_balance)
    }

    /// Sequence numbers of the batch, in order.
    pub fn numbers(&self) -> impl Iterator<Item = u64> + use<> {
        self.start_num..self.start_num + self.count
    }

    /// Check every setting before any file is touched.
    pub fn validate(&self) -> Result<()> {
        self.image_spec().validate()?;
        self.layout_config().validate()?;

        if self.font_size == Some(0) {
            return Err(Error::Configuration(
                "font size must be positive".to_string(),
            ));
        }

        if self.start_num.checked_add(self.count).is_none() {
            return Err(Error::Configuration(format!(
                "sequence {} + {} overflows",
                self.start_num, self.count
            )));
        }

        if self.prefix.contains(['/', '\\']) {
            return Err(Error::Configuration(format!(
                "prefix `{}` must not contain path separators",
                self.prefix
            )));
        }

        if self.output_dir.is_file() {
            return Err(Error::Configuration(format!(
                "output path {} is a file",
                self.output_dir.display()
            )));
        }

        Ok(())
    }
}
