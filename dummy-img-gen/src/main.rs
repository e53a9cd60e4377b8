use anyhow::{Context, Result, bail};
use clap::Parser;
use dummy_img_gen::{GeneratorConfig, generate};
use placeholder_render::{Color, ImageFormat};
use std::path::PathBuf;

/// Generate numbered placeholder images for development and testing
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory to save images
    output_dir: PathBuf,

    /// Number of images to generate
    #[arg(long, default_value_t = 10)]
    count: u64,

    /// First number in sequence
    #[arg(long, default_value_t = 1)]
    start: u64,

    /// Image width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Background color (hex/name)
    #[arg(long, default_value = "#cccccc")]
    bg_color: Color,

    /// Text color (hex/name)
    #[arg(long, default_value = "#333333")]
    text_color: Color,

    /// Image format: png, jpg or webp
    #[arg(long, default_value = "png")]
    format: ImageFormat,

    /// Filename prefix
    #[arg(long, default_value = "img_")]
    prefix: String,

    /// Zero-pad numbers in filenames to this many digits (0 = plain)
    #[arg(long, default_value_t = 0)]
    pad_width: usize,

    /// Path to custom font (.ttf/.otf)
    #[arg(long)]
    font_path: Option<PathBuf>,

    /// Font size (auto-calculated if omitted)
    #[arg(long)]
    font_size: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 90)]
    jpg_quality: u8,

    /// Overwrite existing files
    #[arg(long)]
    overwrite: bool,

    /// Padding around text (0.0-0.5)
    #[arg(long, default_value_t = 0.2)]
    padding: f32,

    /// Upward nudge of the label as a fraction of its height
    #[arg(long, default_value_t = 0.03, allow_negative_numbers = true)]
    optical_balance: f32,

    /// Worker threads (0 = one per CPU)
    #[arg(short, long, default_value_t = 0)]
    jobs: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> GeneratorConfig {
        let mut config = GeneratorConfig::new(self.output_dir)
            .with_count(self.count)
            .with_start_num(self.start)
            .with_width(self.width)
            .with_height(self.height)
            .with_bg_color(self.bg_color)
            .with_text_color(self.text_color)
            .with_format(self.format)
            .with_prefix(self.prefix)
            .with_pad_width(self.pad_width)
            .with_quality(self.jpg_quality)
            .with_overwrite(self.overwrite)
            .with_padding(self.padding)
            .with_optical_balance(self.optical_balance)
            .with_jobs(self.jobs);

        config.font_path = self.font_path;
        config.font_size = self.font_size;
        config
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    dummy_img_gen::init_logger(if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });

    let config = args.into_config();
    let report = generate(&config).context("image generation failed")?;

    let (written, skipped, failed) = (
        report.written().len(),
        report.skipped().len(),
        report.failed(),
    );

    log::info!(
        "Generated {written} image(s) in {} ({} skipped, {} failed)",
        config.output_dir.display(),
        skipped,
        failed.len()
    );

    if !failed.is_empty() {
        for item in &failed {
            log::error!("#{} ({}): {}", item.index, item.number, item.error);
        }
        bail!("{} image(s) failed", failed.len());
    }

    Ok(())
}
