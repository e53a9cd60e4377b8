//! Numbered placeholder image generator.
//!
//! Drives [`placeholder_render`] over a sequence of numbers and writes one
//! file per number:
//! - [`config`]: batch configuration and eager validation
//! - [`naming`]: output file names
//! - [`generator`]: the parallel batch driver and its report

pub mod config;
pub mod generator;
pub mod naming;

pub use config::GeneratorConfig;
pub use generator::{FailedImage, GenerationReport, ImageOutcome, generate, generate_with};
pub use naming::file_name;

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Output directory {} is not writable: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Render error: {0}")]
    Render(#[from] placeholder_render::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_configuration(&self) -> bool {
        match self {
            Error::Configuration(_) | Error::OutputDir { .. } => true,
            Error::Render(e) => e.is_configuration(),
            Error::Io(_) => false,
        }
    }
}

/// Install the process-wide logger.
///
/// Format: `[HH:MM:SS LEVEL file line] message`. `RUST_LOG` overrides
/// `default_level`.
pub fn init_logger(default_level: log::LevelFilter) {
    use std::io::Write;

    env_logger::builder()
        .filter_level(default_level)
        .parse_default_env()
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            let ts = chrono::Local::now().format("%H:%M:%S");

            writeln!(
                buf,
                "[{} {style}{}{style:#} {} {}] {}",
                ts,
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}
