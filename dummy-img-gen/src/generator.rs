//! Batch driver: renders every number of a [`GeneratorConfig`] and writes the
//! encoded images to disk.
//!
//! Configuration problems abort before any file is written. Once rendering
//! starts, each image succeeds, is skipped or fails on its own; one broken
//! image never stops the rest of the batch.

use crate::{Error, GeneratorConfig, Result, naming};
use placeholder_render::{ImageSpec, Renderer, TextBackend};
use rayon::prelude::*;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

#[derive(Debug)]
pub struct FailedImage {
    /// Position in the batch, starting at 0
    pub index: u64,
    pub number: u64,
    pub path: PathBuf,
    pub error: Error,
}

#[derive(Debug)]
pub enum ImageOutcome {
    Written(PathBuf),
    /// Target existed and overwriting was disabled
    Skipped(PathBuf),
    Failed(FailedImage),
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    /// One entry per number, in sequence order
    pub outcomes: Vec<ImageOutcome>,
}

impl GenerationReport {
    pub fn written(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ImageOutcome::Written(path) => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ImageOutcome::Skipped(path) => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }

    pub fn failed(&self) -> Vec<&FailedImage> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ImageOutcome::Failed(failed) => Some(failed),
                _ => None,
            })
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed().is_empty()
    }

    /// Paths of written images, consuming the report.
    pub fn into_written(self) -> Vec<PathBuf> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                ImageOutcome::Written(path) => Some(path),
                _ => None,
            })
            .collect()
    }
}

/// Generate the batch with the configured (or system default) font.
pub fn generate(config: &GeneratorConfig) -> Result<GenerationReport> {
    config.validate()?;
    let renderer = Renderer::from_font_spec(&config.font_spec(), config.layout_config())?;

    prepare_output_dir(&config.output_dir)?;
    run(config, &renderer)
}

/// Generate the batch with a caller-provided text backend.
pub fn generate_with<B>(config: &GeneratorConfig, backend: B) -> Result<GenerationReport>
where
    B: TextBackend + Sync,
{
    config.validate()?;
    prepare_output_dir(&config.output_dir)?;

    let renderer = Renderer::new(backend, config.layout_config(), config.font_size);
    run(config, &renderer)
}

fn prepare_output_dir(dir: &Path) -> Result<()> {
    let output_dir_error = |source| Error::OutputDir {
        path: dir.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(output_dir_error)?;

    // Probe with a real file, directory permissions alone are not reliable.
    NamedTempFile::new_in(dir).map_err(output_dir_error)?;
    Ok(())
}

fn run<B>(config: &GeneratorConfig, renderer: &Renderer<B>) -> Result<GenerationReport>
where
    B: TextBackend + Sync,
{
    let spec = config.image_spec();
    let items: Vec<(u64, u64)> = config
        .numbers()
        .enumerate()
        .map(|(index, number)| (index as u64, number))
        .collect();

    log::info!(
        "generating {} {}x{} {} image(s) into {}",
        items.len(),
        config.width,
        config.height,
        config.format,
        config.output_dir.display()
    );

    let render_all = || {
        items
            .par_iter()
            .map(|&(index, number)| render_one(config, renderer, &spec, index, number))
            .collect::<Vec<_>>()
    };

    let outcomes = if config.jobs > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to start worker pool: {e}")))?
            .install(render_all)
    } else {
        render_all()
    };

    Ok(GenerationReport { outcomes })
}

fn render_one<B: TextBackend>(
    config: &GeneratorConfig,
    renderer: &Renderer<B>,
    spec: &ImageSpec,
    index: u64,
    number: u64,
) -> ImageOutcome {
    let path = config.output_dir.join(naming::file_name(
        &config.prefix,
        number,
        config.pad_width,
        config.format,
    ));

    if !config.overwrite && path.exists() {
        log::info!("Skipping {} (already exists)", path.display());
        return ImageOutcome::Skipped(path);
    }

    let written = renderer
        .render(spec, &naming::label(number))
        .map_err(Error::from)
        .and_then(|bytes| write_image(&config.output_dir, &path, &bytes, config.overwrite));

    match written {
        Ok(true) => {
            log::info!("Generated: {}", path.display());
            ImageOutcome::Written(path)
        }
        Ok(false) => {
            log::info!("Skipping {} (already exists)", path.display());
            ImageOutcome::Skipped(path)
        }
        Err(error) => {
            log::error!("Error generating {}: {error}", path.display());
            ImageOutcome::Failed(FailedImage {
                index,
                number,
                path,
                error,
            })
        }
    }
}

/// Write through a temporary file in `dir` so a failed write never leaves a
/// truncated image behind. Returns `false` when the target appeared in the
/// meantime and `overwrite` is off.
fn write_image(dir: &Path, path: &Path, bytes: &[u8], overwrite: bool) -> Result<bool> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    let persisted = if overwrite {
        tmp.persist(path)
    } else {
        tmp.persist_noclobber(path)
    };

    match persisted {
        Ok(_) => Ok(true),
        Err(e) if !overwrite && e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_image_respects_overwrite() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("img_1.png");

        assert!(write_image(dir.path(), &path, b"first", false)?);
        assert!(!write_image(dir.path(), &path, b"second", false)?);
        assert_eq!(fs::read(&path)?, b"first");

        assert!(write_image(dir.path(), &path, b"third", true)?);
        assert_eq!(fs::read(&path)?, b"third");

        // No temporary files left behind.
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_prepare_output_dir_creates_nested() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("a").join("b");

        prepare_output_dir(&nested)?;
        assert!(nested.is_dir());
        assert_eq!(fs::read_dir(&nested)?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_prepare_output_dir_on_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("file");
        fs::write(&file, b"x")?;

        let err = prepare_output_dir(&file).unwrap_err();
        assert!(matches!(err, Error::OutputDir { .. }));
        assert!(err.is_configuration());
        Ok(())
    }

    #[test]
    fn test_report_accessors() {
        let report = GenerationReport {
            outcomes: vec![
                ImageOutcome::Written(PathBuf::from("a.png")),
                ImageOutcome::Skipped(PathBuf::from("b.png")),
                ImageOutcome::Failed(FailedImage {
                    index: 2,
                    number: 3,
                    path: PathBuf::from("c.png"),
                    error: Error::Configuration("boom".to_string()),
                }),
                ImageOutcome::Written(PathBuf::from("d.png")),
            ],
        };

        assert_eq!(report.written(), vec![Path::new("a.png"), Path::new("d.png")]);
        assert_eq!(report.skipped(), vec![Path::new("b.png")]);
        assert_eq!(report.failed()[0].number, 3);
        assert!(!report.is_success());
        assert_eq!(
            report.into_written(),
            vec![PathBuf::from("a.png"), PathBuf::from("d.png")]
        );
    }
}
