//! Pipeline module
//!
//! Wires configuration, rasterization, cleaning, storage and recombination
//! into the three top-level operations:
//!
//! - [`CleanPipeline::clean_document`] - clean every page of a PDF into `source_image_<NNN>.jpg`
//! - [`CleanPipeline::tweak_document`] - clean a one-page PDF with a protected top band
//! - [`CleanPipeline::recombine`] - join stored pages into `Recombined_output.pdf`

use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

use crate::aggregate::{aggregate, load_page_images, AggregateError, RECOMBINED_FILE_NAME};
use crate::cleanup::{process_document, ClassificationPolicy, CleanupError, PaletteStats};
use crate::config::{Config, ConfigError};
use crate::encode::{EncodeError, PdfDocumentEncoder};
use crate::progress::{ProcessingStage, ProgressCallback};
use crate::rasterize::{DocumentRasterizer, PopplerRasterizer, RasterizeError};
use crate::sink::{DirectorySink, OutputNaming, SinkError};

// ============================================================
// Error Types
// ============================================================

/// Broad failure category of a pipeline error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input or configuration does not satisfy a requirement
    Precondition,
    /// Reading, writing, rendering or encoding failed
    Io,
}

/// Pipeline error types
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Source PDF not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Expected {expected} page(s) in {path}, found {actual}")]
    PageCount {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cleanup(#[from] CleanupError),

    #[error(transparent)]
    Rasterize(#[from] RasterizeError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Classify the error as a precondition violation or an I/O failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::SourceNotFound(_)
            | PipelineError::PageCount { .. }
            | PipelineError::Config(ConfigError::Missing(_)) => ErrorKind::Precondition,
            PipelineError::Config(_) => ErrorKind::Io,
            PipelineError::Cleanup(CleanupError::Sink { .. }) => ErrorKind::Io,
            PipelineError::Cleanup(_) => ErrorKind::Precondition,
            PipelineError::Rasterize(RasterizeError::SourceNotFound(_))
            | PipelineError::Rasterize(RasterizeError::NoPages(_)) => ErrorKind::Precondition,
            PipelineError::Rasterize(_) => ErrorKind::Io,
            PipelineError::Aggregate(
                AggregateError::EmptyImageSet
                | AggregateError::FolderNotFound(_)
                | AggregateError::MissingImage(_)
                | AggregateError::InvalidResolution(_)
                | AggregateError::Encode(
                    EncodeError::EmptyInput
                    | EncodeError::PageCount { .. }
                    | EncodeError::InvalidResolution(_),
                ),
            ) => ErrorKind::Precondition,
            PipelineError::Aggregate(_) => ErrorKind::Io,
            PipelineError::Encode(
                EncodeError::EmptyInput
                | EncodeError::PageCount { .. }
                | EncodeError::InvalidResolution(_),
            ) => ErrorKind::Precondition,
            PipelineError::Encode(_) | PipelineError::Sink(_) | PipelineError::Io(_) => {
                ErrorKind::Io
            }
        }
    }

    pub fn is_precondition(&self) -> bool {
        self.kind() == ErrorKind::Precondition
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// ============================================================
// Reports
// ============================================================

/// Outcome of a clean or tweak run
#[derive(Debug, Clone)]
pub struct CleanReport {
    /// Source PDF
    pub source: PathBuf,
    /// Number of pages cleaned
    pub pages: usize,
    /// Files written, in page order
    pub written: Vec<PathBuf>,
    /// Palette counts over all pages
    pub stats: PaletteStats,
    pub elapsed_seconds: f64,
}

/// Outcome of a recombine run
#[derive(Debug, Clone)]
pub struct RecombineReport {
    /// Number of pages in the output document
    pub pages: usize,
    /// Written PDF
    pub output: PathBuf,
    /// Size of the PDF in bytes
    pub output_size: u64,
    pub elapsed_seconds: f64,
}

// ============================================================
// Pipeline
// ============================================================

/// Annotation cleaning pipeline
pub struct CleanPipeline<R = PopplerRasterizer> {
    config: Config,
    rasterizer: R,
}

impl CleanPipeline<PopplerRasterizer> {
    /// Pipeline using `pdftoppm` for rasterization
    pub fn new(config: Config) -> Self {
        Self::with_rasterizer(config, PopplerRasterizer::new())
    }
}

impl<R: DocumentRasterizer> CleanPipeline<R> {
    pub fn with_rasterizer(config: Config, rasterizer: R) -> Self {
        Self { config, rasterizer }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Clean every page of the configured PDF into `source_image_<NNN>.jpg`
    pub fn clean_document(&self, progress: &dyn ProgressCallback) -> Result<CleanReport> {
        let source = self.config.source_pdf()?;
        let output = self.config.output_folder()?;
        let policy = self.config.policy.without_region();
        self.run(&source, output, OutputNaming::Sequential, &policy, None, progress)
    }

    /// Clean a single-page PDF, leaving rows above `region_y` untouched
    ///
    /// Uses the configured `tweak_region_threshold` when `region_y` is `None`.
    pub fn tweak_document(
        &self,
        source: &Path,
        region_y: Option<u32>,
        progress: &dyn ProgressCallback,
    ) -> Result<CleanReport> {
        let output = self.config.output_folder()?;
        let policy = ClassificationPolicy {
            region_threshold: Some(region_y.unwrap_or(self.config.tweak_region_threshold)),
            ..self.config.policy
        };
        self.run(
            source,
            output,
            OutputNaming::tweaked(source),
            &policy,
            Some(1),
            progress,
        )
    }

    /// Join the stored page images into `Recombined_output.pdf`
    pub fn recombine(&self, progress: &dyn ProgressCallback) -> Result<RecombineReport> {
        let start = Instant::now();
        let input = self.config.input_image_folder()?;
        let output_folder = self.config.output_folder()?;

        progress.on_step_start(ProcessingStage::Loading.name());
        let images = load_page_images(input, self.config.recombine_count)?;
        progress.on_step_complete(
            ProcessingStage::Loading.name(),
            &format!("{} image(s) from {}", images.len(), input.display()),
        );

        progress.on_step_start(ProcessingStage::Recombining.name());
        let encoder = PdfDocumentEncoder::new(self.config.jpeg_quality);
        let document = aggregate(&images, &encoder, self.config.recombine_resolution)?;
        drop(images);

        std::fs::create_dir_all(output_folder)?;
        let output = output_folder.join(RECOMBINED_FILE_NAME);
        let output_size = document.save(&output)?;
        progress.on_step_complete(
            ProcessingStage::Recombining.name(),
            &format!("{}", output.display()),
        );

        info!(
            pages = document.page_count,
            output = %output.display(),
            bytes = output_size,
            "Recombined document"
        );

        Ok(RecombineReport {
            pages: document.page_count,
            output,
            output_size,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }

    fn run(
        &self,
        source: &Path,
        output: &Path,
        naming: OutputNaming,
        policy: &ClassificationPolicy,
        required_pages: Option<usize>,
        progress: &dyn ProgressCallback,
    ) -> Result<CleanReport> {
        let start = Instant::now();
        if !source.is_file() {
            return Err(PipelineError::SourceNotFound(source.to_path_buf()));
        }
        info!(source = %source.display(), "Source PDF");

        progress.on_step_start(ProcessingStage::Rasterizing.name());
        let document = self.rasterizer.rasterize(source, self.config.dpi)?;
        progress.on_step_complete(
            ProcessingStage::Rasterizing.name(),
            &format!("{} page(s) at {} dpi", document.len(), self.config.dpi),
        );

        if let Some(expected) = required_pages {
            if document.len() != expected {
                return Err(PipelineError::PageCount {
                    path: source.to_path_buf(),
                    expected,
                    actual: document.len(),
                });
            }
        }

        let mut sink = DirectorySink::create(output, naming)?
            .with_jpeg_quality(self.config.jpeg_quality)
            .with_resolution(self.config.dpi);
        let stats = process_document(&document, policy, &mut sink, progress)?;

        Ok(CleanReport {
            source: source.to_path_buf(),
            pages: document.len(),
            written: sink.into_written(),
            stats,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }
}

// ============================================================
// Tests
// ============================================================
