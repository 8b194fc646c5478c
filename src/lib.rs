//! pdfcleaner - Remove colored annotations from scanned PDF pages
//!
//! Scanned pages are rasterized, every pixel is forced to white or black
//! (or left untouched inside a protected band), and the cleaned pages are
//! written as JPEG images that can later be recombined into one PDF.
//!
//! # Modules
//!
//! - [`cleanup`] - Pixel classification and page processing
//! - [`rasterize`] - PDF to bitmap rendering via Poppler
//! - [`sink`] - Destinations for cleaned pages
//! - [`encode`] - JPEG and PDF encoding
//! - [`aggregate`] - Recombination of stored pages
//! - [`pipeline`] - Top-level clean, tweak and recombine operations
//! - [`config`] - TOML configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use pdfcleaner::{CleanPipeline, Config, NoopProgress};
//!
//! let config = Config::load().unwrap_or_default();
//! let pipeline = CleanPipeline::new(config);
//! let report = pipeline.clean_document(&NoopProgress).unwrap();
//! println!("Cleaned {} pages", report.pages);
//! ```

pub mod aggregate;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod encode;
pub mod pipeline;
pub mod progress;
pub mod rasterize;
pub mod sink;

pub use aggregate::{
    aggregate, load_page_images, sequential_image_paths, AggregateError, RECOMBINED_FILE_NAME,
};
pub use cleanup::{
    class_of, classify, process_document, process_page, process_page_with_stats,
    ClassificationPolicy, ClassificationPolicyBuilder, CleanupError, Coordinate, Document,
    PageImage, PaletteStats, PixelClass, BLACK, WHITE,
};
pub use cli::{CleanArgs, Cli, Commands, CommonArgs, RecombineArgs, TweakArgs};
pub use config::{CliOverrides, Config, ConfigError};
pub use encode::{
    DocumentEncoder, DocumentFormat, EncodeError, EncodedDocument, JpegPageEncoder,
    PdfDocumentEncoder,
};
pub use pipeline::{CleanPipeline, CleanReport, ErrorKind, PipelineError, RecombineReport};
pub use progress::{ConsoleProgress, NoopProgress, OutputMode, ProcessingStage, ProgressCallback};
pub use rasterize::{DocumentRasterizer, PopplerRasterizer, RasterizeError};
pub use sink::{DirectorySink, MemorySink, OutputNaming, PageSink, SinkError};

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGS: i32 = 2;
    pub const INPUT_NOT_FOUND: i32 = 3;
    pub const PRECONDITION_FAILED: i32 = 4;
    pub const IO_FAILURE: i32 = 5;
}
