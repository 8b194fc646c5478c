//! Page sink module
//!
//! Destinations for cleaned pages, keyed by their page index.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::cleanup::PageImage;
use crate::encode::{DocumentEncoder, EncodeError, JpegPageEncoder};

/// File name prefix of batch-cleaned pages
pub const SEQUENTIAL_PREFIX: &str = "source_image_";

/// Suffix appended to the source name of a tweaked page
pub const TWEAKED_SUFFIX: &str = "_tweaked";

/// Extension of stored pages
pub const PAGE_EXTENSION: &str = "jpg";

/// Sink error types
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: EncodeError,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives cleaned pages in document order
pub trait PageSink {
    /// Store the cleaned page with the given zero-based index
    fn put(&mut self, index: usize, page: &PageImage) -> Result<(), SinkError>;
}

/// How stored pages are named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNaming {
    /// `source_image_<NNN>`
    Sequential,
    /// `<source_name>_tweaked`
    Tweaked { source_name: String },
}

impl OutputNaming {
    /// Naming for a tweak of the given source document
    pub fn tweaked(source: &Path) -> Self {
        let source_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        OutputNaming::Tweaked { source_name }
    }

    /// Name without extension
    pub fn stem(&self, index: usize) -> String {
        match self {
            OutputNaming::Sequential => sequential_stem(index),
            OutputNaming::Tweaked { source_name } => format!("{}{}", source_name, TWEAKED_SUFFIX),
        }
    }

    /// File name including the extension
    pub fn file_name(&self, index: usize) -> String {
        format!("{}.{}", self.stem(index), PAGE_EXTENSION)
    }
}

/// `source_image_<NNN>` for a page index
pub fn sequential_stem(index: usize) -> String {
    format!("{}{:03}", SEQUENTIAL_PREFIX, index)
}

/// `source_image_<NNN>.jpg` for a page index
pub fn sequential_file_name(index: usize) -> String {
    format!("{}.{}", sequential_stem(index), PAGE_EXTENSION)
}

// ============================================================
// Directory sink
// ============================================================

/// Writes each page as a JPEG file into a folder
#[derive(Debug)]
pub struct DirectorySink {
    folder: PathBuf,
    naming: OutputNaming,
    encoder: JpegPageEncoder,
    resolution: f32,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Create a sink, creating the folder if needed
    pub fn create(folder: impl Into<PathBuf>, naming: OutputNaming) -> Result<Self, SinkError> {
        let folder = folder.into();
        std::fs::create_dir_all(&folder)?;
        Ok(Self {
            folder,
            naming,
            encoder: JpegPageEncoder::default(),
            resolution: 0.0,
            written: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.encoder = JpegPageEncoder::new(quality);
        self
    }

    /// Record the rasterization dpi in the JPEG header
    ///
    /// Without it no density is written.
    #[must_use]
    pub fn with_resolution(mut self, dpi: u32) -> Self {
        self.resolution = dpi as f32;
        self
    }

    pub fn encoder(&self) -> &JpegPageEncoder {
        &self.encoder
    }

    /// Path a page with this index is written to
    pub fn path_for(&self, index: usize) -> PathBuf {
        self.folder.join(self.naming.file_name(index))
    }

    /// Files written so far, in order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn into_written(self) -> Vec<PathBuf> {
        self.written
    }
}

impl PageSink for DirectorySink {
    fn put(&mut self, index: usize, page: &PageImage) -> Result<(), SinkError> {
        let path = self.path_for(index);
        let encoded = self
            .encoder
            .encode(std::slice::from_ref(page), self.resolution)
            .map_err(|source| SinkError::Encode {
                path: path.clone(),
                source,
            })?;
        std::fs::write(&path, &encoded.bytes).map_err(|source| SinkError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(index, path = %path.display(), "Stored page");
        self.written.push(path);
        Ok(())
    }
}

// ============================================================
// Memory sink
// ============================================================

/// Keeps pages in memory, mainly for tests and library callers
#[derive(Debug, Default)]
pub struct MemorySink {
    pub pages: Vec<(usize, PageImage)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices in the order they were stored
    pub fn indices(&self) -> Vec<usize> {
        self.pages.iter().map(|(index, _)| *index).collect()
    }
}

impl PageSink for MemorySink {
    fn put(&mut self, index: usize, page: &PageImage) -> Result<(), SinkError> {
        self.pages.push((index, page.clone()));
        Ok(())
    }
}
