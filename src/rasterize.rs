//! PDF rasterization module
//!
//! Renders PDF pages to RGB bitmaps. The production rasterizer shells out to
//! Poppler's `pdftoppm`, writing PNG pages into a temporary directory and
//! loading them back in page order.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

use crate::cleanup::{Document, PageImage};

/// Rasterization DPI used for cleaning passes
pub const DEFAULT_DPI: u32 = 300;

/// Poppler rasterizer executable
const PDFTOPPM: &str = "pdftoppm";

/// File prefix of rendered pages inside the work directory
const PAGE_PREFIX: &str = "page";

/// Rasterization error types
#[derive(Debug, Error)]
pub enum RasterizeError {
    #[error("PDF not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Required tool not found: {0}")]
    ToolNotFound(&'static str),

    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("No pages rendered from {0}")]
    NoPages(PathBuf),

    #[error("Invalid rendered page {path}: {source}")]
    InvalidPage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RasterizeError>;

/// Renders every page of a PDF to a bitmap, preserving page order
pub trait DocumentRasterizer {
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Document>;
}

/// `pdftoppm`-based rasterizer
#[derive(Debug, Clone, Default)]
pub struct PopplerRasterizer {
    /// Explicit executable path; looked up on `PATH` when `None`
    executable: Option<PathBuf>,
}

impl PopplerRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `pdftoppm` binary
    pub fn with_executable(path: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(path.into()),
        }
    }

    /// Check whether `pdftoppm` can be found
    pub fn is_available(&self) -> bool {
        self.executable().is_ok()
    }

    fn executable(&self) -> Result<PathBuf> {
        match &self.executable {
            Some(path) if path.is_file() => Ok(path.clone()),
            Some(_) => Err(RasterizeError::ToolNotFound(PDFTOPPM)),
            None => which::which(PDFTOPPM).map_err(|_| RasterizeError::ToolNotFound(PDFTOPPM)),
        }
    }
}

impl DocumentRasterizer for PopplerRasterizer {
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Document> {
        if !pdf_path.is_file() {
            return Err(RasterizeError::SourceNotFound(pdf_path.to_path_buf()));
        }

        let tool = self.executable()?;
        let work_dir = tempfile::tempdir()?;
        let prefix = work_dir.path().join(PAGE_PREFIX);

        info!(pdf = %pdf_path.display(), dpi, "Rasterizing PDF");
        let output = Command::new(&tool)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(pdf_path)
            .arg(&prefix)
            .output()?;

        if !output.status.success() {
            return Err(RasterizeError::ToolFailed {
                tool: PDFTOPPM,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let pages = collect_rendered_pages(work_dir.path(), PAGE_PREFIX)?;
        if pages.is_empty() {
            return Err(RasterizeError::NoPages(pdf_path.to_path_buf()));
        }

        let mut document = Vec::with_capacity(pages.len());
        for path in pages {
            document.push(load_page(&path)?);
        }

        info!(pages = document.len(), "Rasterized PDF");
        Ok(document)
    }
}

/// Load an image file as an RGB page
pub fn load_page(path: &Path) -> Result<PageImage> {
    let page = image::open(path)
        .map_err(|source| RasterizeError::InvalidPage {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    debug!(path = %path.display(), width = page.width(), height = page.height(), "Loaded page");
    Ok(page)
}

/// Rendered page files in `dir`, ordered by page number
///
/// `pdftoppm` pads the page number to the width of the page count
/// (`page-1.png` or `page-01.png`), so names are ordered numerically.
fn collect_rendered_pages(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut pages: Vec<(u32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let number = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| page_number_from_file_name(name, prefix));
        if let Some(number) = number {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

/// Parse the page number of `<prefix>-<n>.png`
fn page_number_from_file_name(name: &str, prefix: &str) -> Option<u32> {
    name.strip_prefix(prefix)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}
