//! Document encoding module
//!
//! Turns cleaned pages back into files: a standalone JPEG for a single page,
//! or a multi-page PDF where every page is one embedded JPEG image.
//!
//! # Example
//!
//! ```rust,no_run
//! use pdfcleaner::{DocumentEncoder, PdfDocumentEncoder};
//! use image::RgbImage;
//!
//! let pages = vec![RgbImage::new(850, 1100), RgbImage::new(850, 1100)];
//! let document = PdfDocumentEncoder::default().encode(&pages, 100.0).unwrap();
//! document.save(std::path::Path::new("Recombined_output.pdf")).unwrap();
//! ```

use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::cleanup::PageImage;

// ============================================================
// Constants
// ============================================================

/// Default JPEG quality for cleaned pages
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Default resolution (dpi) of a recombined document
pub const DEFAULT_RECOMBINE_RESOLUTION: f32 = 100.0;

/// PDF user space units per inch
const POINTS_PER_INCH: f32 = 72.0;

/// PDF version written by the encoder
const PDF_VERSION: &str = "1.5";

// ============================================================
// Error Types
// ============================================================

/// Encoding error types
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("No pages to encode")]
    EmptyInput,

    #[error("Expected {expected} page(s), got {actual}")]
    PageCount { expected: usize, actual: usize },

    #[error("Invalid resolution: {0}")]
    InvalidResolution(f32),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EncodeError>;

// ============================================================
// Encoded output
// ============================================================

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Jpeg,
    Pdf,
}

impl DocumentFormat {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Jpeg => "jpg",
            DocumentFormat::Pdf => "pdf",
        }
    }
}

/// An encoded document held in memory
#[derive(Debug, Clone)]
pub struct EncodedDocument {
    pub format: DocumentFormat,
    pub page_count: usize,
    pub bytes: Vec<u8>,
}

impl EncodedDocument {
    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the document to `path`, returning the number of bytes written
    pub fn save(&self, path: &Path) -> Result<u64> {
        std::fs::write(path, &self.bytes)?;
        debug!(path = %path.display(), bytes = self.bytes.len(), "Saved encoded document");
        Ok(self.bytes.len() as u64)
    }
}

// ============================================================
// Encoders
// ============================================================

/// Encodes an ordered sequence of pages into one document
pub trait DocumentEncoder {
    /// Encode `pages` in order at `resolution` dots per inch
    fn encode(&self, pages: &[PageImage], resolution: f32) -> Result<EncodedDocument>;
}

/// Encode one page as JPEG bytes
fn encode_jpeg(page: &PageImage, quality: u8, resolution: Option<u16>) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
        if let Some(dpi) = resolution {
            encoder.set_pixel_density(PixelDensity::dpi(dpi));
        }
        encoder.encode_image(page)?;
    }
    Ok(bytes)
}

/// Single-page JPEG encoder
#[derive(Debug, Clone, Copy)]
pub struct JpegPageEncoder {
    quality: u8,
}

impl Default for JpegPageEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl JpegPageEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl DocumentEncoder for JpegPageEncoder {
    fn encode(&self, pages: &[PageImage], resolution: f32) -> Result<EncodedDocument> {
        let page = match pages {
            [] => return Err(EncodeError::EmptyInput),
            [page] => page,
            _ => {
                return Err(EncodeError::PageCount {
                    expected: 1,
                    actual: pages.len(),
                })
            }
        };
        let dpi = (resolution.is_finite() && resolution >= 1.0)
            .then(|| resolution.round().min(u16::MAX as f32) as u16);

        Ok(EncodedDocument {
            format: DocumentFormat::Jpeg,
            page_count: 1,
            bytes: encode_jpeg(page, self.quality, dpi)?,
        })
    }
}

/// Multi-page PDF encoder
///
/// Each page becomes a DCT-compressed image XObject drawn over the whole
/// media box; the page size follows from the pixel size and the resolution.
#[derive(Debug, Clone, Copy)]
pub struct PdfDocumentEncoder {
    jpeg_quality: u8,
}

impl Default for PdfDocumentEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl PdfDocumentEncoder {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Page size in points for a page of `pixels` at `resolution` dpi
    fn to_points(pixels: u32, resolution: f32) -> f32 {
        pixels as f32 / resolution * POINTS_PER_INCH
    }

    fn add_page(
        &self,
        doc: &mut Document,
        pages_id: ObjectId,
        page: &PageImage,
        resolution: f32,
    ) -> Result<ObjectId> {
        let (width, height) = page.dimensions();
        let jpeg = encode_jpeg(page, self.jpeg_quality, None)?;

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));

        let width_pt = Self::to_points(width, resolution);
        let height_pt = Self::to_points(height, resolution);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width_pt.into(),
                        Object::Integer(0),
                        Object::Integer(0),
                        height_pt.into(),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                width_pt.into(),
                height_pt.into(),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });

        Ok(page_id)
    }
}

impl DocumentEncoder for PdfDocumentEncoder {
    fn encode(&self, pages: &[PageImage], resolution: f32) -> Result<EncodedDocument> {
        if pages.is_empty() {
            return Err(EncodeError::EmptyInput);
        }
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(EncodeError::InvalidResolution(resolution));
        }

        let mut doc = Document::with_version(PDF_VERSION);
        let pages_id = doc.new_object_id();

        let mut kids = Vec::with_capacity(pages.len());
        for page in pages {
            let page_id = self.add_page(&mut doc, pages_id, page, resolution)?;
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;

        debug!(pages = page_count, bytes = bytes.len(), resolution, "Encoded PDF");

        Ok(EncodedDocument {
            format: DocumentFormat::Pdf,
            page_count,
            bytes,
        })
    }
}

// ============================================================
// Tests
// ============================================================
