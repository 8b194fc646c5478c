//! Image Aggregator module
//!
//! Recombines previously cleaned page images into one document.
//!
//! Loading and aggregation are separate: [`load_page_images`] reads
//! `source_image_<NNN>.jpg` files back from a folder, and [`aggregate`]
//! encodes whatever ordered pages it is given.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::cleanup::PageImage;
use crate::encode::{DocumentEncoder, EncodeError, EncodedDocument};
use crate::sink::sequential_file_name;

/// File name of the recombined document
pub const RECOMBINED_FILE_NAME: &str = "Recombined_output.pdf";

/// Aggregation error types
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("No page images to aggregate")]
    EmptyImageSet,

    #[error("Image folder not found: {0}")]
    FolderNotFound(PathBuf),

    #[error("Page image not found: {0}")]
    MissingImage(PathBuf),

    #[error("Invalid resolution: {0} (must be a positive number of dpi)")]
    InvalidResolution(f32),

    #[error("Failed to load {path}: {source}")]
    InvalidImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Encoding failed: {0}")]
    Encode(#[from] EncodeError),
}

pub type Result<T> = std::result::Result<T, AggregateError>;

/// Concatenate `images` in order into one document
///
/// `resolution` must be finite and positive.
pub fn aggregate<E: DocumentEncoder + ?Sized>(
    images: &[PageImage],
    encoder: &E,
    resolution: f32,
) -> Result<EncodedDocument> {
    if images.is_empty() {
        return Err(AggregateError::EmptyImageSet);
    }
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(AggregateError::InvalidResolution(resolution));
    }
    let document = encoder.encode(images, resolution)?;
    info!(pages = document.page_count, bytes = document.len(), "Aggregated pages");
    Ok(document)
}

/// Paths of the sequential page images to load from `folder`
///
/// With a `count`, exactly `source_image_000` .. `count - 1` must exist.
/// Without one, consecutive files are taken from `000` up to the first gap.
pub fn sequential_image_paths(folder: &Path, count: Option<usize>) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(AggregateError::FolderNotFound(folder.to_path_buf()));
    }

    let paths = match count {
        Some(count) => {
            let paths: Vec<PathBuf> = (0..count)
                .map(|index| folder.join(sequential_file_name(index)))
                .collect();
            if let Some(missing) = paths.iter().find(|path| !path.is_file()) {
                return Err(AggregateError::MissingImage(missing.clone()));
            }
            paths
        }
        None => (0..)
            .map(|index| folder.join(sequential_file_name(index)))
            .take_while(|path| path.is_file())
            .collect(),
    };

    if paths.is_empty() {
        return Err(AggregateError::EmptyImageSet);
    }
    Ok(paths)
}

/// Load the sequential page images of `folder` in order
pub fn load_page_images(folder: &Path, count: Option<usize>) -> Result<Vec<PageImage>> {
    sequential_image_paths(folder, count)?
        .iter()
        .map(|path| load_image(path))
        .collect()
}

fn load_image(path: &Path) -> Result<PageImage> {
    let image = image::open(path)
        .map_err(|source| AggregateError::InvalidImage {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    debug!(path = %path.display(), "Loaded page image");
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{DocumentFormat, PdfDocumentEncoder};
    use image::{Rgb, RgbImage};
    use std::cell::RefCell;

    /// Encoder that records the pixel of each 1x1 page it receives
    #[derive(Default)]
    struct RecordingEncoder {
        seen: RefCell<Vec<Rgb<u8>>>,
        resolution: RefCell<Option<f32>>,
    }

    impl DocumentEncoder for RecordingEncoder {
        fn encode(
            &self,
            pages: &[PageImage],
            resolution: f32,
        ) -> crate::encode::Result<EncodedDocument> {
            self.seen
                .borrow_mut()
                .extend(pages.iter().map(|page| *page.get_pixel(0, 0)));
            *self.resolution.borrow_mut() = Some(resolution);
            Ok(EncodedDocument {
                format: DocumentFormat::Pdf,
                page_count: pages.len(),
                bytes: Vec::new(),
            })
        }
    }

    fn write_pages(folder: &Path, count: usize) {
        for index in 0..count {
            RgbImage::from_pixel(4 + index as u32, 4, Rgb([255, 255, 255]))
                .save(folder.join(sequential_file_name(index)))
                .unwrap();
        }
    }

    #[test]
    fn test_aggregate_keeps_order() {
        let a = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        let b = RgbImage::from_pixel(1, 1, Rgb([0, 255, 0]));
        let c = RgbImage::from_pixel(1, 1, Rgb([0, 0, 255]));
        let encoder = RecordingEncoder::default();

        let document = aggregate(&[a, b, c], &encoder, 100.0).unwrap();

        assert_eq!(document.page_count, 3);
        assert_eq!(
            *encoder.seen.borrow(),
            vec![Rgb([255, 0, 0]), Rgb([0, 255, 0]), Rgb([0, 0, 255])]
        );
        assert_eq!(*encoder.resolution.borrow(), Some(100.0));
    }

    #[test]
    fn test_aggregate_pdf_three_single_pixel_pages() {
        let pages: Vec<RgbImage> = [[255, 0, 0], [0, 255, 0], [0, 0, 255]]
            .into_iter()
            .map(|color| RgbImage::from_pixel(1, 1, Rgb(color)))
            .collect();

        let document = aggregate(&pages, &PdfDocumentEncoder::default(), 100.0).unwrap();
        let parsed = lopdf::Document::load_mem(&document.bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 3);
    }

    #[test]
    fn test_aggregate_empty() {
        let result = aggregate(&[], &RecordingEncoder::default(), 100.0);
        assert!(matches!(result, Err(AggregateError::EmptyImageSet)));
    }

    #[test]
    fn test_aggregate_rejects_invalid_resolution() {
        let page = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        for resolution in [0.0, -100.0, f32::NAN, f32::INFINITY] {
            let encoder = RecordingEncoder::default();
            let result = aggregate(std::slice::from_ref(&page), &encoder, resolution);
            assert!(matches!(result, Err(AggregateError::InvalidResolution(_))));
            assert!(encoder.seen.borrow().is_empty());
        }
    }

    #[test]
    fn test_discover_consecutive_images() {
        let dir = tempfile::tempdir().unwrap();
        write_pages(dir.path(), 3);
        // gap at 003, 004 is not picked up
        RgbImage::new(1, 1)
            .save(dir.path().join(sequential_file_name(4)))
            .unwrap();

        let paths = sequential_image_paths(dir.path(), None).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths[2].ends_with("source_image_002.jpg"));
    }

    #[test]
    fn test_fixed_count_requires_every_image() {
        let dir = tempfile::tempdir().unwrap();
        write_pages(dir.path(), 2);

        assert_eq!(sequential_image_paths(dir.path(), Some(2)).unwrap().len(), 2);
        let result = sequential_image_paths(dir.path(), Some(3));
        assert!(matches!(result, Err(AggregateError::MissingImage(p)) if p.ends_with("source_image_002.jpg")));
    }

    #[test]
    fn test_load_page_images_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_pages(dir.path(), 3);

        let images = load_page_images(dir.path(), None).unwrap();
        let widths: Vec<u32> = images.iter().map(|image| image.width()).collect();
        assert_eq!(widths, vec![4, 5, 6]);
    }

    #[test]
    fn test_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_page_images(dir.path(), None);
        assert!(matches!(result, Err(AggregateError::EmptyImageSet)));
    }

    #[test]
    fn test_missing_folder() {
        let result = load_page_images(Path::new("/nonexistent/images"), None);
        assert!(matches!(result, Err(AggregateError::FolderNotFound(_))));
    }
}
