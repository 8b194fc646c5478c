//! Page Processor
//!
//! Maps every pixel of a page through the classifier and feeds cleaned pages
//! of a document to a [`PageSink`] in source order.
//!
//! Rows are classified in parallel with rayon. The classifier only looks at
//! one pixel and its coordinate, so the result equals a sequential pass.

use image::Rgb;
use rayon::prelude::*;
use std::ops::AddAssign;
use tracing::{debug, info};

use super::classifier::{class_of, ClassificationPolicy, PixelClass};
use super::types::{CleanupError, Coordinate, PageImage, Result};
use crate::progress::{ProcessingStage, ProgressCallback};
use crate::sink::PageSink;

/// Bytes per RGB pixel
const CHANNELS: usize = 3;

/// Palette counts of a cleaned page or document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaletteStats {
    /// Pixels painted white
    pub white: u64,
    /// Pixels painted black
    pub black: u64,
    /// Pixels left untouched by the protected region
    pub passthrough: u64,
}

impl PaletteStats {
    fn record(&mut self, class: PixelClass) {
        match class {
            PixelClass::Passthrough => self.passthrough += 1,
            PixelClass::Ink | PixelClass::GrayInk => self.black += 1,
            PixelClass::Background
            | PixelClass::Annotation
            | PixelClass::GrayPaper
            | PixelClass::MidTone => self.white += 1,
        }
    }

    /// Total classified pixels
    pub fn total(&self) -> u64 {
        self.white + self.black + self.passthrough
    }

    /// Share of black pixels in percent
    pub fn black_percent(&self) -> f64 {
        Self::percent(self.black, self.total())
    }

    /// Share of untouched pixels in percent
    pub fn passthrough_percent(&self) -> f64 {
        Self::percent(self.passthrough, self.total())
    }

    fn percent(part: u64, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        part as f64 / total as f64 * 100.0
    }
}

impl AddAssign for PaletteStats {
    fn add_assign(&mut self, other: Self) {
        self.white += other.white;
        self.black += other.black;
        self.passthrough += other.passthrough;
    }
}

/// Clean a page, returning a fresh page of the same dimensions
pub fn process_page(page: &PageImage, policy: &ClassificationPolicy) -> PageImage {
    process_page_with_stats(page, policy).0
}

/// Clean a page and count the resulting palette
pub fn process_page_with_stats(
    page: &PageImage,
    policy: &ClassificationPolicy,
) -> (PageImage, PaletteStats) {
    let mut cleaned = page.clone();
    let row_len = cleaned.width() as usize * CHANNELS;
    if row_len == 0 {
        return (cleaned, PaletteStats::default());
    }

    let buffer: &mut [u8] = &mut cleaned;
    let stats = buffer
        .par_chunks_mut(row_len)
        .enumerate()
        .map(|(y, row)| {
            let mut row_stats = PaletteStats::default();
            for (x, pixel) in row.chunks_exact_mut(CHANNELS).enumerate() {
                let original = Rgb([pixel[0], pixel[1], pixel[2]]);
                let class = class_of(original, Coordinate::new(x as u32, y as u32), policy);
                pixel.copy_from_slice(&class.output(original).0);
                row_stats.record(class);
            }
            row_stats
        })
        .reduce(PaletteStats::default, |mut acc, row_stats| {
            acc += row_stats;
            acc
        });

    (cleaned, stats)
}

/// Reject an empty document or any page with a zero dimension
pub fn validate_document(document: &[PageImage]) -> Result<()> {
    if document.is_empty() {
        return Err(CleanupError::EmptyDocument);
    }
    for (index, page) in document.iter().enumerate() {
        let (width, height) = page.dimensions();
        if width == 0 || height == 0 {
            return Err(CleanupError::DegeneratePage {
                index,
                width,
                height,
            });
        }
    }
    Ok(())
}

/// Clean every page of a document in order and store it in `sink`
///
/// All pages are validated before any pixel work. A sink failure stops the
/// run; pages stored before it stay in the sink.
pub fn process_document<S: PageSink + ?Sized>(
    document: &[PageImage],
    policy: &ClassificationPolicy,
    sink: &mut S,
    progress: &dyn ProgressCallback,
) -> Result<PaletteStats> {
    validate_document(document)?;

    let total = document.len();
    let mut totals = PaletteStats::default();
    progress.on_step_start(ProcessingStage::Cleaning.name());

    for (index, page) in document.iter().enumerate() {
        let (cleaned, stats) = process_page_with_stats(page, policy);
        sink.put(index, &cleaned)
            .map_err(|source| CleanupError::Sink { index, source })?;

        debug!(
            page = index,
            width = cleaned.width(),
            height = cleaned.height(),
            black_percent = stats.black_percent(),
            passthrough = stats.passthrough,
            "Cleaned page"
        );
        progress.on_debug(&format!(
            "page {:03}: {}x{}, black {:.2}%, protected {}",
            index,
            cleaned.width(),
            cleaned.height(),
            stats.black_percent(),
            stats.passthrough
        ));
        totals += stats;
        progress.on_step_progress(index + 1, total);
    }

    info!(pages = total, black = totals.black, white = totals.white, "Document cleaned");
    progress.on_step_complete(
        ProcessingStage::Cleaning.name(),
        &format!("{} page(s)", total),
    );

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::{BLACK, WHITE};
    use crate::progress::NoopProgress;
    use crate::sink::{MemorySink, SinkError};
    use image::RgbImage;
    use std::cell::RefCell;

    fn annotated_page() -> RgbImage {
        // text rows, red pen, paper
        RgbImage::from_fn(8, 6, |x, y| match (x + y) % 3 {
            0 => Rgb([20, 20, 20]),
            1 => Rgb([220, 10, 10]),
            _ => Rgb([250, 250, 250]),
        })
    }

    struct FailingSink {
        fail_at: usize,
        stored: Vec<usize>,
    }

    impl PageSink for FailingSink {
        fn put(&mut self, index: usize, _page: &PageImage) -> std::result::Result<(), SinkError> {
            if index == self.fail_at {
                return Err(SinkError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.stored.push(index);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        steps: RefCell<Vec<(usize, usize)>>,
        debug: RefCell<Vec<String>>,
    }

    impl ProgressCallback for RecordingProgress {
        fn on_step_start(&self, _step: &str) {}
        fn on_step_progress(&self, current: usize, total: usize) {
            self.steps.borrow_mut().push((current, total));
        }
        fn on_step_complete(&self, _step: &str, _message: &str) {}
        fn on_debug(&self, message: &str) {
            self.debug.borrow_mut().push(message.to_string());
        }
    }

    #[test]
    fn test_process_page_preserves_shape() {
        let page = RgbImage::new(13, 7);
        let cleaned = process_page(&page, &ClassificationPolicy::default());
        assert_eq!(cleaned.dimensions(), (13, 7));
    }

    #[test]
    fn test_process_page_maps_every_pixel() {
        let page = annotated_page();
        let policy = ClassificationPolicy::default();
        let cleaned = process_page(&page, &policy);

        for (x, y, pixel) in cleaned.enumerate_pixels() {
            let expected = if (x + y) % 3 == 0 { BLACK } else { WHITE };
            assert_eq!(*pixel, expected, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn test_process_page_does_not_touch_input() {
        let page = annotated_page();
        let before = page.clone();
        let _ = process_page(&page, &ClassificationPolicy::default());
        assert_eq!(page, before);
    }

    #[test]
    fn test_process_page_region_passthrough() {
        let page = RgbImage::from_pixel(4, 10, Rgb([100, 150, 120]));
        let (cleaned, stats) = process_page_with_stats(&page, &ClassificationPolicy::tweak(3));

        for (_, y, pixel) in cleaned.enumerate_pixels() {
            if y < 3 {
                assert_eq!(*pixel, Rgb([100, 150, 120]));
            } else {
                assert_eq!(*pixel, WHITE);
            }
        }
        assert_eq!(stats.passthrough, 12);
        assert_eq!(stats.white, 28);
        assert_eq!(stats.total(), 40);
    }

    #[test]
    fn test_palette_stats() {
        let page = annotated_page();
        let (_, stats) = process_page_with_stats(&page, &ClassificationPolicy::default());
        assert_eq!(stats.total(), 48);
        assert_eq!(stats.black, 16);
        assert_eq!(stats.white, 32);
        assert!((stats.black_percent() - 33.333).abs() < 0.01);
        assert_eq!(stats.passthrough_percent(), 0.0);
        assert_eq!(PaletteStats::default().black_percent(), 0.0);
    }

    #[test]
    fn test_process_document_order() {
        let document = vec![annotated_page(), RgbImage::new(2, 2), annotated_page()];
        let mut sink = MemorySink::new();
        let progress = RecordingProgress::default();

        let totals =
            process_document(&document, &ClassificationPolicy::default(), &mut sink, &progress)
                .unwrap();

        assert_eq!(sink.indices(), vec![0, 1, 2]);
        assert_eq!(sink.pages[1].1.dimensions(), (2, 2));
        assert_eq!(totals.total(), 48 + 4 + 48);
        assert_eq!(*progress.steps.borrow(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_process_document_reports_page_detail() {
        let document = vec![annotated_page(), RgbImage::from_pixel(2, 2, WHITE)];
        let mut sink = MemorySink::new();
        let progress = RecordingProgress::default();

        process_document(&document, &ClassificationPolicy::default(), &mut sink, &progress)
            .unwrap();

        let debug = progress.debug.borrow();
        assert_eq!(debug.len(), 2);
        assert_eq!(debug[0], "page 000: 8x6, black 33.33%, protected 0");
        assert_eq!(debug[1], "page 001: 2x2, black 0.00%, protected 0");
    }

    #[test]
    fn test_process_document_empty() {
        let mut sink = MemorySink::new();
        let result =
            process_document(&[], &ClassificationPolicy::default(), &mut sink, &NoopProgress);
        assert!(matches!(result, Err(CleanupError::EmptyDocument)));
    }

    #[test]
    fn test_process_document_degenerate_page_fails_before_work() {
        let document = vec![annotated_page(), RgbImage::new(0, 5)];
        let mut sink = MemorySink::new();
        let result =
            process_document(&document, &ClassificationPolicy::default(), &mut sink, &NoopProgress);

        assert!(matches!(
            result,
            Err(CleanupError::DegeneratePage {
                index: 1,
                width: 0,
                height: 5
            })
        ));
        assert!(sink.pages.is_empty());
    }

    #[test]
    fn test_process_document_sink_failure_keeps_earlier_pages() {
        let document = vec![annotated_page(), annotated_page(), annotated_page()];
        let mut sink = FailingSink {
            fail_at: 1,
            stored: Vec::new(),
        };
        let result =
            process_document(&document, &ClassificationPolicy::default(), &mut sink, &NoopProgress);

        assert!(matches!(result, Err(CleanupError::Sink { index: 1, .. })));
        assert_eq!(sink.stored, vec![0]);
    }
}
