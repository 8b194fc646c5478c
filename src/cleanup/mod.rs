//! Cleanup module for annotation removal
//!
//! Provides the pixel classification that strips colored annotations from
//! scanned pages:
//!
//! # Features
//!
//! - **Pixel Classifier** ([`classifier`]) - Force a pixel into white, black, or passthrough
//! - **Page Processor** ([`page`]) - Apply the classifier across pages and documents
//!
//! # Example
//!
//! ```rust,no_run
//! use pdfcleaner::{process_page, ClassificationPolicy};
//!
//! let page = image::open("page.png").unwrap().to_rgb8();
//! let cleaned = process_page(&page, &ClassificationPolicy::default());
//! cleaned.save("page_clean.png").unwrap();
//! ```

pub mod classifier;
pub mod page;
mod types;

// Re-export public API
pub use classifier::{
    class_of, classify, ClassificationPolicy, ClassificationPolicyBuilder, PixelClass,
    DEFAULT_TWEAK_REGION_THRESHOLD,
};

pub use page::{
    process_document, process_page, process_page_with_stats, validate_document, PaletteStats,
};

pub use types::{CleanupError, Coordinate, Document, PageImage, Result, BLACK, WHITE};
