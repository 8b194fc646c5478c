//! Common types for the cleanup module

use image::{Rgb, RgbImage};
use thiserror::Error;

/// Pure white output pixel
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Pure black output pixel
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// A single rasterized page
pub type PageImage = RgbImage;

/// Ordered pages of one source document
pub type Document = Vec<PageImage>;

/// Cleanup error types
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Document has no pages")]
    EmptyDocument,

    #[error("Page {index} has degenerate dimensions {width}x{height}")]
    DegeneratePage { index: usize, width: u32, height: u32 },

    #[error("Failed to store page {index}: {source}")]
    Sink {
        index: usize,
        #[source]
        source: crate::sink::SinkError,
    },
}

pub type Result<T> = std::result::Result<T, CleanupError>;

/// Position of a pixel within a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}
