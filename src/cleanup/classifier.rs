//! Pixel Classifier module
//!
//! Forces every pixel of a scanned page into a three-color palette so that
//! colored pen and pencil annotations disappear while printed black text
//! survives.
//!
//! # Algorithm
//!
//! Rules are evaluated in order, the first match wins:
//!
//! 1. Pixels above the protected region boundary pass through unchanged
//!    (only when region passthrough is enabled)
//! 2. All channels bright: background noise, painted white
//! 3. One channel strongly dominant over another: colored ink, painted white
//! 4. All channels dark: printed text, painted black
//! 5. Exact gray: split at the bright threshold
//! 6. Anything else (mixed mid-tones): painted white

use image::Rgb;
use serde::{Deserialize, Serialize};

use super::types::{Coordinate, BLACK, WHITE};

// ============================================================
// Constants
// ============================================================

/// Channels above this value on every channel count as paper
const DEFAULT_BRIGHT_THRESHOLD: u8 = 200;

/// A channel above this value may be a dominant ink color
const DEFAULT_DOMINANT_HIGH: u8 = 96;

/// A channel below this value marks the dominance of another channel
const DEFAULT_DOMINANT_LOW: u8 = 64;

/// Every channel below this value counts as printed ink
const DEFAULT_DARK_THRESHOLD: u8 = 96;

/// Default protected band height for single-page tweaks (pixels at 300 dpi)
pub const DEFAULT_TWEAK_REGION_THRESHOLD: u32 = 2000;

// ============================================================
// Types
// ============================================================

/// Thresholds and region rule controlling pixel reclassification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationPolicy {
    /// Rows with `y` below this boundary are left untouched (disabled when `None`)
    pub region_threshold: Option<u32>,

    /// Bright threshold (paper / grayscale split)
    pub bright_threshold: u8,

    /// Upper bound a channel must exceed to be considered dominant
    pub dominant_high: u8,

    /// Lower bound another channel must fall below for dominance
    pub dominant_low: u8,

    /// Dark threshold (ink)
    pub dark_threshold: u8,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            region_threshold: None,
            bright_threshold: DEFAULT_BRIGHT_THRESHOLD,
            dominant_high: DEFAULT_DOMINANT_HIGH,
            dominant_low: DEFAULT_DOMINANT_LOW,
            dark_threshold: DEFAULT_DARK_THRESHOLD,
        }
    }
}

impl ClassificationPolicy {
    /// Create a builder
    pub fn builder() -> ClassificationPolicyBuilder {
        ClassificationPolicyBuilder::default()
    }

    /// Policy used for whole-document batch cleaning (no protected region)
    pub fn batch() -> Self {
        Self::default()
    }

    /// Policy used for single-page tweaks, protecting rows above `region_y`
    pub fn tweak(region_y: u32) -> Self {
        Self {
            region_threshold: Some(region_y),
            ..Default::default()
        }
    }

    /// Same thresholds with region passthrough removed
    #[must_use]
    pub fn without_region(self) -> Self {
        Self {
            region_threshold: None,
            ..self
        }
    }

    /// Check whether region passthrough is enabled
    pub fn has_region_passthrough(&self) -> bool {
        self.region_threshold.is_some()
    }

    /// Check whether a coordinate lies inside the protected region
    fn protects(&self, coordinate: Coordinate) -> bool {
        self.region_threshold
            .is_some_and(|threshold| coordinate.y < threshold)
    }
}

/// Builder for ClassificationPolicy
#[derive(Debug, Default)]
pub struct ClassificationPolicyBuilder {
    policy: ClassificationPolicy,
}

impl ClassificationPolicyBuilder {
    /// Enable region passthrough for rows above `threshold`
    #[must_use]
    pub fn region_threshold(mut self, threshold: u32) -> Self {
        self.policy.region_threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn bright_threshold(mut self, threshold: u8) -> Self {
        self.policy.bright_threshold = threshold;
        self
    }

    #[must_use]
    pub fn dominant_high(mut self, threshold: u8) -> Self {
        self.policy.dominant_high = threshold;
        self
    }

    #[must_use]
    pub fn dominant_low(mut self, threshold: u8) -> Self {
        self.policy.dominant_low = threshold;
        self
    }

    #[must_use]
    pub fn dark_threshold(mut self, threshold: u8) -> Self {
        self.policy.dark_threshold = threshold;
        self
    }

    /// Build the policy
    #[must_use]
    pub fn build(self) -> ClassificationPolicy {
        self.policy
    }
}

/// Which rule decided a pixel's output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelClass {
    /// Inside the protected region, left untouched
    Passthrough,
    /// Near-white paper noise
    Background,
    /// Saturated annotation color
    Annotation,
    /// Dark ink
    Ink,
    /// Exact gray below the bright threshold
    GrayInk,
    /// Exact gray at or above the bright threshold
    GrayPaper,
    /// Mixed mid-tone color
    MidTone,
}

impl PixelClass {
    /// Output pixel for this class (`original` is only used by passthrough)
    pub fn output(self, original: Rgb<u8>) -> Rgb<u8> {
        match self {
            PixelClass::Passthrough => original,
            PixelClass::Ink | PixelClass::GrayInk => BLACK,
            PixelClass::Background
            | PixelClass::Annotation
            | PixelClass::GrayPaper
            | PixelClass::MidTone => WHITE,
        }
    }
}

// ============================================================
// Classification
// ============================================================

/// Decide which rule applies to a pixel
pub fn class_of(
    pixel: Rgb<u8>,
    coordinate: Coordinate,
    policy: &ClassificationPolicy,
) -> PixelClass {
    let [r, g, b] = pixel.0;
    let max_c = r.max(g).max(b);
    let min_c = r.min(g).min(b);

    if policy.protects(coordinate) {
        PixelClass::Passthrough
    } else if max_c > policy.bright_threshold && min_c > policy.bright_threshold {
        PixelClass::Background
    } else if max_c > policy.dominant_high && min_c < policy.dominant_low {
        PixelClass::Annotation
    } else if max_c < policy.dark_threshold {
        PixelClass::Ink
    } else if r == g && g == b {
        if min_c < policy.bright_threshold {
            PixelClass::GrayInk
        } else {
            PixelClass::GrayPaper
        }
    } else {
        PixelClass::MidTone
    }
}

/// Map one pixel to white, black, or itself
pub fn classify(
    pixel: Rgb<u8>,
    coordinate: Coordinate,
    policy: &ClassificationPolicy,
) -> Rgb<u8> {
    class_of(pixel, coordinate, policy).output(pixel)
}

// ============================================================
// Tests
// ============================================================
