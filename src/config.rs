//! Configuration file support
//!
//! Settings are read from TOML, searched in this order:
//!
//! 1. `./pdfcleaner.toml`
//! 2. `<config dir>/pdfcleaner/config.toml`
//!
//! Command-line arguments override file values through [`CliOverrides`].
//!
//! ```toml
//! input_pdf_folder = "scans"
//! input_pdf_file = "exam_annotated.pdf"
//! output_folder = "out"
//! input_image_folder = "out"
//! dpi = 300
//!
//! [policy]
//! bright_threshold = 200
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::cleanup::{ClassificationPolicy, DEFAULT_TWEAK_REGION_THRESHOLD};
use crate::encode::{DEFAULT_JPEG_QUALITY, DEFAULT_RECOMBINE_RESOLUTION};
use crate::rasterize::DEFAULT_DPI;

/// Local configuration file name
pub const LOCAL_CONFIG_FILE: &str = "pdfcleaner.toml";

/// Application folder under the user config directory
const APP_CONFIG_DIR: &str = "pdfcleaner";

/// User configuration file name
const USER_CONFIG_FILE: &str = "config.toml";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required option: {0}")]
    Missing(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder holding the PDF to clean (`INPUT_PDF_FOLDER`)
    pub input_pdf_folder: Option<PathBuf>,
    /// PDF file name inside `input_pdf_folder` (`INPUT_PDF_FILE`)
    pub input_pdf_file: Option<String>,
    /// Destination of cleaned pages and documents (`OUTPUT_FOLDER`)
    pub output_folder: Option<PathBuf>,
    /// Folder of previously cleaned pages to recombine (`INPUT_IMAGE_FOLDER`)
    pub input_image_folder: Option<PathBuf>,
    /// Rasterization DPI
    pub dpi: u32,
    /// JPEG quality of stored pages
    pub jpeg_quality: u8,
    /// Resolution of the recombined PDF
    pub recombine_resolution: f32,
    /// Exact number of pages to recombine; discovered when unset
    pub recombine_count: Option<usize>,
    /// Protected band height for single-page tweaks
    pub tweak_region_threshold: u32,
    /// Worker threads for pixel classification
    pub threads: Option<usize>,
    /// Classification thresholds
    pub policy: ClassificationPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_pdf_folder: None,
            input_pdf_file: None,
            output_folder: None,
            input_image_folder: None,
            dpi: DEFAULT_DPI,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            recombine_resolution: DEFAULT_RECOMBINE_RESOLUTION,
            recombine_count: None,
            tweak_region_threshold: DEFAULT_TWEAK_REGION_THRESHOLD,
            threads: None,
            policy: ClassificationPolicy::default(),
        }
    }
}

impl Config {
    /// Candidate config file locations in search order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_CONFIG_DIR).join(USER_CONFIG_FILE));
        }
        paths
    }

    /// Load the first config file found, or defaults when none exists
    pub fn load() -> Result<Self> {
        match Self::search_paths().into_iter().find(|path| path.is_file()) {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load a config file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Parse TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply command-line overrides (CLI takes precedence)
    #[must_use]
    pub fn merge_with_cli(mut self, cli: &CliOverrides) -> Self {
        if let Some(folder) = &cli.input_pdf_folder {
            self.input_pdf_folder = Some(folder.clone());
        }
        if let Some(file) = &cli.input_pdf_file {
            self.input_pdf_file = Some(file.clone());
        }
        if let Some(folder) = &cli.output_folder {
            self.output_folder = Some(folder.clone());
        }
        if let Some(folder) = &cli.input_image_folder {
            self.input_image_folder = Some(folder.clone());
        }
        if let Some(dpi) = cli.dpi {
            self.dpi = dpi;
        }
        if let Some(quality) = cli.jpeg_quality {
            self.jpeg_quality = quality;
        }
        if let Some(resolution) = cli.recombine_resolution {
            self.recombine_resolution = resolution;
        }
        if cli.recombine_count.is_some() {
            self.recombine_count = cli.recombine_count;
        }
        if let Some(threshold) = cli.tweak_region_threshold {
            self.tweak_region_threshold = threshold;
        }
        if cli.threads.is_some() {
            self.threads = cli.threads;
        }
        self
    }

    /// Full path of the PDF to clean
    pub fn source_pdf(&self) -> Result<PathBuf> {
        let folder = self
            .input_pdf_folder
            .as_ref()
            .ok_or(ConfigError::Missing("input_pdf_folder"))?;
        let file = self
            .input_pdf_file
            .as_ref()
            .ok_or(ConfigError::Missing("input_pdf_file"))?;
        Ok(folder.join(file))
    }

    pub fn output_folder(&self) -> Result<&Path> {
        self.output_folder
            .as_deref()
            .ok_or(ConfigError::Missing("output_folder"))
    }

    pub fn input_image_folder(&self) -> Result<&Path> {
        self.input_image_folder
            .as_deref()
            .ok_or(ConfigError::Missing("input_image_folder"))
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub input_pdf_folder: Option<PathBuf>,
    pub input_pdf_file: Option<String>,
    pub output_folder: Option<PathBuf>,
    pub input_image_folder: Option<PathBuf>,
    pub dpi: Option<u32>,
    pub jpeg_quality: Option<u8>,
    pub recombine_resolution: Option<f32>,
    pub recombine_count: Option<usize>,
    pub tweak_region_threshold: Option<u32>,
    pub threads: Option<usize>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.dpi, 300);
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.recombine_resolution, 100.0);
        assert_eq!(config.recombine_count, None);
        assert_eq!(config.tweak_region_threshold, 2000);
        assert_eq!(config.policy, ClassificationPolicy::default());
    }

    #[test]
    fn test_config_from_toml() {
        let config = Config::from_toml(
            r#"
            input_pdf_folder = "scans"
            input_pdf_file = "exam.pdf"
            output_folder = "out"
            input_image_folder = "out"
            recombine_count = 32

            [policy]
            dark_threshold = 80
            "#,
        )
        .unwrap();

        assert_eq!(config.source_pdf().unwrap(), PathBuf::from("scans/exam.pdf"));
        assert_eq!(config.output_folder().unwrap(), Path::new("out"));
        assert_eq!(config.input_image_folder().unwrap(), Path::new("out"));
        assert_eq!(config.recombine_count, Some(32));
        assert_eq!(config.policy.dark_threshold, 80);
        assert_eq!(config.policy.bright_threshold, 200);
        assert_eq!(config.dpi, 300);
    }

    #[test]
    fn test_config_invalid_toml() {
        let result = Config::from_toml("dpi = \"high\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_required_options() {
        let config = Config::default();
        assert!(matches!(
            config.source_pdf(),
            Err(ConfigError::Missing("input_pdf_folder"))
        ));
        assert!(matches!(
            config.output_folder(),
            Err(ConfigError::Missing("output_folder"))
        ));
        assert!(matches!(
            config.input_image_folder(),
            Err(ConfigError::Missing("input_image_folder"))
        ));

        let config = Config {
            input_pdf_folder: Some(PathBuf::from("scans")),
            ..Default::default()
        };
        assert!(matches!(
            config.source_pdf(),
            Err(ConfigError::Missing("input_pdf_file"))
        ));
    }

    #[test]
    fn test_merge_with_cli() {
        let config = Config {
            output_folder: Some(PathBuf::from("file_out")),
            dpi: 200,
            recombine_count: Some(32),
            ..Default::default()
        };
        let overrides = CliOverrides {
            output_folder: Some(PathBuf::from("cli_out")),
            jpeg_quality: Some(75),
            ..Default::default()
        };

        let merged = config.merge_with_cli(&overrides);
        assert_eq!(merged.output_folder, Some(PathBuf::from("cli_out")));
        assert_eq!(merged.jpeg_quality, 75);
        // untouched values come from the file
        assert_eq!(merged.dpi, 200);
        assert_eq!(merged.recombine_count, Some(32));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdfcleaner.toml");
        std::fs::write(&path, "dpi = 150\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.dpi, 150);

        let missing = Config::load_from_path(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_search_paths_start_local() {
        let paths = Config::search_paths();
        assert_eq!(paths[0], PathBuf::from("pdfcleaner.toml"));
    }
}
