//! Command-line interface definitions

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CliOverrides;

/// Remove colored annotations from scanned PDF pages
#[derive(Debug, Parser)]
#[command(name = "pdfcleaner", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean every page of a PDF into source_image_<NNN>.jpg files
    Clean(CleanArgs),

    /// Clean a single-page PDF, keeping the top band untouched
    Tweak(TweakArgs),

    /// Join cleaned page images into Recombined_output.pdf
    Recombine(RecombineArgs),

    /// Show system and tool information
    Info,
}

/// Options shared by all processing commands
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Config file (default: ./pdfcleaner.toml, then the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output folder
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Worker threads for pixel classification (default: all CPUs)
    #[arg(long)]
    pub threads: Option<usize>,

    /// JPEG quality of written images (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: Option<u8>,
}

impl CommonArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            output_folder: self.output.clone(),
            threads: self.threads,
            jpeg_quality: self.jpeg_quality,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Folder containing the source PDF
    #[arg(long)]
    pub input_folder: Option<PathBuf>,

    /// Source PDF file name inside the input folder
    #[arg(long)]
    pub input_file: Option<String>,

    /// Rasterization DPI
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Print the execution plan without processing
    #[arg(long)]
    pub dry_run: bool,
}

impl CleanArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            input_pdf_folder: self.input_folder.clone(),
            input_pdf_file: self.input_file.clone(),
            dpi: self.dpi,
            ..self.common.overrides()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct TweakArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Single-page source PDF
    pub source: PathBuf,

    /// Rows above this y coordinate are left untouched
    #[arg(long)]
    pub region_y: Option<u32>,

    /// Rasterization DPI
    #[arg(long)]
    pub dpi: Option<u32>,
}

impl TweakArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            tweak_region_threshold: self.region_y,
            dpi: self.dpi,
            ..self.common.overrides()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct RecombineArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Folder containing source_image_<NNN>.jpg files
    #[arg(long)]
    pub input_images: Option<PathBuf>,

    /// Exact number of images to join (default: all consecutive images)
    #[arg(long)]
    pub count: Option<usize>,

    /// Resolution of the output PDF in dpi
    #[arg(long)]
    pub resolution: Option<f32>,
}

impl RecombineArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            input_image_folder: self.input_images.clone(),
            recombine_count: self.count,
            recombine_resolution: self.resolution,
            ..self.common.overrides()
        }
    }
}
