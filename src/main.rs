//! pdfcleaner - Remove colored annotations from scanned PDF pages
//!
//! CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::Level;

use pdfcleaner::{
    exit_codes, progress, CleanArgs, CleanPipeline, Cli, CliOverrides, Commands, CommonArgs,
    Config, ConsoleProgress, ErrorKind, OutputMode, PipelineError, PopplerRasterizer,
    RecombineArgs, TweakArgs,
};

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Clean(args) => run_clean(args),
        Commands::Tweak(args) => run_tweak(args),
        Commands::Recombine(args) => run_recombine(args),
        Commands::Info => run_info(),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    });
}

/// Map an error chain to a process exit code
fn exit_code_for(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<PipelineError>() {
        Some(PipelineError::SourceNotFound(_)) => exit_codes::INPUT_NOT_FOUND,
        Some(e) if e.kind() == ErrorKind::Precondition => exit_codes::PRECONDITION_FAILED,
        Some(_) => exit_codes::IO_FAILURE,
        None => exit_codes::GENERAL_ERROR,
    }
}

// ============ Setup ============

fn init_logging(common: &CommonArgs) {
    let level = match (common.quiet, common.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn output_mode(common: &CommonArgs) -> OutputMode {
    if common.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::from_verbosity(common.verbose)
    }
}

/// Load the config file and apply command-line overrides
fn load_config(common: &CommonArgs, overrides: &CliOverrides) -> Result<Config> {
    let file_config = match &common.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };
    let config = file_config.merge_with_cli(overrides);

    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring worker threads")?;
    }
    Ok(config)
}

// ============ Clean Command ============

fn run_clean(args: &CleanArgs) -> Result<()> {
    init_logging(&args.common);
    let config = load_config(&args.common, &args.overrides())?;

    if args.dry_run {
        print_execution_plan(&config);
        return Ok(());
    }

    let progress = ConsoleProgress::new(output_mode(&args.common));
    let pipeline = CleanPipeline::new(config);
    let report = pipeline.clean_document(&progress)?;

    if progress.mode().should_show(OutputMode::Normal) {
        println!("Source PDF is {}", display_name(&report.source));
        println!(
            "  Black: {:.2}%  Protected: {:.2}%",
            report.stats.black_percent(),
            report.stats.passthrough_percent()
        );
        progress::print_summary("Clean", report.pages, report.written.len(), report.elapsed_seconds);
    }
    Ok(())
}

/// Print execution plan for dry-run mode
fn print_execution_plan(config: &Config) {
    let source = config
        .source_pdf()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|e| format!("<{}>", e));
    let output = config
        .output_folder()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|e| format!("<{}>", e));

    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Source: {}", source);
    println!("Output: {}", output);
    println!();
    println!("Pipeline Configuration:");
    println!("  1. Rasterization (DPI: {})", config.dpi);
    println!(
        "  2. Classification (bright > {}, dominant > {} over < {}, dark < {})",
        config.policy.bright_threshold,
        config.policy.dominant_high,
        config.policy.dominant_low,
        config.policy.dark_threshold
    );
    println!(
        "  3. JPEG output source_image_NNN.jpg (quality: {})",
        config.jpeg_quality
    );
    println!();
    println!(
        "Threads: {}",
        config.threads.unwrap_or_else(num_cpus::get)
    );
}

// ============ Tweak Command ============

fn run_tweak(args: &TweakArgs) -> Result<()> {
    init_logging(&args.common);
    let config = load_config(&args.common, &args.overrides())?;

    let progress = ConsoleProgress::new(output_mode(&args.common));
    let pipeline = CleanPipeline::new(config);
    let report = pipeline.tweak_document(&args.source, None, &progress)?;

    if progress.mode().should_show(OutputMode::Normal) {
        println!("Loaded image from {}", display_name(&report.source));
        for path in &report.written {
            println!("Saved {}", display_name(path));
        }
    }
    Ok(())
}

// ============ Recombine Command ============

fn run_recombine(args: &RecombineArgs) -> Result<()> {
    init_logging(&args.common);
    let config = load_config(&args.common, &args.overrides())?;

    let progress = ConsoleProgress::new(output_mode(&args.common));
    let pipeline = CleanPipeline::new(config);
    let report = pipeline.recombine(&progress)?;

    if progress.mode().should_show(OutputMode::Normal) {
        println!(
            "Saved {} ({} pages, {:.2} MB)",
            report.output.display(),
            report.pages,
            report.output_size as f64 / 1_048_576.0
        );
    }
    Ok(())
}

// ============ Info Command ============

fn run_info() -> Result<()> {
    println!("pdfcleaner v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());

    println!();
    println!("PDF Rasterization:");
    match which::which("pdftoppm") {
        Ok(path) => println!("  Poppler pdftoppm: {} (found)", path.display()),
        Err(_) => println!("  Poppler pdftoppm: Not found"),
    }
    if !PopplerRasterizer::new().is_available() {
        println!("  clean and tweak require pdftoppm on PATH");
    }

    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        let state = if path.is_file() { "found" } else { "absent" };
        println!("  {} ({})", path.display(), state);
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
