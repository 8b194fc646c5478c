//! Progress tracking module for page cleaning.
//!
//! Progress is reported through [`ProgressCallback`] so the library never
//! prints on its own; the CLI plugs in [`ConsoleProgress`], which draws an
//! `indicatif` bar.

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::sync::Mutex;

/// Receives progress notifications from the pipeline
pub trait ProgressCallback {
    /// A processing step begins
    fn on_step_start(&self, step: &str);

    /// `current` of `total` items of the running step are done
    fn on_step_progress(&self, current: usize, total: usize);

    /// A processing step finished
    fn on_step_complete(&self, step: &str, message: &str);

    /// Extra detail for very verbose output
    fn on_debug(&self, _message: &str) {}
}

/// Progress callback that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_step_start(&self, _step: &str) {}
    fn on_step_progress(&self, _current: usize, _total: usize) {}
    fn on_step_complete(&self, _step: &str, _message: &str) {}
}

/// Processing stages of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Rasterizing PDF pages
    Rasterizing,
    /// Classifying pixels
    Cleaning,
    /// Loading stored page images
    Loading,
    /// Encoding the recombined document
    Recombining,
}

impl ProcessingStage {
    /// Get the name of the stage
    pub fn name(&self) -> &'static str {
        match self {
            ProcessingStage::Rasterizing => "Rasterizing",
            ProcessingStage::Cleaning => "Cleaning",
            ProcessingStage::Loading => "Loading",
            ProcessingStage::Recombining => "Recombining",
        }
    }
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// No output
    Quiet,
    /// Normal output (stage display and progress bar)
    #[default]
    Normal,
    /// Verbose output (step completion messages)
    Verbose,
    /// Very verbose (debug messages)
    VeryVerbose,
}

impl OutputMode {
    /// Create OutputMode from verbosity level
    pub fn from_verbosity(level: u8) -> Self {
        match level {
            0 => OutputMode::Normal,
            1 => OutputMode::Verbose,
            _ => OutputMode::VeryVerbose,
        }
    }

    /// Check if output should be shown at this mode
    pub fn should_show(&self, required: OutputMode) -> bool {
        use OutputMode::*;
        match (self, required) {
            (Quiet, _) => false,
            (Normal, Quiet | Normal) => true,
            (Verbose, Quiet | Normal | Verbose) => true,
            (VeryVerbose, _) => true,
            _ => false,
        }
    }
}

/// Progress bar template
const PROGRESS_TEMPLATE: &str = "    [{bar:40}] {pos}/{len} {msg}";

/// Console progress with an `indicatif` bar per step
pub struct ConsoleProgress {
    mode: OutputMode,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            bar: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    fn new_bar(total: usize) -> ProgressBar {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_step_start(&self, step: &str) {
        if self.mode.should_show(OutputMode::Normal) {
            println!("  {}", step);
        }
    }

    fn on_step_progress(&self, current: usize, total: usize) {
        if !self.mode.should_show(OutputMode::Normal) {
            return;
        }
        let Ok(mut guard) = self.bar.lock() else {
            return;
        };
        let bar = guard.get_or_insert_with(|| Self::new_bar(total));
        bar.set_length(total as u64);
        bar.set_position(current as u64);
        bar.set_message(format!("{:03} of {:03}", current, total));
    }

    fn on_step_complete(&self, step: &str, message: &str) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
        if self.mode.should_show(OutputMode::Verbose) {
            println!("    {}: {}", step, message);
        }
    }

    fn on_debug(&self, message: &str) {
        if self.mode.should_show(OutputMode::VeryVerbose) {
            println!("    [DEBUG] {}", message);
        }
    }
}

/// Print the final summary of a run
pub fn print_summary(command: &str, pages: usize, outputs: usize, elapsed_seconds: f64) {
    println!();
    println!("{}", "=".repeat(60));
    println!("{} Summary", command);
    println!("{}", "=".repeat(60));
    println!("  Pages:    {}", pages);
    println!("  Outputs:  {}", outputs);
    println!("  Elapsed:  {:.2}s", elapsed_seconds);
    println!("{}", "=".repeat(60));
}
