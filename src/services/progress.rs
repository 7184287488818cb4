//! Progress reporting service
//!
//! This module separates progress reporting concerns from the materialization
//! pipeline, allowing different frontends to implement their own progress
//! handling.

use crate::materialize::{MaterializeSummary, SplitReport};
use crate::split::SplitSpec;
#[cfg(feature = "cli")]
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Progress bar abstraction that works with and without CLI features
#[derive(Debug)]
pub enum ProgressIndicator {
    #[cfg(feature = "cli")]
    Indicatif(ProgressBar),
    NoOp,
}

impl ProgressIndicator {
    /// Byte-oriented bar for downloads
    #[must_use]
    pub fn download() -> Self {
        #[cfg(feature = "cli")]
        {
            Self::styled(
                0,
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
            )
        }
        #[cfg(not(feature = "cli"))]
        {
            Self::NoOp
        }
    }

    /// Item-oriented bar for linking `len` files
    #[must_use]
    pub fn items(len: u64) -> Self {
        #[cfg(feature = "cli")]
        {
            Self::styled(
                len,
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
        }
        #[cfg(not(feature = "cli"))]
        {
            let _ = len;
            Self::NoOp
        }
    }

    #[cfg(feature = "cli")]
    fn styled(len: u64, template: &str) -> Self {
        let pb = ProgressBar::new(len);
        match ProgressStyle::default_bar().template(template) {
            Ok(style) => pb.set_style(style.progress_chars("#>-")),
            Err(e) => log::debug!("Invalid progress template, using default: {}", e),
        }
        Self::Indicatif(pb)
    }

    /// Set message for progress indicator
    pub fn set_message(&self, msg: String) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.set_message(msg),
            Self::NoOp => {
                let _ = msg;
            },
        }
    }

    /// Set length for progress indicator
    pub fn set_length(&self, len: u64) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.set_length(len),
            Self::NoOp => {
                let _ = len;
            },
        }
    }

    /// Set position for progress indicator
    pub fn set_position(&self, pos: u64) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.set_position(pos),
            Self::NoOp => {
                let _ = pos;
            },
        }
    }

    /// Finish progress indicator with message
    pub fn finish_with_message(&self, msg: String) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.finish_with_message(msg),
            Self::NoOp => {
                let _ = msg;
            },
        }
    }
}

/// Trait for reporting progress while materializing splits
pub trait ProgressReporter: Send + Sync {
    /// Called once before the first split is fetched
    fn on_run_start(&self, zoo_dir: &Path);

    /// Called before a split is fetched from the zoo
    fn on_split_start(&self, spec: &SplitSpec);

    /// Called once the window is known, before linking starts
    fn on_link_start(&self, spec: &SplitSpec, file_count: usize, destination: &Path);

    /// Progress indicator used while linking `file_count` files
    fn link_indicator(&self, file_count: usize) -> ProgressIndicator {
        let _ = file_count;
        ProgressIndicator::NoOp
    }

    /// Progress indicator used while downloading samples
    fn download_indicator(&self) -> ProgressIndicator {
        ProgressIndicator::NoOp
    }

    /// Called after a split has been linked and its dataset deleted
    fn on_split_complete(&self, report: &SplitReport);

    /// Called once every split completed
    fn on_run_complete(&self, summary: &MaterializeSummary);
}

/// No-op progress reporter that discards all progress updates
#[derive(Debug, Default)]
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn on_run_start(&self, _zoo_dir: &Path) {}
    fn on_split_start(&self, _spec: &SplitSpec) {}
    fn on_link_start(&self, _spec: &SplitSpec, _file_count: usize, _destination: &Path) {}
    fn on_split_complete(&self, _report: &SplitReport) {}
    fn on_run_complete(&self, _summary: &MaterializeSummary) {}
}

/// Console progress reporter printing one line per pipeline step
#[derive(Debug)]
pub struct ConsoleProgressReporter {
    show_bars: bool,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    ///
    /// # Arguments
    /// * `show_bars` - Whether to draw progress bars for downloads and linking
    #[must_use]
    pub fn new(show_bars: bool) -> Self {
        Self { show_bars }
    }
}

impl Default for ConsoleProgressReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn on_run_start(&self, zoo_dir: &Path) {
        println!("🚀 Initializing download to {}...", zoo_dir.display());
    }

    fn on_split_start(&self, spec: &SplitSpec) {
        println!(
            "\n📥 Fetching {} (Indices {} to {})...",
            spec.split, spec.range.start, spec.range.end
        );
    }

    fn on_link_start(&self, _spec: &SplitSpec, file_count: usize, destination: &Path) {
        println!("🔗 Linking {} files to {}...", file_count, destination.display());
    }

    fn link_indicator(&self, file_count: usize) -> ProgressIndicator {
        if self.show_bars {
            ProgressIndicator::items(file_count as u64)
        } else {
            ProgressIndicator::NoOp
        }
    }

    fn download_indicator(&self) -> ProgressIndicator {
        if self.show_bars {
            ProgressIndicator::download()
        } else {
            ProgressIndicator::NoOp
        }
    }

    fn on_split_complete(&self, report: &SplitReport) {
        let links = &report.links;
        if links.symlinked > 0 || links.skipped > 0 {
            println!(
                "   {} hard-linked, {} symlinked, {} already present",
                links.hard_linked, links.symlinked, links.skipped
            );
        }
        for failure in &links.failed {
            eprintln!(
                "❌ Failed: {} - {}",
                failure.source.display(),
                failure.symlink_error
            );
        }
    }

    fn on_run_complete(&self, summary: &MaterializeSummary) {
        if summary.failed_count() == 0 {
            println!("\n✅ Done! Images are ready in: {}", summary.out_dir.display());
        } else {
            println!(
                "\n⚠️  Finished with {} failed file(s). Output: {}",
                summary.failed_count(),
                summary.out_dir.display()
            );
        }
    }
}
