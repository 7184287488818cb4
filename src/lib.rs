#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # zoolink
//!
//! Fetch a window of samples from a dataset zoo and materialize it as split
//! folders of hard links, falling back to symbolic links when hard links are
//! not possible (e.g. the zoo cache lives on another filesystem).
//!
//! ## Pipeline
//!
//! For every configured split, one after the other:
//!
//! 1. **Fetch**: ask the [`DatasetZoo`] for the first `end` samples of the split
//! 2. **Slice**: skip the first `start` samples, leaving the `[start, end)` window
//! 3. **Link**: hard-link (or symlink) each sample into `<out-dir>/<folder>`,
//!    leaving existing entries untouched
//! 4. **Cleanup**: delete the dataset handle
//!
//! The `validation` split is written to a folder named `valid`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zoolink::{ConsoleProgressReporter, MaterializeConfig, SplitRange};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = MaterializeConfig::builder()
//!     .zoo_dir("./zoo_cache")
//!     .out_dir("./dataset")
//!     .dataset("open-images-v7")
//!     .train_range("10:20".parse::<SplitRange>()?)
//!     .val_range("1:5".parse::<SplitRange>()?)
//!     .build()?;
//!
//! let summary = zoolink::run(&config, &ConsoleProgressReporter::default()).await?;
//! println!("{} entries created", summary.created_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): command-line interface, progress bars, tracing subscriber
//! - `tracing-json`: JSON log output for the CLI

pub mod cache;
pub mod catalog;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod linker;
pub mod manifest;
pub mod materialize;
pub mod range;
pub mod services;
pub mod split;
pub mod tracing_config;
pub mod zoo;

// Public API exports
pub use cache::{format_size, CachedSplitInfo, DatasetRecord, ZooCache};
pub use catalog::{ManifestSource, ZooCatalog};
pub use config::{MaterializeConfig, MaterializeConfigBuilder};
pub use download::{DownloadStats, SampleDownloader};
pub use error::{Result, ZooLinkError};
pub use linker::{link_all, link_file, FailurePolicy, LinkFailure, LinkOutcome, LinkSummary};
pub use manifest::{Manifest, ManifestEntry};
pub use materialize::{materialize, materialize_split, run, MaterializeSummary, SplitReport};
pub use range::SplitRange;
pub use services::{
    ConsoleProgressReporter, NoOpProgressReporter, ProgressIndicator, ProgressReporter,
};
pub use split::{Split, SplitSpec};
pub use tracing_config::{TracingConfig, TracingFormat};
pub use zoo::{CachedZoo, Dataset, DatasetZoo, LoadRequest, Sample};
