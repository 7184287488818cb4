//! Split materialization pipeline
//!
//! Each configured split goes through fetch, slice, link and cleanup before
//! the next split starts.

use crate::catalog::ZooCatalog;
use crate::config::MaterializeConfig;
use crate::error::{Result, ZooLinkError};
use crate::linker::{self, LinkSummary};
use crate::services::ProgressReporter;
use crate::split::SplitSpec;
use crate::tracing_config::spans;
use crate::zoo::{CachedZoo, DatasetZoo, LoadRequest};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Instrument};

/// Outcome of materializing one split
#[derive(Debug)]
pub struct SplitReport {
    pub spec: SplitSpec,
    /// Directory the split was linked into
    pub destination: PathBuf,
    /// Samples the zoo returned for `0..end`
    pub fetched: usize,
    /// Samples in the `[start, end)` window
    pub window: usize,
    pub links: LinkSummary,
}

/// Outcome of a whole run
#[derive(Debug)]
pub struct MaterializeSummary {
    /// Absolute output root
    pub out_dir: PathBuf,
    pub splits: Vec<SplitReport>,
}

impl MaterializeSummary {
    /// Files that could not be linked, across all splits
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.splits.iter().map(|s| s.links.failed.len()).sum()
    }

    /// Entries created across all splits
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.splits.iter().map(|s| s.links.created()).sum()
    }
}

/// Fetch, slice and link a single split, then delete its dataset handle
///
/// The handle is deleted even when linking fails; the link error is returned
/// afterwards.
pub async fn materialize_split(
    zoo: &dyn DatasetZoo,
    config: &MaterializeConfig,
    spec: &SplitSpec,
    reporter: &dyn ProgressReporter,
) -> Result<SplitReport> {
    reporter.on_split_start(spec);

    let request = LoadRequest::new(&config.dataset, spec.split.name(), spec.range.end);
    let download_progress = reporter.download_indicator();
    let dataset = zoo.load(&request, Some(&download_progress)).await?;

    let fetched = dataset.len();
    let window = dataset.skip(spec.range.start);
    let destination = config.split_out_dir(&spec.split);
    info!(
        fetched,
        window = window.len(),
        destination = %destination.display(),
        "Linking window"
    );
    reporter.on_link_start(spec, window.len(), &destination);

    let link_progress = reporter.link_indicator(window.len());
    let linked = linker::link_all(
        window.iter().map(|sample| sample.filepath.as_path()),
        &destination,
        config.failure_policy,
        Some(&link_progress),
    );
    let window_len = window.len();
    link_progress.finish_with_message(format!("{} linked", spec.split));

    let deleted = dataset.delete();
    let links = match (linked, deleted) {
        (Ok(links), Ok(())) => links,
        (Ok(_), Err(e)) => return Err(e),
        (Err(e), Ok(())) => return Err(e),
        (Err(e), Err(delete_err)) => {
            warn!(error = %delete_err, "Failed to delete dataset after link failure");
            return Err(e);
        },
    };

    let report = SplitReport {
        spec: spec.clone(),
        destination,
        fetched,
        window: window_len,
        links,
    };
    reporter.on_split_complete(&report);
    Ok(report)
}

/// Materialize every configured split using `zoo`, sequentially
pub async fn materialize(
    zoo: &dyn DatasetZoo,
    config: &MaterializeConfig,
    reporter: &dyn ProgressReporter,
) -> Result<MaterializeSummary> {
    config.validate()?;

    fs::create_dir_all(&config.out_dir).map_err(|e| {
        ZooLinkError::file_io_error("create output directory", &config.out_dir, &e)
    })?;
    reporter.on_run_start(&config.zoo_dir);

    let start_time = Instant::now();
    let mut splits = Vec::with_capacity(config.splits.len());
    for spec in &config.splits {
        let span = spans::split(&config.dataset, spec.split.name(), &spec.range.to_string());
        let report = materialize_split(zoo, config, spec, reporter)
            .instrument(span)
            .await?;
        splits.push(report);
    }

    let summary = MaterializeSummary {
        out_dir: absolute(&config.out_dir),
        splits,
    };
    info!(
        created = summary.created_count(),
        failed = summary.failed_count(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Materialization finished"
    );
    reporter.on_run_complete(&summary);
    Ok(summary)
}

/// Materialize using the default [`CachedZoo`] rooted at `config.zoo_dir`
pub async fn run(
    config: &MaterializeConfig,
    reporter: &dyn ProgressReporter,
) -> Result<MaterializeSummary> {
    let catalog = ZooCatalog::load_or_default(config.catalog.as_deref())?;
    let zoo = CachedZoo::new(&config.zoo_dir, catalog)?;
    materialize(&zoo, config, reporter).await
}

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
