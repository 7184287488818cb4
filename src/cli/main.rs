//! zoolink CLI Tool
//!
//! Command-line interface for materializing dataset windows from the zoo cache.

use super::config::CliConfigBuilder;
use crate::{
    cache::{format_size, ZooCache},
    services::ConsoleProgressReporter,
    tracing_config::{spans, TracingConfig},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, Instrument};

/// Fetch dataset windows from the zoo and link them into train/valid folders
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "zoolink")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Zoo cache directory, where samples are downloaded to
    #[arg(long, value_name = "PATH", env = "ZOOLINK_ZOO_DIR", default_value = "./zoo_cache")]
    pub zoo_dir: PathBuf,

    /// Root of the linked output tree
    #[arg(long, value_name = "PATH", default_value = "./dataset")]
    pub out_dir: PathBuf,

    /// Dataset name in the zoo catalog
    #[arg(long, default_value = "open-images-v7")]
    pub dataset: String,

    /// Train window as start:end
    #[arg(long, value_name = "START:END", default_value = "10:20")]
    pub train_range: String,

    /// Validation window as start:end (linked into the "valid" folder)
    #[arg(long, value_name = "START:END", default_value = "1:5")]
    pub val_range: String,

    /// Catalog mapping datasets and splits to manifests
    #[arg(long, value_name = "PATH", env = "ZOOLINK_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Keep linking after a file fails; the run still exits with an error
    #[arg(long)]
    pub keep_going: bool,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// List cached dataset splits and exit
    #[arg(long)]
    pub list_cached: bool,

    /// Remove dataset records left behind by interrupted runs and exit
    #[arg(long)]
    pub prune_records: bool,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    TracingConfig::new()
        .with_verbosity(cli.verbose)
        .with_optional_env_filter(std::env::var("RUST_LOG").ok())
        .with_format(CliConfigBuilder::tracing_format(cli.log_format))
        .init()
        .context("Failed to initialize tracing subscriber")?;
    debug!(verbosity = cli.verbose, "Tracing initialized");

    if cli.list_cached {
        return list_cached(&cli.zoo_dir);
    }

    if cli.prune_records {
        return prune_records(&cli.zoo_dir);
    }

    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;
    info!(
        dataset = %config.dataset,
        zoo_dir = %config.zoo_dir.display(),
        out_dir = %config.out_dir.display(),
        "Starting zoolink"
    );

    let session_id = uuid::Uuid::new_v4().to_string();
    let reporter = ConsoleProgressReporter::new(!cli.no_progress);
    let start_time = Instant::now();

    let summary = crate::run(&config, &reporter)
        .instrument(spans::run(&session_id, &config.dataset, &config.out_dir))
        .await
        .context("Failed to materialize dataset")?;

    info!(
        created = summary.created_count(),
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "Run complete"
    );

    ensure_no_failures(summary.failed_count())
}

/// Turn files left unlinked under `--keep-going` into a failing exit status
fn ensure_no_failures(failed: usize) -> Result<()> {
    if failed > 0 {
        anyhow::bail!("{} file(s) could not be linked", failed);
    }
    Ok(())
}

/// List cached dataset splits
fn list_cached(zoo_dir: &Path) -> Result<()> {
    let cache = ZooCache::open(zoo_dir);
    let splits = cache
        .scan_cached_splits()
        .context("Failed to list cached splits")?;

    println!("📦 Cached Splits in {}", cache.root().display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if splits.is_empty() {
        println!("No cached splits found.");
        return Ok(());
    }

    for info in splits {
        println!("📁 {} / {}", info.dataset, info.split);
        println!("  └─ Location: {}", info.path.display());
        println!("  └─ Samples: {}", info.sample_count);
        println!("  └─ Size: {}", format_size(info.size_bytes));
    }

    Ok(())
}

/// Remove stale dataset records
fn prune_records(zoo_dir: &Path) -> Result<()> {
    let cache = ZooCache::open(zoo_dir);
    let removed = cache
        .prune_records()
        .context("Failed to prune dataset records")?;

    if removed.is_empty() {
        println!("💡 No dataset records to prune");
    } else {
        println!("✅ Removed {} dataset record(s):", removed.len());
        for name in &removed {
            println!("   • {}", name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DatasetRecord;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "zoolink",
            "--zoo-dir",
            "/zoo",
            "--list-cached",
            "-vv",
            "--log-format",
            "compact",
        ])
        .unwrap();

        assert_eq!(cli.zoo_dir, PathBuf::from("/zoo"));
        assert!(cli.list_cached);
        assert!(!cli.prune_records);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, CliLogFormat::Compact);
    }

    #[test]
    fn test_cli_rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["zoolink", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn test_list_cached_on_empty_zoo() {
        let temp = TempDir::new().unwrap();
        let zoo_dir = temp.path().join("zoo");
        assert!(list_cached(&zoo_dir).is_ok());
        assert!(prune_records(&zoo_dir).is_ok());
        assert!(!zoo_dir.exists());
    }

    #[test]
    fn test_failed_files_fail_the_run() {
        assert!(ensure_no_failures(0).is_ok());
        let err = ensure_no_failures(3).unwrap_err();
        assert_eq!(err.to_string(), "3 file(s) could not be linked");
    }

    #[test]
    fn test_prune_records_removes_stale_records() {
        let temp = TempDir::new().unwrap();
        let cache = ZooCache::new(temp.path()).unwrap();
        cache
            .write_record(&DatasetRecord {
                name: "ds-train-stale".to_string(),
                dataset: "ds".to_string(),
                split: "train".to_string(),
                created_at: Utc::now(),
                samples: Vec::new(),
            })
            .unwrap();
        assert_eq!(cache.list_records().unwrap().len(), 1);

        prune_records(temp.path()).unwrap();
        assert!(cache.list_records().unwrap().is_empty());
    }
}
