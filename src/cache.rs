//! Zoo cache directory management
//!
//! Layout under the zoo directory:
//!
//! ```text
//! <zoo-dir>/
//!   <dataset>/<split>/data/<sample files>
//!   .datasets/<dataset>-<split>-<uuid>.json   (one record per loaded dataset)
//! ```
//!
//! Sample files are the link sources; they are never modified once placed.
//! Dataset records are the per-load state that cleanup deletes.

use crate::error::{Result, ZooLinkError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Environment variable overriding the default zoo directory
pub const ZOO_DIR_ENV: &str = "ZOOLINK_ZOO_DIR";

/// Zoo directory used when neither a flag nor the environment names one
pub const DEFAULT_ZOO_DIR: &str = "./zoo_cache";

const RECORDS_DIR: &str = ".datasets";
const DATA_DIR: &str = "data";

/// Information about one cached dataset split
#[derive(Debug, Clone)]
pub struct CachedSplitInfo {
    pub dataset: String,
    pub split: String,
    /// Path to the split's data directory
    pub path: PathBuf,
    pub sample_count: usize,
    pub size_bytes: u64,
}

/// Persisted description of a loaded dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub name: String,
    pub dataset: String,
    pub split: String,
    pub created_at: DateTime<Utc>,
    pub samples: Vec<PathBuf>,
}

/// Zoo cache manager
#[derive(Debug, Clone)]
pub struct ZooCache {
    root: PathBuf,
}

impl ZooCache {
    /// Open (and create if needed) the zoo cache at `root`
    ///
    /// # Errors
    /// - Failed to create the cache directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.exists() {
            fs::create_dir_all(&root)
                .map_err(|e| ZooLinkError::file_io_error("create zoo directory", &root, &e))?;
        }

        Ok(Self { root })
    }

    /// Open the zoo cache at `root` without touching the filesystem
    ///
    /// For read-only maintenance, where a missing directory is an empty zoo.
    #[must_use]
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Zoo directory from `ZOOLINK_ZOO_DIR`, else `./zoo_cache`
    #[must_use]
    pub fn default_root() -> PathBuf {
        std::env::var(ZOO_DIR_ENV).map_or_else(|_| PathBuf::from(DEFAULT_ZOO_DIR), PathBuf::from)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the cached sample files of a split
    #[must_use]
    pub fn split_data_dir(&self, dataset: &str, split: &str) -> PathBuf {
        self.root.join(dataset).join(split).join(DATA_DIR)
    }

    /// Cached sample files of a split ordered by file name, at most `max_samples`
    ///
    /// Returns `None` if the split has never been cached.
    pub fn cached_samples(
        &self,
        dataset: &str,
        split: &str,
        max_samples: usize,
    ) -> Result<Option<Vec<PathBuf>>> {
        let data_dir = self.split_data_dir(dataset, split);
        if !data_dir.is_dir() {
            return Ok(None);
        }

        let mut samples = Vec::new();
        for entry in Self::sample_entries(&data_dir) {
            if samples.len() >= max_samples {
                break;
            }
            let entry = entry.map_err(|e| {
                ZooLinkError::file_io_error("read cached sample", &data_dir, &e.into())
            })?;
            if entry.file_type().is_file() {
                samples.push(entry.into_path());
            }
        }

        Ok(Some(samples))
    }

    fn sample_entries(data_dir: &Path) -> walkdir::IntoIter {
        WalkDir::new(data_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
    }

    /// Scan the zoo directory and return every cached dataset split
    ///
    /// This backs the `--list-cached` functionality.
    pub fn scan_cached_splits(&self) -> Result<Vec<CachedSplitInfo>> {
        let mut splits = Vec::new();

        if !self.root.exists() {
            return Ok(splits);
        }

        for dataset_dir in Self::child_dirs(&self.root)? {
            let Some(dataset) = Self::dir_name(&dataset_dir) else {
                continue;
            };
            if dataset == RECORDS_DIR {
                continue;
            }

            for split_dir in Self::child_dirs(&dataset_dir)? {
                let data_dir = split_dir.join(DATA_DIR);
                let Some(split) = Self::dir_name(&split_dir) else {
                    continue;
                };
                if !data_dir.is_dir() {
                    log::debug!("Skipping split without data directory: {}", split_dir.display());
                    continue;
                }

                let mut sample_count = 0;
                let mut size_bytes = 0;
                for entry in Self::sample_entries(&data_dir).flatten() {
                    if entry.file_type().is_file() {
                        sample_count += 1;
                        size_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
                    }
                }

                splits.push(CachedSplitInfo {
                    dataset: dataset.clone(),
                    split,
                    path: data_dir,
                    sample_count,
                    size_bytes,
                });
            }
        }

        // Sort for consistent output
        splits.sort_by(|a, b| (&a.dataset, &a.split).cmp(&(&b.dataset, &b.split)));
        Ok(splits)
    }

    fn child_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(dir)
            .map_err(|e| ZooLinkError::file_io_error("read zoo directory", dir, &e))?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| ZooLinkError::file_io_error("read zoo directory entry", dir, &e))?;
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        Ok(dirs)
    }

    fn dir_name(path: &Path) -> Option<String> {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
    }

    /// Directory holding dataset records
    #[must_use]
    pub fn records_dir(&self) -> PathBuf {
        self.root.join(RECORDS_DIR)
    }

    /// Persist a dataset record, returning its path
    pub fn write_record(&self, record: &DatasetRecord) -> Result<PathBuf> {
        let dir = self.records_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| ZooLinkError::file_io_error("create records directory", &dir, &e))?;

        let path = dir.join(format!("{}.json", record.name));
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| ZooLinkError::parse("dataset record", e))?;
        fs::write(&path, json)
            .map_err(|e| ZooLinkError::file_io_error("write dataset record", &path, &e))?;

        log::debug!("Wrote dataset record {}", path.display());
        Ok(path)
    }

    /// Read a dataset record back
    pub fn read_record(path: &Path) -> Result<DatasetRecord> {
        let contents = fs::read(path)
            .map_err(|e| ZooLinkError::file_io_error("read dataset record", path, &e))?;
        serde_json::from_slice(&contents).map_err(|e| ZooLinkError::parse("dataset record", e))
    }

    /// Remove a dataset record; a record that is already gone is not an error
    pub fn remove_record(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ZooLinkError::file_io_error("remove dataset record", path, &e)),
        }
    }

    /// Paths of all dataset records currently on disk
    pub fn list_records(&self) -> Result<Vec<PathBuf>> {
        let dir = self.records_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir)
            .map_err(|e| ZooLinkError::file_io_error("read records directory", &dir, &e))?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| ZooLinkError::file_io_error("read records directory entry", &dir, &e))?;
            let path = entry.path();
            if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            {
                records.push(path);
            }
        }
        records.sort();
        Ok(records)
    }

    /// Delete every dataset record, e.g. ones left behind by interrupted runs
    ///
    /// # Returns
    /// Names of the removed records for user feedback
    pub fn prune_records(&self) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        for path in self.list_records()? {
            log::info!("Removing stale dataset record: {}", path.display());
            Self::remove_record(&path)?;
            if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                removed.push(name.to_string());
            }
        }
        Ok(removed)
    }
}

/// Format file size in human-readable format
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS.get(unit_index).unwrap_or(&"B"))
    } else {
        format!("{:.1} {}", size, UNITS.get(unit_index).unwrap_or(&"B"))
    }
}
