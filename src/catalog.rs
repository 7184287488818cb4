//! Zoo catalog: which manifest describes each dataset split
//!
//! The catalog is a JSON document of the form
//!
//! ```json
//! {
//!   "datasets": {
//!     "open-images-v7": {
//!       "splits": {
//!         "train": { "manifest": "https://example.org/oiv7/train.json" },
//!         "validation": { "manifest": "/data/manifests/oiv7-validation.txt" }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Manifests may be HTTP(S) URLs or local paths; relative paths are resolved
//! against the catalog file's directory.

use crate::error::{Result, ZooLinkError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming a catalog file
pub const CATALOG_ENV: &str = "ZOOLINK_CATALOG";

/// Registry of downloadable datasets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZooCatalog {
    #[serde(default)]
    pub datasets: BTreeMap<String, CatalogDataset>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Catalog entry for one dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDataset {
    #[serde(default)]
    pub splits: BTreeMap<String, CatalogSplit>,
}

/// Catalog entry for one split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSplit {
    /// URL or path of the split manifest
    pub manifest: String,
}

/// Where a manifest is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    Url(String),
    File(PathBuf),
}

impl ManifestSource {
    fn from_location(location: &str, base_dir: Option<&Path>) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Self::Url(location.to_string());
        }
        let path = PathBuf::from(location);
        match base_dir {
            Some(base) if path.is_relative() => Self::File(base.join(path)),
            _ => Self::File(path),
        }
    }
}

impl ZooCatalog {
    /// Catalog without any datasets; every lookup falls back to the cache
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a catalog from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ZooLinkError::parse("zoo catalog", e))
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ZooLinkError::file_io_error("read zoo catalog", path, &e))?;
        let mut catalog = Self::from_json(&contents)
            .map_err(|e| ZooLinkError::invalid_config(format!("{} ({})", e, path.display())))?;
        catalog.base_dir = path.parent().map(Path::to_path_buf);
        log::debug!(
            "Loaded zoo catalog {} with {} dataset(s)",
            path.display(),
            catalog.datasets.len()
        );
        Ok(catalog)
    }

    /// Locate the catalog to use when none is given explicitly
    ///
    /// `ZOOLINK_CATALOG` wins; otherwise `<config dir>/zoolink/catalog.json`
    /// is used if it exists.
    #[must_use]
    pub fn default_location() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CATALOG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|dir| dir.join("zoolink").join("catalog.json"))
            .filter(|path| path.exists())
    }

    /// Load the catalog at `path`, the default location, or an empty one
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(Self::default_location) {
            Some(path) => Self::load(&path),
            None => Ok(Self::empty()),
        }
    }

    /// Manifest source for a dataset split, if the catalog lists it
    #[must_use]
    pub fn manifest_for(&self, dataset: &str, split: &str) -> Option<ManifestSource> {
        self.datasets
            .get(dataset)
            .and_then(|entry| entry.splits.get(split))
            .map(|entry| ManifestSource::from_location(&entry.manifest, self.base_dir.as_deref()))
    }
}
