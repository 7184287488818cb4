//! Dataset zoo: loads dataset splits as handles over cached sample files
//!
//! [`DatasetZoo`] is the seam between the materialization pipeline and
//! whatever provides samples. [`CachedZoo`] is the default implementation,
//! backed by a [`ZooCatalog`], the on-disk [`ZooCache`] and a
//! [`SampleDownloader`].

use crate::cache::{DatasetRecord, ZooCache};
use crate::catalog::ZooCatalog;
use crate::download::SampleDownloader;
use crate::error::{Result, ZooLinkError};
use crate::services::ProgressIndicator;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Parameters for loading one dataset split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub dataset: String,
    pub split: String,
    /// Upper bound on the number of samples in the returned dataset
    pub max_samples: usize,
    /// Label types to materialize alongside the samples; always empty here
    pub label_types: Vec<String>,
}

impl LoadRequest {
    /// Request without labels, in source order
    #[must_use]
    pub fn new(dataset: impl Into<String>, split: impl Into<String>, max_samples: usize) -> Self {
        Self {
            dataset: dataset.into(),
            split: split.into(),
            max_samples,
            label_types: Vec::new(),
        }
    }
}

/// A single sample file known to the zoo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// File name of the sample
    pub id: String,
    /// Location of the sample file in the zoo cache
    pub filepath: PathBuf,
}

impl Sample {
    #[must_use]
    pub fn from_path(filepath: PathBuf) -> Self {
        let id = filepath
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { id, filepath }
    }
}

/// Handle to a loaded dataset split
///
/// Samples are kept in source-fetch order. The handle owns a dataset record in
/// the zoo directory which [`Dataset::delete`] removes.
#[derive(Debug)]
pub struct Dataset {
    name: String,
    split: String,
    samples: Vec<Sample>,
    record: Option<PathBuf>,
}

impl Dataset {
    /// Build a handle from samples; `record` is the on-disk record, if any
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        split: impl Into<String>,
        samples: Vec<Sample>,
        record: Option<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            split: split.into(),
            samples,
            record,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn split(&self) -> &str {
        &self.split
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Samples after the first `n`; empty when `n` is past the end
    #[must_use]
    pub fn skip(&self, n: usize) -> &[Sample] {
        self.samples.get(n..).unwrap_or_default()
    }

    #[must_use]
    pub fn record_path(&self) -> Option<&Path> {
        self.record.as_deref()
    }

    /// Release the handle and delete its dataset record
    pub fn delete(self) -> Result<()> {
        if let Some(record) = &self.record {
            ZooCache::remove_record(record)?;
            debug!(dataset = %self.name, record = %record.display(), "Deleted dataset record");
        }
        Ok(())
    }
}

/// Source of dataset splits
#[async_trait]
pub trait DatasetZoo: Send + Sync {
    /// Load up to `request.max_samples` samples of a split, in source order
    async fn load(
        &self,
        request: &LoadRequest,
        progress: Option<&ProgressIndicator>,
    ) -> Result<Dataset>;
}

/// Zoo backed by a catalog, a local cache and an HTTP downloader
#[derive(Debug, Clone)]
pub struct CachedZoo {
    catalog: ZooCatalog,
    cache: ZooCache,
    downloader: SampleDownloader,
}

impl CachedZoo {
    /// Create a zoo storing samples under `zoo_dir`
    ///
    /// # Errors
    /// - Failed to create the zoo directory
    /// - Failed to create the HTTP client
    pub fn new(zoo_dir: &Path, catalog: ZooCatalog) -> Result<Self> {
        Ok(Self {
            catalog,
            cache: ZooCache::new(zoo_dir)?,
            downloader: SampleDownloader::new()?,
        })
    }

    #[must_use]
    pub fn cache(&self) -> &ZooCache {
        &self.cache
    }

    async fn resolve_samples(
        &self,
        request: &LoadRequest,
        progress: Option<&ProgressIndicator>,
    ) -> Result<Vec<PathBuf>> {
        let data_dir = self.cache.split_data_dir(&request.dataset, &request.split);

        if let Some(source) = self.catalog.manifest_for(&request.dataset, &request.split) {
            let manifest = self.downloader.fetch_manifest(&source).await?;
            let entries = manifest.head(request.max_samples);
            info!(
                dataset = %request.dataset,
                split = %request.split,
                available = manifest.len(),
                requested = entries.len(),
                "Resolved split from catalog"
            );
            let (paths, stats) = self
                .downloader
                .ensure_samples(entries, &data_dir, progress)
                .await?;
            debug!(
                downloaded = stats.downloaded,
                cached = stats.cached,
                bytes = stats.bytes,
                "Samples ready"
            );
            if let Some(pb) = progress {
                pb.finish_with_message(format!(
                    "{} samples ready ({} downloaded, {})",
                    paths.len(),
                    stats.downloaded,
                    crate::cache::format_size(stats.bytes)
                ));
            }
            return Ok(paths);
        }

        match self
            .cache
            .cached_samples(&request.dataset, &request.split, request.max_samples)?
        {
            Some(paths) => {
                info!(
                    dataset = %request.dataset,
                    split = %request.split,
                    samples = paths.len(),
                    "Dataset not in catalog, using cached samples"
                );
                Ok(paths)
            },
            None => Err(ZooLinkError::DatasetNotFound {
                dataset: request.dataset.clone(),
                split: request.split.clone(),
                cache_dir: self.cache.root().to_path_buf(),
            }),
        }
    }
}

#[async_trait]
impl DatasetZoo for CachedZoo {
    async fn load(
        &self,
        request: &LoadRequest,
        progress: Option<&ProgressIndicator>,
    ) -> Result<Dataset> {
        if !request.label_types.is_empty() {
            debug!(
                label_types = ?request.label_types,
                "Label materialization is not supported; ignoring label types"
            );
        }

        let paths = self.resolve_samples(request, progress).await?;

        let name = format!("{}-{}-{}", request.dataset, request.split, uuid::Uuid::new_v4());
        let record = DatasetRecord {
            name: name.clone(),
            dataset: request.dataset.clone(),
            split: request.split.clone(),
            created_at: Utc::now(),
            samples: paths.clone(),
        };
        let record_path = self.cache.write_record(&record)?;

        let samples = paths.into_iter().map(Sample::from_path).collect();
        Ok(Dataset::new(name, request.split.clone(), samples, Some(record_path)))
    }
}
