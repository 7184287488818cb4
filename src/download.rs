//! Sample downloading for zoo dataset splits
//!
//! This module fetches split manifests and downloads the samples they list
//! into the zoo cache, with progress reporting, optional SHA-256 verification,
//! and atomic placement (temporary file in the target directory, then rename).

use crate::catalog::ManifestSource;
use crate::error::{Result, ZooLinkError};
use crate::manifest::{Manifest, ManifestEntry};
use crate::services::ProgressIndicator;
use crate::tracing_config::spans;
use futures_util::stream::TryStreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;
use tracing::Instrument;

/// Request timeout for manifest and sample downloads
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Sample downloader with progress reporting
#[derive(Debug, Clone)]
pub struct SampleDownloader {
    client: Client,
}

/// Download progress information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadStats {
    /// Samples fetched over the network
    pub downloaded: usize,
    /// Samples already present in the cache
    pub cached: usize,
    /// Bytes written to the cache
    pub bytes: u64,
}

impl SampleDownloader {
    /// Create a new sample downloader
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ZooLinkError::network_error("Failed to create HTTP client", e))?;

        Ok(Self { client })
    }

    /// Read a manifest from a URL or a local file
    pub async fn fetch_manifest(&self, source: &ManifestSource) -> Result<Manifest> {
        let contents = match source {
            ManifestSource::Url(url) => {
                log::info!("Fetching manifest: {}", url);
                let response = self.client.get(url).send().await.map_err(|e| {
                    ZooLinkError::network_error(format!("Failed to fetch manifest {}", url), e)
                })?;
                if !response.status().is_success() {
                    return Err(ZooLinkError::network_error(
                        format!("Failed to fetch manifest {}", url),
                        format!("HTTP {}", response.status()),
                    ));
                }
                response.text().await.map_err(|e| {
                    ZooLinkError::network_error(format!("Failed to read manifest {}", url), e)
                })?
            },
            ManifestSource::File(path) => {
                log::debug!("Reading manifest: {}", path.display());
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| ZooLinkError::file_io_error("read manifest", path, &e))?
            },
        };

        Manifest::parse(&contents)
    }

    /// Make sure every entry is present in `data_dir`, downloading missing ones
    ///
    /// Returns the cached sample paths in entry order.
    ///
    /// # Errors
    /// - An entry has no usable file name
    /// - Network errors during download
    /// - Checksum mismatch for a downloaded sample
    /// - File system errors while placing files
    pub async fn ensure_samples(
        &self,
        entries: &[ManifestEntry],
        data_dir: &Path,
        progress: Option<&ProgressIndicator>,
    ) -> Result<(Vec<PathBuf>, DownloadStats)> {
        fs::create_dir_all(data_dir)
            .map_err(|e| ZooLinkError::file_io_error("create data directory", data_dir, &e))?;

        let mut stats = DownloadStats::default();
        let mut paths = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let local_path = data_dir.join(entry.file_name()?);

            if local_path.is_file()
                && verify_file_integrity(&local_path, entry.sha256.as_deref())?
            {
                log::trace!("Sample already cached: {}", local_path.display());
                stats.cached += 1;
            } else {
                if local_path.is_file() {
                    log::warn!(
                        "Cached sample {} does not match its checksum, downloading again",
                        local_path.display()
                    );
                }
                if let Some(pb) = progress {
                    pb.set_message(format!("Downloading {}/{}", index + 1, entries.len()));
                }
                stats.bytes += self
                    .download_file(&entry.url, &local_path, entry.sha256.as_deref(), progress)
                    .instrument(spans::download(&entry.url, &local_path))
                    .await?;
                stats.downloaded += 1;
            }
            paths.push(local_path);
        }

        log::info!(
            "{} sample(s) downloaded, {} already cached",
            stats.downloaded,
            stats.cached
        );
        Ok((paths, stats))
    }

    /// Download a single file with progress reporting
    ///
    /// The file only appears at `local_path` once it is complete and verified.
    async fn download_file(
        &self,
        url: &str,
        local_path: &Path,
        expected_sha256: Option<&str>,
        progress: Option<&ProgressIndicator>,
    ) -> Result<u64> {
        log::debug!("Downloading: {} -> {}", url, local_path.display());

        let parent = local_path.parent().unwrap_or_else(|| Path::new("."));

        let response =
            self.client.get(url).send().await.map_err(|e| {
                ZooLinkError::network_error(format!("Failed to download {}", url), e)
            })?;

        if !response.status().is_success() {
            return Err(ZooLinkError::network_error(
                format!("Failed to download {}", url),
                format!("HTTP {}", response.status()),
            ));
        }

        let total_size = response.content_length();

        let (std_file, temp_path) = tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(parent)
            .map_err(|e| ZooLinkError::file_io_error("create temporary file", parent, &e))?
            .into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        let mut stream = StreamReader::new(
            response
                .bytes_stream()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
        );

        let mut hasher = Sha256::new();
        let mut downloaded = 0u64;
        let mut buffer = vec![0; 8192]; // 8KB buffer

        if let Some(pb) = progress {
            if let Some(total) = total_size {
                pb.set_length(total);
            }
            pb.set_position(0);
        }

        loop {
            let bytes_read = tokio::io::AsyncReadExt::read(&mut stream, &mut buffer)
                .await
                .map_err(|e| ZooLinkError::network_error("Failed to read download stream", e))?;

            if bytes_read == 0 {
                break; // EOF
            }

            let chunk = buffer.get(..bytes_read).unwrap_or(&[]);
            hasher.update(chunk);
            file.write_all(chunk)
                .await
                .map_err(|e| ZooLinkError::file_io_error("write to file", &temp_path, &e))?;

            downloaded += bytes_read as u64;

            if let Some(pb) = progress {
                pb.set_position(downloaded);
            }
        }

        file.flush()
            .await
            .map_err(|e| ZooLinkError::file_io_error("flush file", &temp_path, &e))?;
        drop(file);

        if let Some(expected) = expected_sha256 {
            let actual = format!("{:x}", hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                log::warn!(
                    "File integrity check failed for {}: expected {}, got {}",
                    url,
                    expected,
                    actual
                );
                return Err(ZooLinkError::Checksum {
                    path: local_path.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        temp_path.persist(local_path).map_err(|e| {
            ZooLinkError::file_io_error("move downloaded sample into cache", local_path, &e.error)
        })?;

        log::debug!(
            "Downloaded {} bytes to {}",
            downloaded,
            local_path.display()
        );
        Ok(downloaded)
    }
}

/// Verify a cached file against an expected SHA-256 hex digest
pub fn verify_file_integrity(file_path: &Path, expected_hash: Option<&str>) -> Result<bool> {
    let Some(expected) = expected_hash else {
        // No hash provided, skip verification
        return Ok(true);
    };

    let contents = fs::read(file_path).map_err(|e| {
        ZooLinkError::file_io_error("read file for verification", file_path, &e)
    })?;

    let actual_hash = format!("{:x}", Sha256::digest(&contents));
    Ok(actual_hash.eq_ignore_ascii_case(expected))
}
