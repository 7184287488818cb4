//! Error types for dataset materialization

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for zoolink operations
pub type Result<T> = std::result::Result<T, ZooLinkError>;

/// Error types for fetching and linking dataset splits
#[derive(Error, Debug)]
pub enum ZooLinkError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or inverted `start:end` range
    #[error("Invalid range '{input}': {reason}")]
    InvalidRange { input: String, reason: String },

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The zoo has neither a catalog entry nor cached files for a split
    #[error("Dataset '{dataset}' has no split '{split}' in the catalog or in {}", .cache_dir.display())]
    DatasetNotFound {
        dataset: String,
        split: String,
        cache_dir: PathBuf,
    },

    /// Catalog, manifest or dataset record could not be parsed
    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// Network errors while fetching manifests or samples
    #[error("Network error: {0}")]
    Network(String),

    /// Downloaded sample did not match its expected checksum
    #[error("Checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    Checksum {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Both the hard link and the symlink fallback failed
    #[error("Failed to link '{}' -> '{}': hard link: {hard_link}; symlink: {symlink}", .source_path.display(), .destination.display())]
    Link {
        source_path: PathBuf,
        destination: PathBuf,
        hard_link: String,
        symlink: String,
    },
}

impl ZooLinkError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new invalid range error
    pub fn invalid_range<S: Into<String>, R: Into<String>>(input: S, reason: R) -> Self {
        Self::InvalidRange {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error for a named document
    pub fn parse<S: Into<String>>(what: S, source: serde_json::Error) -> Self {
        Self::Parse {
            what: what.into(),
            source,
        }
    }

    /// Create network error with context
    pub fn network_error<S: Into<String>, E: std::fmt::Display>(context: S, error: E) -> Self {
        Self::Network(format!("{}: {}", context.into(), error))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }
}
