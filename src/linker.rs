//! Space-efficient placement of sample files into an output directory
//!
//! Each source file is hard-linked into the destination directory under its
//! base name. When the hard link cannot be created (different filesystem,
//! directory source, unsupported filesystem) a symbolic link to the absolute source
//! path is created instead. Destinations that already exist are never touched, which
//! makes repeated runs over the same window idempotent.

use crate::error::{Result, ZooLinkError};
use crate::services::ProgressIndicator;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Result of placing one sample into the destination directory
#[derive(Debug)]
pub enum LinkOutcome {
    /// A hard link to the source was created
    HardLinked(PathBuf),
    /// Hard linking failed and a symbolic link was created instead
    SymLinked { destination: PathBuf, hard_link_error: io::Error },
    /// Something already exists at the destination; nothing was written
    Skipped(PathBuf),
    /// Neither link could be created
    Failed(LinkFailure),
}

impl LinkOutcome {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, LinkOutcome::Failed(_))
    }
}

/// Both attempts for one source file failed
#[derive(Debug)]
pub struct LinkFailure {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub hard_link_error: io::Error,
    pub symlink_error: io::Error,
}

impl From<LinkFailure> for ZooLinkError {
    fn from(failure: LinkFailure) -> Self {
        ZooLinkError::Link {
            source_path: failure.source,
            destination: failure.destination,
            hard_link: failure.hard_link_error.to_string(),
            symlink: failure.symlink_error.to_string(),
        }
    }
}

/// What to do when a file cannot be linked at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failed file and return its error
    #[default]
    Abort,
    /// Record the failure and keep linking the remaining files
    Continue,
}

/// Counts for a batch of link operations
#[derive(Debug, Default)]
pub struct LinkSummary {
    pub hard_linked: usize,
    pub symlinked: usize,
    pub skipped: usize,
    pub failed: Vec<LinkFailure>,
}

impl LinkSummary {
    /// Entries newly created at the destination
    #[must_use]
    pub fn created(&self) -> usize {
        self.hard_linked + self.symlinked
    }

    /// Every file the batch looked at
    #[must_use]
    pub fn total(&self) -> usize {
        self.created() + self.skipped + self.failed.len()
    }

    fn record(&mut self, outcome: LinkOutcome) {
        match outcome {
            LinkOutcome::HardLinked(_) => self.hard_linked += 1,
            LinkOutcome::SymLinked { .. } => self.symlinked += 1,
            LinkOutcome::Skipped(_) => self.skipped += 1,
            LinkOutcome::Failed(failure) => self.failed.push(failure),
        }
    }
}

/// Destination path for `source` inside `dest_dir`, or `None` if the source
/// has no file name
#[must_use]
pub fn destination_for(source: &Path, dest_dir: &Path) -> Option<PathBuf> {
    source.file_name().map(|name| dest_dir.join(name))
}

/// Link a single source file into `dest_dir`
///
/// Never returns an error: the fallback chain is encoded in the outcome.
#[must_use]
pub fn link_file(source: &Path, dest_dir: &Path) -> LinkOutcome {
    let Some(destination) = destination_for(source, dest_dir) else {
        let error = || io::Error::new(io::ErrorKind::InvalidInput, "source path has no file name");
        return LinkOutcome::Failed(LinkFailure {
            source: source.to_path_buf(),
            destination: dest_dir.to_path_buf(),
            hard_link_error: error(),
            symlink_error: error(),
        });
    };

    // symlink_metadata so that a dangling symlink also counts as present
    if fs::symlink_metadata(&destination).is_ok() {
        trace!(destination = %destination.display(), "Destination exists, skipping");
        return LinkOutcome::Skipped(destination);
    }

    match fs::hard_link(source, &destination) {
        Ok(()) => LinkOutcome::HardLinked(destination),
        Err(hard_link_error) => {
            debug!(
                source = %source.display(),
                error = %hard_link_error,
                "Hard link failed, falling back to symlink"
            );
            // Relative targets would resolve against the destination directory
            let target = fs::canonicalize(source).unwrap_or_else(|_| source.to_path_buf());
            match symlink(&target, &destination) {
                Ok(()) => LinkOutcome::SymLinked {
                    destination,
                    hard_link_error,
                },
                Err(symlink_error) => LinkOutcome::Failed(LinkFailure {
                    source: source.to_path_buf(),
                    destination,
                    hard_link_error,
                    symlink_error,
                }),
            }
        },
    }
}

#[cfg(unix)]
fn symlink(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, destination)
}

#[cfg(windows)]
fn symlink(source: &Path, destination: &Path) -> io::Result<()> {
    if source.is_dir() {
        std::os::windows::fs::symlink_dir(source, destination)
    } else {
        std::os::windows::fs::symlink_file(source, destination)
    }
}

/// Link every source into `dest_dir`, creating the directory if needed
///
/// Under [`FailurePolicy::Abort`] the first failed file is returned as
/// [`ZooLinkError::Link`]; under [`FailurePolicy::Continue`] failures are
/// collected in the returned summary.
pub fn link_all<'a, I>(
    sources: I,
    dest_dir: &Path,
    policy: FailurePolicy,
    progress: Option<&ProgressIndicator>,
) -> Result<LinkSummary>
where
    I: IntoIterator<Item = &'a Path>,
{
    fs::create_dir_all(dest_dir)
        .map_err(|e| ZooLinkError::file_io_error("create output directory", dest_dir, &e))?;

    let mut summary = LinkSummary::default();
    for source in sources {
        match link_file(source, dest_dir) {
            LinkOutcome::Failed(failure) if policy == FailurePolicy::Abort => {
                return Err(failure.into());
            },
            LinkOutcome::Failed(failure) => {
                warn!(
                    source = %failure.source.display(),
                    hard_link_error = %failure.hard_link_error,
                    symlink_error = %failure.symlink_error,
                    "Failed to link sample"
                );
                summary.failed.push(failure);
            },
            outcome => summary.record(outcome),
        }

        if let Some(pb) = progress {
            pb.set_position(summary.total() as u64);
        }
    }

    Ok(summary)
}
