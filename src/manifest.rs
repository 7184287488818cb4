//! Per-split sample manifests
//!
//! A manifest lists the samples of one split in source order. Two formats are
//! accepted:
//!
//! - JSON: `{"samples": [{"url": "...", "filename": "...", "sha256": "..."}]}`
//!   where `filename` and `sha256` are optional;
//! - plain text: one URL per line, blank lines and `#` comments ignored.

use crate::error::{Result, ZooLinkError};
use serde::{Deserialize, Serialize};

/// One downloadable sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl ManifestEntry {
    /// File name the sample is cached under
    ///
    /// Falls back to the last path segment of the URL, without query string or
    /// fragment.
    pub fn file_name(&self) -> Result<String> {
        if let Some(name) = &self.filename {
            return Self::checked_name(name, &self.url);
        }

        let without_query = self
            .url
            .split(['?', '#'])
            .next()
            .unwrap_or(&self.url);
        let segment = without_query
            .rsplit('/')
            .next()
            .unwrap_or_default();
        Self::checked_name(segment, &self.url)
    }

    fn checked_name(name: &str, url: &str) -> Result<String> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.contains(':');
        if invalid {
            return Err(ZooLinkError::invalid_config(format!(
                "Cannot derive a file name for manifest entry {}",
                url
            )));
        }
        Ok(name.to_string())
    }
}

/// Ordered list of samples for one split
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub samples: Vec<ManifestEntry>,
}

impl Manifest {
    /// Parse manifest contents, detecting the format
    pub fn parse(contents: &str) -> Result<Self> {
        let trimmed = contents.trim_start();
        if trimmed.starts_with('{') {
            return serde_json::from_str(trimmed).map_err(|e| ZooLinkError::parse("manifest", e));
        }

        let samples = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|url| ManifestEntry {
                url: url.to_string(),
                filename: None,
                sha256: None,
            })
            .collect();
        Ok(Self { samples })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// First `max_samples` entries, in manifest order
    #[must_use]
    pub fn head(&self, max_samples: usize) -> &[ManifestEntry] {
        self.samples
            .get(..max_samples.min(self.samples.len()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_manifest() {
        let manifest = Manifest::parse(
            r#"{"samples": [
                {"url": "https://example.org/train/0001.jpg"},
                {"url": "https://example.org/img?id=2", "filename": "0002.jpg", "sha256": "abc"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.samples[0].file_name().unwrap(), "0001.jpg");
        assert_eq!(manifest.samples[1].file_name().unwrap(), "0002.jpg");
        assert_eq!(manifest.samples[1].sha256.as_deref(), Some("abc"));
    }

    #[test]
    fn test_parse_text_manifest() {
        let manifest = Manifest::parse(
            "# open-images-v7 train\n\nhttps://example.org/a.jpg\n  https://example.org/b.jpg  \n",
        )
        .unwrap();

        let names: Vec<_> = manifest
            .samples
            .iter()
            .map(|entry| entry.file_name().unwrap())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_invalid_json_manifest() {
        let err = Manifest::parse("{\"samples\": [").unwrap_err();
        assert!(matches!(err, ZooLinkError::Parse { .. }));
    }

    #[test]
    fn test_file_name_strips_query_and_fragment() {
        let entry = ManifestEntry {
            url: "https://example.org/data/c.png?token=xyz#frag".to_string(),
            filename: None,
            sha256: None,
        };
        assert_eq!(entry.file_name().unwrap(), "c.png");
    }

    #[test]
    fn test_file_name_rejects_unsafe_names() {
        for filename in ["", "..", "../escape.jpg", "a\\b.jpg"] {
            let entry = ManifestEntry {
                url: "https://example.org/x.jpg".to_string(),
                filename: Some(filename.to_string()),
                sha256: None,
            };
            assert!(entry.file_name().is_err(), "should reject {filename:?}");
        }

        let entry = ManifestEntry {
            url: "https://example.org/".to_string(),
            filename: None,
            sha256: None,
        };
        assert!(entry.file_name().is_err());
    }

    #[test]
    fn test_head_is_clipped() {
        let manifest = Manifest::parse("u/1\nu/2\nu/3\n").unwrap();
        assert_eq!(manifest.head(2).len(), 2);
        assert_eq!(manifest.head(10).len(), 3);
        assert!(manifest.head(0).is_empty());
    }
}
