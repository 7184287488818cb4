//! Configuration for a materialization run
//!
//! Everything the pipeline needs is carried explicitly in a
//! [`MaterializeConfig`]; nothing is read from global state after the
//! configuration has been built.

use crate::cache::ZooCache;
use crate::error::{Result, ZooLinkError};
use crate::linker::FailurePolicy;
use crate::range::SplitRange;
use crate::split::{Split, SplitSpec};
use std::collections::HashSet;
use std::path::PathBuf;

/// Dataset fetched when none is specified
pub const DEFAULT_DATASET: &str = "open-images-v7";

/// Output root used when none is specified
pub const DEFAULT_OUT_DIR: &str = "./dataset";

/// Default train window
pub const DEFAULT_TRAIN_RANGE: SplitRange = SplitRange::new(10, 20);

/// Default validation window
pub const DEFAULT_VAL_RANGE: SplitRange = SplitRange::new(1, 5);

/// Configuration for fetching and linking dataset splits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeConfig {
    /// Zoo cache directory
    pub zoo_dir: PathBuf,
    /// Root of the linked output tree
    pub out_dir: PathBuf,
    /// Dataset name in the zoo catalog
    pub dataset: String,
    /// Splits to materialize, processed in order
    pub splits: Vec<SplitSpec>,
    /// Catalog file; `None` uses the default location
    pub catalog: Option<PathBuf>,
    /// Behaviour on files that cannot be linked
    pub failure_policy: FailurePolicy,
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            zoo_dir: ZooCache::default_root(),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            dataset: DEFAULT_DATASET.to_string(),
            splits: vec![
                SplitSpec::new(Split::Train, DEFAULT_TRAIN_RANGE),
                SplitSpec::new(Split::Validation, DEFAULT_VAL_RANGE),
            ],
            catalog: None,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl MaterializeConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> MaterializeConfigBuilder {
        MaterializeConfigBuilder::default()
    }

    /// Validate configuration parameters
    ///
    /// # Validation Rules
    ///
    /// - Dataset name: non-empty, no path separators
    /// - Splits: at least one, with distinct output folders and names free of
    ///   path separators
    pub fn validate(&self) -> Result<()> {
        if self.dataset.trim().is_empty() {
            return Err(ZooLinkError::invalid_config("Dataset name cannot be empty"));
        }
        Self::validate_path_component("Dataset", &self.dataset)?;

        if self.splits.is_empty() {
            return Err(ZooLinkError::invalid_config(
                "At least one split must be configured",
            ));
        }

        let mut folders = HashSet::new();
        for spec in &self.splits {
            if spec.split.name().trim().is_empty() {
                return Err(ZooLinkError::invalid_config("Split name cannot be empty"));
            }
            Self::validate_path_component("Split", spec.split.name())?;
            if !folders.insert(spec.split.output_folder()) {
                return Err(ZooLinkError::invalid_config(format!(
                    "Split '{}' is configured more than once",
                    spec.split
                )));
            }
        }

        Ok(())
    }

    /// Names become directory names under the zoo and output roots
    fn validate_path_component(kind: &str, name: &str) -> Result<()> {
        let name = name.trim();
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ZooLinkError::invalid_config(format!(
                "{kind} name '{name}' must not contain path separators"
            )));
        }
        Ok(())
    }

    /// Output directory for a split
    #[must_use]
    pub fn split_out_dir(&self, split: &Split) -> PathBuf {
        self.out_dir.join(split.output_folder())
    }
}

/// Builder for `MaterializeConfig`
#[derive(Debug, Default)]
pub struct MaterializeConfigBuilder {
    config: MaterializeConfig,
}

impl MaterializeConfigBuilder {
    /// Set the zoo cache directory
    #[must_use]
    pub fn zoo_dir(mut self, zoo_dir: impl Into<PathBuf>) -> Self {
        self.config.zoo_dir = zoo_dir.into();
        self
    }

    /// Set the output root
    #[must_use]
    pub fn out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.config.out_dir = out_dir.into();
        self
    }

    /// Set the dataset name
    #[must_use]
    pub fn dataset(mut self, dataset: impl Into<String>) -> Self {
        self.config.dataset = dataset.into();
        self
    }

    /// Set the window for a split, replacing any existing window for it
    #[must_use]
    pub fn split(mut self, split: Split, range: SplitRange) -> Self {
        match self.config.splits.iter_mut().find(|spec| spec.split == split) {
            Some(spec) => spec.range = range,
            None => self.config.splits.push(SplitSpec::new(split, range)),
        }
        self
    }

    /// Replace all configured splits
    #[must_use]
    pub fn splits(mut self, splits: Vec<SplitSpec>) -> Self {
        self.config.splits = splits;
        self
    }

    /// Set the train window
    #[must_use]
    pub fn train_range(self, range: SplitRange) -> Self {
        self.split(Split::Train, range)
    }

    /// Set the validation window
    #[must_use]
    pub fn val_range(self, range: SplitRange) -> Self {
        self.split(Split::Validation, range)
    }

    /// Set the catalog file
    #[must_use]
    pub fn catalog(mut self, catalog: Option<PathBuf>) -> Self {
        self.config.catalog = catalog;
        self
    }

    /// Set the link failure policy
    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<MaterializeConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MaterializeConfig::default();
        assert_eq!(config.out_dir, PathBuf::from("./dataset"));
        assert_eq!(config.dataset, "open-images-v7");
        assert_eq!(config.splits.len(), 2);
        assert_eq!(config.splits[0].split, Split::Train);
        assert_eq!(config.splits[0].range.to_string(), "10:20");
        assert_eq!(config.splits[1].split, Split::Validation);
        assert_eq!(config.splits[1].range.to_string(), "1:5");
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides_ranges_in_place() {
        let config = MaterializeConfig::builder()
            .zoo_dir("/tmp/zoo")
            .out_dir("/tmp/out")
            .dataset("coco-2017")
            .val_range(SplitRange::new(0, 3))
            .train_range(SplitRange::new(5, 6))
            .failure_policy(FailurePolicy::Continue)
            .build()
            .unwrap();

        assert_eq!(config.zoo_dir, PathBuf::from("/tmp/zoo"));
        assert_eq!(config.dataset, "coco-2017");
        // Order of the defaults is kept
        assert_eq!(config.splits[0].split, Split::Train);
        assert_eq!(config.splits[0].range, SplitRange::new(5, 6));
        assert_eq!(config.splits[1].range, SplitRange::new(0, 3));
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
    }

    #[test]
    fn test_split_out_dir_uses_valid_folder() {
        let config = MaterializeConfig::builder().out_dir("/out").build().unwrap();
        assert_eq!(config.split_out_dir(&Split::Train), PathBuf::from("/out/train"));
        assert_eq!(config.split_out_dir(&Split::Validation), PathBuf::from("/out/valid"));
    }

    #[test]
    fn test_invalid_configs() {
        assert!(MaterializeConfig::builder().dataset("").build().is_err());
        assert!(MaterializeConfig::builder().dataset("../etc").build().is_err());
        assert!(MaterializeConfig::builder().splits(Vec::new()).build().is_err());

        for name in ["../x", "a/b", "..", "c\\d"] {
            let err = MaterializeConfig::builder()
                .split(Split::from(name), SplitRange::new(0, 1))
                .build()
                .unwrap_err();
            assert!(err.to_string().contains("path separators"), "{name}: {err}");
        }

        let duplicated = vec![
            SplitSpec::new(Split::Train, SplitRange::new(0, 1)),
            SplitSpec::new(Split::from("train"), SplitRange::new(1, 2)),
        ];
        let err = MaterializeConfig::builder()
            .splits(duplicated)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }
}
