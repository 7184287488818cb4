//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliLogFormat};
use crate::{
    config::MaterializeConfig, linker::FailurePolicy, range::SplitRange,
    tracing_config::TracingFormat,
};
use anyhow::{Context, Result};

/// Convert CLI arguments to a `MaterializeConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build MaterializeConfig from CLI arguments
    ///
    /// Ranges are parsed here so a malformed range fails before anything is
    /// fetched.
    pub(crate) fn from_cli(cli: &Cli) -> Result<MaterializeConfig> {
        let train_range = SplitRange::parse(&cli.train_range)
            .with_context(|| format!("Invalid --train-range '{}'", cli.train_range))?;
        let val_range = SplitRange::parse(&cli.val_range)
            .with_context(|| format!("Invalid --val-range '{}'", cli.val_range))?;

        let failure_policy = if cli.keep_going {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Abort
        };

        let config = MaterializeConfig::builder()
            .zoo_dir(&cli.zoo_dir)
            .out_dir(&cli.out_dir)
            .dataset(cli.dataset.as_str())
            .train_range(train_range)
            .val_range(val_range)
            .catalog(cli.catalog.clone())
            .failure_policy(failure_policy)
            .build()
            .context("Invalid configuration")?;

        Ok(config)
    }

    /// Map the CLI log format onto the tracing output format
    pub(crate) fn tracing_format(format: CliLogFormat) -> TracingFormat {
        match format {
            CliLogFormat::Console => TracingFormat::Console,
            CliLogFormat::Compact => TracingFormat::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => TracingFormat::Json,
        }
    }
}
