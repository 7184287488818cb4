//! Dataset split names and their output folders

use crate::range::SplitRange;
use std::fmt;

/// Named subset of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Validation,
    Test,
    Other(String),
}

impl Split {
    /// Split name as the zoo knows it
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
            Split::Test => "test",
            Split::Other(name) => name,
        }
    }

    /// Folder the split is materialized into under the output directory
    ///
    /// Identity except `validation`, which becomes `valid`.
    #[must_use]
    pub fn output_folder(&self) -> &str {
        match self {
            Split::Validation => "valid",
            other => other.name(),
        }
    }
}

impl From<&str> for Split {
    fn from(name: &str) -> Self {
        match name {
            "train" => Split::Train,
            "validation" => Split::Validation,
            "test" => Split::Test,
            other => Split::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A split together with the window of samples to materialize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSpec {
    pub split: Split,
    pub range: SplitRange,
}

impl SplitSpec {
    #[must_use]
    pub fn new(split: Split, range: SplitRange) -> Self {
        Self { split, range }
    }
}
