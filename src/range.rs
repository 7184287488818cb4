//! `start:end` sample windows for a split

use crate::error::{Result, ZooLinkError};
use std::fmt;
use std::str::FromStr;

/// Half-open window `[start, end)` of samples within a split
///
/// `end` doubles as the maximum number of samples fetched from the zoo; the
/// first `start` of those are skipped before linking. An inverted range
/// (`start > end`) is accepted and selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SplitRange {
    pub start: usize,
    pub end: usize,
}

impl SplitRange {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Parse a `"start:end"` string
    ///
    /// # Examples
    /// ```
    /// use zoolink::SplitRange;
    ///
    /// let range = SplitRange::parse("10:20").unwrap();
    /// assert_eq!((range.start, range.end), (10, 20));
    /// assert!(SplitRange::parse("20:10").unwrap().is_empty());
    /// assert!(SplitRange::parse("10").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let (start, end) = input
            .split_once(':')
            .ok_or_else(|| ZooLinkError::invalid_range(input, "expected 'start:end'"))?;

        let start = Self::parse_index(input, start, "start")?;
        let end = Self::parse_index(input, end, "end")?;

        Ok(Self::new(start, end))
    }

    fn parse_index(input: &str, part: &str, label: &str) -> Result<usize> {
        part.trim().parse::<usize>().map_err(|e| {
            ZooLinkError::invalid_range(input, format!("{label} index '{}': {e}", part.trim()))
        })
    }

    /// Number of samples in the window, before clipping to what the zoo has
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl FromStr for SplitRange {
    type Err = ZooLinkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SplitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
